//! # Registry Errors
//!
//! This module defines the error type shared by the registry, the scopes it
//! creates and the definition machinery that builds them. Lookup misses by
//! type are *not* errors (they come back as `Ok(None)` or an empty map); every
//! variant here is a signal the caller has to act on.

use crate::name::{ComponentId, ScopeName};

/// Boxed error produced by user-supplied configuration and factory code.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while resolving scopes or looking up components.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Invalid scope name: {0:?}")]
    InvalidScopeName(String),

    #[error(
        "Expected a single component of type {type_name} in scope '{scope}' but found {}: {}",
        .ids.len(),
        join_ids(.ids)
    )]
    AmbiguousComponent {
        scope: ScopeName,
        type_name: &'static str,
        ids: Vec<ComponentId>,
    },

    #[error("No component '{id}' in scope '{scope}'")]
    NoSuchComponent { scope: ScopeName, id: ComponentId },

    #[error("Component '{id}' in scope '{scope}' is {actual}, not {expected}")]
    TypeMismatch {
        scope: ScopeName,
        id: ComponentId,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("No component of type {type_name} in scope '{scope}'")]
    MissingDependency {
        scope: ScopeName,
        type_name: &'static str,
    },

    #[error("Circular dependency in scope '{scope}': {}", join_chain(.chain))]
    CircularDependency {
        scope: ScopeName,
        chain: Vec<ComponentId>,
    },

    /// A configuration or component factory failed. The user's error is kept
    /// as-is: its message and source chain are forwarded unchanged.
    #[error(transparent)]
    Configuration(BoxError),
}

impl RegistryError {
    /// Wraps a user error, unwrapping it again if it is already a `RegistryError`
    /// (e.g. a dependency lookup that failed inside a factory).
    pub fn from_boxed(error: BoxError) -> Self {
        match error.downcast::<RegistryError>() {
            Ok(registry_error) => *registry_error,
            Err(other) => RegistryError::Configuration(other),
        }
    }
}

fn join_ids(ids: &[ComponentId]) -> String {
    ids.iter()
        .map(ComponentId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_chain(chain: &[ComponentId]) -> String {
    chain
        .iter()
        .map(ComponentId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("encoder exploded")]
    struct Exploded;

    #[test]
    fn test_configuration_error_keeps_user_message() {
        let error = RegistryError::from_boxed(Box::new(Exploded));
        assert!(matches!(error, RegistryError::Configuration(_)));
        assert_eq!(error.to_string(), "encoder exploded");
    }

    #[test]
    fn test_boxed_registry_error_is_unwrapped() {
        let scope = ScopeName::new("billing").unwrap();
        let inner = RegistryError::MissingDependency {
            scope,
            type_name: "Options",
        };
        let error = RegistryError::from_boxed(Box::new(inner));
        assert!(matches!(error, RegistryError::MissingDependency { .. }));
    }

    #[test]
    fn test_ambiguous_message_lists_ids() {
        let error = RegistryError::AmbiguousComponent {
            scope: ScopeName::new("svc-a").unwrap(),
            type_name: "dyn Encoder",
            ids: vec!["json".into(), "xml".into()],
        };
        assert_eq!(
            error.to_string(),
            "Expected a single component of type dyn Encoder in scope 'svc-a' but found 2: json, xml"
        );
    }
}
