//! # Configurations
//!
//! A [`Configuration`] is a unit of wiring: when a scope is built, each
//! configuration applied to it declares component definitions. The registry
//! applies them in layers:
//!
//! 1. the default configurations of the [`ScopeDefinition`] (every scope),
//! 2. every [`Specification`] whose name starts with [`DEFAULT_PREFIX`] (every scope),
//! 3. the [`Specification`] registered under the scope's own name.
//!
//! Later layers augment earlier ones, and a definition with an id that is
//! already taken replaces the earlier definition.

use crate::definition::ComponentDefinitions;
use crate::error::BoxError;
use crate::name::ScopeName;
use crate::scope::ScopeProperties;
use std::fmt;
use std::sync::Arc;

/// Specifications whose name starts with this prefix apply to every scope.
pub const DEFAULT_PREFIX: &str = "default.";

/// A unit of wiring that declares component definitions for a scope.
///
/// Implement it on a type, or wrap a closure with [`from_fn`]:
///
/// ```rust
/// use scope_framework::{configuration, Specification};
/// use std::sync::Arc;
///
/// let spec = Specification::new("billing").with(configuration::from_fn("retries", |defs| {
///     defs.register("retries", |_| Ok(Arc::new(3_u32)));
///     Ok(())
/// }));
/// assert_eq!(spec.configurations()[0].name(), "retries");
/// ```
pub trait Configuration: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    /// Declares this configuration's components.
    fn configure(&self, definitions: &mut ComponentDefinitions) -> Result<(), BoxError>;
}

/// A [`Configuration`] backed by a closure. See [`from_fn`].
pub struct FnConfiguration<F> {
    name: &'static str,
    configure: F,
}

/// Wraps a closure as a named [`Configuration`].
pub fn from_fn<F>(name: &'static str, configure: F) -> FnConfiguration<F>
where
    F: Fn(&mut ComponentDefinitions) -> Result<(), BoxError> + Send + Sync + 'static,
{
    FnConfiguration { name, configure }
}

impl<F> Configuration for FnConfiguration<F>
where
    F: Fn(&mut ComponentDefinitions) -> Result<(), BoxError> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        self.name
    }

    fn configure(&self, definitions: &mut ComponentDefinitions) -> Result<(), BoxError> {
        (self.configure)(definitions)
    }
}

/// Override configuration registered for one scope name.
#[derive(Clone)]
pub struct Specification {
    name: String,
    configurations: Vec<Arc<dyn Configuration>>,
}

impl Specification {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            configurations: Vec::new(),
        }
    }

    pub fn with(mut self, configuration: impl Configuration) -> Self {
        self.configurations.push(Arc::new(configuration));
        self
    }

    pub fn with_shared(mut self, configuration: Arc<dyn Configuration>) -> Self {
        self.configurations.push(configuration);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn configurations(&self) -> &[Arc<dyn Configuration>] {
        &self.configurations
    }

    /// Whether this specification applies to every scope.
    pub fn is_default(&self) -> bool {
        self.name.starts_with(DEFAULT_PREFIX)
    }
}

impl fmt::Debug for Specification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Specification")
            .field("name", &self.name)
            .field(
                "configurations",
                &self
                    .configurations
                    .iter()
                    .map(|c| c.name())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Immutable description shared by every scope of a registry: the default
/// configurations and the two naming conventions for the scope environment.
#[derive(Clone)]
pub struct ScopeDefinition {
    default_configurations: Vec<Arc<dyn Configuration>>,
    property_source_name: String,
    property_name: String,
}

impl ScopeDefinition {
    /// `property_source_name` names the property source published to each
    /// scope; `property_name` is the key under which the scope name appears.
    pub fn new(property_source_name: impl Into<String>, property_name: impl Into<String>) -> Self {
        Self {
            default_configurations: Vec::new(),
            property_source_name: property_source_name.into(),
            property_name: property_name.into(),
        }
    }

    pub fn with_default(mut self, configuration: impl Configuration) -> Self {
        self.default_configurations.push(Arc::new(configuration));
        self
    }

    pub fn with_shared_default(mut self, configuration: Arc<dyn Configuration>) -> Self {
        self.default_configurations.push(configuration);
        self
    }

    pub fn default_configurations(&self) -> &[Arc<dyn Configuration>] {
        &self.default_configurations
    }

    pub fn property_source_name(&self) -> &str {
        &self.property_source_name
    }

    pub fn property_name(&self) -> &str {
        &self.property_name
    }

    /// The environment published to the scope called `name`.
    pub fn properties_for(&self, name: &ScopeName) -> ScopeProperties {
        ScopeProperties::new(self.property_source_name.as_str())
            .with(self.property_name.as_str(), name.as_str())
    }
}

impl fmt::Debug for ScopeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeDefinition")
            .field(
                "default_configurations",
                &self
                    .default_configurations
                    .iter()
                    .map(|c| c.name())
                    .collect::<Vec<_>>(),
            )
            .field("property_source_name", &self.property_source_name)
            .field("property_name", &self.property_name)
            .finish()
    }
}
