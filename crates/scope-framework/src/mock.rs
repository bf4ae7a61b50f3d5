//! # Mock Scope Builder & Testing Guide
//!
//! `MockScopeBuilder` implements [`ScopeBuilder`] but lets a test decide, per
//! scope name, whether a build succeeds, fails or stalls. Successful builds are
//! delegated to [`DefinitionScopeBuilder`], so components still come from the
//! registry's real configurations.
//!
//! ## When to use the Mock vs the Default Builder
//!
//! | Feature | MockScopeBuilder | DefinitionScopeBuilder |
//! |---------|------------------|------------------------|
//! | **Build count** | Recorded per name | Not recorded |
//! | **Error Injection** | Easy (`return_err`) | Needs a failing configuration |
//! | **Slow builds** | `return_ok_after` | Needs a sleeping factory |
//! | **Strictness** | Panics on unexpected builds | Builds anything |
//! | **Use Case** | Registry behaviour (caching, retry, races) | Wiring behaviour |
//!
//! ## Testing Strategies
//!
//! <details>
//! <summary><b>Pattern 1: Exactly-once creation</b></summary>
//!
//! ```rust
//! use scope_framework::mock::MockScopeBuilder;
//! use scope_framework::{NamedScopeRegistry, ScopeDefinition};
//!
//! let mock = MockScopeBuilder::new();
//! mock.expect_build("billing").return_ok();
//!
//! let registry = NamedScopeRegistry::builder(ScopeDefinition::new("clients", "clients.client.name"))
//!     .scope_builder(mock.clone())
//!     .build();
//!
//! registry.resolve_scope("billing").unwrap();
//! registry.resolve_scope("billing").unwrap();
//!
//! assert_eq!(mock.build_count("billing"), 1);
//! mock.verify();
//! ```
//! </details>
//!
//! <details>
//! <summary><b>Pattern 2: Failed creation is retried</b></summary>
//!
//! ```rust
//! use scope_framework::mock::MockScopeBuilder;
//! use scope_framework::{NamedScopeRegistry, RegistryError, ScopeDefinition};
//!
//! let mock = MockScopeBuilder::new();
//! mock.expect_build("billing")
//!     .return_err(RegistryError::Configuration("connection refused".into()));
//! mock.expect_build("billing").return_ok();
//!
//! let registry = NamedScopeRegistry::builder(ScopeDefinition::new("clients", "clients.client.name"))
//!     .scope_builder(mock.clone())
//!     .build();
//!
//! assert!(registry.resolve_scope("billing").is_err());
//! assert!(registry.resolve_scope("billing").is_ok());
//! mock.verify();
//! ```
//! </details>
//!
//! <details>
//! <summary><b>Pattern 3: Concurrent first resolution</b></summary>
//!
//! Use `return_ok_after` to hold the first build open long enough for other
//! threads to pile up behind it. See `test_concurrent_first_resolution_builds_once`
//! in `tests/integration_test.rs`.
//! </details>

use crate::builder::{DefinitionScopeBuilder, ScopeBuilder};
use crate::configuration::Configuration;
use crate::error::RegistryError;
use crate::name::ScopeName;
use crate::scope::{ComponentScope, ScopeProperties};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

enum Outcome {
    Ok { delay: Option<Duration> },
    Err(RegistryError),
}

struct Expectation {
    name: String,
    outcome: Outcome,
}

#[derive(Default)]
struct Inner {
    expectations: Mutex<VecDeque<Expectation>>,
    builds: Mutex<HashMap<String, usize>>,
}

/// A [`ScopeBuilder`] with expectation tracking for fluent testing.
///
/// Expectations are consumed in the order they were set. A build for a name
/// with no pending expectation panics.
#[derive(Clone, Default)]
pub struct MockScopeBuilder {
    inner: Arc<Inner>,
}

impl MockScopeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects one build of the scope called `name`.
    pub fn expect_build(&self, name: &str) -> BuildExpectationBuilder {
        BuildExpectationBuilder {
            name: name.to_string(),
            inner: self.inner.clone(),
        }
    }

    /// Number of builds attempted for `name`, successful or not.
    pub fn build_count(&self, name: &str) -> usize {
        let builds = self.inner.builds.lock().unwrap();
        builds.get(name).copied().unwrap_or(0)
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let exps = self.inner.expectations.lock().unwrap();
        if !exps.is_empty() {
            panic!("Not all expectations were met. {} remaining", exps.len());
        }
    }

    fn take(&self, name: &ScopeName) -> Expectation {
        let mut exps = self.inner.expectations.lock().unwrap();
        let position = exps.iter().position(|e| e.name == name.as_str());
        match position.and_then(|i| exps.remove(i)) {
            Some(expectation) => expectation,
            None => panic!("Unexpected build of scope '{}'", name),
        }
    }
}

impl ScopeBuilder for MockScopeBuilder {
    fn build(
        &self,
        name: &ScopeName,
        configurations: &[Arc<dyn Configuration>],
        properties: ScopeProperties,
    ) -> Result<ComponentScope, RegistryError> {
        *self
            .inner
            .builds
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_default() += 1;

        match self.take(name).outcome {
            Outcome::Ok { delay } => {
                if let Some(delay) = delay {
                    std::thread::sleep(delay);
                }
                DefinitionScopeBuilder.build(name, configurations, properties)
            }
            Outcome::Err(error) => Err(error),
        }
    }
}

/// Builder for `build` expectations.
pub struct BuildExpectationBuilder {
    name: String,
    inner: Arc<Inner>,
}

impl BuildExpectationBuilder {
    /// The build succeeds with the real configurations.
    pub fn return_ok(self) {
        self.push(Outcome::Ok { delay: None });
    }

    /// The build blocks for `delay`, then succeeds.
    pub fn return_ok_after(self, delay: Duration) {
        self.push(Outcome::Ok { delay: Some(delay) });
    }

    /// The build fails with `error`.
    pub fn return_err(self, error: RegistryError) {
        self.push(Outcome::Err(error));
    }

    fn push(self, outcome: Outcome) {
        let mut exps = self.inner.expectations.lock().unwrap();
        exps.push_back(Expectation {
            name: self.name,
            outcome,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "Unexpected build of scope 'orders'")]
    fn test_unexpected_build_panics() {
        let mock = MockScopeBuilder::new();
        let name = ScopeName::new("orders").unwrap();
        let _ = mock.build(&name, &[], ScopeProperties::new("clients"));
    }

    #[test]
    #[should_panic(expected = "Not all expectations were met. 1 remaining")]
    fn test_verify_reports_leftovers() {
        let mock = MockScopeBuilder::new();
        mock.expect_build("billing").return_ok();
        mock.verify();
    }

    #[test]
    fn test_expectations_matched_by_name() {
        let mock = MockScopeBuilder::new();
        mock.expect_build("billing").return_ok();
        mock.expect_build("orders")
            .return_err(RegistryError::InvalidScopeName("orders".into()));

        let orders = ScopeName::new("orders").unwrap();
        let billing = ScopeName::new("billing").unwrap();
        assert!(mock.build(&orders, &[], ScopeProperties::new("clients")).is_err());
        assert!(mock.build(&billing, &[], ScopeProperties::new("clients")).is_ok());

        assert_eq!(mock.build_count("orders"), 1);
        assert_eq!(mock.build_count("inventory"), 0);
        mock.verify();
    }
}
