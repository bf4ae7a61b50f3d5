//! # Scope Builders
//!
//! The registry never builds scopes itself. It hands the ordered list of
//! configurations for a name to a [`ScopeBuilder`], so any wiring mechanism
//! (explicit constructors, a service locator, a generated container) can sit
//! behind it. [`DefinitionScopeBuilder`] is the one shipped here.

use crate::configuration::Configuration;
use crate::definition::{into_components, ComponentDefinitions, ScopeResolver};
use crate::error::RegistryError;
use crate::name::ScopeName;
use crate::scope::{ComponentScope, ScopeProperties};
use std::sync::Arc;
use tracing::debug;

/// Builds a fully initialised [`ComponentScope`] from configurations.
pub trait ScopeBuilder: Send + Sync {
    fn build(
        &self,
        name: &ScopeName,
        configurations: &[Arc<dyn Configuration>],
        properties: ScopeProperties,
    ) -> Result<ComponentScope, RegistryError>;
}

/// Builds scopes by collecting [`ComponentDefinitions`] from every
/// configuration, then instantiating the definitions that survive.
///
/// 1. Configurations run in order; each declares definitions.
/// 2. Fallback definitions that lost to a regular one are dropped.
/// 3. Components are instantiated in declaration order, dependencies first.
///
/// Any failure aborts the whole build: no half-built scope is returned.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefinitionScopeBuilder;

impl ScopeBuilder for DefinitionScopeBuilder {
    fn build(
        &self,
        name: &ScopeName,
        configurations: &[Arc<dyn Configuration>],
        properties: ScopeProperties,
    ) -> Result<ComponentScope, RegistryError> {
        let mut definitions = ComponentDefinitions::new(name.clone(), properties);
        for configuration in configurations {
            debug!(scope = %name, configuration = configuration.name(), "Applying configuration");
            definitions.set_source(configuration.name());
            configuration
                .configure(&mut definitions)
                .map_err(RegistryError::from_boxed)?;
        }

        let (name, properties, definitions) = definitions.finish();
        let instances = ScopeResolver::new(&name, &properties, &definitions).instantiate_all()?;
        let components = into_components(definitions, instances);

        Ok(ComponentScope::new(name, properties, components))
    }
}

impl ComponentScope {
    /// Builds a standalone scope (e.g. a parent scope shared by a registry)
    /// with the [`DefinitionScopeBuilder`].
    pub fn from_configurations(
        name: ScopeName,
        properties: ScopeProperties,
        configurations: &[Arc<dyn Configuration>],
    ) -> Result<Self, RegistryError> {
        DefinitionScopeBuilder.build(&name, configurations, properties)
    }
}
