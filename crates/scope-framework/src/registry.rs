//! # Named Scope Registry
//!
//! The [`NamedScopeRegistry`] maps scope names to lazily built
//! [`ComponentScope`]s. It is the one piece of shared mutable state in the
//! framework, and it is only ever mutated through the create-if-absent path.
//!
//! ## Resolution
//!
//! Each name owns a slot (`Arc<OnceCell<_>>`) in a concurrent map. The first
//! caller for a name initialises the slot; concurrent callers for the same
//! name block on that single initialisation and then share its result. If the
//! initialisation fails, the slot stays empty and the next caller retries from
//! scratch, so a failed build is never cached.
//!
//! ```text
//! resolve_scope("billing")
//!   └─ scopes.entry("billing").or_default()      slot for the name
//!        └─ slot.get_or_try_init(create_scope)   at most one successful build
//!             ├─ ScopeDefinition defaults
//!             ├─ "default.*" specifications
//!             ├─ "billing" specification
//!             └─ ScopeBuilder::build(...)        refresh
//! ```
//!
//! ## Lifecycle
//!
//! Scopes live until [`NamedScopeRegistry::close`] is called, which closes
//! every scope and empties the registry. Lookup traffic is expected to have
//! stopped by then.

use crate::builder::{DefinitionScopeBuilder, ScopeBuilder};
use crate::configuration::{Configuration, ScopeDefinition, Specification};
use crate::error::RegistryError;
use crate::name::{ComponentId, ScopeName};
use crate::scope::ComponentScope;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

type Slot = Arc<OnceCell<Arc<ComponentScope>>>;

/// Lazily creates and caches one isolated [`ComponentScope`] per name.
///
/// # Example
///
/// ```rust
/// use scope_framework::{configuration, NamedScopeRegistry, ScopeDefinition, Specification};
/// use std::sync::Arc;
///
/// trait Encoder: Send + Sync { fn format(&self) -> &'static str; }
/// struct JsonEncoder;
/// impl Encoder for JsonEncoder { fn format(&self) -> &'static str { "json" } }
/// struct XmlEncoder;
/// impl Encoder for XmlEncoder { fn format(&self) -> &'static str { "xml" } }
///
/// let definition = ScopeDefinition::new("clients", "clients.client.name").with_default(
///     configuration::from_fn("defaults", |defs| {
///         defs.register_if_missing("encoder", |_| Ok(Arc::new(JsonEncoder) as Arc<dyn Encoder>));
///         Ok(())
///     }),
/// );
///
/// let registry = NamedScopeRegistry::builder(definition)
///     .specification(Specification::new("billing").with(configuration::from_fn("xml", |defs| {
///         defs.register("encoder", |_| Ok(Arc::new(XmlEncoder) as Arc<dyn Encoder>));
///         Ok(())
///     })))
///     .build();
///
/// let billing = registry.lookup_exclusive::<dyn Encoder>("billing").unwrap().unwrap();
/// let orders = registry.lookup_exclusive::<dyn Encoder>("orders").unwrap().unwrap();
/// assert_eq!(billing.format(), "xml");
/// assert_eq!(orders.format(), "json");
/// ```
pub struct NamedScopeRegistry {
    definition: Arc<ScopeDefinition>,
    specifications: HashMap<String, Specification>,
    builder: Arc<dyn ScopeBuilder>,
    parent: Option<Arc<ComponentScope>>,
    scopes: DashMap<ScopeName, Slot>,
}

/// Assembles a [`NamedScopeRegistry`].
pub struct RegistryBuilder {
    definition: ScopeDefinition,
    specifications: HashMap<String, Specification>,
    builder: Arc<dyn ScopeBuilder>,
    parent: Option<Arc<ComponentScope>>,
}

impl RegistryBuilder {
    /// Registers override configuration. A second specification for the same
    /// name replaces the first.
    pub fn specification(mut self, specification: Specification) -> Self {
        self.specifications
            .insert(specification.name().to_string(), specification);
        self
    }

    pub fn specifications(self, specifications: impl IntoIterator<Item = Specification>) -> Self {
        specifications
            .into_iter()
            .fold(self, |builder, spec| builder.specification(spec))
    }

    /// Replaces the default [`DefinitionScopeBuilder`].
    pub fn scope_builder(mut self, builder: impl ScopeBuilder + 'static) -> Self {
        self.builder = Arc::new(builder);
        self
    }

    /// Shared scope consulted by [`NamedScopeRegistry::lookup`] when a named
    /// scope has no match. Never consulted by the `*_exclusive` lookups.
    pub fn parent(mut self, parent: Arc<ComponentScope>) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn build(self) -> NamedScopeRegistry {
        NamedScopeRegistry {
            definition: Arc::new(self.definition),
            specifications: self.specifications,
            builder: self.builder,
            parent: self.parent,
            scopes: DashMap::new(),
        }
    }
}

impl NamedScopeRegistry {
    pub fn builder(definition: ScopeDefinition) -> RegistryBuilder {
        RegistryBuilder {
            definition,
            specifications: HashMap::new(),
            builder: Arc::new(DefinitionScopeBuilder),
            parent: None,
        }
    }

    /// A registry with no specifications and the default builder.
    pub fn new(definition: ScopeDefinition) -> Self {
        Self::builder(definition).build()
    }

    pub fn definition(&self) -> &ScopeDefinition {
        &self.definition
    }

    pub fn specification(&self, name: &str) -> Option<&Specification> {
        self.specifications.get(name)
    }

    pub fn parent(&self) -> Option<&Arc<ComponentScope>> {
        self.parent.as_ref()
    }

    /// Returns the scope for `name`, building it on first use.
    ///
    /// Concurrent first calls for the same name run exactly one build and all
    /// observe the same scope. A failed build is not cached.
    pub fn resolve_scope(&self, name: &str) -> Result<Arc<ComponentScope>, RegistryError> {
        let name = ScopeName::new(name)?;

        if let Some(scope) = self.scopes.get(&name).and_then(|slot| slot.get().cloned()) {
            return Ok(scope);
        }

        // The map guard is dropped at the end of this statement, so a build
        // never runs while a shard of the map is locked.
        let slot: Slot = self.scopes.entry(name.clone()).or_default().clone();
        slot.get_or_try_init(|| self.create_scope(&name)).cloned()
    }

    /// The single component of the scope exposed as `T`, with no fallback to
    /// the parent scope. Zero matches is `Ok(None)`.
    pub fn lookup_exclusive<T: ?Sized + Send + Sync + 'static>(
        &self,
        name: &str,
    ) -> Result<Option<Arc<T>>, RegistryError> {
        let scope = self.resolve_scope(name)?;
        let found = scope.get_exclusive::<T>()?;
        debug!(
            scope = %scope.name(),
            type_name = std::any::type_name::<T>(),
            found = found.is_some(),
            "Lookup"
        );
        Ok(found)
    }

    /// Every component of the scope exposed as `T`, keyed by id.
    pub fn lookup_all_exclusive<T: ?Sized + Send + Sync + 'static>(
        &self,
        name: &str,
    ) -> Result<HashMap<ComponentId, Arc<T>>, RegistryError> {
        let scope = self.resolve_scope(name)?;
        let found = scope.get_all::<T>();
        debug!(
            scope = %scope.name(),
            type_name = std::any::type_name::<T>(),
            size = found.len(),
            "Lookup all"
        );
        Ok(found)
    }

    /// The component registered under `id` in the scope, as `T`.
    pub fn lookup_by_id<T: ?Sized + Send + Sync + 'static>(
        &self,
        name: &str,
        id: &str,
    ) -> Result<Arc<T>, RegistryError> {
        let scope = self.resolve_scope(name)?;
        let found = scope.get_by_id::<T>(id);
        if let Err(e) = &found {
            debug!(scope = %scope.name(), id, error = %e, "Lookup by id failed");
        }
        found
    }

    /// Like [`lookup_exclusive`](Self::lookup_exclusive), but falls back to the
    /// parent scope when the named scope has no match. An ambiguous match in
    /// the named scope is still an error.
    pub fn lookup<T: ?Sized + Send + Sync + 'static>(
        &self,
        name: &str,
    ) -> Result<Option<Arc<T>>, RegistryError> {
        if let Some(found) = self.lookup_exclusive::<T>(name)? {
            return Ok(Some(found));
        }
        match &self.parent {
            Some(parent) => parent.get_exclusive::<T>(),
            None => Ok(None),
        }
    }

    /// Names of every scope built so far, sorted.
    pub fn scope_names(&self) -> Vec<ScopeName> {
        let mut names: Vec<ScopeName> = self
            .scopes
            .iter()
            .filter(|entry| entry.value().get().is_some())
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    /// Whether the scope for `name` has been built. Never builds it.
    pub fn contains_scope(&self, name: &str) -> bool {
        self.scopes
            .get(name)
            .map(|slot| slot.get().is_some())
            .unwrap_or(false)
    }

    /// Closes every scope and empties the registry.
    ///
    /// Must only be called once lookup traffic has stopped. The registry stays
    /// usable: a later lookup builds a fresh scope.
    pub fn close(&self) {
        let names: Vec<ScopeName> = self.scopes.iter().map(|e| e.key().clone()).collect();
        let mut closed = 0;
        for name in names {
            if let Some((_, slot)) = self.scopes.remove(&name) {
                if let Some(scope) = slot.get() {
                    scope.close();
                    closed += 1;
                }
            }
        }
        info!(closed, "Registry closed");
    }

    fn configurations_for(&self, name: &ScopeName) -> Vec<Arc<dyn Configuration>> {
        let mut defaults: Vec<&Specification> = self
            .specifications
            .values()
            .filter(|spec| spec.is_default())
            .collect();
        defaults.sort_by(|a, b| a.name().cmp(b.name()));

        let named = self
            .specifications
            .get(name.as_str())
            .filter(|spec| !spec.is_default());

        self.definition
            .default_configurations()
            .iter()
            .chain(defaults.into_iter().flat_map(|spec| spec.configurations()))
            .chain(named.into_iter().flat_map(|spec| spec.configurations()))
            .cloned()
            .collect()
    }

    fn create_scope(&self, name: &ScopeName) -> Result<Arc<ComponentScope>, RegistryError> {
        let configurations = self.configurations_for(name);
        let properties = self.definition.properties_for(name);
        info!(scope = %name, configurations = configurations.len(), "Creating scope");

        match self.builder.build(name, &configurations, properties) {
            Ok(scope) => {
                info!(scope = %name, size = scope.len(), "Scope ready");
                Ok(Arc::new(scope))
            }
            Err(e) => {
                warn!(scope = %name, error = %e, "Scope initialisation failed");
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for NamedScopeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedScopeRegistry")
            .field("definition", &self.definition)
            .field("specifications", &self.specifications.keys().collect::<Vec<_>>())
            .field("scopes", &self.scope_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::from_fn;
    use crate::scope::ScopeProperties;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_definition(builds: Arc<AtomicUsize>) -> ScopeDefinition {
        ScopeDefinition::new("clients", "clients.client.name").with_default(from_fn(
            "defaults",
            move |defs| {
                let builds = builds.clone();
                defs.register("buildNumber", move |_| {
                    Ok(Arc::new(builds.fetch_add(1, Ordering::SeqCst)))
                });
                Ok(())
            },
        ))
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let registry = NamedScopeRegistry::new(counting_definition(Arc::default()));
        let first = registry.resolve_scope("svc-a").unwrap();
        let second = registry.resolve_scope("svc-a").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_distinct_names_get_distinct_instances() {
        let registry = NamedScopeRegistry::new(counting_definition(Arc::default()));
        let a = registry.lookup_by_id::<usize>("svc-a", "buildNumber").unwrap();
        let b = registry.lookup_by_id::<usize>("svc-b", "buildNumber").unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_ne!(*a, *b);
    }

    #[test]
    fn test_empty_name_rejected_before_any_work() {
        let builds = Arc::new(AtomicUsize::new(0));
        let registry = NamedScopeRegistry::new(counting_definition(builds.clone()));
        assert!(matches!(
            registry.resolve_scope(""),
            Err(RegistryError::InvalidScopeName(_))
        ));
        assert_eq!(builds.load(Ordering::SeqCst), 0);
        assert!(registry.scope_names().is_empty());
    }

    #[test]
    fn test_default_specifications_apply_before_named() {
        let definition = ScopeDefinition::new("clients", "clients.client.name");
        let registry = NamedScopeRegistry::builder(definition)
            .specification(Specification::new("default.timeouts").with(from_fn("shared", |defs| {
                defs.register("timeout", |_| Ok(Arc::new(10_u64)));
                Ok(())
            })))
            .specification(Specification::new("billing").with(from_fn("billing", |defs| {
                defs.register("timeout", |_| Ok(Arc::new(60_u64)));
                Ok(())
            })))
            .build();

        assert_eq!(*registry.lookup_by_id::<u64>("billing", "timeout").unwrap(), 60);
        assert_eq!(*registry.lookup_by_id::<u64>("orders", "timeout").unwrap(), 10);
    }

    #[test]
    fn test_parent_fallback_only_in_lookup() {
        let parent = ComponentScope::from_configurations(
            ScopeName::new("parent").unwrap(),
            ScopeProperties::new("parent"),
            &[Arc::new(from_fn("shared", |defs| {
                defs.register("region", |_| Ok(Arc::new("eu-west-1".to_string())));
                Ok(())
            }))],
        )
        .unwrap();

        let registry = NamedScopeRegistry::builder(ScopeDefinition::new("clients", "name"))
            .parent(Arc::new(parent))
            .build();

        assert!(registry.lookup_exclusive::<String>("svc-a").unwrap().is_none());
        assert_eq!(
            registry.lookup::<String>("svc-a").unwrap().as_deref().map(String::as_str),
            Some("eu-west-1")
        );
    }

    #[test]
    fn test_close_empties_registry_and_allows_rebuild() {
        let registry = NamedScopeRegistry::new(counting_definition(Arc::default()));
        let before = registry.resolve_scope("svc-a").unwrap();
        registry.resolve_scope("svc-b").unwrap();
        assert_eq!(registry.scope_names().len(), 2);

        registry.close();

        assert!(before.is_closed());
        assert!(!registry.contains_scope("svc-a"));
        let after = registry.resolve_scope("svc-a").unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
    }
}
