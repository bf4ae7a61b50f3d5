//! # Component Scopes
//!
//! A [`ComponentScope`] is the isolated container built for one scope name. It
//! owns every component instance it holds: two scopes built from the same
//! configuration still hold two separate sets of instances.
//!
//! Scopes are immutable once built. Lookups only read, so a scope can be
//! shared behind an `Arc` and queried from any thread without locking.
//!
//! ## Type-based lookup
//!
//! Each [`Component`] records the types it was *exposed as* when it was
//! registered (its primary type plus any extra exposures). A type-based lookup
//! for `T` matches exactly the components exposed as `T`; there is no runtime
//! reflection over the instance itself. `T` is usually a trait object:
//!
//! ```rust
//! use scope_framework::{Component, ComponentScope, ScopeName, ScopeProperties};
//! use std::sync::Arc;
//!
//! trait Encoder: Send + Sync {}
//! struct JsonEncoder;
//! impl Encoder for JsonEncoder {}
//!
//! let name = ScopeName::new("billing").unwrap();
//! let scope = ComponentScope::new(
//!     name,
//!     ScopeProperties::new("clients"),
//!     vec![Component::new("encoder", Arc::new(JsonEncoder) as Arc<dyn Encoder>)],
//! );
//!
//! assert!(scope.get_exclusive::<dyn Encoder>().unwrap().is_some());
//! assert!(scope.get_exclusive::<String>().unwrap().is_none());
//! ```

use crate::error::RegistryError;
use crate::name::{ComponentId, ScopeName};
use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Type-erased `Arc<T>` for some `T: ?Sized`.
pub(crate) type Handle = Box<dyn Any + Send + Sync>;

/// Hook run against a component's primary handle when its scope closes.
pub(crate) type CloseHook = Box<dyn Fn(&(dyn Any + Send + Sync)) + Send + Sync>;

/// The environment published to one scope: a named property source holding
/// string key/value pairs. The registry always publishes the scope name under
/// the configured property name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeProperties {
    source_name: String,
    values: BTreeMap<String, String>,
}

impl ScopeProperties {
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

pub(crate) struct Exposure {
    type_id: TypeId,
    type_name: &'static str,
    handle: Handle,
}

impl Exposure {
    pub(crate) fn new<T: ?Sized + Send + Sync + 'static>(instance: Arc<T>) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            handle: Box::new(instance),
        }
    }

    pub(crate) fn from_handle(type_id: TypeId, type_name: &'static str, handle: Handle) -> Self {
        Self {
            type_id,
            type_name,
            handle,
        }
    }
}

/// One instantiated component, owned by exactly one scope.
pub struct Component {
    id: ComponentId,
    exposures: Vec<Exposure>,
    close_hook: Option<CloseHook>,
}

impl Component {
    /// Creates a component exposed as `T`.
    pub fn new<T: ?Sized + Send + Sync + 'static>(
        id: impl Into<ComponentId>,
        instance: Arc<T>,
    ) -> Self {
        Self {
            id: id.into(),
            exposures: vec![Exposure::new(instance)],
            close_hook: None,
        }
    }

    /// Additionally exposes the component as `U`.
    pub fn with_exposure<U: ?Sized + Send + Sync + 'static>(mut self, instance: Arc<U>) -> Self {
        self.exposures.push(Exposure::new(instance));
        self
    }

    /// Runs `hook` with the primary instance when the owning scope closes.
    /// The hook is ignored if `T` is not the primary type.
    pub fn with_close_hook<T: ?Sized + Send + Sync + 'static>(
        mut self,
        hook: impl Fn(&T) + Send + Sync + 'static,
    ) -> Self {
        self.close_hook = Some(close_hook_for(hook));
        self
    }

    pub(crate) fn from_parts(
        id: ComponentId,
        exposures: Vec<Exposure>,
        close_hook: Option<CloseHook>,
    ) -> Self {
        Self {
            id,
            exposures,
            close_hook,
        }
    }

    pub fn id(&self) -> &ComponentId {
        &self.id
    }

    /// Name of the primary type the component was registered as.
    pub fn type_name(&self) -> &'static str {
        self.exposures
            .first()
            .map(|e| e.type_name)
            .unwrap_or("<empty>")
    }

    /// Whether the component is exposed as `T`.
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        let wanted = TypeId::of::<T>();
        self.exposures.iter().any(|e| e.type_id == wanted)
    }

    /// The instance as `T`, if the component is exposed as `T`.
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        let wanted = TypeId::of::<T>();
        self.exposures
            .iter()
            .find(|e| e.type_id == wanted)
            .and_then(|e| e.handle.downcast_ref::<Arc<T>>())
            .cloned()
    }

    fn close(&self) {
        if let (Some(hook), Some(primary)) = (&self.close_hook, self.exposures.first()) {
            hook(primary.handle.as_ref());
        }
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("id", &self.id)
            .field(
                "types",
                &self.exposures.iter().map(|e| e.type_name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

pub(crate) fn close_hook_for<T: ?Sized + Send + Sync + 'static>(
    hook: impl Fn(&T) + Send + Sync + 'static,
) -> CloseHook {
    Box::new(move |handle: &(dyn Any + Send + Sync)| {
        if let Some(instance) = handle.downcast_ref::<Arc<T>>() {
            hook(instance);
        }
    })
}

/// The isolated container of components for one scope name.
pub struct ComponentScope {
    name: ScopeName,
    properties: ScopeProperties,
    components: Vec<Component>,
    index: HashMap<ComponentId, usize>,
    closed: AtomicBool,
}

impl ComponentScope {
    /// Creates a scope from already-instantiated components, kept in the given
    /// order. When two components share an id the later one wins.
    pub fn new(name: ScopeName, properties: ScopeProperties, components: Vec<Component>) -> Self {
        let mut deduped: Vec<Component> = Vec::with_capacity(components.len());
        for component in components {
            if let Some(pos) = deduped.iter().position(|c| c.id == component.id) {
                debug!(scope = %name, id = %component.id, "Replacing component with duplicate id");
                deduped.remove(pos);
            }
            deduped.push(component);
        }
        let index = deduped
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.clone(), i))
            .collect();
        Self {
            name,
            properties,
            components: deduped,
            index,
            closed: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &ScopeName {
        &self.name
    }

    pub fn properties(&self) -> &ScopeProperties {
        &self.properties
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Component ids in instantiation order.
    pub fn ids(&self) -> impl Iterator<Item = &ComponentId> {
        self.components.iter().map(Component::id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn component(&self, id: &str) -> Option<&Component> {
        self.index.get(id).map(|&i| &self.components[i])
    }

    /// The single component exposed as `T`.
    ///
    /// Zero matches is `Ok(None)`; more than one is
    /// [`RegistryError::AmbiguousComponent`], never a silent pick.
    pub fn get_exclusive<T: ?Sized + Send + Sync + 'static>(
        &self,
    ) -> Result<Option<Arc<T>>, RegistryError> {
        let mut matches = self.components.iter().filter(|c| c.is::<T>());
        let first = match matches.next() {
            Some(first) => first,
            None => return Ok(None),
        };
        if matches.next().is_some() {
            return Err(RegistryError::AmbiguousComponent {
                scope: self.name.clone(),
                type_name: std::any::type_name::<T>(),
                ids: self
                    .components
                    .iter()
                    .filter(|c| c.is::<T>())
                    .map(|c| c.id.clone())
                    .collect(),
            });
        }
        Ok(first.get::<T>())
    }

    /// Every component exposed as `T`, keyed by id.
    pub fn get_all<T: ?Sized + Send + Sync + 'static>(&self) -> HashMap<ComponentId, Arc<T>> {
        self.components
            .iter()
            .filter_map(|c| c.get::<T>().map(|instance| (c.id.clone(), instance)))
            .collect()
    }

    /// The component registered under `id`, as `T`.
    pub fn get_by_id<T: ?Sized + Send + Sync + 'static>(
        &self,
        id: &str,
    ) -> Result<Arc<T>, RegistryError> {
        let component = self
            .component(id)
            .ok_or_else(|| RegistryError::NoSuchComponent {
                scope: self.name.clone(),
                id: id.into(),
            })?;
        component.get::<T>().ok_or_else(|| RegistryError::TypeMismatch {
            scope: self.name.clone(),
            id: component.id.clone(),
            expected: std::any::type_name::<T>(),
            actual: component.type_name(),
        })
    }

    /// Runs every close hook once, in reverse instantiation order.
    /// Subsequent calls do nothing.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        for component in self.components.iter().rev() {
            debug!(scope = %self.name, id = %component.id, "Closing component");
            component.close();
        }
        info!(scope = %self.name, size = self.components.len(), "Scope closed");
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for ComponentScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentScope")
            .field("name", &self.name)
            .field("components", &self.components)
            .field("closed", &self.is_closed())
            .finish()
    }
}
