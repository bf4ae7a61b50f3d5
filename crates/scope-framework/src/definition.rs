//! # Component Definitions
//!
//! Configurations do not build components directly. They *declare* them on a
//! [`ComponentDefinitions`] collector: an id, the type the component is
//! exposed as, and a factory. Only once every configuration of a scope has
//! been applied does the builder instantiate the surviving definitions.
//!
//! Two kinds of definitions exist:
//!
//! - **Regular** ([`ComponentDefinitions::register`]): always instantiated.
//!   Registering an id that is already taken replaces the earlier definition,
//!   which is how a name-specific configuration overrides a default one.
//! - **Fallback** ([`ComponentDefinitions::register_if_missing`]): instantiated
//!   only if no regular definition exposes the same type. Of several fallbacks
//!   for one type, the first one declared wins.
//!
//! Factories receive a [`ScopeResolver`], through which they can read the
//! scope's properties and pull other components of the same scope. Those are
//! instantiated on demand; a dependency cycle fails with
//! [`RegistryError::CircularDependency`].

use crate::error::{BoxError, RegistryError};
use crate::name::{ComponentId, ScopeName};
use crate::scope::{close_hook_for, CloseHook, Component, Exposure, Handle, ScopeProperties};
use std::any::TypeId;
use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

type Factory = Box<dyn Fn(&mut ScopeResolver<'_>) -> Result<Handle, BoxError> + Send + Sync>;
type Cast = Box<dyn Fn(&Handle) -> Option<Handle> + Send + Sync>;

struct ExtraExposure {
    type_id: TypeId,
    type_name: &'static str,
    cast: Cast,
}

/// A declared, not yet instantiated, component.
pub(crate) struct Definition {
    id: ComponentId,
    type_id: TypeId,
    type_name: &'static str,
    source: String,
    fallback: bool,
    factory: Factory,
    exposures: Vec<ExtraExposure>,
    close_hook: Option<CloseHook>,
}

impl Definition {
    fn exposes(&self, type_id: TypeId) -> bool {
        self.type_id == type_id || self.exposures.iter().any(|e| e.type_id == type_id)
    }

    fn cast(&self, handle: &Handle, type_id: TypeId) -> Option<Handle> {
        self.exposures
            .iter()
            .find(|e| e.type_id == type_id)
            .and_then(|e| (e.cast)(handle))
    }

    fn into_component(self, primary: Handle) -> Component {
        let mut exposures = Vec::with_capacity(self.exposures.len() + 1);
        for extra in &self.exposures {
            if let Some(handle) = (extra.cast)(&primary) {
                exposures.push(Exposure::from_handle(extra.type_id, extra.type_name, handle));
            }
        }
        exposures.insert(
            0,
            Exposure::from_handle(self.type_id, self.type_name, primary),
        );
        Component::from_parts(self.id, exposures, self.close_hook)
    }
}

/// Collector that configurations declare components on.
pub struct ComponentDefinitions {
    scope: ScopeName,
    properties: ScopeProperties,
    source: String,
    definitions: Vec<Definition>,
}

impl ComponentDefinitions {
    pub(crate) fn new(scope: ScopeName, properties: ScopeProperties) -> Self {
        Self {
            scope,
            properties,
            source: String::new(),
            definitions: Vec::new(),
        }
    }

    /// Name of the scope being built.
    pub fn scope_name(&self) -> &ScopeName {
        &self.scope
    }

    pub fn properties(&self) -> &ScopeProperties {
        &self.properties
    }

    pub fn contains(&self, id: &str) -> bool {
        self.definitions.iter().any(|d| d.id.as_str() == id)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Declares a component exposed as `T`, replacing any earlier definition
    /// with the same id.
    pub fn register<T, F>(&mut self, id: impl Into<ComponentId>, factory: F) -> DefinitionBuilder<'_, T>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&mut ScopeResolver<'_>) -> Result<Arc<T>, BoxError> + Send + Sync + 'static,
    {
        self.push(id.into(), factory, false)
    }

    /// Declares a component exposed as `T` that is only kept when no regular
    /// definition exposes `T`.
    pub fn register_if_missing<T, F>(
        &mut self,
        id: impl Into<ComponentId>,
        factory: F,
    ) -> DefinitionBuilder<'_, T>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&mut ScopeResolver<'_>) -> Result<Arc<T>, BoxError> + Send + Sync + 'static,
    {
        self.push(id.into(), factory, true)
    }

    pub(crate) fn set_source(&mut self, source: &str) {
        self.source = source.to_string();
    }

    fn push<T, F>(&mut self, id: ComponentId, factory: F, fallback: bool) -> DefinitionBuilder<'_, T>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&mut ScopeResolver<'_>) -> Result<Arc<T>, BoxError> + Send + Sync + 'static,
    {
        let definition = Definition {
            id: id.clone(),
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            source: self.source.clone(),
            fallback,
            factory: Box::new(move |resolver| {
                factory(resolver).map(|instance| Box::new(instance) as Handle)
            }),
            exposures: Vec::new(),
            close_hook: None,
        };

        let index = match self.definitions.iter().position(|d| d.id == id) {
            Some(existing) => {
                debug!(
                    scope = %self.scope,
                    %id,
                    replaced = %self.definitions[existing].source,
                    by = %self.source,
                    "Overriding component definition"
                );
                self.definitions[existing] = definition;
                existing
            }
            None => {
                self.definitions.push(definition);
                self.definitions.len() - 1
            }
        };

        DefinitionBuilder {
            definition: &mut self.definitions[index],
            _marker: PhantomData,
        }
    }

    /// Drops fallbacks that lost to a regular definition (or to an earlier
    /// fallback of the same type) and hands back what is left.
    pub(crate) fn finish(self) -> (ScopeName, ScopeProperties, Vec<Definition>) {
        let regular_types: HashSet<TypeId> = self
            .definitions
            .iter()
            .filter(|d| !d.fallback)
            .flat_map(|d| std::iter::once(d.type_id).chain(d.exposures.iter().map(|e| e.type_id)))
            .collect();

        let scope = self.scope;
        let mut kept_fallbacks = HashSet::new();
        let mut definitions = self.definitions;
        definitions.retain(|d| {
            if !d.fallback {
                return true;
            }
            let keep = !regular_types.contains(&d.type_id) && kept_fallbacks.insert(d.type_id);
            if !keep {
                debug!(scope = %scope, id = %d.id, type_name = d.type_name, "Skipping fallback definition");
            }
            keep
        });

        (scope, self.properties, definitions)
    }
}

/// Returned by `register` calls to refine the definition just declared.
pub struct DefinitionBuilder<'a, T: ?Sized> {
    definition: &'a mut Definition,
    _marker: PhantomData<fn(&T)>,
}

impl<T: ?Sized + Send + Sync + 'static> DefinitionBuilder<'_, T> {
    /// Also exposes the component as `U`, so type-based lookups for `U` find it.
    ///
    /// ```rust,ignore
    /// defs.register("encoder", |_| Ok(Arc::new(XmlEncoder)))
    ///     .expose::<dyn Encoder>(|encoder| encoder);
    /// ```
    pub fn expose<U>(self, cast: impl Fn(Arc<T>) -> Arc<U> + Send + Sync + 'static) -> Self
    where
        U: ?Sized + Send + Sync + 'static,
    {
        self.definition.exposures.push(ExtraExposure {
            type_id: TypeId::of::<U>(),
            type_name: std::any::type_name::<U>(),
            cast: Box::new(move |handle: &Handle| {
                handle
                    .downcast_ref::<Arc<T>>()
                    .map(|instance| Box::new(cast(instance.clone())) as Handle)
            }),
        });
        self
    }

    /// Runs `hook` with the instance when the owning scope closes.
    pub fn on_close(self, hook: impl Fn(&T) + Send + Sync + 'static) -> Self {
        self.definition.close_hook = Some(close_hook_for(hook));
        self
    }
}

/// Handed to component factories while a scope is being built.
pub struct ScopeResolver<'d> {
    scope: &'d ScopeName,
    properties: &'d ScopeProperties,
    definitions: &'d [Definition],
    instances: Vec<Option<Handle>>,
    in_progress: Vec<usize>,
}

impl<'d> ScopeResolver<'d> {
    pub(crate) fn new(
        scope: &'d ScopeName,
        properties: &'d ScopeProperties,
        definitions: &'d [Definition],
    ) -> Self {
        Self {
            scope,
            properties,
            definitions,
            instances: definitions.iter().map(|_| None).collect(),
            in_progress: Vec::new(),
        }
    }

    pub fn scope_name(&self) -> &ScopeName {
        self.scope
    }

    pub fn properties(&self) -> &ScopeProperties {
        self.properties
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key)
    }

    /// The single component of this scope exposed as `T`.
    pub fn component<T: ?Sized + Send + Sync + 'static>(&mut self) -> Result<Arc<T>, RegistryError> {
        self.optional::<T>()?
            .ok_or_else(|| RegistryError::MissingDependency {
                scope: self.scope.clone(),
                type_name: std::any::type_name::<T>(),
            })
    }

    /// Like [`component`](Self::component), but `Ok(None)` when nothing matches.
    pub fn optional<T: ?Sized + Send + Sync + 'static>(
        &mut self,
    ) -> Result<Option<Arc<T>>, RegistryError> {
        let type_id = TypeId::of::<T>();
        let matching: Vec<usize> = self
            .definitions
            .iter()
            .enumerate()
            .filter(|(_, d)| d.exposes(type_id))
            .map(|(i, _)| i)
            .collect();

        match matching.as_slice() {
            [] => Ok(None),
            [index] => self.instance::<T>(*index).map(Some),
            _ => Err(RegistryError::AmbiguousComponent {
                scope: self.scope.clone(),
                type_name: std::any::type_name::<T>(),
                ids: matching
                    .iter()
                    .map(|&i| self.definitions[i].id.clone())
                    .collect(),
            }),
        }
    }

    /// The component declared under `id`, as `T`.
    pub fn component_by_id<T: ?Sized + Send + Sync + 'static>(
        &mut self,
        id: &str,
    ) -> Result<Arc<T>, RegistryError> {
        let index = self
            .definitions
            .iter()
            .position(|d| d.id.as_str() == id)
            .ok_or_else(|| RegistryError::NoSuchComponent {
                scope: self.scope.clone(),
                id: id.into(),
            })?;
        self.instance::<T>(index)
    }

    fn instance<T: ?Sized + Send + Sync + 'static>(
        &mut self,
        index: usize,
    ) -> Result<Arc<T>, RegistryError> {
        self.instantiate(index)?;

        let definition = &self.definitions[index];
        let mismatch = || RegistryError::TypeMismatch {
            scope: self.scope.clone(),
            id: definition.id.clone(),
            expected: std::any::type_name::<T>(),
            actual: definition.type_name,
        };
        let primary = self.instances[index].as_ref().ok_or_else(mismatch)?;

        let type_id = TypeId::of::<T>();
        if definition.type_id == type_id {
            return primary.downcast_ref::<Arc<T>>().cloned().ok_or_else(mismatch);
        }
        definition
            .cast(primary, type_id)
            .and_then(|handle| handle.downcast::<Arc<T>>().ok())
            .map(|boxed| *boxed)
            .ok_or_else(mismatch)
    }

    fn instantiate(&mut self, index: usize) -> Result<(), RegistryError> {
        if self.instances[index].is_some() {
            return Ok(());
        }

        let definitions = self.definitions;
        if let Some(start) = self.in_progress.iter().position(|&i| i == index) {
            let chain = self.in_progress[start..]
                .iter()
                .chain(std::iter::once(&index))
                .map(|&i| definitions[i].id.clone())
                .collect();
            return Err(RegistryError::CircularDependency {
                scope: self.scope.clone(),
                chain,
            });
        }

        let definition = &definitions[index];
        self.in_progress.push(index);
        let result = (definition.factory)(self);
        self.in_progress.pop();

        let handle = result.map_err(RegistryError::from_boxed)?;
        debug!(
            scope = %self.scope,
            id = %definition.id,
            type_name = definition.type_name,
            source = %definition.source,
            "Instantiated component"
        );
        self.instances[index] = Some(handle);
        Ok(())
    }

    /// Instantiates every definition, in declaration order.
    pub(crate) fn instantiate_all(mut self) -> Result<Vec<Handle>, RegistryError> {
        for index in 0..self.definitions.len() {
            self.instantiate(index)?;
        }
        // every slot was filled by the loop above
        Ok(self.instances.into_iter().flatten().collect())
    }
}

pub(crate) fn into_components(definitions: Vec<Definition>, instances: Vec<Handle>) -> Vec<Component> {
    definitions
        .into_iter()
        .zip(instances)
        .map(|(definition, primary)| definition.into_component(primary))
        .collect()
}
