//! # Client Context
//!
//! [`ClientContext`] gives every named client its own scope of components. It
//! wraps a [`NamedScopeRegistry`] whose scopes are seeded with
//! [`ClientSettings`](crate::configuration::ClientSettings) and
//! [`ClientsConfiguration`](crate::configuration::ClientsConfiguration), then
//! with any [`Specification`] registered for all clients (`default.*`) or for
//! one client by name.
//!
//! ## Lookup flavours
//!
//! | Method | Searches | Zero matches | Several matches |
//! |--------|----------|--------------|-----------------|
//! | [`instance_without_ancestors`](ClientContext::instance_without_ancestors) | client scope | `Ok(None)` | error |
//! | [`instances_without_ancestors`](ClientContext::instances_without_ancestors) | client scope | empty map | all of them |
//! | [`instance`](ClientContext::instance) | client scope, by id | error | n/a |
//! | [`instance_or_parent`](ClientContext::instance_or_parent) | client scope, then parent | `Ok(None)` | error |

use crate::clients::{
    Decoder, Encoder, ErrorDecoder, LoggerLevel, Options, RequestInterceptor, RequestTemplate,
    Response,
};
use crate::configuration::client_scope_definition;
use crate::error::ClientError;
use crate::properties::{ClientConfig, ClientProperties};
use scope_framework::{
    ComponentId, ComponentScope, NamedScopeRegistry, RegistryBuilder, ScopeBuilder, ScopeName,
    Specification,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// One isolated component scope per client name.
pub struct ClientContext {
    registry: NamedScopeRegistry,
    properties: Arc<ClientProperties>,
}

/// Assembles a [`ClientContext`].
pub struct ClientContextBuilder {
    registry: RegistryBuilder,
    properties: Arc<ClientProperties>,
}

impl ClientContextBuilder {
    /// Registers override configuration for one client, or for every client
    /// when the name starts with `default.`.
    pub fn specification(mut self, specification: Specification) -> Self {
        self.registry = self.registry.specification(specification);
        self
    }

    pub fn specifications(mut self, specifications: impl IntoIterator<Item = Specification>) -> Self {
        self.registry = self.registry.specifications(specifications);
        self
    }

    /// Components shared by all clients, consulted by
    /// [`ClientContext::instance_or_parent`].
    pub fn parent(mut self, parent: Arc<ComponentScope>) -> Self {
        self.registry = self.registry.parent(parent);
        self
    }

    pub fn scope_builder(mut self, builder: impl ScopeBuilder + 'static) -> Self {
        self.registry = self.registry.scope_builder(builder);
        self
    }

    pub fn build(self) -> ClientContext {
        ClientContext {
            registry: self.registry.build(),
            properties: self.properties,
        }
    }
}

impl ClientContext {
    pub fn builder(properties: ClientProperties) -> ClientContextBuilder {
        let properties = Arc::new(properties);
        ClientContextBuilder {
            registry: NamedScopeRegistry::builder(client_scope_definition(properties.clone())),
            properties,
        }
    }

    pub fn new(properties: ClientProperties) -> Self {
        Self::builder(properties).build()
    }

    pub fn properties(&self) -> &ClientProperties {
        &self.properties
    }

    pub fn registry(&self) -> &NamedScopeRegistry {
        &self.registry
    }

    /// The single component of type `T` in the client's own scope.
    pub fn instance_without_ancestors<T: ?Sized + Send + Sync + 'static>(
        &self,
        name: &str,
    ) -> Result<Option<Arc<T>>, ClientError> {
        Ok(self.registry.lookup_exclusive::<T>(name)?)
    }

    /// Every component of type `T` in the client's own scope, keyed by id.
    pub fn instances_without_ancestors<T: ?Sized + Send + Sync + 'static>(
        &self,
        name: &str,
    ) -> Result<HashMap<ComponentId, Arc<T>>, ClientError> {
        Ok(self.registry.lookup_all_exclusive::<T>(name)?)
    }

    /// The component registered under `id` in the client's scope.
    pub fn instance<T: ?Sized + Send + Sync + 'static>(
        &self,
        name: &str,
        id: &str,
    ) -> Result<Arc<T>, ClientError> {
        Ok(self.registry.lookup_by_id::<T>(name, id)?)
    }

    /// Like [`instance_without_ancestors`](Self::instance_without_ancestors),
    /// falling back to the parent scope when the client has none.
    pub fn instance_or_parent<T: ?Sized + Send + Sync + 'static>(
        &self,
        name: &str,
    ) -> Result<Option<Arc<T>>, ClientError> {
        Ok(self.registry.lookup::<T>(name)?)
    }

    /// Names of the clients whose scope has been built.
    pub fn context_names(&self) -> Vec<ScopeName> {
        self.registry.scope_names()
    }

    /// The merged properties of a client. Does not build its scope.
    pub fn client_config(&self, name: &str) -> ClientConfig {
        self.properties.config_for(name)
    }

    /// Closes every client scope.
    pub fn close(&self) {
        self.registry.close();
    }

    pub fn encoder(&self, name: &str) -> Result<Arc<dyn Encoder>, ClientError> {
        self.required::<dyn Encoder>(name, "encoder")
    }

    pub fn decoder(&self, name: &str) -> Result<Arc<dyn Decoder>, ClientError> {
        self.required::<dyn Decoder>(name, "decoder")
    }

    pub fn error_decoder(&self, name: &str) -> Result<Arc<dyn ErrorDecoder>, ClientError> {
        self.required::<dyn ErrorDecoder>(name, "error decoder")
    }

    pub fn options(&self, name: &str) -> Result<Options, ClientError> {
        Ok(*self.required::<Options>(name, "options")?)
    }

    pub fn logger_level(&self, name: &str) -> Result<LoggerLevel, ClientError> {
        Ok(*self.required::<LoggerLevel>(name, "logger level")?)
    }

    /// Every interceptor of the client, in id order.
    pub fn interceptors(&self, name: &str) -> Result<Vec<Arc<dyn RequestInterceptor>>, ClientError> {
        let mut interceptors: Vec<(ComponentId, Arc<dyn RequestInterceptor>)> = self
            .instances_without_ancestors::<dyn RequestInterceptor>(name)?
            .into_iter()
            .collect();
        interceptors.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(interceptors.into_iter().map(|(_, i)| i).collect())
    }

    /// Encodes `body` (if any) with the client's encoder, then runs every
    /// interceptor of the client over the template.
    #[instrument(skip(self, template, body), fields(method = %template.method(), path = %template.path()))]
    pub fn prepare_request<B: Serialize>(
        &self,
        name: &str,
        mut template: RequestTemplate,
        body: Option<&B>,
    ) -> Result<RequestTemplate, ClientError> {
        if let Some(body) = body {
            let value = serde_json::to_value(body).map_err(ClientError::Encode)?;
            self.encoder(name)?.encode(&value, &mut template)?;
        }
        let interceptors = self.interceptors(name)?;
        for interceptor in &interceptors {
            interceptor.apply(&mut template);
        }
        debug!(interceptors = interceptors.len(), url = %template.url(), "Request prepared");
        Ok(template)
    }

    /// Decodes a response with the client's components.
    ///
    /// A success status is decoded into `T`. A 404 is `Ok(None)` when the
    /// client dismisses 404s. Any other status goes through the error decoder.
    #[instrument(skip(self, response), fields(status = response.status()))]
    pub fn decode_response<T: DeserializeOwned>(
        &self,
        name: &str,
        method_key: &str,
        response: &Response,
    ) -> Result<Option<T>, ClientError> {
        if response.is_success() {
            let value = self.decoder(name)?.decode(response)?;
            return serde_json::from_value(value)
                .map(Some)
                .map_err(ClientError::Decode);
        }
        if response.status() == 404 && self.client_config(name).dismiss_404() {
            debug!("Dismissing 404");
            return Ok(None);
        }
        Err(self.error_decoder(name)?.decode(method_key, response))
    }

    fn required<T: ?Sized + Send + Sync + 'static>(
        &self,
        name: &str,
        component: &'static str,
    ) -> Result<Arc<T>, ClientError> {
        self.instance_without_ancestors::<T>(name)?
            .ok_or_else(|| ClientError::MissingComponent {
                client: name.to_string(),
                component,
            })
    }
}

impl std::fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientContext")
            .field("clients", &self.context_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scope_framework::configuration::from_fn;
    use scope_framework::RegistryError;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Invoice {
        id: String,
        amount: u32,
    }

    fn context() -> ClientContext {
        let billing = ClientConfig {
            dismiss_404: Some(true),
            ..Default::default()
        };
        ClientContext::new(ClientProperties::default().with_client("billing", billing))
    }

    #[test]
    fn test_scopes_built_on_demand() {
        let context = context();
        assert!(context.context_names().is_empty());

        context.encoder("billing").unwrap();
        context.encoder("billing").unwrap();
        context.decoder("orders").unwrap();

        let names: Vec<String> = context.context_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["billing", "orders"]);
    }

    #[test]
    fn test_decode_success_and_dismissed_404() {
        let context = context();
        let ok = Response::new(200, "OK").with_body(r#"{"id":"inv-1","amount":42}"#);
        let invoice: Option<Invoice> = context.decode_response("billing", "Api#get", &ok).unwrap();
        assert_eq!(
            invoice,
            Some(Invoice {
                id: "inv-1".to_string(),
                amount: 42
            })
        );

        let missing = Response::new(404, "Not Found");
        let dismissed: Option<Invoice> =
            context.decode_response("billing", "Api#get", &missing).unwrap();
        assert!(dismissed.is_none());

        let error = context
            .decode_response::<Invoice>("orders", "Api#get", &missing)
            .unwrap_err();
        assert!(matches!(error, ClientError::NotFound { .. }));
    }

    #[test]
    fn test_missing_component_reported() {
        let context = ClientContext::builder(ClientProperties::default())
            .specification(Specification::new("bare").with(from_fn("bare", |defs| {
                defs.register("decoder", |_| Ok(Arc::new(0_u8)));
                Ok(())
            })))
            .build();

        // The fallback decoder is keyed "decoder" too, so the override by id
        // removes it.
        assert!(matches!(
            context.decoder("bare"),
            Err(ClientError::MissingComponent { component: "decoder", .. })
        ));
    }

    #[test]
    fn test_invalid_name_surfaces_registry_error() {
        let context = context();
        assert!(matches!(
            context.encoder(""),
            Err(ClientError::Scope(RegistryError::InvalidScopeName(_)))
        ));
    }
}
