//! Default wiring shared by every client scope.

use crate::clients::{
    Decoder, DefaultErrorDecoder, Encoder, ErrorDecoder, HeadersInterceptor, JsonDecoder,
    JsonEncoder, RequestInterceptor,
};
use crate::properties::{ClientConfig, ClientProperties};
use scope_framework::{BoxError, ComponentDefinitions, Configuration, ScopeDefinition};
use std::sync::Arc;

/// Property source published to every client scope.
pub const PROPERTY_SOURCE_NAME: &str = "clients";

/// Key under which a client scope finds its own name.
pub const CLIENT_NAME_PROPERTY: &str = "clients.client.name";

pub mod ids {
    pub const CLIENT_CONFIG: &str = "clientConfig";
    pub const ENCODER: &str = "encoder";
    pub const DECODER: &str = "decoder";
    pub const ERROR_DECODER: &str = "errorDecoder";
    pub const OPTIONS: &str = "options";
    pub const LOGGER_LEVEL: &str = "loggerLevel";
    pub const HEADERS_INTERCEPTOR: &str = "headersInterceptor";
}

/// Publishes the merged [`ClientConfig`] of the scope's client.
pub struct ClientSettings {
    properties: Arc<ClientProperties>,
}

impl ClientSettings {
    pub fn new(properties: Arc<ClientProperties>) -> Self {
        Self { properties }
    }
}

impl Configuration for ClientSettings {
    fn configure(&self, definitions: &mut ComponentDefinitions) -> Result<(), BoxError> {
        let config = self.properties.config_for(definitions.scope_name().as_str());
        definitions.register(ids::CLIENT_CONFIG, move |_| Ok(Arc::new(config.clone())));
        Ok(())
    }
}

/// Components every client gets unless its own configuration provides one of
/// the same type: JSON codecs, the default error decoder, options and logger
/// level from properties. Default headers are always added as an interceptor.
pub struct ClientsConfiguration;

impl Configuration for ClientsConfiguration {
    fn configure(&self, definitions: &mut ComponentDefinitions) -> Result<(), BoxError> {
        definitions.register_if_missing(ids::ENCODER, |_| {
            Ok(Arc::new(JsonEncoder) as Arc<dyn Encoder>)
        });
        definitions.register_if_missing(ids::DECODER, |_| {
            Ok(Arc::new(JsonDecoder) as Arc<dyn Decoder>)
        });
        definitions.register_if_missing(ids::ERROR_DECODER, |_| {
            Ok(Arc::new(DefaultErrorDecoder) as Arc<dyn ErrorDecoder>)
        });
        definitions.register_if_missing(ids::OPTIONS, |r| {
            let config = r.optional::<ClientConfig>()?.unwrap_or_default();
            Ok(Arc::new(config.options()))
        });
        definitions.register_if_missing(ids::LOGGER_LEVEL, |r| {
            let config = r.optional::<ClientConfig>()?.unwrap_or_default();
            Ok(Arc::new(config.logger_level()))
        });
        definitions.register(ids::HEADERS_INTERCEPTOR, |r| {
            let config = r.optional::<ClientConfig>()?.unwrap_or_default();
            Ok(Arc::new(HeadersInterceptor::new(
                config.default_request_headers.clone(),
                config.default_query_parameters.clone(),
            )) as Arc<dyn RequestInterceptor>)
        });
        Ok(())
    }
}

/// The scope definition shared by every client of a [`ClientContext`](crate::ClientContext).
pub fn client_scope_definition(properties: Arc<ClientProperties>) -> ScopeDefinition {
    ScopeDefinition::new(PROPERTY_SOURCE_NAME, CLIENT_NAME_PROPERTY)
        .with_default(ClientSettings::new(properties))
        .with_default(ClientsConfiguration)
}
