//! # Client Context
//!
//! > **One isolated component scope per named HTTP client.**
//!
//! A process usually calls several remote services through declarative
//! clients. Each client needs its own encoder, decoder, error decoder,
//! interceptors and transport options, and a change made for one client must
//! never leak into another. This crate builds that on top of the
//! [`scope_framework`] registry.
//!
//! ## Core Concepts
//!
//! ### Scopes per client
//! The first lookup for a client name builds its scope from three layers:
//! - **Defaults** ([`ClientsConfiguration`]): JSON codecs, the default error
//!   decoder, options and logger level from [`ClientProperties`], and a
//!   headers interceptor. Each default is only used when the client does not
//!   configure a component of the same type.
//! - **Global overrides**: specifications named `default.*`.
//! - **Named overrides**: the specification registered under the client name.
//!
//! ### Properties
//! [`ClientProperties`] holds per-client settings plus a `default` entry every
//! client inherits. [`PropertiesLoader`] reads them from a TOML file and
//! `CLIENTS_`-prefixed environment variables.
//!
//! ## Module Tour
//!
//! - [`clients`]: the collaborator interfaces ([`Encoder`], [`Decoder`],
//!   [`ErrorDecoder`], [`RequestInterceptor`]), value components ([`Options`],
//!   [`LoggerLevel`]) and the request/response carriers.
//! - [`configuration`]: the default wiring applied to every client scope.
//! - [`context`]: [`ClientContext`], the per-client lookup surface.
//! - [`properties`]: [`ClientProperties`] and its loader.
//! - [`error`]: [`ClientError`] and [`PropertiesError`].
//!
//! ## Quick Start
//!
//! ```rust
//! use client_context::{ClientContext, ClientProperties, Encoder, RequestTemplate};
//! use serde_json::json;
//!
//! let context = ClientContext::new(ClientProperties::default());
//!
//! let request = context
//!     .prepare_request("billing", RequestTemplate::post("/invoices"), Some(&json!({"amount": 42})))
//!     .unwrap();
//! assert_eq!(request.header_values("Content-Type"), ["application/json".to_string()]);
//!
//! assert!(context.instance_without_ancestors::<dyn Encoder>("billing").unwrap().is_some());
//! context.close();
//! ```

pub mod clients;
pub mod configuration;
pub mod context;
pub mod error;
pub mod properties;

pub use clients::{
    Decoder, DefaultErrorDecoder, Encoder, ErrorDecoder, HeadersInterceptor, JsonDecoder,
    JsonEncoder, LoggerLevel, Options, RequestInterceptor, RequestTemplate, Response,
};
pub use configuration::{ClientSettings, ClientsConfiguration, CLIENT_NAME_PROPERTY, PROPERTY_SOURCE_NAME};
pub use context::{ClientContext, ClientContextBuilder};
pub use error::{ClientError, PropertiesError};
pub use properties::{ClientConfig, ClientProperties, PropertiesLoader};
