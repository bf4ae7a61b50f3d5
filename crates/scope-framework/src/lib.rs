//! # Scope Framework
//!
//! This crate provides a **named multi-scope component registry**: a registry
//! that lazily creates one isolated container of components per name and
//! caches it for the life of the process. It is the machinery behind per-client
//! configuration, where every named HTTP client gets its own encoder, decoder,
//! interceptors and options without any of them leaking into another client.
//!
//! ## Why named scopes?
//!
//! A process usually talks to several remote services. Most of them share the
//! same wiring, but a few need something different: an XML encoder for one
//! service, an extra auth interceptor for another. Named scopes give each
//! service its own container, built from:
//!
//! - **Defaults** shared by every scope (the [`ScopeDefinition`])
//! - **Global overrides** applied to every scope (specifications named `default.*`)
//! - **Named overrides** applied to one scope (a [`Specification`] per name)
//!
//! Later layers augment earlier ones, and a component registered under an id
//! that is already taken replaces the earlier one.
//!
//! ## Architecture Overview
//!
//! 1. **Wiring Layer** ([`Configuration`], [`ComponentDefinitions`]) - declares components
//! 2. **Build Layer** ([`ScopeBuilder`]) - turns configurations into a [`ComponentScope`]
//! 3. **Registry Layer** ([`NamedScopeRegistry`]) - one scope per name, built once, shared
//!
//! ## Example
//!
//! ```rust
//! use scope_framework::{configuration, NamedScopeRegistry, ScopeDefinition, Specification};
//! use std::sync::Arc;
//!
//! trait Encoder: Send + Sync { fn content_type(&self) -> &'static str; }
//! struct JsonEncoder;
//! impl Encoder for JsonEncoder { fn content_type(&self) -> &'static str { "application/json" } }
//! struct XmlEncoder;
//! impl Encoder for XmlEncoder { fn content_type(&self) -> &'static str { "application/xml" } }
//!
//! // 1. Defaults for every client
//! let definition = ScopeDefinition::new("clients", "clients.client.name").with_default(
//!     configuration::from_fn("defaults", |defs| {
//!         defs.register_if_missing("encoder", |_| Ok(Arc::new(JsonEncoder) as Arc<dyn Encoder>));
//!         Ok(())
//!     }),
//! );
//!
//! // 2. "billing" speaks XML
//! let registry = NamedScopeRegistry::builder(definition)
//!     .specification(Specification::new("billing").with(configuration::from_fn("billing", |defs| {
//!         defs.register("xmlEncoder", |_| Ok(Arc::new(XmlEncoder) as Arc<dyn Encoder>));
//!         Ok(())
//!     })))
//!     .build();
//!
//! // 3. Look up per client
//! let billing = registry.lookup_exclusive::<dyn Encoder>("billing").unwrap().unwrap();
//! let orders = registry.lookup_exclusive::<dyn Encoder>("orders").unwrap().unwrap();
//! assert_eq!(billing.content_type(), "application/xml");
//! assert_eq!(orders.content_type(), "application/json");
//! ```
//!
//! The fallback JSON encoder is dropped from the `billing` scope because a
//! regular definition exposes the same type, so the exclusive lookup is not
//! ambiguous.
//!
//! ## Concurrency Model
//!
//! - Scope creation is **exactly once** per name, even under concurrent first use
//! - Creation for one name never blocks lookups or creation for another name
//! - A built scope is immutable; lookups take no locks
//! - A failed creation is not cached, so the next call retries
//!
//! ## Testing
//!
//! The [`mock`] module provides a `MockScopeBuilder` that counts builds and
//! injects failures or delays per scope name. See the module docs for patterns.

pub mod builder;
pub mod configuration;
pub mod definition;
pub mod error;
pub mod mock;
pub mod name;
pub mod registry;
pub mod scope;
pub mod tracing;

// Re-export core types for convenience
pub use builder::{DefinitionScopeBuilder, ScopeBuilder};
pub use configuration::{Configuration, ScopeDefinition, Specification, DEFAULT_PREFIX};
pub use definition::{ComponentDefinitions, DefinitionBuilder, ScopeResolver};
pub use error::{BoxError, RegistryError};
pub use name::{ComponentId, ScopeName};
pub use registry::{NamedScopeRegistry, RegistryBuilder};
pub use scope::{Component, ComponentScope, ScopeProperties};
