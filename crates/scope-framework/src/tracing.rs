//! # Observability & Tracing
//!
//! The registry logs through the `tracing` crate with structured fields, so
//! every line about a scope carries `scope=<name>`. [`setup_tracing`] installs
//! a compact subscriber driven by `RUST_LOG`.
//!
//! ## What Gets Traced
//!
//! - **Scope lifecycle** (`info`): creation, readiness, failed initialisation, close
//! - **Wiring** (`debug`): each configuration applied, each definition overridden
//! - **Lookups** (`debug`): type or id, and whether anything matched
//!
//! ## Usage Examples
//!
//! ```bash
//! # Scope lifecycle only
//! RUST_LOG=info cargo run -p client-sample
//!
//! # Every configuration and lookup
//! RUST_LOG=debug cargo run -p client-sample
//!
//! # Only the registry internals
//! RUST_LOG=scope_framework=debug cargo run -p client-sample
//! ```
//!
//! ## Trace Example
//!
//! **With `RUST_LOG=info`**:
//!
//! ```text
//! INFO Creating scope scope=billing configurations=3
//! INFO Scope ready scope=billing size=6
//! INFO Creating scope scope=inventory configurations=3
//! INFO Scope ready scope=inventory size=7
//! INFO Scope closed scope=billing size=6
//! INFO Scope closed scope=inventory size=7
//! INFO Registry closed closed=2
//! ```
//!
//! **With `RUST_LOG=debug`** (excerpt):
//!
//! ```text
//! INFO Creating scope scope=billing configurations=3
//! DEBUG Applying configuration scope=billing configuration=ClientsConfiguration
//! DEBUG Applying configuration scope=billing configuration=BillingConfiguration
//! DEBUG Overriding component definition scope=billing id=encoder replaced=ClientsConfiguration by=BillingConfiguration
//! INFO Scope ready scope=billing size=6
//! DEBUG Lookup scope=billing type_name=dyn client_context::clients::codec::Encoder found=true
//! ```

/// Installs a compact `tracing` subscriber filtered by `RUST_LOG`.
///
/// Panics if a global subscriber is already installed; call it once from `main`.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
