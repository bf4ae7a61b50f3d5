//! # Client Lifecycle
//!
//! Named clients are cheap to declare and lazy to build: nothing happens for a
//! client until its first lookup. A service usually wants the opposite at
//! startup, so that a broken client configuration fails the deploy instead of
//! the first request. [`ClientSystem`] covers that:
//!
//! 1. **Load** - read [`ClientProperties`](client_context::ClientProperties)
//!    from `clients.toml` and `CLIENTS_*` variables
//! 2. **Wire** - build the context with the sample specifications
//! 3. **Warm** - build every configured client's scope concurrently
//! 4. **Shutdown** - close every scope, running component close hooks
//!
//! Clients that are not named in the properties still work; their scope is
//! built on first use.

mod client_system;

pub use client_system::*;
