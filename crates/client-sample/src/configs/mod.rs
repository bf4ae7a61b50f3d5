//! Sample override configurations, one per remote service, plus one applied
//! to every client.

pub mod billing;
pub mod inventory;

pub use billing::*;
pub use inventory::*;

use client_context::{RequestInterceptor, RequestTemplate};
use scope_framework::{BoxError, ComponentDefinitions, Configuration, Specification};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Tags each request with a sequence number, counted per client.
#[derive(Debug, Default)]
pub struct RequestIdInterceptor {
    next: AtomicU64,
}

impl RequestInterceptor for RequestIdInterceptor {
    fn apply(&self, template: &mut RequestTemplate) {
        let id = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        template.set_header("X-Request-Id", id.to_string());
    }
}

pub struct RequestIdConfiguration;

impl Configuration for RequestIdConfiguration {
    fn configure(&self, definitions: &mut ComponentDefinitions) -> Result<(), BoxError> {
        definitions.register("requestId", |_| {
            Ok(Arc::new(RequestIdInterceptor::default()) as Arc<dyn RequestInterceptor>)
        });
        Ok(())
    }
}

/// Every specification the sample registers.
pub fn sample_specifications(inventory_token: &str) -> Vec<Specification> {
    vec![
        Specification::new("default.request-id").with(RequestIdConfiguration),
        Specification::new("billing").with(BillingConfiguration),
        Specification::new("inventory").with(InventoryConfiguration::new(inventory_token)),
    ]
}
