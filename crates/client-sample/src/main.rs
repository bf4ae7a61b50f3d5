//! # Client Sample
//!
//! Runs three named clients through one [`ClientContext`](client_context::ClientContext):
//!
//! - **billing**: XML encoder and an audit trail, from `BillingConfiguration`
//! - **inventory**: bearer token interceptor, from `InventoryConfiguration`
//! - **orders**: nothing of its own, so only the defaults
//!
//! Every client also gets a request id interceptor from the `default.request-id`
//! specification. Properties come from `clients.toml` in the working directory
//! and `CLIENTS_*` variables.
//!
//! ```bash
//! RUST_LOG=info cargo run -p client-sample
//! RUST_LOG=debug CLIENTS_CONFIG__ORDERS__READ_TIMEOUT_MS=5000 cargo run -p client-sample
//! ```

use client_context::{PropertiesLoader, RequestTemplate, Response};
use client_sample::lifecycle::ClientSystem;
use scope_framework::tracing::setup_tracing;
use serde::{Deserialize, Serialize};
use tracing::{error, info, Instrument};

#[derive(Debug, Serialize)]
struct InvoiceRequest {
    customer: String,
    amount: u32,
}

#[derive(Debug, Deserialize)]
struct StockLevel {
    sku: String,
    available: u32,
}

#[tokio::main]
async fn main() -> Result<(), String> {
    // Setup tracing once for the entire application
    setup_tracing();

    info!("Starting client sample");

    let loader = PropertiesLoader::new().with_config_path("clients.toml");
    let system = ClientSystem::load(&loader).map_err(|e| e.to_string())?;

    let span = tracing::info_span!("warm_up");
    let warmed = system.warm().instrument(span).await.map_err(|e| e.to_string())?;
    info!(clients = ?warmed, "Clients ready");

    let invoice = InvoiceRequest {
        customer: "acme".to_string(),
        amount: 42,
    };
    for client in ["billing", "inventory", "orders"] {
        let span = tracing::info_span!("prepare", client);
        let _guard = span.enter();
        match system.prepare(client, RequestTemplate::post("/requests"), &invoice) {
            Ok(request) => info!(
                url = %request.url(),
                headers = ?request.headers(),
                body = %String::from_utf8_lossy(request.body().unwrap_or_default()),
                "Request prepared"
            ),
            Err(e) => error!(error = %e, "Request preparation failed"),
        }
    }

    let context = system.context();
    let response = Response::new(200, "OK").with_body(r#"{"sku":"widget-1","available":7}"#);
    match context.decode_response::<StockLevel>("inventory", "InventoryApi#stock", &response) {
        Ok(Some(stock)) => info!(sku = %stock.sku, available = stock.available, "Stock decoded"),
        Ok(None) => info!("No stock returned"),
        Err(e) => error!(error = %e, "Stock decoding failed"),
    }

    let missing = Response::new(404, "Not Found");
    match context.decode_response::<StockLevel>("orders", "OrdersApi#get", &missing) {
        Ok(_) => info!("Missing order dismissed"),
        Err(e) => info!(error = %e, "Missing order reported"),
    }

    system.shutdown();

    info!("Client sample completed successfully");
    Ok(())
}
