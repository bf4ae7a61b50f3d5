use client_context::{ClientConfig, ClientError, ClientProperties, RequestTemplate};
use client_sample::configs::{AuditTrail, XML_CONTENT_TYPE};
use client_sample::lifecycle::{ClientSystem, SystemError};
use scope_framework::RegistryError;
use serde_json::json;

fn properties() -> ClientProperties {
    ClientProperties::default()
        .with_client("billing", ClientConfig::default())
        .with_client("inventory", ClientConfig::default())
}

/// Full flow: warm the configured clients, prepare requests, shut down.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_full_client_system() {
    let system = ClientSystem::new(properties());

    let warmed: Vec<String> = system
        .warm()
        .await
        .expect("Failed to warm clients")
        .iter()
        .map(|name| name.to_string())
        .collect();
    assert_eq!(warmed, vec!["billing", "inventory"]);

    let body = json!({"customer": "acme", "amount": 42});

    let billing = system
        .prepare("billing", RequestTemplate::post("/invoices"), &body)
        .expect("Failed to prepare billing request");
    assert_eq!(billing.header_values("Content-Type"), [XML_CONTENT_TYPE.to_string()]);
    assert_eq!(billing.header_values("X-Request-Id"), ["1".to_string()]);
    assert!(!billing.has_header("Authorization"));

    let inventory = system
        .prepare("inventory", RequestTemplate::post("/stock"), &body)
        .expect("Failed to prepare inventory request");
    assert_eq!(inventory.header_values("Content-Type"), ["application/json".to_string()]);
    assert_eq!(
        inventory.header_values("Authorization"),
        ["Bearer inventory-demo-token".to_string()]
    );
    // Request ids are counted per client.
    assert_eq!(inventory.header_values("X-Request-Id"), ["1".to_string()]);

    // A client outside the properties is built on first use.
    let orders = system
        .prepare("orders", RequestTemplate::post("/orders"), &body)
        .expect("Failed to prepare orders request");
    assert_eq!(orders.header_values("Content-Type"), ["application/json".to_string()]);
    assert_eq!(system.context().context_names().len(), 3);

    let trail = system
        .context()
        .instance::<AuditTrail>("billing", "auditTrail")
        .expect("Billing has an audit trail");
    assert_eq!(trail.record(), 1);
    assert!(system
        .context()
        .instance_without_ancestors::<AuditTrail>("orders")
        .unwrap()
        .is_none());

    system.shutdown();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_broken_client_fails_warm_up() {
    let system = ClientSystem::with_token(properties(), "  ");

    let error = system.warm().await.unwrap_err();
    assert!(matches!(
        error,
        SystemError::Client(ClientError::Scope(RegistryError::Configuration(_)))
    ));
    assert_eq!(error.to_string(), "Inventory token is empty");

    // The healthy client is unaffected.
    assert!(system.context().encoder("billing").is_ok());
}
