use scope_framework::mock::MockScopeBuilder;
use scope_framework::{
    configuration, ComponentScope, NamedScopeRegistry, RegistryError, ScopeDefinition,
    ScopeName, ScopeProperties, Specification,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// --- Test Components ---

trait Encoder: Send + Sync {
    fn content_type(&self) -> &'static str;
}

struct JsonEncoder;

impl Encoder for JsonEncoder {
    fn content_type(&self) -> &'static str {
        "application/json"
    }
}

struct XmlEncoder;

impl Encoder for XmlEncoder {
    fn content_type(&self) -> &'static str {
        "application/xml"
    }
}

#[derive(Debug)]
struct Options {
    read_timeout: Duration,
}

fn definition() -> ScopeDefinition {
    ScopeDefinition::new("clients", "clients.client.name").with_default(configuration::from_fn(
        "defaults",
        |defs| {
            defs.register_if_missing("options", |_| {
                Ok(Arc::new(Options {
                    read_timeout: Duration::from_secs(60),
                }))
            });
            Ok(())
        },
    ))
}

fn xml_encoder() -> Specification {
    Specification::new("billing").with(configuration::from_fn("xml", |defs| {
        defs.register("encoder", |_| Ok(Arc::new(XmlEncoder) as Arc<dyn Encoder>));
        Ok(())
    }))
}

// --- Tests ---

#[test]
fn test_distinct_names_get_isolated_scopes() {
    let registry = NamedScopeRegistry::new(definition());

    let a = registry.resolve_scope("svc-a").unwrap();
    let b = registry.resolve_scope("svc-b").unwrap();
    assert!(!Arc::ptr_eq(&a, &b));

    let options_a = a.get_exclusive::<Options>().unwrap().unwrap();
    let options_b = b.get_exclusive::<Options>().unwrap().unwrap();
    assert!(!Arc::ptr_eq(&options_a, &options_b));
    assert_eq!(options_a.read_timeout, options_b.read_timeout);
}

#[test]
fn test_repeat_resolution_returns_same_scope() {
    let registry = NamedScopeRegistry::new(definition());

    let first = registry.lookup_exclusive::<Options>("svc-a").unwrap().unwrap();
    let second = registry.lookup_exclusive::<Options>("svc-a").unwrap().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(registry.scope_names(), vec![ScopeName::new("svc-a").unwrap()]);
}

#[test]
fn test_named_override_stays_in_its_scope() {
    let registry = NamedScopeRegistry::builder(definition())
        .specification(xml_encoder())
        .build();

    let billing = registry.lookup_exclusive::<dyn Encoder>("billing").unwrap();
    assert_eq!(billing.unwrap().content_type(), "application/xml");

    // svc-a has no encoder at all, even though billing does.
    assert!(registry.lookup_exclusive::<dyn Encoder>("svc-a").unwrap().is_none());
    assert!(registry.lookup_all_exclusive::<dyn Encoder>("svc-a").unwrap().is_empty());
}

#[test]
fn test_global_and_named_layers_combine() {
    let registry = NamedScopeRegistry::builder(definition())
        .specification(Specification::new("default.json").with(configuration::from_fn(
            "json",
            |defs| {
                defs.register_if_missing("encoder", |_| {
                    Ok(Arc::new(JsonEncoder) as Arc<dyn Encoder>)
                });
                Ok(())
            },
        )))
        .specification(xml_encoder())
        .build();

    let billing = registry.lookup_exclusive::<dyn Encoder>("billing").unwrap().unwrap();
    let orders = registry.lookup_exclusive::<dyn Encoder>("orders").unwrap().unwrap();
    assert_eq!(billing.content_type(), "application/xml");
    assert_eq!(orders.content_type(), "application/json");
}

#[test]
fn test_two_components_of_a_type_are_ambiguous() {
    let registry = NamedScopeRegistry::builder(definition())
        .specification(Specification::new("svc-x").with(configuration::from_fn(
            "both",
            |defs| {
                defs.register("json", |_| Ok(Arc::new(JsonEncoder) as Arc<dyn Encoder>));
                defs.register("xml", |_| Ok(Arc::new(XmlEncoder) as Arc<dyn Encoder>));
                Ok(())
            },
        )))
        .build();

    let error = registry.lookup_exclusive::<dyn Encoder>("svc-x").err().unwrap();
    assert!(matches!(error, RegistryError::AmbiguousComponent { .. }));

    let all = registry.lookup_all_exclusive::<dyn Encoder>("svc-x").unwrap();
    let mut ids: Vec<&str> = all.keys().map(|id| id.as_str()).collect();
    ids.sort();
    assert_eq!(ids, vec!["json", "xml"]);
}

#[test]
fn test_empty_name_is_rejected() {
    let registry = NamedScopeRegistry::new(definition());
    assert!(matches!(
        registry.lookup_exclusive::<Options>(""),
        Err(RegistryError::InvalidScopeName(_))
    ));
    assert!(!registry.contains_scope(""));
}

#[test]
fn test_failed_creation_is_retried() {
    let mock = MockScopeBuilder::new();
    mock.expect_build("billing")
        .return_err(RegistryError::Configuration("upstream unavailable".into()));
    mock.expect_build("billing").return_ok();

    let registry = NamedScopeRegistry::builder(definition())
        .scope_builder(mock.clone())
        .build();

    let error = registry.resolve_scope("billing").unwrap_err();
    assert_eq!(error.to_string(), "upstream unavailable");
    assert!(!registry.contains_scope("billing"));

    registry.resolve_scope("billing").unwrap();
    assert!(registry.contains_scope("billing"));
    assert_eq!(mock.build_count("billing"), 2);
    mock.verify();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_resolution_builds_once() {
    let mock = MockScopeBuilder::new();
    mock.expect_build("svc-a")
        .return_ok_after(Duration::from_millis(100));

    let registry = Arc::new(
        NamedScopeRegistry::builder(definition())
            .scope_builder(mock.clone())
            .build(),
    );

    let mut handles = Vec::new();
    for _ in 0..8 {
        let registry = registry.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            registry.resolve_scope("svc-a").unwrap()
        }));
    }

    let mut scopes = Vec::new();
    for handle in handles {
        scopes.push(handle.await.unwrap());
    }

    assert!(scopes.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    assert_eq!(mock.build_count("svc-a"), 1);
    mock.verify();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_slow_scope_does_not_block_other_names() {
    let mock = MockScopeBuilder::new();
    mock.expect_build("slow").return_ok_after(Duration::from_millis(500));
    mock.expect_build("fast").return_ok();

    let registry = Arc::new(
        NamedScopeRegistry::builder(definition())
            .scope_builder(mock.clone())
            .build(),
    );

    let slow = {
        let registry = registry.clone();
        tokio::task::spawn_blocking(move || registry.resolve_scope("slow").unwrap())
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let started = std::time::Instant::now();
    let fast = {
        let registry = registry.clone();
        tokio::task::spawn_blocking(move || registry.resolve_scope("fast").unwrap())
    };
    fast.await.unwrap();
    assert!(started.elapsed() < Duration::from_millis(400));

    slow.await.unwrap();
    mock.verify();
}

#[test]
fn test_dependencies_resolved_inside_scope() {
    struct Client {
        encoder: Arc<dyn Encoder>,
        name: String,
    }

    let registry = NamedScopeRegistry::builder(definition())
        .specification(xml_encoder())
        .specification(Specification::new("default.client").with(configuration::from_fn(
            "client",
            |defs| {
                defs.register("client", |r| {
                    Ok(Arc::new(Client {
                        encoder: r.component::<dyn Encoder>()?,
                        name: r.property("clients.client.name").unwrap_or_default().to_string(),
                    }))
                });
                Ok(())
            },
        )))
        .build();

    let client = registry.lookup_by_id::<Client>("billing", "client").unwrap();
    assert_eq!(client.name, "billing");
    assert_eq!(client.encoder.content_type(), "application/xml");

    // Without an encoder the client cannot be built.
    let error = registry.resolve_scope("orders").unwrap_err();
    assert!(matches!(error, RegistryError::MissingDependency { .. }));
}

#[test]
fn test_lookup_falls_back_to_parent() {
    let parent = ComponentScope::from_configurations(
        ScopeName::new("application").unwrap(),
        ScopeProperties::new("application"),
        &[Arc::new(configuration::from_fn("shared", |defs| {
            defs.register("encoder", |_| Ok(Arc::new(JsonEncoder) as Arc<dyn Encoder>));
            Ok(())
        }))],
    )
    .unwrap();

    let registry = NamedScopeRegistry::builder(definition())
        .specification(xml_encoder())
        .parent(Arc::new(parent))
        .build();

    let billing = registry.lookup::<dyn Encoder>("billing").unwrap().unwrap();
    let orders = registry.lookup::<dyn Encoder>("orders").unwrap().unwrap();
    assert_eq!(billing.content_type(), "application/xml");
    assert_eq!(orders.content_type(), "application/json");
    assert!(registry.lookup_exclusive::<dyn Encoder>("orders").unwrap().is_none());
}

#[test]
fn test_close_releases_every_scope() {
    let closed = Arc::new(AtomicUsize::new(0));
    let counter = closed.clone();
    let definition = definition().with_default(configuration::from_fn("pool", move |defs| {
        let counter = counter.clone();
        defs.register("pool", |_| Ok(Arc::new(Vec::<u8>::with_capacity(16))))
            .on_close(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        Ok(())
    }));

    let registry = NamedScopeRegistry::new(definition);
    registry.resolve_scope("svc-a").unwrap();
    registry.resolve_scope("svc-b").unwrap();

    registry.close();

    assert_eq!(closed.load(Ordering::SeqCst), 2);
    assert!(registry.scope_names().is_empty());
}
