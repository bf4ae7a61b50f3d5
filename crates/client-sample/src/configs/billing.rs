//! The billing service speaks XML and keeps an audit trail per client.

use client_context::{ClientError, Encoder, RequestTemplate};
use scope_framework::{BoxError, ComponentDefinitions, Configuration};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::info;

pub const XML_CONTENT_TYPE: &str = "application/xml";

/// Writes flat JSON objects as `<request><key>value</key>...</request>`.
#[derive(Debug, Default)]
pub struct XmlEncoder;

impl Encoder for XmlEncoder {
    fn encode(&self, body: &Value, template: &mut RequestTemplate) -> Result<(), ClientError> {
        let mut xml = String::from("<request>");
        match body {
            Value::Object(fields) => {
                for (key, value) in fields {
                    xml.push_str(&format!("<{key}>{}</{key}>", text(value)));
                }
            }
            other => xml.push_str(&text(other)),
        }
        xml.push_str("</request>");

        template
            .set_header("Content-Type", XML_CONTENT_TYPE)
            .set_body(xml.into_bytes());
        Ok(())
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Counts requests encoded for one client; reports the total when the
/// client's scope closes.
#[derive(Debug, Default)]
pub struct AuditTrail {
    requests: AtomicUsize,
}

impl AuditTrail {
    pub fn record(&self) -> usize {
        self.requests.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn total(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

pub struct BillingConfiguration;

impl Configuration for BillingConfiguration {
    fn configure(&self, definitions: &mut ComponentDefinitions) -> Result<(), BoxError> {
        definitions.register("xmlEncoder", |_| Ok(Arc::new(XmlEncoder) as Arc<dyn Encoder>));
        definitions
            .register("auditTrail", |_| Ok(Arc::new(AuditTrail::default())))
            .on_close(|trail| info!(requests = trail.total(), "Billing audit trail closed"));
        Ok(())
    }
}
