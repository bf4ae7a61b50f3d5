//! Request interceptors: every interceptor in a client's scope sees each
//! request after encoding.

use crate::clients::template::RequestTemplate;
use std::collections::BTreeMap;

pub trait RequestInterceptor: Send + Sync {
    fn apply(&self, template: &mut RequestTemplate);
}

/// Adds configured default headers and query parameters that the request
/// does not already carry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadersInterceptor {
    headers: BTreeMap<String, Vec<String>>,
    queries: BTreeMap<String, Vec<String>>,
}

impl HeadersInterceptor {
    pub fn new(
        headers: BTreeMap<String, Vec<String>>,
        queries: BTreeMap<String, Vec<String>>,
    ) -> Self {
        Self { headers, queries }
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.queries.is_empty()
    }
}

impl RequestInterceptor for HeadersInterceptor {
    fn apply(&self, template: &mut RequestTemplate) {
        for (name, values) in &self.headers {
            if template.has_header(name) {
                continue;
            }
            for value in values {
                template.header(name, value.as_str());
            }
        }
        for (name, values) in &self.queries {
            if template.has_query(name) {
                continue;
            }
            for value in values {
                template.query(name, value.as_str());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_never_override_request_values() {
        let interceptor = HeadersInterceptor::new(
            BTreeMap::from([
                ("X-Tenant".to_string(), vec!["acme".to_string()]),
                ("Accept".to_string(), vec!["application/json".to_string()]),
            ]),
            BTreeMap::from([("locale".to_string(), vec!["en".to_string()])]),
        );

        let mut template = RequestTemplate::get("/invoices");
        template.header("accept", "application/xml");
        interceptor.apply(&mut template);

        assert_eq!(template.header_values("X-Tenant"), ["acme".to_string()]);
        assert_eq!(template.header_values("Accept"), ["application/xml".to_string()]);
        assert_eq!(template.url(), "/invoices?locale=en");
    }
}
