//! Request and response carriers passed through a client's components.

use std::collections::BTreeMap;

/// An outgoing request under construction.
///
/// Header names are matched case-insensitively; each name may carry several
/// values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestTemplate {
    method: String,
    path: String,
    headers: BTreeMap<String, Vec<String>>,
    queries: BTreeMap<String, Vec<String>>,
    body: Option<Vec<u8>>,
}

impl RequestTemplate {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new("GET", path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new("POST", path)
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Appends a header value.
    pub fn header(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        let key = self.header_key(name).unwrap_or_else(|| name.to_string());
        self.headers.entry(key).or_default().push(value.into());
        self
    }

    /// Replaces every value of a header.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        if let Some(existing) = self.header_key(name) {
            self.headers.remove(&existing);
        }
        self.headers.insert(name.to_string(), vec![value.into()]);
        self
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.header_key(name).is_some()
    }

    pub fn header_values(&self, name: &str) -> &[String] {
        self.header_key(name)
            .and_then(|key| self.headers.get(&key))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn headers(&self) -> &BTreeMap<String, Vec<String>> {
        &self.headers
    }

    /// Appends a query parameter value.
    pub fn query(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.queries
            .entry(name.to_string())
            .or_default()
            .push(value.into());
        self
    }

    pub fn has_query(&self, name: &str) -> bool {
        self.queries.contains_key(name)
    }

    pub fn queries(&self) -> &BTreeMap<String, Vec<String>> {
        &self.queries
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn set_body(&mut self, body: Vec<u8>) -> &mut Self {
        self.body = Some(body);
        self
    }

    /// Path followed by the query string, in key order.
    pub fn url(&self) -> String {
        let query: Vec<String> = self
            .queries
            .iter()
            .flat_map(|(k, values)| values.iter().map(move |v| format!("{}={}", k, v)))
            .collect();
        if query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, query.join("&"))
        }
    }

    fn header_key(&self, name: &str) -> Option<String> {
        self.headers
            .keys()
            .find(|k| k.eq_ignore_ascii_case(name))
            .cloned()
    }
}

/// A response as seen by decoders and error decoders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: u16,
    reason: String,
    headers: BTreeMap<String, Vec<String>>,
    body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
            headers: BTreeMap::new(),
            body: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.entry(name.into()).or_default().push(value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn headers(&self) -> &BTreeMap<String, Vec<String>> {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
