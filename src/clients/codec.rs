//! Codec components: how a client turns bodies into bytes and responses back
//! into values or errors.
//!
//! Bodies cross the codec boundary as [`serde_json::Value`] so the traits stay
//! object safe; typed conversion happens at the edges in
//! [`ClientContext`](crate::ClientContext).

use crate::clients::template::{RequestTemplate, Response};
use crate::error::ClientError;
use serde_json::Value;

pub const CONTENT_TYPE: &str = "Content-Type";

/// Writes a request body into a template.
pub trait Encoder: Send + Sync {
    fn encode(&self, body: &Value, template: &mut RequestTemplate) -> Result<(), ClientError>;
}

/// Reads the body of a successful response.
pub trait Decoder: Send + Sync {
    fn decode(&self, response: &Response) -> Result<Value, ClientError>;
}

/// Turns a non-success response into an error.
pub trait ErrorDecoder: Send + Sync {
    fn decode(&self, method_key: &str, response: &Response) -> ClientError;
}

/// Encodes bodies as JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonEncoder;

impl Encoder for JsonEncoder {
    fn encode(&self, body: &Value, template: &mut RequestTemplate) -> Result<(), ClientError> {
        let bytes = serde_json::to_vec(body).map_err(ClientError::Encode)?;
        template
            .set_header(CONTENT_TYPE, "application/json")
            .set_body(bytes);
        Ok(())
    }
}

/// Decodes JSON bodies. An empty body decodes to `null`.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonDecoder;

impl Decoder for JsonDecoder {
    fn decode(&self, response: &Response) -> Result<Value, ClientError> {
        if response.body().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(response.body()).map_err(ClientError::Decode)
    }
}

/// Maps 404 to [`ClientError::NotFound`] and every other status to
/// [`ClientError::Status`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultErrorDecoder;

impl ErrorDecoder for DefaultErrorDecoder {
    fn decode(&self, method_key: &str, response: &Response) -> ClientError {
        match response.status() {
            404 => ClientError::NotFound {
                method_key: method_key.to_string(),
            },
            status => ClientError::Status {
                method_key: method_key.to_string(),
                status,
                reason: response.reason().to_string(),
            },
        }
    }
}
