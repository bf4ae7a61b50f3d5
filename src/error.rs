//! Error types for the client layer.

use scope_framework::RegistryError;
use thiserror::Error;

/// Errors produced while preparing requests or interpreting responses with a
/// client's components.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request body could not be encoded.
    #[error("Failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// The response body could not be decoded.
    #[error("Failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    /// The remote side answered with a non-success status.
    #[error("[{status}] {reason} during [{method_key}]")]
    Status {
        method_key: String,
        status: u16,
        reason: String,
    },

    /// The remote side answered 404 and the client does not dismiss it.
    #[error("[404] Not Found during [{method_key}]")]
    NotFound { method_key: String },

    /// The client's scope does not provide a required component.
    #[error("Client '{client}' has no {component} configured")]
    MissingComponent {
        client: String,
        component: &'static str,
    },

    /// Resolving the client's scope or one of its components failed.
    #[error(transparent)]
    Scope(#[from] RegistryError),
}

impl ClientError {
    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::NotFound { .. } => Some(404),
            _ => None,
        }
    }
}

/// Errors that can occur while loading [`ClientProperties`](crate::ClientProperties).
#[derive(Debug, Error)]
pub enum PropertiesError {
    /// A source could not be read or did not match the expected shape.
    #[error("Failed to load client properties: {0}")]
    Extract(#[from] figment::Error),

    /// A value was read but is not acceptable.
    #[error("Invalid properties for client '{client}': {message}")]
    Invalid { client: String, message: String },
}
