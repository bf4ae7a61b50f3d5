//! The inventory service needs a bearer token on every request.

use client_context::{RequestInterceptor, RequestTemplate};
use scope_framework::{BoxError, ComponentDefinitions, Configuration};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
#[error("Inventory token is empty")]
pub struct EmptyToken;

#[derive(Debug)]
pub struct TokenInterceptor {
    token: String,
}

impl TokenInterceptor {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl RequestInterceptor for TokenInterceptor {
    fn apply(&self, template: &mut RequestTemplate) {
        template.set_header("Authorization", format!("Bearer {}", self.token));
    }
}

pub struct InventoryConfiguration {
    token: String,
}

impl InventoryConfiguration {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl Configuration for InventoryConfiguration {
    fn configure(&self, definitions: &mut ComponentDefinitions) -> Result<(), BoxError> {
        if self.token.trim().is_empty() {
            return Err(EmptyToken.into());
        }
        let token = self.token.clone();
        definitions.register("tokenInterceptor", move |_| {
            Ok(Arc::new(TokenInterceptor::new(token.as_str())) as Arc<dyn RequestInterceptor>)
        });
        Ok(())
    }
}
