use crate::configs::sample_specifications;
use client_context::{
    ClientContext, ClientError, ClientProperties, PropertiesError, PropertiesLoader,
    RequestTemplate,
};
use scope_framework::ScopeName;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument};

pub const DEFAULT_INVENTORY_TOKEN: &str = "inventory-demo-token";

#[derive(Debug, Error)]
pub enum SystemError {
    #[error(transparent)]
    Properties(#[from] PropertiesError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Warm-up task failed: {0}")]
    Task(String),
}

/// The runtime orchestrator for the sample's named clients.
///
/// `ClientSystem` is responsible for:
/// - **Wiring**: building the [`ClientContext`] with the sample specifications
/// - **Warm-up**: building every configured client's scope up front, concurrently
/// - **Shutdown**: closing every client scope
///
/// # Example
///
/// ```ignore
/// let system = ClientSystem::load(&PropertiesLoader::new())?;
/// system.warm().await?;
/// let request = system.prepare("billing", RequestTemplate::post("/invoices"), &invoice)?;
/// system.shutdown();
/// ```
pub struct ClientSystem {
    context: Arc<ClientContext>,
}

impl ClientSystem {
    pub fn new(properties: ClientProperties) -> Self {
        Self::with_token(properties, DEFAULT_INVENTORY_TOKEN)
    }

    pub fn with_token(properties: ClientProperties, inventory_token: &str) -> Self {
        let context = ClientContext::builder(properties)
            .specifications(sample_specifications(inventory_token))
            .build();
        Self {
            context: Arc::new(context),
        }
    }

    /// Loads properties, then builds the system.
    pub fn load(loader: &PropertiesLoader) -> Result<Self, SystemError> {
        Ok(Self::new(loader.load()?))
    }

    pub fn context(&self) -> &Arc<ClientContext> {
        &self.context
    }

    /// Builds the scope of every client named in the properties.
    ///
    /// Scope builds run user code synchronously, so each one runs on the
    /// blocking pool.
    #[instrument(skip(self))]
    pub async fn warm(&self) -> Result<Vec<ScopeName>, SystemError> {
        let names: Vec<String> = self
            .context
            .properties()
            .client_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        info!(clients = names.len(), "Warming clients");

        let handles: Vec<_> = names
            .into_iter()
            .map(|name| {
                let context = self.context.clone();
                tokio::task::spawn_blocking(move || {
                    context
                        .registry()
                        .resolve_scope(&name)
                        .map(|scope| scope.name().clone())
                })
            })
            .collect();

        let mut warmed = Vec::with_capacity(handles.len());
        for handle in handles {
            let scope = handle.await.map_err(|e| {
                error!(error = %e, "Warm-up task failed");
                SystemError::Task(e.to_string())
            })?;
            warmed.push(scope.map_err(ClientError::from)?);
        }
        Ok(warmed)
    }

    /// Encodes `body` and applies interceptors with the components of `client`.
    pub fn prepare<B: Serialize>(
        &self,
        client: &str,
        template: RequestTemplate,
        body: &B,
    ) -> Result<RequestTemplate, SystemError> {
        Ok(self.context.prepare_request(client, template, Some(body))?)
    }

    /// Closes every client scope.
    pub fn shutdown(self) {
        info!(clients = self.context.context_names().len(), "Shutting down clients...");
        self.context.close();
        info!("Client shutdown complete.");
    }
}
