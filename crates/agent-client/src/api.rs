//! Collaborator REST endpoints around the streaming core.
//!
//! Memory inspection, provider management and health checks are plain
//! request/response calls, orthogonal to the event stream. Failures here
//! are logged and returned to the caller; they never touch an in-flight
//! turn.

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::client::AgentClient;
use crate::errors::ClientError;

/// Health probe response.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

/// One remembered exchange entry, as the backend reports it (content may
/// be truncated server-side).
#[derive(Clone, Debug, serde::Deserialize)]
pub struct MemoryEntry {
    pub role: String,
    pub content: String,
}

/// Server-side memory snapshot for one session.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct MemoryStatus {
    pub session_id: String,
    pub message_count: u64,
    #[serde(default)]
    pub messages: Vec<MemoryEntry>,
}

/// Provider catalog as reported by the backend.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct ProviderCatalog {
    #[serde(default)]
    pub available_providers: Vec<String>,
    #[serde(default)]
    pub configured_providers: std::collections::BTreeMap<String, bool>,
    pub current_provider: String,
    pub default_provider: String,
}

impl AgentClient {
    /// Probes the backend.
    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        self.get_json(self.inner.config.health_url()).await
    }

    /// Fetches the backend's memory snapshot for `session_id`.
    pub async fn memory_status(&self, session_id: &str) -> Result<MemoryStatus, ClientError> {
        self.get_json(self.inner.config.memory_status_url(session_id))
            .await
    }

    /// Clears the backend's memory for `session_id`.
    pub async fn clear_memory(&self, session_id: &str) -> Result<(), ClientError> {
        let url = self.inner.config.memory_clear_url(session_id);
        let response = self
            .inner
            .http
            .delete(&url)
            .send()
            .await
            .map_err(|e| self.request_failed(&url, e))?;
        self.check_status(&url, response).await.map(|_| ())
    }

    /// Lists providers and their configuration state.
    pub async fn providers(&self) -> Result<ProviderCatalog, ClientError> {
        self.get_json(self.inner.config.providers_url()).await
    }

    /// Switches the backend's active provider.
    ///
    /// Rejected while a turn is running, mirroring the backend's own lock.
    pub async fn switch_provider(&self, provider: &str) -> Result<(), ClientError> {
        if provider.trim().is_empty() {
            return Err(ClientError::Validation("provider must not be empty".into()));
        }
        if self.is_turn_active() {
            return Err(ClientError::TurnActive);
        }

        let url = self.inner.config.provider_switch_url();
        let response = self
            .inner
            .http
            .post(&url)
            .json(&serde_json::json!({ "provider": provider }))
            .send()
            .await
            .map_err(|e| self.request_failed(&url, e))?;
        self.check_status(&url, response).await.map(|_| ())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, ClientError> {
        let response = self
            .inner
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| self.request_failed(&url, e))?;
        let text = self.check_status(&url, response).await?;
        serde_json::from_str(&text)
            .map_err(|e| ClientError::Http(format!("failed to parse response from {url}: {e}")))
    }

    async fn check_status(
        &self,
        url: &str,
        response: reqwest::Response,
    ) -> Result<String, ClientError> {
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ClientError::Http(e.to_string()))?;
        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "collaborator endpoint rejected request");
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: text,
            });
        }
        Ok(text)
    }

    fn request_failed(&self, url: &str, error: reqwest::Error) -> ClientError {
        warn!(%url, error = %error, "collaborator request failed");
        ClientError::Http(error.to_string())
    }
}
