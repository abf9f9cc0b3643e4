use std::time::Duration;

use crate::retry::RetryPolicy;

const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Configuration for [`AgentClient`](crate::AgentClient).
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL of the agent endpoint.
    pub base_url: String,
    /// Timeout for connection establishment.
    pub connect_timeout: Duration,
    /// Optional whole-request timeout. Streaming turns usually leave this
    /// unset; mid-stream failures are the retry layer's job.
    pub request_timeout: Option<Duration>,
    /// Bounded event buffer between the turn task and the consumer.
    pub stream_buffer_capacity: usize,
    /// Reconnect policy for faulted streams.
    pub retry: RetryPolicy,
}

impl ClientConfig {
    /// Creates a config with sensible defaults and the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
            stream_buffer_capacity: 128,
            retry: RetryPolicy::default(),
        }
    }

    /// Builds a config from the environment.
    ///
    /// Reads `AGENT_BASE_URL` (default `http://localhost:5000`); `.env`
    /// files are honored.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let base_url = std::env::var("AGENT_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self::new(base_url)
    }

    /// Overrides the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets a whole-request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Overrides the event buffer size.
    pub fn stream_buffer_capacity(mut self, capacity: usize) -> Self {
        self.stream_buffer_capacity = capacity;
        self
    }

    /// Overrides the reconnect policy.
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub(crate) fn chat_url(&self) -> String {
        format!("{}/api/v1/chat", self.root())
    }

    pub(crate) fn health_url(&self) -> String {
        format!("{}/api/v1/health", self.root())
    }

    pub(crate) fn memory_status_url(&self, session_id: &str) -> String {
        format!("{}/api/v1/memory/status/{session_id}", self.root())
    }

    pub(crate) fn memory_clear_url(&self, session_id: &str) -> String {
        format!("{}/api/v1/memory/clear/{session_id}", self.root())
    }

    pub(crate) fn providers_url(&self) -> String {
        format!("{}/api/v1/llm/providers", self.root())
    }

    pub(crate) fn provider_switch_url(&self) -> String {
        format!("{}/api/v1/llm/switch", self.root())
    }

    fn root(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
