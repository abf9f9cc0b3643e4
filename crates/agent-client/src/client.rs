use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::ClientConfig;
use crate::errors::ClientError;
use crate::session::ChatSession;
use crate::transport::{HttpTransport, Transport, TurnRequest};
use crate::turn::{TurnGuard, TurnStream, spawn_turn};

/// Client for a remote reasoning agent speaking the streaming chat
/// protocol.
///
/// Cheap to clone; clones share the transport, the HTTP client and the
/// turn-active flag.
#[derive(Clone)]
pub struct AgentClient {
    pub(crate) inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) http: reqwest::Client,
    pub(crate) config: ClientConfig,
    pub(crate) turn_active: Arc<AtomicBool>,
}

/// Per-turn options.
#[derive(Clone, Debug, Default)]
pub struct TurnOptions {
    /// Optional provider override for this turn.
    pub provider: Option<String>,
}

impl TurnOptions {
    /// Asks the backend to answer this turn with a specific provider.
    pub fn provider(mut self, name: impl Into<String>) -> Self {
        self.provider = Some(name.into());
        self
    }
}

impl AgentClient {
    /// Starts a builder for creating a client.
    pub fn builder() -> AgentClientBuilder {
        AgentClientBuilder::default()
    }

    /// The active configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// True while a turn supervisor is running on this client.
    pub fn is_turn_active(&self) -> bool {
        self.inner.turn_active.load(Ordering::SeqCst)
    }

    /// Starts one streaming turn for `session`.
    ///
    /// The user message is recorded on the session before the request goes
    /// out, so the log shows it even if the connection never comes up.
    /// Exactly one turn may run at a time per client.
    pub fn start_turn(
        &self,
        session: &mut ChatSession,
        message: impl Into<String>,
    ) -> Result<TurnStream, ClientError> {
        self.start_turn_with(session, message, TurnOptions::default())
    }

    /// Starts one streaming turn with per-turn options.
    pub fn start_turn_with(
        &self,
        session: &mut ChatSession,
        message: impl Into<String>,
        options: TurnOptions,
    ) -> Result<TurnStream, ClientError> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(ClientError::Validation("message must not be empty".into()));
        }
        let guard =
            TurnGuard::acquire(&self.inner.turn_active).ok_or(ClientError::TurnActive)?;

        session.conversation_mut().push_user(message.clone());
        let request = TurnRequest {
            message,
            session_id: session.id().to_string(),
            provider: options.provider,
        };
        Ok(spawn_turn(
            self.inner.transport.clone(),
            request,
            self.inner.config.retry.clone(),
            self.inner.config.stream_buffer_capacity,
            guard,
        ))
    }
}

/// Builder for [`AgentClient`].
pub struct AgentClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
}

impl Default for AgentClientBuilder {
    fn default() -> Self {
        Self {
            config: ClientConfig::default(),
            transport: None,
        }
    }
}

impl AgentClientBuilder {
    /// Replaces the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides the endpoint base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    /// Overrides the reconnect policy.
    pub fn retry_policy(mut self, policy: crate::retry::RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    /// Replaces the wire transport. Used by tests and embeddings that
    /// bring their own stream source.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Validates the configuration and builds the client.
    pub fn build(self) -> Result<AgentClient, ClientError> {
        if self.config.base_url.trim().is_empty() {
            return Err(ClientError::Config("base_url must not be empty".into()));
        }
        if self.config.stream_buffer_capacity == 0 {
            return Err(ClientError::Config(
                "stream_buffer_capacity must be greater than 0".into(),
            ));
        }

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(self.config.clone())?),
        };
        let http = reqwest::Client::builder()
            .connect_timeout(self.config.connect_timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build http client: {e}")))?;

        Ok(AgentClient {
            inner: Arc::new(ClientInner {
                transport,
                http,
                config: self.config,
                turn_active: Arc::new(AtomicBool::new(false)),
            }),
        })
    }
}
