use std::collections::VecDeque;
use std::pin::Pin;

use futures::StreamExt as _;
use futures::stream;
use tracing::debug;

use crate::config::ClientConfig;
use crate::decode::FrameDecoder;
use crate::errors::{ClientError, TransportFault};
use crate::event::AgentEvent;

/// Boxed stream of decoded events for one transport session.
///
/// Yields `Err` at most once (the session fault) and ends after it; a plain
/// end of stream is a graceful close. Dropping the stream cancels the
/// underlying request promptly without producing anything further.
pub type EventStream =
    Pin<Box<dyn futures::Stream<Item = Result<AgentEvent, TransportFault>> + Send + 'static>>;

type ByteStream =
    Pin<Box<dyn futures::Stream<Item = Result<bytes::Bytes, TransportFault>> + Send + 'static>>;

/// Handle for one open transport session.
pub struct TransportHandle {
    /// Decoded events in wire order.
    pub stream: EventStream,
}

/// Wire request for one turn.
#[derive(Clone, Debug, serde::Serialize)]
pub struct TurnRequest {
    /// The user message for this turn.
    pub message: String,
    /// Stable conversation id on the wire.
    pub session_id: String,
    /// Optional provider override for this turn.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

/// Seam between the retry layer and the wire.
///
/// Exactly one session is open per turn at a time; the retry layer drops a
/// faulted handle before opening the next one.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Opens one streaming session for `request`.
    ///
    /// A non-success response is a fault before any event is produced.
    async fn open(&self, request: &TurnRequest) -> Result<TransportHandle, TransportFault>;
}

/// HTTP transport speaking the agent's line-delimited chat protocol.
pub struct HttpTransport {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpTransport {
    /// Creates a transport for the configured endpoint.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder().connect_timeout(config.connect_timeout);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build http client: {e}")))?;
        Ok(Self { client, config })
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn open(&self, request: &TurnRequest) -> Result<TransportHandle, TransportFault> {
        debug!(session_id = %request.session_id, "opening chat stream");
        let response = self
            .client
            .post(self.config.chat_url())
            .json(request)
            .send()
            .await
            .map_err(|e| TransportFault::connect(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(TransportFault::status(status.as_u16(), body));
        }

        let bytes: ByteStream = Box::pin(
            response
                .bytes_stream()
                .map(|item| item.map_err(|e| TransportFault::read(e.to_string()))),
        );
        Ok(TransportHandle {
            stream: event_stream(bytes),
        })
    }
}

/// Pulls body chunks through a [`FrameDecoder`], yielding one decoded event
/// at a time. End of body runs `flush()` so a trailing unterminated frame
/// is salvaged before the graceful close.
fn event_stream(bytes: ByteStream) -> EventStream {
    struct State {
        bytes: ByteStream,
        decoder: FrameDecoder,
        pending: VecDeque<AgentEvent>,
        done: bool,
    }

    Box::pin(stream::try_unfold(
        State {
            bytes,
            decoder: FrameDecoder::new(),
            pending: VecDeque::new(),
            done: false,
        },
        |mut state| async move {
            loop {
                if let Some(event) = state.pending.pop_front() {
                    return Ok(Some((event, state)));
                }
                if state.done {
                    return Ok(None);
                }

                match state.bytes.next().await {
                    Some(Ok(chunk)) => {
                        for event in state.decoder.feed(&chunk) {
                            state.pending.push_back(event);
                        }
                    }
                    Some(Err(fault)) => return Err(fault),
                    None => {
                        if let Some(event) = state.decoder.flush() {
                            state.pending.push_back(event);
                        }
                        state.done = true;
                    }
                }
            }
        },
    ))
}
