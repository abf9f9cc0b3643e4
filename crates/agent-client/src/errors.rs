/// Signal raised when one wire frame cannot be decoded.
///
/// Decode failures stop at the decoder boundary: the offending frame is
/// dropped, the stream continues.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed frame: {reason}")]
pub struct DecodeError {
    /// Human-readable reason the frame was dropped.
    pub reason: String,
}

impl DecodeError {
    pub(crate) fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Failure of one streaming transport attempt.
///
/// Faults feed the reconnect policy; they are not surfaced to the consumer
/// unless the retry budget runs out.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportFault {
    /// The request could not be issued or the connection dropped before a
    /// response arrived.
    #[error("connect failed: {message}")]
    Connect { message: String },
    /// The endpoint answered with a non-success status before any event was
    /// produced.
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    /// The response body failed mid-stream.
    #[error("stream read failed: {message}")]
    Read { message: String },
}

impl TransportFault {
    /// Creates a connect-phase fault.
    pub fn connect(message: impl Into<String>) -> Self {
        Self::Connect {
            message: message.into(),
        }
    }

    /// Creates a rejected-status fault.
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// Creates a mid-stream read fault.
    pub fn read(message: impl Into<String>) -> Self {
        Self::Read {
            message: message.into(),
        }
    }
}

/// Terminal failure for a turn, delivered through `TurnEvent::Failed`.
///
/// Cancellation is deliberately absent: an aborted turn ends silently.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TurnFailure {
    /// Every reconnect attempt allowed by the retry policy has been spent.
    #[error("connection lost after {attempts} reconnect attempts: {last}")]
    RetryExhausted {
        attempts: u32,
        #[source]
        last: TransportFault,
    },
}

/// Top-level error type for the public client API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// Invalid client configuration.
    #[error("config error: {0}")]
    Config(String),
    /// Invalid caller input.
    #[error("validation error: {0}")]
    Validation(String),
    /// A turn is already running on this client.
    #[error("a turn is already active")]
    TurnActive,
    /// A collaborator HTTP request could not be completed.
    #[error("http error: {0}")]
    Http(String),
    /// A collaborator endpoint answered with an error status.
    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },
}
