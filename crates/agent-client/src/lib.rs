//! Streaming client core for a remote reasoning agent.
//!
//! The agent answers over a single long-lived HTTP response as a sequence
//! of typed events (thinking tokens, tool invocations, tool results,
//! answer tokens). This crate owns the client side of that stream: framing
//! raw body chunks into events, supervising the connection with bounded
//! jitter-free exponential backoff, and reducing the event sequence into
//! an ordered conversation log with deterministic transient-entry cleanup.
//!
//! # Streaming usage
//!
//! ```no_run
//! use agent_client::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), ClientError> {
//! let client = AgentClient::builder()
//!     .config(ClientConfig::new("http://localhost:5000"))
//!     .build()?;
//!
//! let mut session = ChatSession::new();
//! let mut turn = client.start_turn(&mut session, "What's the weather in Paris?")?;
//! let outcome = turn.drive(session.conversation_mut()).await;
//! println!("turn ended: {outcome:?}");
//!
//! for message in session.conversation().messages() {
//!     println!("[{:?}] {}", message.kind, message.content);
//! }
//! # Ok(())
//! # }
//! ```

/// Collaborator REST endpoints (health, memory, provider catalog).
pub mod api;
/// Client entry point and builder.
pub mod client;
/// Client configuration.
pub mod config;
/// Message-lifecycle reducer and conversation log.
pub mod conversation;
/// Incremental frame decoding.
pub mod decode;
/// Public error types.
pub mod errors;
/// Wire-level event model.
pub mod event;
/// Process-wide logging setup.
pub mod observability;
/// Common imports for typical usage.
pub mod prelude;
/// Reconnect policy and connectivity states.
pub mod retry;
/// Conversation session state.
pub mod session;
/// Streaming transport seam and HTTP implementation.
pub mod transport;
/// Turn supervision and the consumer stream.
pub mod turn;

pub use api::{HealthStatus, MemoryEntry, MemoryStatus, ProviderCatalog};
pub use client::{AgentClient, AgentClientBuilder, TurnOptions};
pub use config::ClientConfig;
pub use conversation::{Conversation, Message, MessageKind};
pub use decode::FrameDecoder;
pub use errors::{ClientError, DecodeError, TransportFault, TurnFailure};
pub use event::AgentEvent;
pub use observability::init_observability;
pub use retry::{ConnectionState, RetryPolicy};
pub use session::ChatSession;
pub use transport::{EventStream, HttpTransport, Transport, TransportHandle, TurnRequest};
pub use turn::{AbortHandle, TurnEvent, TurnOutcome, TurnStream};
