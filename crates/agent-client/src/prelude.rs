//! Common imports for typical client usage.
//!
//! This module intentionally exports the most frequently used types so
//! examples and application code need fewer import lines.
pub use crate::{
    AbortHandle, AgentClient, AgentClientBuilder, AgentEvent, ChatSession, ClientConfig,
    ClientError, ConnectionState, Conversation, Message, MessageKind, RetryPolicy, TurnEvent,
    TurnFailure, TurnOptions, TurnOutcome, TurnStream,
};
