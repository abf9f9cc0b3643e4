use crate::errors::DecodeError;

/// One decoded event from the agent's response stream.
///
/// Every wire frame carries a `type` tag; tags this client does not know
/// are preserved as [`AgentEvent::Unknown`] so protocol extensions pass
/// through without breaking reduction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AgentEvent {
    /// The agent entered its reasoning phase.
    ThinkingStart,
    /// Incremental reasoning text.
    Thinking { token: String },
    /// The reasoning phase ended; answer text follows.
    ThinkingEnd,
    /// Incremental answer text.
    Response { token: String },
    /// A tool invocation opened.
    ToolCallStart {
        tool_name: Option<String>,
        parameters: Option<String>,
    },
    /// Current rendering of the pending tool invocation. Replaces the
    /// previous rendering rather than appending to it.
    ToolCall {
        token: String,
        parameters: Option<String>,
    },
    /// The pending tool invocation is final.
    ToolCallEnd,
    /// A tool result started streaming.
    ToolResultStart { tool_name: Option<String> },
    /// Incremental tool result text.
    ToolResult { token: String },
    /// The pending tool result is final.
    ToolResultEnd,
    /// Single-shot agent-loop annotation.
    Action { token: String },
    /// Single-shot agent-loop annotation.
    ActionInput { token: String },
    /// Single-shot agent-loop annotation.
    Observation { token: String },
    /// Single-shot agent-loop annotation.
    FinalAnswerHeader { token: String },
    /// Backend-reported failure text.
    Error { token: String },
    /// Terminal event for the turn.
    Complete,
    /// Unrecognized event kind, carried through for forward compatibility.
    Unknown { kind: String },
}

impl AgentEvent {
    /// Decodes one frame payload.
    pub(crate) fn from_json_str(payload: &str) -> Result<Self, DecodeError> {
        let value: serde_json::Value = serde_json::from_str(payload)
            .map_err(|e| DecodeError::new(format!("invalid JSON payload: {e}")))?;
        Self::from_value(&value)
    }

    /// Resolves a parsed frame payload to an event.
    ///
    /// Field lookup is by convention per kind; a missing `token` decodes as
    /// the empty string.
    pub(crate) fn from_value(value: &serde_json::Value) -> Result<Self, DecodeError> {
        let Some(kind) = value.get("type").and_then(|v| v.as_str()) else {
            return Err(DecodeError::new("frame payload has no `type` field"));
        };
        Ok(match kind {
            "thinking_start" => Self::ThinkingStart,
            "thinking" => Self::Thinking {
                token: string_field(value, "token"),
            },
            "thinking_end" => Self::ThinkingEnd,
            "response" => Self::Response {
                token: string_field(value, "token"),
            },
            "tool_call_start" => Self::ToolCallStart {
                tool_name: opt_string_field(value, "tool_name"),
                parameters: opt_string_field(value, "parameters"),
            },
            "tool_call" => Self::ToolCall {
                token: string_field(value, "token"),
                parameters: opt_string_field(value, "parameters"),
            },
            "tool_call_end" => Self::ToolCallEnd,
            "tool_result_start" => Self::ToolResultStart {
                tool_name: opt_string_field(value, "tool_name"),
            },
            "tool_result" => Self::ToolResult {
                token: string_field(value, "token"),
            },
            "tool_result_end" => Self::ToolResultEnd,
            "action" => Self::Action {
                token: string_field(value, "token"),
            },
            "action_input" => Self::ActionInput {
                token: string_field(value, "token"),
            },
            "observation" => Self::Observation {
                token: string_field(value, "token"),
            },
            "final_answer_header" => Self::FinalAnswerHeader {
                token: string_field(value, "token"),
            },
            "error" => Self::Error {
                token: string_field(value, "token"),
            },
            "complete" => Self::Complete,
            other => Self::Unknown {
                kind: other.to_string(),
            },
        })
    }
}

fn string_field(value: &serde_json::Value, key: &str) -> String {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

fn opt_string_field(value: &serde_json::Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .map(ToOwned::to_owned)
}
