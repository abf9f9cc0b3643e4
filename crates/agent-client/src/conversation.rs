use std::collections::BTreeMap;
use std::time::SystemTime;

use crate::event::AgentEvent;

/// Role of a conversation entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageKind {
    /// Something the user submitted.
    UserText,
    /// The agent's answer text.
    AssistantText,
    /// Transient reasoning shown while the agent works.
    Thinking,
    /// A tool invocation issued by the agent.
    ToolCall,
    /// Output returned by a tool.
    ToolResult,
    /// Agent-loop annotation.
    Action,
    /// Agent-loop annotation.
    ActionInput,
    /// Agent-loop annotation.
    Observation,
    /// Agent-loop annotation.
    FinalAnswerHeader,
    /// A failure surfaced to the user.
    Error,
    /// A local notice not originating from the agent.
    System,
}

/// One entry in the conversation log.
#[derive(Clone, Debug)]
pub struct Message {
    /// Monotonic id, unique and ordered within one conversation.
    pub id: u64,
    pub kind: MessageKind,
    /// Accumulated text. Append-only while streaming, except tool-call
    /// frames which replace the pending invocation rendering.
    pub content: String,
    pub created_at: SystemTime,
    /// Display-transient entry, purged when its turn ends.
    pub is_ephemeral: bool,
    /// Entry is still receiving deltas.
    pub is_streaming: bool,
    /// Kind-specific annotations such as `tool_name`.
    pub metadata: BTreeMap<String, String>,
}

/// Ordered message log plus the open-entry pointers that drive reduction.
///
/// The wire protocol carries no correlation ids: deltas attach to the most
/// recently opened entry of the matching kind, so overlapping tool calls of
/// the same phase are not representable. The log has a single writer:
/// only [`Conversation::apply`] and the explicit push/fail helpers mutate
/// it.
#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    next_id: u64,
    open_thinking: Option<usize>,
    open_assistant: Option<usize>,
    open_tool_call: Option<usize>,
    open_tool_result: Option<usize>,
}

impl Conversation {
    /// Creates an empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries in display order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// True once the user has said anything in this conversation.
    pub fn is_active(&self) -> bool {
        self.messages
            .iter()
            .any(|m| m.kind == MessageKind::UserText)
    }

    /// Records a user submission as a closed entry.
    pub fn push_user(&mut self, text: impl Into<String>) {
        let idx = self.push_message(MessageKind::UserText, false, false);
        self.messages[idx].content = text.into();
    }

    /// Records a local notice as a closed entry.
    pub fn push_system(&mut self, text: impl Into<String>) {
        let idx = self.push_message(MessageKind::System, false, false);
        self.messages[idx].content = text.into();
    }

    /// Applies one stream event to the log.
    ///
    /// Append-type events with no open target of the expected kind create
    /// it lazily; close-type events with no open target are no-ops;
    /// unrecognized kinds are ignored.
    pub fn apply(&mut self, event: &AgentEvent) {
        match event {
            AgentEvent::ThinkingStart => {
                self.close_thinking();
                let idx = self.push_message(MessageKind::Thinking, true, true);
                self.open_thinking = Some(idx);
            }
            AgentEvent::Thinking { token } => {
                let idx = self.ensure_thinking();
                self.messages[idx].content.push_str(token);
            }
            AgentEvent::ThinkingEnd => {
                self.close_thinking();
                // Answer text follows the reasoning phase immediately.
                self.ensure_assistant();
            }
            AgentEvent::Response { token } => {
                let idx = self.ensure_assistant();
                self.messages[idx].content.push_str(token);
            }
            AgentEvent::ToolCallStart {
                tool_name,
                parameters,
            } => {
                self.close_tool_call();
                let idx = self.push_message(MessageKind::ToolCall, false, true);
                self.open_tool_call = Some(idx);
                self.merge_metadata(idx, "tool_name", tool_name.as_deref());
                self.merge_metadata(idx, "parameters", parameters.as_deref());
            }
            AgentEvent::ToolCall { token, parameters } => {
                let idx = self.ensure_tool_call();
                self.messages[idx].content = token.clone();
                self.merge_metadata(idx, "parameters", parameters.as_deref());
            }
            AgentEvent::ToolCallEnd => self.close_tool_call(),
            AgentEvent::ToolResultStart { tool_name } => {
                self.close_tool_result();
                let idx = self.push_message(MessageKind::ToolResult, false, true);
                self.open_tool_result = Some(idx);
                self.merge_metadata(idx, "tool_name", tool_name.as_deref());
            }
            AgentEvent::ToolResult { token } => {
                let idx = self.ensure_tool_result();
                self.messages[idx].content.push_str(token);
            }
            AgentEvent::ToolResultEnd => self.close_tool_result(),
            AgentEvent::Action { token } => self.push_annotation(MessageKind::Action, token),
            AgentEvent::ActionInput { token } => {
                self.push_annotation(MessageKind::ActionInput, token)
            }
            AgentEvent::Observation { token } => {
                self.push_annotation(MessageKind::Observation, token)
            }
            AgentEvent::FinalAnswerHeader { token } => {
                self.push_annotation(MessageKind::FinalAnswerHeader, token)
            }
            AgentEvent::Error { token } => self.fail_turn(token),
            AgentEvent::Complete => {
                if let Some(idx) = self.open_assistant.take() {
                    self.messages[idx].is_streaming = false;
                }
                self.purge_ephemeral();
            }
            AgentEvent::Unknown { .. } => {}
        }
    }

    /// Folds a turn failure into the log.
    ///
    /// Partial answer text already streamed stays in place: an open answer
    /// entry absorbs `text` and becomes an [`MessageKind::Error`] entry;
    /// otherwise a closed error entry is appended. The turn is over, so
    /// transient entries are purged as well.
    pub fn fail_turn(&mut self, text: &str) {
        if let Some(idx) = self.open_assistant.take() {
            let message = &mut self.messages[idx];
            message.content.push_str(text);
            message.kind = MessageKind::Error;
            message.is_streaming = false;
        } else {
            let idx = self.push_message(MessageKind::Error, false, false);
            self.messages[idx].content = text.to_string();
        }
        self.purge_ephemeral();
    }

    /// Drops every entry and open pointer; ids restart from zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn push_message(&mut self, kind: MessageKind, ephemeral: bool, streaming: bool) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        self.messages.push(Message {
            id,
            kind,
            content: String::new(),
            created_at: SystemTime::now(),
            is_ephemeral: ephemeral,
            is_streaming: streaming,
            metadata: BTreeMap::new(),
        });
        self.messages.len() - 1
    }

    fn push_annotation(&mut self, kind: MessageKind, token: &str) {
        let idx = self.push_message(kind, false, false);
        self.messages[idx].content = token.to_string();
    }

    fn merge_metadata(&mut self, idx: usize, key: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.messages[idx]
                .metadata
                .insert(key.to_string(), value.to_string());
        }
    }

    fn ensure_thinking(&mut self) -> usize {
        match self.open_thinking {
            Some(idx) => idx,
            None => {
                let idx = self.push_message(MessageKind::Thinking, true, true);
                self.open_thinking = Some(idx);
                idx
            }
        }
    }

    fn ensure_assistant(&mut self) -> usize {
        match self.open_assistant {
            Some(idx) => idx,
            None => {
                let idx = self.push_message(MessageKind::AssistantText, false, true);
                self.open_assistant = Some(idx);
                idx
            }
        }
    }

    fn ensure_tool_call(&mut self) -> usize {
        match self.open_tool_call {
            Some(idx) => idx,
            None => {
                let idx = self.push_message(MessageKind::ToolCall, false, true);
                self.open_tool_call = Some(idx);
                idx
            }
        }
    }

    fn ensure_tool_result(&mut self) -> usize {
        match self.open_tool_result {
            Some(idx) => idx,
            None => {
                let idx = self.push_message(MessageKind::ToolResult, false, true);
                self.open_tool_result = Some(idx);
                idx
            }
        }
    }

    fn close_thinking(&mut self) {
        if let Some(idx) = self.open_thinking.take() {
            self.messages[idx].is_streaming = false;
        }
    }

    fn close_tool_call(&mut self) {
        if let Some(idx) = self.open_tool_call.take() {
            self.messages[idx].is_streaming = false;
        }
    }

    fn close_tool_result(&mut self) {
        if let Some(idx) = self.open_tool_result.take() {
            self.messages[idx].is_streaming = false;
        }
    }

    // Removal invalidates indices, so every open pointer is cleared with it.
    fn purge_ephemeral(&mut self) {
        self.open_thinking = None;
        self.open_assistant = None;
        self.open_tool_call = None;
        self.open_tool_result = None;
        self.messages.retain(|m| !m.is_ephemeral);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply_all(conversation: &mut Conversation, events: &[AgentEvent]) {
        for event in events {
            conversation.apply(event);
        }
    }

    fn thinking(token: &str) -> AgentEvent {
        AgentEvent::Thinking {
            token: token.to_string(),
        }
    }

    fn response(token: &str) -> AgentEvent {
        AgentEvent::Response {
            token: token.to_string(),
        }
    }

    /// Semantic view of a message, ignoring the wall-clock timestamp.
    fn snapshot(
        conversation: &Conversation,
    ) -> Vec<(u64, MessageKind, String, bool, bool, BTreeMap<String, String>)> {
        conversation
            .messages()
            .iter()
            .map(|m| {
                (
                    m.id,
                    m.kind,
                    m.content.clone(),
                    m.is_ephemeral,
                    m.is_streaming,
                    m.metadata.clone(),
                )
            })
            .collect()
    }

    #[test]
    fn thinking_entries_disappear_after_completion() {
        let mut conversation = Conversation::new();
        apply_all(
            &mut conversation,
            &[
                AgentEvent::ThinkingStart,
                thinking("a"),
                AgentEvent::ThinkingEnd,
                response("hi"),
                AgentEvent::Complete,
            ],
        );

        assert!(
            conversation
                .messages()
                .iter()
                .all(|m| m.kind != MessageKind::Thinking)
        );
        let answers: Vec<_> = conversation
            .messages()
            .iter()
            .filter(|m| m.kind == MessageKind::AssistantText)
            .collect();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].content, "hi");
        assert!(!answers[0].is_streaming);
    }

    #[test]
    fn full_turn_scenario_yields_exactly_the_final_entries() {
        let mut conversation = Conversation::new();
        apply_all(
            &mut conversation,
            &[
                AgentEvent::ThinkingStart,
                thinking("eval"),
                AgentEvent::ThinkingEnd,
                AgentEvent::ToolCallStart {
                    tool_name: Some("Weather".to_string()),
                    parameters: None,
                },
                AgentEvent::ToolCall {
                    token: "Paris".to_string(),
                    parameters: None,
                },
                AgentEvent::ToolCallEnd,
                AgentEvent::ToolResultStart { tool_name: None },
                AgentEvent::ToolResult {
                    token: "23C".to_string(),
                },
                AgentEvent::ToolResultEnd,
                response("It's 23C"),
                AgentEvent::Complete,
            ],
        );

        let messages = conversation.messages();
        assert_eq!(messages.len(), 3);
        assert!(messages.iter().all(|m| !m.is_streaming));
        assert!(messages.iter().all(|m| m.kind != MessageKind::Thinking));

        let find = |kind: MessageKind| {
            let mut hits = messages.iter().filter(|m| m.kind == kind);
            let hit = hits.next().expect("entry of kind present");
            assert!(hits.next().is_none(), "exactly one entry of {kind:?}");
            hit
        };

        let tool_call = find(MessageKind::ToolCall);
        assert_eq!(tool_call.content, "Paris");
        assert_eq!(
            tool_call.metadata.get("tool_name").map(String::as_str),
            Some("Weather")
        );

        assert_eq!(find(MessageKind::ToolResult).content, "23C");
        assert_eq!(find(MessageKind::AssistantText).content, "It's 23C");
    }

    #[test]
    fn same_event_sequence_reduces_identically_from_fresh_state() {
        let events = vec![
            AgentEvent::ThinkingStart,
            thinking("t"),
            AgentEvent::ThinkingEnd,
            AgentEvent::ToolCallStart {
                tool_name: Some("Time".to_string()),
                parameters: None,
            },
            AgentEvent::ToolCall {
                token: "Lisbon".to_string(),
                parameters: Some("{\"city\":\"Lisbon\"}".to_string()),
            },
            AgentEvent::ToolCallEnd,
            response("14:00"),
            AgentEvent::Complete,
        ];

        let mut first = Conversation::new();
        let mut second = Conversation::new();
        apply_all(&mut first, &events);
        apply_all(&mut second, &events);

        assert_eq!(snapshot(&first), snapshot(&second));
    }

    #[test]
    fn response_without_thinking_phase_opens_answer_lazily() {
        let mut conversation = Conversation::new();
        apply_all(&mut conversation, &[response("direct"), response(" answer")]);

        let messages = conversation.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].kind, MessageKind::AssistantText);
        assert_eq!(messages[0].content, "direct answer");
        assert!(messages[0].is_streaming);
    }

    #[test]
    fn append_events_without_open_target_create_it_lazily() {
        let mut conversation = Conversation::new();
        apply_all(
            &mut conversation,
            &[
                thinking("stray"),
                AgentEvent::ToolResult {
                    token: "out".to_string(),
                },
            ],
        );

        let messages = conversation.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].kind, MessageKind::Thinking);
        assert!(messages[0].is_ephemeral);
        assert_eq!(messages[1].kind, MessageKind::ToolResult);
        assert_eq!(messages[1].content, "out");
    }

    #[test]
    fn close_events_without_open_target_are_no_ops() {
        let mut conversation = Conversation::new();
        apply_all(
            &mut conversation,
            &[AgentEvent::ToolCallEnd, AgentEvent::ToolResultEnd],
        );
        assert!(conversation.messages().is_empty());
    }

    #[test]
    fn tool_call_deltas_replace_and_merge_metadata() {
        let mut conversation = Conversation::new();
        apply_all(
            &mut conversation,
            &[
                AgentEvent::ToolCallStart {
                    tool_name: Some("Weather".to_string()),
                    parameters: None,
                },
                AgentEvent::ToolCall {
                    token: "Par".to_string(),
                    parameters: None,
                },
                AgentEvent::ToolCall {
                    token: "Paris".to_string(),
                    parameters: Some("{\"city\":\"Paris\"}".to_string()),
                },
            ],
        );

        let messages = conversation.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "Paris");
        assert_eq!(
            messages[0].metadata.get("tool_name").map(String::as_str),
            Some("Weather")
        );
        assert_eq!(
            messages[0].metadata.get("parameters").map(String::as_str),
            Some("{\"city\":\"Paris\"}")
        );
    }

    #[test]
    fn tool_pairing_attaches_to_most_recently_opened_entry() {
        let mut conversation = Conversation::new();
        apply_all(
            &mut conversation,
            &[
                AgentEvent::ToolResultStart { tool_name: None },
                AgentEvent::ToolResult {
                    token: "first".to_string(),
                },
                AgentEvent::ToolResultStart { tool_name: None },
                AgentEvent::ToolResult {
                    token: "second".to_string(),
                },
            ],
        );

        let messages = conversation.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "first");
        assert!(!messages[0].is_streaming);
        assert_eq!(messages[1].content, "second");
        assert!(messages[1].is_streaming);
    }

    #[test]
    fn backend_error_absorbs_the_open_answer() {
        let mut conversation = Conversation::new();
        apply_all(
            &mut conversation,
            &[
                response("partial "),
                AgentEvent::Error {
                    token: "boom".to_string(),
                },
            ],
        );

        let messages = conversation.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].kind, MessageKind::Error);
        assert_eq!(messages[0].content, "partial boom");
        assert!(!messages[0].is_streaming);
    }

    #[test]
    fn backend_error_without_open_answer_appends_a_closed_entry() {
        let mut conversation = Conversation::new();
        conversation.apply(&AgentEvent::Error {
            token: "boom".to_string(),
        });

        let messages = conversation.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].kind, MessageKind::Error);
        assert_eq!(messages[0].content, "boom");
    }

    #[test]
    fn annotations_land_as_closed_entries() {
        let mut conversation = Conversation::new();
        apply_all(
            &mut conversation,
            &[
                AgentEvent::Action {
                    token: "look up weather".to_string(),
                },
                AgentEvent::Observation {
                    token: "sunny".to_string(),
                },
            ],
        );

        let messages = conversation.messages();
        assert_eq!(messages[0].kind, MessageKind::Action);
        assert!(!messages[0].is_streaming);
        assert_eq!(messages[1].kind, MessageKind::Observation);
        assert_eq!(messages[1].content, "sunny");
    }

    #[test]
    fn unknown_kinds_are_ignored() {
        let mut conversation = Conversation::new();
        conversation.apply(&AgentEvent::Unknown {
            kind: "usage_report".to_string(),
        });
        assert!(conversation.messages().is_empty());
    }

    #[test]
    fn activity_is_derived_from_user_entries() {
        let mut conversation = Conversation::new();
        assert!(!conversation.is_active());
        conversation.apply(&response("hello"));
        assert!(!conversation.is_active());
        conversation.push_user("hi");
        assert!(conversation.is_active());
    }

    #[test]
    fn reset_clears_entries_and_restarts_ids() {
        let mut conversation = Conversation::new();
        conversation.push_user("hi");
        conversation.apply(&response("there"));
        conversation.reset();

        assert!(conversation.messages().is_empty());
        assert!(!conversation.is_active());
        conversation.push_user("again");
        assert_eq!(conversation.messages()[0].id, 0);
    }

    #[test]
    fn failed_turn_keeps_partial_answer_and_purges_transients() {
        let mut conversation = Conversation::new();
        apply_all(
            &mut conversation,
            &[AgentEvent::ThinkingStart, thinking("t"), response("part")],
        );
        conversation.fail_turn(" [connection lost]");

        let messages = conversation.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].kind, MessageKind::Error);
        assert_eq!(messages[0].content, "part [connection lost]");
    }
}
