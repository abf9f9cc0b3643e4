use crate::conversation::Conversation;

/// One client-side conversation: a stable wire id plus the reduced log.
///
/// The id travels with every chat request so the backend can associate its
/// own memory with the conversation. Resetting issues a fresh id, so the
/// backend sees a brand-new conversation afterwards.
#[derive(Debug)]
pub struct ChatSession {
    id: String,
    conversation: Conversation,
}

impl ChatSession {
    /// Creates a session with a fresh random id.
    pub fn new() -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string())
    }

    /// Creates a session with a caller-chosen wire id.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            conversation: Conversation::new(),
        }
    }

    /// The session id sent on the wire.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// True once the user has said anything in this session.
    pub fn is_active(&self) -> bool {
        self.conversation.is_active()
    }

    /// The reduced conversation log.
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Mutable access for reduction and user input.
    pub fn conversation_mut(&mut self) -> &mut Conversation {
        &mut self.conversation
    }

    /// Clears the log and issues a fresh id; the old history is gone.
    pub fn reset(&mut self) {
        self.id = uuid::Uuid::new_v4().to_string();
        self.conversation.reset();
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}
