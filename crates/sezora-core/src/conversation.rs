use sezora_types::conversation::ConversationId;
use sezora_types::models::{Conversation, Message};

/// Outcome of appending a delivered message to a session's conversations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Append {
    Appended,
    /// No conversation with that id is loaded; nothing changed.
    UnknownConversation,
    /// The message is already in the history (it was part of a reload).
    Duplicate,
}

/// The conversations one session is looking at, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationList {
    conversations: Vec<Conversation>,
}

impl ConversationList {
    pub fn new(conversations: Vec<Conversation>) -> Self {
        Self { conversations }
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Conversation> {
        self.conversations.iter()
    }

    pub fn get(&self, id: &ConversationId) -> Option<&Conversation> {
        self.conversations.iter().find(|c| &c.id == id)
    }

    pub fn contains(&self, id: &ConversationId) -> bool {
        self.get(id).is_some()
    }

    /// Add `message` at the tail of its conversation. Earlier messages are
    /// never reordered.
    pub fn append(&mut self, message: Message) -> Append {
        let Some(conversation) = self
            .conversations
            .iter_mut()
            .find(|c| c.id == message.conversation_id)
        else {
            return Append::UnknownConversation;
        };

        if conversation.messages.iter().any(|m| m.id == message.id) {
            return Append::Duplicate;
        }

        conversation.messages.push(message);
        Append::Appended
    }

    /// Swap in a freshly loaded list.
    pub fn replace(&mut self, fresh: ConversationList) {
        *self = fresh;
    }

    pub fn as_slice(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn into_vec(self) -> Vec<Conversation> {
        self.conversations
    }
}
