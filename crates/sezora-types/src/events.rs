use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Application, Conversation, Job, Message, User};

/// Tables the store publishes change events for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Users,
    Jobs,
    Applications,
    Messages,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
}

/// The committed row carried by a change event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "table", content = "row", rename_all = "lowercase")]
pub enum Record {
    Users(User),
    Jobs(Job),
    Applications(Application),
    Messages(Message),
}

impl Record {
    pub fn table(&self) -> Table {
        match self {
            Self::Users(_) => Table::Users,
            Self::Jobs(_) => Table::Jobs,
            Self::Applications(_) => Table::Applications,
            Self::Messages(_) => Table::Messages,
        }
    }

    /// Value of a column in its stored string form, for filter matching.
    /// Unknown columns yield `None` and never match.
    pub fn column(&self, name: &str) -> Option<String> {
        match self {
            Self::Users(u) => match name {
                "id" => Some(u.id.to_string()),
                "email" => Some(u.email.clone()),
                "user_type" => Some(u.user_type.to_string()),
                _ => None,
            },
            Self::Jobs(j) => match name {
                "id" => Some(j.id.to_string()),
                "employer_id" => Some(j.employer_id.to_string()),
                "status" => Some(j.status.to_string()),
                _ => None,
            },
            Self::Applications(a) => match name {
                "id" => Some(a.id.to_string()),
                "job_id" => Some(a.job_id.to_string()),
                "student_id" => Some(a.student_id.to_string()),
                "status" => Some(a.status.to_string()),
                _ => None,
            },
            Self::Messages(m) => match name {
                "id" => Some(m.id.to_string()),
                "sender_id" => Some(m.sender_id.to_string()),
                "receiver_id" => Some(m.receiver_id.to_string()),
                "conversation_id" => Some(m.conversation_id.to_string()),
                _ => None,
            },
        }
    }
}

/// One committed row change, published after the write succeeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub record: Record,
}

impl ChangeEvent {
    pub fn table(&self) -> Table {
        self.record.table()
    }
}

/// Events sent over the WebSocket gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayEvent {
    /// Server confirms successful authentication
    Ready { user_id: Uuid, name: String },

    /// Full conversation list, sent after Ready and after every reload
    Conversations { conversations: Vec<Conversation> },

    /// A new message landed in one of the session's conversations
    MessageCreate { message: Message },
}

/// Commands sent FROM client TO server over WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayCommand {
    /// Authenticate the WebSocket connection
    Identify { token: String },

    /// Rebuild the conversation list from the store
    Reload,
}
