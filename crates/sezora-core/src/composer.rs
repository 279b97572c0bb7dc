use tracing::debug;
use uuid::Uuid;

use sezora_types::conversation::ConversationId;
use sezora_types::models::{Message, NewMessage};

use crate::error::{CoreError, Result};
use crate::policy::{self, Action};
use crate::session::Session;
use crate::store::MessageStore;

/// Validate and insert a message from the session user to `receiver_id`.
///
/// Content is trimmed and must not be empty; that check happens before the
/// store is touched. The caller's in-memory view is not updated here: the new
/// row reaches every subscribed view, the sender's included, through the
/// change feed. Failures are returned as-is, nothing is retried.
pub fn send<S: MessageStore + ?Sized>(
    store: &S,
    session: &Session,
    conversation_id: &ConversationId,
    receiver_id: Uuid,
    content: &str,
) -> Result<Message> {
    let content = content.trim();
    if content.is_empty() {
        return Err(CoreError::EmptyMessage);
    }

    policy::authorize(
        session,
        &Action::SendMessage {
            conversation: conversation_id,
            receiver_id,
        },
    )?;
    policy::ensure_linked(store, session.user_id(), receiver_id)?;

    let message = store.insert_message(&NewMessage {
        sender_id: session.user_id(),
        receiver_id,
        content: content.to_string(),
        conversation_id: conversation_id.clone(),
    })?;

    debug!("{} sent message {} in {}", session.user_id(), message.id, conversation_id);
    Ok(message)
}
