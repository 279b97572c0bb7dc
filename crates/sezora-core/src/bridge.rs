use tracing::{debug, info};
use uuid::Uuid;

use sezora_db::realtime::{ChangeFeed, Delivery, Filter, Subscription};
use sezora_types::events::{ChangeEvent, ChangeKind, Record, Table};
use sezora_types::models::Message;

use crate::conversation::{Append, ConversationList};

#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEvent {
    Message(Message),
    /// Events were lost; the caller should reload from the store.
    Lagged(u64),
    /// The bridge was closed or the feed went away.
    Closed,
}

/// Keeps one session's conversation list current from the change feed.
///
/// Holds a single subscription to message inserts where the session user is
/// sender or receiver. The subscription is released by [`close`] or when the
/// bridge is dropped, whichever comes first.
///
/// [`close`]: RealtimeBridge::close
pub struct RealtimeBridge {
    user_id: Uuid,
    subscription: Option<Subscription>,
}

impl RealtimeBridge {
    pub fn activate(feed: &ChangeFeed, user_id: Uuid) -> Self {
        let filter = Filter::where_eq("sender_id", user_id).or_eq("receiver_id", user_id);
        let subscription = feed.subscribe(Table::Messages, ChangeKind::Insert, filter);
        info!("Realtime bridge active for {} (subscription {})", user_id, subscription.id());

        Self {
            user_id,
            subscription: Some(subscription),
        }
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_some()
    }

    /// Wait for the next message insert in scope.
    pub async fn next(&mut self) -> BridgeEvent {
        let Some(subscription) = self.subscription.as_mut() else {
            return BridgeEvent::Closed;
        };
        loop {
            if let Some(event) = into_bridge_event(subscription.recv().await) {
                return event;
            }
        }
    }

    /// Next message insert if one is already queued.
    pub fn try_next(&mut self) -> Option<BridgeEvent> {
        let Some(subscription) = self.subscription.as_mut() else {
            return Some(BridgeEvent::Closed);
        };
        loop {
            match subscription.try_recv() {
                None => return None,
                Some(delivery) => {
                    if let Some(event) = into_bridge_event(delivery) {
                        return Some(event);
                    }
                }
            }
        }
    }

    /// Release the subscription. Already loaded history is untouched.
    pub fn close(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            info!("Realtime bridge closed for {} (subscription {})", self.user_id, subscription.id());
        }
    }
}

fn into_bridge_event(delivery: Delivery) -> Option<BridgeEvent> {
    match delivery {
        Delivery::Event(ChangeEvent {
            record: Record::Messages(message),
            ..
        }) => Some(BridgeEvent::Message(message)),
        // The subscription is scoped to the messages table.
        Delivery::Event(_) => None,
        Delivery::Lagged(n) => Some(BridgeEvent::Lagged(n)),
        Delivery::Closed => Some(BridgeEvent::Closed),
    }
}

/// Apply a delivered message to the session's list. Messages for
/// conversations the list doesn't hold yet are dropped until the next reload.
pub fn deliver(list: &mut ConversationList, message: Message) -> Append {
    let id = message.id;
    let conversation_id = message.conversation_id.clone();
    let outcome = list.append(message);
    match outcome {
        Append::Appended => {}
        Append::UnknownConversation => {
            debug!("Dropped message {} for unloaded conversation {}", id, conversation_id)
        }
        Append::Duplicate => debug!("Message {} already in {}", id, conversation_id),
    }
    outcome
}
