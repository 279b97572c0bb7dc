use std::sync::Arc;

use tracing::{error, warn};

use sezora_core::Session;
use sezora_core::aggregator;
use sezora_core::bridge::{BridgeEvent, RealtimeBridge, deliver};
use sezora_core::conversation::{Append, ConversationList};
use sezora_db::Database;
use sezora_types::events::GatewayEvent;

/// What the connection loop should do after the bridge yields.
#[derive(Debug, PartialEq)]
pub enum Step {
    Send(GatewayEvent),
    /// The event changed nothing the client can see.
    Idle,
    /// Events were lost; reload and resend the list.
    Reload,
    Closed,
}

/// Server-side view of one identified connection: the user's conversation
/// list and the realtime bridge that keeps it current. Owned by a single task,
/// so reloads and appends never interleave.
pub struct GatewaySession {
    db: Arc<Database>,
    session: Session,
    list: ConversationList,
    bridge: RealtimeBridge,
}

impl GatewaySession {
    /// Subscribe, then load. A message committed in between shows up in both
    /// and the list drops the second copy.
    pub async fn open(db: Arc<Database>, session: Session) -> (Self, Vec<GatewayEvent>) {
        let bridge = RealtimeBridge::activate(db.changes(), session.user_id());
        let list = load(&db, &session).await.unwrap_or_default();

        let events = vec![
            GatewayEvent::Ready {
                user_id: session.user_id(),
                name: session.user().name.clone(),
            },
            GatewayEvent::Conversations {
                conversations: list.as_slice().to_vec(),
            },
        ];

        let gateway_session = Self {
            db,
            session,
            list,
            bridge,
        };
        (gateway_session, events)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn conversations(&self) -> &ConversationList {
        &self.list
    }

    /// Wait for the bridge and apply what it delivers. Cancel safe.
    pub async fn next_step(&mut self) -> Step {
        match self.bridge.next().await {
            BridgeEvent::Message(message) => match deliver(&mut self.list, message.clone()) {
                Append::Appended => Step::Send(GatewayEvent::MessageCreate { message }),
                Append::UnknownConversation | Append::Duplicate => Step::Idle,
            },
            BridgeEvent::Lagged(n) => {
                warn!(
                    "Realtime bridge for {} lagged by {} events",
                    self.session.user_id(),
                    n
                );
                Step::Reload
            }
            BridgeEvent::Closed => Step::Closed,
        }
    }

    /// Rebuild the list from the store. On failure the current list is kept.
    pub async fn reload(&mut self) -> GatewayEvent {
        if let Some(fresh) = load(&self.db, &self.session).await {
            self.list.replace(fresh);
        }
        GatewayEvent::Conversations {
            conversations: self.list.as_slice().to_vec(),
        }
    }

    pub fn close(&mut self) {
        self.bridge.close();
    }
}

async fn load(db: &Arc<Database>, session: &Session) -> Option<ConversationList> {
    let db = db.clone();
    let session = session.clone();
    let user_id = session.user_id();

    match tokio::task::spawn_blocking(move || aggregator::list_conversations(&*db, &session)).await {
        Ok(Ok(list)) => Some(list),
        Ok(Err(e)) => {
            warn!("Could not load conversations for {}: {}", user_id, e);
            None
        }
        Err(e) => {
            error!("spawn_blocking join error: {}", e);
            None
        }
    }
}
