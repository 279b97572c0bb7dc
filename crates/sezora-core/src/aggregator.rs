use std::collections::HashSet;

use tracing::{debug, warn};

use sezora_types::conversation::ConversationId;
use sezora_types::models::{ApplicationDetail, Conversation, Counterparty, Message, User, UserType};

use crate::conversation::ConversationList;
use crate::error::{CoreError, Result};
use crate::policy::{self, Action};
use crate::session::Session;
use crate::store::MessageStore;

/// Build the session user's conversations: one per counterparty linked by an
/// accepted application, each with its full history.
///
/// Applications are visited oldest first and the first one seen for a pair
/// supplies the counterparty's display details. A conversation whose history
/// fails to load is left out; the rest are still returned.
pub fn list_conversations<S: MessageStore + ?Sized>(
    store: &S,
    session: &Session,
) -> Result<ConversationList> {
    let user = session.user();
    let accepted = match user.user_type {
        UserType::Student => store.accepted_applications_for_student(user.id),
        UserType::Employer => store.accepted_applications_for_employer(user.id),
    }
    .map_err(CoreError::CannotLoadConversations)?;

    let mut seen = HashSet::new();
    let mut conversations = Vec::new();

    for detail in &accepted {
        let counterparty = counterparty_for(user, detail);
        let id = ConversationId::between(user.id, counterparty.id);
        if !seen.insert(id.clone()) {
            continue;
        }

        match store.messages_in_conversation(&id) {
            Ok(messages) => conversations.push(Conversation {
                id,
                counterparty,
                messages,
            }),
            Err(e) => warn!("Skipping conversation {} for {}: {:#}", id, user.id, e),
        }
    }

    debug!(
        "Loaded {} conversations from {} accepted applications for {}",
        conversations.len(),
        accepted.len(),
        user.id
    );
    Ok(ConversationList::new(conversations))
}

/// Reload one conversation's history. Only participants may read it.
pub fn load_history<S: MessageStore + ?Sized>(
    store: &S,
    session: &Session,
    id: &ConversationId,
) -> Result<Vec<Message>> {
    policy::authorize(session, &Action::ReadConversation { conversation: id })?;
    Ok(store.messages_in_conversation(id)?)
}

/// Who `user` talks to through `detail`. Students see the employer under the
/// job's company name; employers see the student's own profile.
pub fn counterparty_for(user: &User, detail: &ApplicationDetail) -> Counterparty {
    match user.user_type {
        UserType::Student => Counterparty {
            id: detail.job.employer_id,
            name: detail.job.company_name.clone(),
            email: String::new(),
            user_type: UserType::Employer,
            company_name: Some(detail.job.company_name.clone()),
        },
        UserType::Employer => Counterparty {
            id: detail.student.id,
            name: detail.student.name.clone(),
            email: detail.student.email.clone(),
            user_type: UserType::Student,
            company_name: None,
        },
    }
}
