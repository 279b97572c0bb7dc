use anyhow::Result;
use uuid::Uuid;

use sezora_db::Database;
use sezora_types::conversation::ConversationId;
use sezora_types::models::{ApplicationDetail, Message, NewMessage};

/// The slice of the data store the messaging core reads and writes.
pub trait MessageStore {
    fn accepted_applications_for_student(&self, student_id: Uuid) -> Result<Vec<ApplicationDetail>>;

    fn accepted_applications_for_employer(&self, employer_id: Uuid)
    -> Result<Vec<ApplicationDetail>>;

    /// Oldest first, ties in insert order.
    fn messages_in_conversation(&self, id: &ConversationId) -> Result<Vec<Message>>;

    fn accepted_link_exists(&self, a: Uuid, b: Uuid) -> Result<bool>;

    fn insert_message(&self, new: &NewMessage) -> Result<Message>;
}

impl MessageStore for Database {
    fn accepted_applications_for_student(&self, student_id: Uuid) -> Result<Vec<ApplicationDetail>> {
        Database::accepted_applications_for_student(self, student_id)
    }

    fn accepted_applications_for_employer(
        &self,
        employer_id: Uuid,
    ) -> Result<Vec<ApplicationDetail>> {
        Database::accepted_applications_for_employer(self, employer_id)
    }

    fn messages_in_conversation(&self, id: &ConversationId) -> Result<Vec<Message>> {
        Database::messages_in_conversation(self, id)
    }

    fn accepted_link_exists(&self, a: Uuid, b: Uuid) -> Result<bool> {
        Database::accepted_link_exists(self, a, b)
    }

    fn insert_message(&self, new: &NewMessage) -> Result<Message> {
        Database::insert_message(self, new)
    }
}
