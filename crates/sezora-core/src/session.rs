use anyhow::Result;
use uuid::Uuid;

use sezora_db::Database;
use sezora_types::models::{User, UserType};

/// Email that grants admin rights when nothing else is configured.
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@sezora.com";

pub fn is_admin_email(email: &str, admin_email: &str) -> bool {
    email.trim().eq_ignore_ascii_case(admin_email.trim())
}

/// The signed-in user, passed explicitly into every operation. Built per
/// request (or per gateway connection) from a verified token; dropping it is
/// signing out.
#[derive(Debug, Clone)]
pub struct Session {
    user: User,
    is_admin: bool,
}

impl Session {
    pub fn new(user: User, admin_email: &str) -> Self {
        let is_admin = is_admin_email(&user.email, admin_email);
        Self { user, is_admin }
    }

    /// Load the profile row behind a verified identity. `None` when the user
    /// no longer exists.
    pub fn load(db: &Database, user_id: Uuid, admin_email: &str) -> Result<Option<Self>> {
        Ok(db
            .get_user_by_id(user_id)?
            .map(|user| Self::new(user, admin_email)))
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn user_id(&self) -> Uuid {
        self.user.id
    }

    pub fn user_type(&self) -> UserType {
        self.user.user_type
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }
}
