use uuid::Uuid;

use sezora_db::Database;
use sezora_db::models::now_timestamp;
use sezora_types::api::{RegisterRequest, UpdateProfileRequest};
use sezora_types::models::{User, UserType};

use crate::error::{CoreError, Result};
use crate::jobs::required;
use crate::policy::{self, Action};
use crate::session::{Session, is_admin_email};

const MIN_PASSWORD_LEN: usize = 8;

/// Check a signup form and build the profile row it describes. Employers must
/// name their company. The admin address is never handed out through signup.
pub fn new_user(req: &RegisterRequest, admin_email: &str) -> Result<User> {
    let email = req.email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(CoreError::Invalid("email is not valid"));
    }
    if is_admin_email(&email, admin_email) {
        return Err(CoreError::Forbidden("this email is reserved"));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(CoreError::Invalid("password must be at least 8 characters"));
    }
    validate_age(req.age)?;

    let company_name = match req.user_type {
        UserType::Employer => Some(required(
            req.company_name.clone().unwrap_or_default(),
            "employers need a company name",
        )?),
        UserType::Student => None,
    };

    Ok(User {
        id: Uuid::new_v4(),
        email,
        name: required(req.name.clone(), "name is required")?,
        age: req.age,
        bio: req.bio.clone(),
        user_type: req.user_type,
        company_name,
        created_at: now_timestamp().0,
    })
}

/// Profile row for the operator account, created at startup.
pub fn admin_user(admin_email: &str) -> User {
    User {
        id: Uuid::new_v4(),
        email: admin_email.trim().to_lowercase(),
        name: "Sezora Admin".into(),
        age: None,
        bio: None,
        user_type: UserType::Employer,
        company_name: Some("Sezora".into()),
        created_at: now_timestamp().0,
    }
}

/// The session user's row as currently stored.
pub fn get_profile(db: &Database, session: &Session) -> Result<User> {
    db.get_user_by_id(session.user_id())?
        .ok_or(CoreError::NotFound("user"))
}

pub fn update_profile(db: &Database, session: &Session, req: UpdateProfileRequest) -> Result<User> {
    policy::authorize(
        session,
        &Action::UpdateProfile {
            user_id: session.user_id(),
        },
    )?;
    validate_age(req.age)?;
    let name = req
        .name
        .map(|name| required(name, "name cannot be blank"))
        .transpose()?;

    db.update_profile(
        session.user_id(),
        name.as_deref(),
        req.age,
        req.bio.as_deref(),
        req.company_name.as_deref(),
    )?
    .ok_or(CoreError::NotFound("user"))
}

fn validate_age(age: Option<i32>) -> Result<()> {
    match age {
        Some(age) if !(0..=150).contains(&age) => Err(CoreError::Invalid("age is out of range")),
        _ => Ok(()),
    }
}
