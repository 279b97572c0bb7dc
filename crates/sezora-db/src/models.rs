//! Database row types. These map directly to SQLite rows and hold every
//! column as stored; conversion into the `sezora-types` records is where row
//! shapes get validated.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use sezora_types::models::{Application, EmployerSummary, Job, Message, User};

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password: String,
    pub name: String,
    pub age: Option<i32>,
    pub bio: Option<String>,
    pub user_type: String,
    pub company_name: Option<String>,
    pub created_at: String,
}

pub struct JobRow {
    pub id: String,
    pub title: String,
    pub company_name: String,
    pub location: String,
    pub description: String,
    pub pay: String,
    pub employer_id: String,
    pub status: String,
    pub created_at: String,
}

pub struct ApplicationRow {
    pub id: String,
    pub job_id: String,
    pub student_id: String,
    pub applied_at: String,
    pub status: String,
}

pub struct EmployerRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub company_name: Option<String>,
}

pub struct MessageRow {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    pub created_at: String,
    pub conversation_id: String,
}

/// Current time in the stored timestamp format (RFC 3339, milliseconds, `Z`).
pub fn now_timestamp() -> (DateTime<Utc>, String) {
    let now = Utc::now();
    let text = now.to_rfc3339_opts(SecondsFormat::Millis, true);
    // Round-trip so the returned value matches what a later read yields.
    let stored = parse_timestamp(&text).unwrap_or(now);
    (stored, text)
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    value
        .parse::<DateTime<Utc>>()
        .with_context(|| format!("bad timestamp '{}'", value))
}

fn parse_id(field: &str, value: &str) -> Result<Uuid> {
    value
        .parse()
        .with_context(|| format!("bad {} '{}'", field, value))
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(User {
            id: parse_id("user id", &row.id)?,
            email: row.email,
            name: row.name,
            age: row.age,
            bio: row.bio,
            user_type: row.user_type.parse()?,
            company_name: row.company_name,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

impl TryFrom<JobRow> for Job {
    type Error = anyhow::Error;

    fn try_from(row: JobRow) -> Result<Self> {
        Ok(Job {
            id: parse_id("job id", &row.id)?,
            title: row.title,
            company_name: row.company_name,
            location: row.location,
            description: row.description,
            pay: row.pay,
            employer_id: parse_id("employer_id", &row.employer_id)?,
            status: row.status.parse()?,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

impl TryFrom<ApplicationRow> for Application {
    type Error = anyhow::Error;

    fn try_from(row: ApplicationRow) -> Result<Self> {
        Ok(Application {
            id: parse_id("application id", &row.id)?,
            job_id: parse_id("job_id", &row.job_id)?,
            student_id: parse_id("student_id", &row.student_id)?,
            applied_at: parse_timestamp(&row.applied_at)?,
            status: row.status.parse()?,
        })
    }
}

impl TryFrom<EmployerRow> for EmployerSummary {
    type Error = anyhow::Error;

    fn try_from(row: EmployerRow) -> Result<Self> {
        Ok(EmployerSummary {
            id: parse_id("employer id", &row.id)?,
            name: row.name,
            email: row.email,
            company_name: row.company_name,
        })
    }
}

impl TryFrom<MessageRow> for Message {
    type Error = anyhow::Error;

    fn try_from(row: MessageRow) -> Result<Self> {
        Ok(Message {
            id: parse_id("message id", &row.id)?,
            sender_id: parse_id("sender_id", &row.sender_id)?,
            receiver_id: parse_id("receiver_id", &row.receiver_id)?,
            content: row.content,
            created_at: parse_timestamp(&row.created_at)?,
            conversation_id: row.conversation_id.parse()?,
        })
    }
}
