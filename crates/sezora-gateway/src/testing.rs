//! Shared fixtures for the gateway tests.

use sezora_core::Session;
use sezora_core::session::DEFAULT_ADMIN_EMAIL;
use sezora_db::Database;
use sezora_types::conversation::ConversationId;
use sezora_types::models::{
    Application, ApplicationStatus, Job, JobStatus, Message, NewMessage, User, UserType,
};
use uuid::Uuid;

pub fn user(db: &Database, user_type: UserType, email: &str) -> User {
    let user = User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        name: email.to_string(),
        age: None,
        bio: None,
        user_type,
        company_name: (user_type == UserType::Employer).then(|| "Green Acres".to_string()),
        created_at: chrono::Utc::now(),
    };
    db.create_user(&user, "hash").unwrap();
    user
}

/// An approved job by `employer` with an accepted application from `student`.
pub fn link(db: &Database, student: &User, employer: &User) {
    let job = Job {
        id: Uuid::new_v4(),
        title: "Harvest hand".into(),
        company_name: "Green Acres".into(),
        location: "Fresno".into(),
        description: "Seasonal work".into(),
        pay: "$18/h".into(),
        employer_id: employer.id,
        status: JobStatus::Approved,
        created_at: chrono::Utc::now(),
    };
    db.insert_job(&job).unwrap();
    db.insert_application(&Application {
        id: Uuid::new_v4(),
        job_id: job.id,
        student_id: student.id,
        applied_at: chrono::Utc::now(),
        status: ApplicationStatus::Accepted,
    })
    .unwrap();
}

pub fn message(db: &Database, from: &User, to: &User, content: &str) -> Message {
    db.insert_message(&NewMessage {
        sender_id: from.id,
        receiver_id: to.id,
        content: content.to_string(),
        conversation_id: ConversationId::between(from.id, to.id),
    })
    .unwrap()
}

pub fn session(user: &User) -> Session {
    Session::new(user.clone(), DEFAULT_ADMIN_EMAIL)
}
