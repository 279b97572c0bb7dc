use std::cell::Cell;
use std::collections::HashSet;

use anyhow::{Result, anyhow};
use uuid::Uuid;

use sezora_db::Database;
use sezora_types::conversation::ConversationId;
use sezora_types::models::{
    Application, ApplicationDetail, ApplicationStatus, Job, JobStatus, Message, NewMessage, User,
    UserType,
};

use crate::session::{DEFAULT_ADMIN_EMAIL, Session};
use crate::store::MessageStore;

pub fn sample_user(user_type: UserType, email: &str) -> User {
    User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        name: email.split('@').next().unwrap_or_default().to_string(),
        age: None,
        bio: None,
        user_type,
        company_name: (user_type == UserType::Employer).then(|| format!("{email} farms")),
        created_at: chrono::Utc::now(),
    }
}

pub fn session_for(user: User) -> Session {
    Session::new(user, DEFAULT_ADMIN_EMAIL)
}

/// An in-memory store with helpers for the rows most tests need.
pub struct Fixture {
    pub db: Database,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            db: Database::open_in_memory().unwrap(),
        }
    }

    pub fn user(&self, user_type: UserType, email: &str) -> User {
        let user = sample_user(user_type, email);
        self.db.create_user(&user, "hash").unwrap();
        user
    }

    pub fn student(&self, email: &str) -> User {
        self.user(UserType::Student, email)
    }

    pub fn employer(&self, email: &str) -> User {
        self.user(UserType::Employer, email)
    }

    pub fn job(&self, employer: &User) -> Job {
        let job = Job {
            id: Uuid::new_v4(),
            title: "Harvest hand".into(),
            company_name: employer.company_name.clone().unwrap_or_default(),
            location: "Fresno".into(),
            description: "Seasonal work".into(),
            pay: "$18/h".into(),
            employer_id: employer.id,
            status: JobStatus::Approved,
            created_at: chrono::Utc::now(),
        };
        self.db.insert_job(&job).unwrap();
        job
    }

    pub fn application(&self, job: &Job, student: &User, status: ApplicationStatus) -> Application {
        let application = Application {
            id: Uuid::new_v4(),
            job_id: job.id,
            student_id: student.id,
            applied_at: chrono::Utc::now(),
            status,
        };
        self.db.insert_application(&application).unwrap();
        application
    }

    pub fn accepted(&self, job: &Job, student: &User) -> Application {
        self.application(job, student, ApplicationStatus::Accepted)
    }

    pub fn session(&self, user: &User) -> Session {
        session_for(user.clone())
    }

    pub fn message(&self, from: &User, to: &User, content: &str) -> Message {
        self.db
            .insert_message(&NewMessage {
                sender_id: from.id,
                receiver_id: to.id,
                content: content.to_string(),
                conversation_id: ConversationId::between(from.id, to.id),
            })
            .unwrap()
    }
}

/// Wraps a store, failing chosen calls and counting the rest.
pub struct FlakyStore<'a> {
    pub inner: &'a Database,
    pub fail_applications: bool,
    pub fail_history_for: HashSet<ConversationId>,
    pub calls: Cell<usize>,
}

impl<'a> FlakyStore<'a> {
    pub fn new(inner: &'a Database) -> Self {
        Self {
            inner,
            fail_applications: false,
            fail_history_for: HashSet::new(),
            calls: Cell::new(0),
        }
    }

    fn count(&self) {
        self.calls.set(self.calls.get() + 1);
    }
}

impl MessageStore for FlakyStore<'_> {
    fn accepted_applications_for_student(&self, student_id: Uuid) -> Result<Vec<ApplicationDetail>> {
        self.count();
        if self.fail_applications {
            return Err(anyhow!("connection reset"));
        }
        self.inner.accepted_applications_for_student(student_id)
    }

    fn accepted_applications_for_employer(
        &self,
        employer_id: Uuid,
    ) -> Result<Vec<ApplicationDetail>> {
        self.count();
        if self.fail_applications {
            return Err(anyhow!("connection reset"));
        }
        self.inner.accepted_applications_for_employer(employer_id)
    }

    fn messages_in_conversation(&self, id: &ConversationId) -> Result<Vec<Message>> {
        self.count();
        if self.fail_history_for.contains(id) {
            return Err(anyhow!("permission denied"));
        }
        self.inner.messages_in_conversation(id)
    }

    fn accepted_link_exists(&self, a: Uuid, b: Uuid) -> Result<bool> {
        self.count();
        self.inner.accepted_link_exists(a, b)
    }

    fn insert_message(&self, new: &NewMessage) -> Result<Message> {
        self.count();
        self.inner.insert_message(new)
    }
}
