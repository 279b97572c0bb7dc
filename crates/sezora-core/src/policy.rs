//! Authorization rules, all in one place. Handlers never compare roles or
//! owners themselves; they build an [`Action`] and ask [`authorize`].

use uuid::Uuid;

use sezora_types::conversation::ConversationId;
use sezora_types::models::{Job, JobStatus, UserType};

use crate::error::{CoreError, Result};
use crate::session::Session;
use crate::store::MessageStore;

#[derive(Debug, Clone, Copy)]
pub enum Action<'a> {
    SendMessage {
        conversation: &'a ConversationId,
        receiver_id: Uuid,
    },
    ReadConversation {
        conversation: &'a ConversationId,
    },
    PostJob,
    ReviewJob,
    ViewPendingJobs,
    Apply {
        job: &'a Job,
    },
    ReviewApplication {
        job: &'a Job,
    },
    UpdateProfile {
        user_id: Uuid,
    },
}

pub fn authorize(session: &Session, action: &Action<'_>) -> Result<()> {
    match *action {
        Action::SendMessage {
            conversation,
            receiver_id,
        } => {
            if receiver_id == session.user_id() {
                return Err(CoreError::Forbidden("cannot message yourself"));
            }
            if *conversation != ConversationId::between(session.user_id(), receiver_id) {
                return Err(CoreError::Forbidden("conversation does not match participants"));
            }
            Ok(())
        }
        Action::ReadConversation { conversation } => {
            if conversation.involves(session.user_id()) {
                Ok(())
            } else {
                Err(CoreError::Forbidden("not a participant"))
            }
        }
        Action::PostJob => require(
            session.user_type() == UserType::Employer,
            "only employers can post jobs",
        ),
        Action::ReviewJob | Action::ViewPendingJobs => {
            require(session.is_admin(), "admin only")
        }
        Action::Apply { job } => {
            require(
                session.user_type() == UserType::Student,
                "only students can apply",
            )?;
            require(job.status == JobStatus::Approved, "job is not open")
        }
        Action::ReviewApplication { job } => require(
            job.employer_id == session.user_id(),
            "not the employer for this job",
        ),
        Action::UpdateProfile { user_id } => {
            require(user_id == session.user_id(), "not your profile")
        }
    }
}

/// Messaging additionally needs an accepted application between the two
/// users, which only the store can answer.
pub fn ensure_linked<S: MessageStore + ?Sized>(store: &S, a: Uuid, b: Uuid) -> Result<()> {
    if store.accepted_link_exists(a, b)? {
        Ok(())
    } else {
        Err(CoreError::Forbidden("no accepted application between these users"))
    }
}

fn require(condition: bool, reason: &'static str) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(CoreError::Forbidden(reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Fixture, session_for, sample_user};

    fn job_for(employer_id: Uuid, status: JobStatus) -> Job {
        Job {
            id: Uuid::new_v4(),
            title: "Orchard assistant".into(),
            company_name: "Green Acres".into(),
            location: "Yakima".into(),
            description: "Pruning".into(),
            pay: "$20/h".into(),
            employer_id,
            status,
            created_at: chrono::Utc::now(),
        }
    }

    fn is_forbidden(result: Result<()>) -> bool {
        matches!(result, Err(CoreError::Forbidden(_)))
    }

    #[test]
    fn only_employers_post_jobs() {
        let student = session_for(sample_user(UserType::Student, "s@farm.edu"));
        let employer = session_for(sample_user(UserType::Employer, "e@farm.com"));

        assert!(is_forbidden(authorize(&student, &Action::PostJob)));
        assert!(authorize(&employer, &Action::PostJob).is_ok());
    }

    #[test]
    fn job_review_needs_admin_email() {
        let employer = session_for(sample_user(UserType::Employer, "e@farm.com"));
        let admin = session_for(sample_user(UserType::Employer, "Admin@Sezora.com"));

        assert!(is_forbidden(authorize(&employer, &Action::ReviewJob)));
        assert!(is_forbidden(authorize(&employer, &Action::ViewPendingJobs)));
        assert!(authorize(&admin, &Action::ReviewJob).is_ok());
        assert!(authorize(&admin, &Action::ViewPendingJobs).is_ok());
    }

    #[test]
    fn students_apply_only_to_approved_jobs() {
        let student = session_for(sample_user(UserType::Student, "s@farm.edu"));
        let employer = session_for(sample_user(UserType::Employer, "e@farm.com"));
        let open = job_for(employer.user_id(), JobStatus::Approved);
        let pending = job_for(employer.user_id(), JobStatus::Pending);

        assert!(authorize(&student, &Action::Apply { job: &open }).is_ok());
        assert!(is_forbidden(authorize(&student, &Action::Apply { job: &pending })));
        assert!(is_forbidden(authorize(&employer, &Action::Apply { job: &open })));
    }

    #[test]
    fn only_the_owning_employer_reviews_applications() {
        let owner = session_for(sample_user(UserType::Employer, "e@farm.com"));
        let rival = session_for(sample_user(UserType::Employer, "r@farm.com"));
        let job = job_for(owner.user_id(), JobStatus::Approved);

        assert!(authorize(&owner, &Action::ReviewApplication { job: &job }).is_ok());
        assert!(is_forbidden(authorize(&rival, &Action::ReviewApplication { job: &job })));
    }

    #[test]
    fn profiles_are_self_service() {
        let user = session_for(sample_user(UserType::Student, "s@farm.edu"));
        let own = Action::UpdateProfile { user_id: user.user_id() };
        let other = Action::UpdateProfile { user_id: Uuid::new_v4() };

        assert!(authorize(&user, &own).is_ok());
        assert!(is_forbidden(authorize(&user, &other)));
    }

    #[test]
    fn send_requires_matching_conversation() {
        let sender = session_for(sample_user(UserType::Student, "s@farm.edu"));
        let receiver = Uuid::new_v4();
        let right = ConversationId::between(sender.user_id(), receiver);
        let wrong = ConversationId::between(sender.user_id(), Uuid::new_v4());

        let ok = Action::SendMessage { conversation: &right, receiver_id: receiver };
        let mismatched = Action::SendMessage { conversation: &wrong, receiver_id: receiver };
        let own = ConversationId::between(sender.user_id(), sender.user_id());
        let to_self = Action::SendMessage { conversation: &own, receiver_id: sender.user_id() };

        assert!(authorize(&sender, &ok).is_ok());
        assert!(is_forbidden(authorize(&sender, &mismatched)));
        assert!(is_forbidden(authorize(&sender, &to_self)));
    }

    #[test]
    fn reading_requires_membership() {
        let reader = session_for(sample_user(UserType::Employer, "e@farm.com"));
        let mine = ConversationId::between(reader.user_id(), Uuid::new_v4());
        let theirs = ConversationId::between(Uuid::new_v4(), Uuid::new_v4());

        assert!(authorize(&reader, &Action::ReadConversation { conversation: &mine }).is_ok());
        assert!(is_forbidden(authorize(
            &reader,
            &Action::ReadConversation { conversation: &theirs }
        )));
    }

    #[test]
    fn link_check_consults_the_store() {
        let fx = Fixture::new();
        let student = fx.student("s@farm.edu");
        let employer = fx.employer("e@farm.com");
        let job = fx.job(&employer);

        assert!(is_forbidden(ensure_linked(&fx.db, student.id, employer.id)));
        fx.accepted(&job, &student);
        assert!(ensure_linked(&fx.db, student.id, employer.id).is_ok());
    }
}
