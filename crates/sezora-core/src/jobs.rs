use tracing::info;
use uuid::Uuid;

use sezora_db::Database;
use sezora_db::models::now_timestamp;
use sezora_types::api::{CreateJobRequest, JobSearch};
use sezora_types::models::{Job, JobStatus, PendingJob};

use crate::error::{CoreError, Result};
use crate::policy::{self, Action};
use crate::session::Session;

/// New postings start out pending until an admin reviews them.
pub fn post_job(db: &Database, session: &Session, req: CreateJobRequest) -> Result<Job> {
    policy::authorize(session, &Action::PostJob)?;

    let job = Job {
        id: Uuid::new_v4(),
        title: required(req.title, "title is required")?,
        company_name: required(req.company_name, "company name is required")?,
        location: required(req.location, "location is required")?,
        description: required(req.description, "description is required")?,
        pay: required(req.pay, "pay is required")?,
        employer_id: session.user_id(),
        status: JobStatus::Pending,
        created_at: now_timestamp().0,
    };
    db.insert_job(&job)?;

    info!("{} posted job {} ({})", session.user_id(), job.id, job.title);
    Ok(job)
}

/// The public board, newest first, narrowed by the search terms.
pub fn list_approved_jobs(db: &Database, search: &JobSearch) -> Result<Vec<Job>> {
    Ok(db.search_jobs(
        JobStatus::Approved,
        search_term(search.q.as_deref()),
        search_term(search.location.as_deref()),
    )?)
}

/// Jobs nobody but the poster and admins should see are reported missing.
pub fn get_approved_job(db: &Database, id: Uuid) -> Result<Job> {
    db.get_job(id)?
        .filter(|job| job.status == JobStatus::Approved)
        .ok_or(CoreError::NotFound("job"))
}

pub fn list_employer_jobs(db: &Database, session: &Session) -> Result<Vec<Job>> {
    Ok(db.list_jobs_by_employer(session.user_id())?)
}

/// The admin review queue, each job with the employer who posted it.
pub fn list_pending_jobs(
    db: &Database,
    session: &Session,
    q: Option<&str>,
) -> Result<Vec<PendingJob>> {
    policy::authorize(session, &Action::ViewPendingJobs)?;
    Ok(db.pending_jobs_with_employer(search_term(q))?)
}

pub fn review_job(db: &Database, session: &Session, id: Uuid, status: JobStatus) -> Result<Job> {
    policy::authorize(session, &Action::ReviewJob)?;
    if status == JobStatus::Pending {
        return Err(CoreError::Invalid("a review must approve or reject"));
    }

    let job = db
        .update_job_status(id, status)?
        .ok_or(CoreError::NotFound("job"))?;
    info!("Admin {} marked job {} {}", session.user_id(), id, status);
    Ok(job)
}

fn search_term(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|term| !term.is_empty())
}

pub(crate) fn required(value: String, reason: &'static str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(CoreError::Invalid(reason))
    } else {
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Fixture, session_for, sample_user};
    use sezora_types::models::UserType;

    fn request(title: &str) -> CreateJobRequest {
        CreateJobRequest {
            title: title.to_string(),
            company_name: "Green Acres".into(),
            location: "Fresno".into(),
            description: "Irrigation checks".into(),
            pay: "$19/h".into(),
        }
    }

    #[test]
    fn posted_jobs_wait_for_approval() {
        let fx = Fixture::new();
        let employer = fx.employer("e@farm.com");
        let session = fx.session(&employer);

        let job = post_job(&fx.db, &session, request("  Irrigation tech ")).unwrap();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.title, "Irrigation tech");
        assert_eq!(job.employer_id, employer.id);

        assert!(list_approved_jobs(&fx.db, &JobSearch::default()).unwrap().is_empty());
        assert!(matches!(get_approved_job(&fx.db, job.id), Err(CoreError::NotFound(_))));
        assert_eq!(list_employer_jobs(&fx.db, &session).unwrap(), vec![job]);
    }

    #[test]
    fn blank_fields_are_rejected() {
        let fx = Fixture::new();
        let employer = fx.employer("e@farm.com");
        let err = post_job(&fx.db, &fx.session(&employer), request("   ")).unwrap_err();
        assert!(matches!(err, CoreError::Invalid("title is required")));
    }

    #[test]
    fn admin_approval_publishes_the_job() {
        let fx = Fixture::new();
        let employer = fx.employer("e@farm.com");
        let admin_user = sample_user(UserType::Employer, crate::session::DEFAULT_ADMIN_EMAIL);
        fx.db.create_user(&admin_user, "hash").unwrap();
        let admin = session_for(admin_user);

        let job = post_job(&fx.db, &fx.session(&employer), request("Picker")).unwrap();
        let queue = list_pending_jobs(&fx.db, &admin, None).unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].employer.id, employer.id);

        let approved = review_job(&fx.db, &admin, job.id, JobStatus::Approved).unwrap();
        assert_eq!(approved.status, JobStatus::Approved);
        assert_eq!(get_approved_job(&fx.db, job.id).unwrap(), approved);
        assert!(list_pending_jobs(&fx.db, &admin, None).unwrap().is_empty());
    }

    #[test]
    fn review_rules() {
        let fx = Fixture::new();
        let employer = fx.employer("e@farm.com");
        let admin = session_for(sample_user(UserType::Employer, crate::session::DEFAULT_ADMIN_EMAIL));
        let job = post_job(&fx.db, &fx.session(&employer), request("Picker")).unwrap();

        assert!(matches!(
            review_job(&fx.db, &fx.session(&employer), job.id, JobStatus::Approved),
            Err(CoreError::Forbidden(_))
        ));
        assert!(matches!(
            review_job(&fx.db, &admin, job.id, JobStatus::Pending),
            Err(CoreError::Invalid(_))
        ));
        assert!(matches!(
            review_job(&fx.db, &admin, Uuid::new_v4(), JobStatus::Rejected),
            Err(CoreError::NotFound("job"))
        ));
    }

    #[test]
    fn board_search_ignores_blank_terms() {
        let fx = Fixture::new();
        let employer = fx.employer("e@farm.com");
        let admin = session_for(sample_user(UserType::Employer, crate::session::DEFAULT_ADMIN_EMAIL));
        for title in ["Picker", "Irrigation tech"] {
            let job = post_job(&fx.db, &fx.session(&employer), request(title)).unwrap();
            review_job(&fx.db, &admin, job.id, JobStatus::Approved).unwrap();
        }

        let blank = JobSearch {
            q: Some("   ".into()),
            location: Some(String::new()),
        };
        assert_eq!(list_approved_jobs(&fx.db, &blank).unwrap().len(), 2);

        let picker = JobSearch {
            q: Some(" pick ".into()),
            location: Some("fresno".into()),
        };
        let found = list_approved_jobs(&fx.db, &picker).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Picker");
    }

    #[test]
    fn review_queue_is_admin_only() {
        let fx = Fixture::new();
        let employer = fx.employer("e@farm.com");
        assert!(matches!(
            list_pending_jobs(&fx.db, &fx.session(&employer), None),
            Err(CoreError::Forbidden(_))
        ));
    }
}
