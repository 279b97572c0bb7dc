use tracing::info;
use uuid::Uuid;

use sezora_db::models::now_timestamp;
use sezora_db::{Database, is_constraint_violation};
use sezora_types::models::{Application, ApplicationDetail, ApplicationStatus, UserType};

use crate::error::{CoreError, Result};
use crate::policy::{self, Action};
use crate::session::Session;

/// One application per student per job.
pub fn apply(db: &Database, session: &Session, job_id: Uuid) -> Result<Application> {
    let job = db.get_job(job_id)?.ok_or(CoreError::NotFound("job"))?;
    policy::authorize(session, &Action::Apply { job: &job })?;

    if db.find_application(job_id, session.user_id())?.is_some() {
        return Err(CoreError::Conflict("already applied to this job"));
    }

    let application = Application {
        id: Uuid::new_v4(),
        job_id,
        student_id: session.user_id(),
        applied_at: now_timestamp().0,
        status: ApplicationStatus::Pending,
    };
    db.insert_application(&application).map_err(|e| {
        // Lost a race with a concurrent apply.
        if is_constraint_violation(&e) {
            CoreError::Conflict("already applied to this job")
        } else {
            CoreError::Store(e)
        }
    })?;

    info!("{} applied to job {}", session.user_id(), job_id);
    Ok(application)
}

/// Students see their own applications, employers the ones sent to their
/// jobs. Newest first.
pub fn list_applications(db: &Database, session: &Session) -> Result<Vec<ApplicationDetail>> {
    let details = match session.user_type() {
        UserType::Student => db.applications_for_student(session.user_id())?,
        UserType::Employer => db.applications_for_employer(session.user_id())?,
    };
    Ok(details)
}

/// Accepting an application is what opens a conversation between the two
/// users.
pub fn review_application(
    db: &Database,
    session: &Session,
    id: Uuid,
    status: ApplicationStatus,
) -> Result<Application> {
    let application = db
        .get_application(id)?
        .ok_or(CoreError::NotFound("application"))?;
    let job = db
        .get_job(application.job_id)?
        .ok_or(CoreError::NotFound("job"))?;
    policy::authorize(session, &Action::ReviewApplication { job: &job })?;

    if status == ApplicationStatus::Pending {
        return Err(CoreError::Invalid("a review must accept or reject"));
    }

    let updated = db
        .update_application_status(id, status)?
        .ok_or(CoreError::NotFound("application"))?;
    info!("{} marked application {} {}", session.user_id(), id, status);
    Ok(updated)
}
