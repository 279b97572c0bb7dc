use crate::models::{ApplicationRow, EmployerRow, JobRow, MessageRow, UserRow, now_timestamp};
use crate::Database;
use anyhow::Result;
use rusqlite::{Connection, Row};
use uuid::Uuid;

use sezora_types::conversation::ConversationId;
use sezora_types::events::{ChangeEvent, ChangeKind, Record};
use sezora_types::models::{
    Application, ApplicationDetail, ApplicationStatus, Job, JobStatus, Message, NewMessage,
    PendingJob, User,
};

const USER_COLUMNS: &str =
    "id, email, password, name, age, bio, user_type, company_name, created_at";
const JOB_COLUMNS: &str =
    "id, title, company_name, location, description, pay, employer_id, status, created_at";
const APPLICATION_COLUMNS: &str = "id, job_id, student_id, applied_at, status";
const MESSAGE_COLUMNS: &str = "id, sender_id, receiver_id, content, created_at, conversation_id";

/// Which side of an application a detail query is keyed on.
#[derive(Debug, Clone, Copy)]
enum DetailScope {
    Student,
    Employer,
}

impl Database {
    fn publish(&self, kind: ChangeKind, record: Record) {
        self.changes().publish(ChangeEvent { kind, record });
    }

    // -- Users --

    pub fn create_user(&self, user: &User, password_hash: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, password, name, age, bio, user_type, company_name, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                rusqlite::params![
                    user.id.to_string(),
                    user.email,
                    password_hash,
                    user.name,
                    user.age,
                    user.bio,
                    user.user_type.as_str(),
                    user.company_name,
                    user.created_at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                ],
            )?;
            Ok(())
        })?;

        self.publish(ChangeKind::Insert, Record::Users(user.clone()));
        Ok(())
    }

    pub fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        self.with_conn(|conn| query_user(conn, "id", &id.to_string()))?
            .map(User::try_from)
            .transpose()
    }

    /// The user and their stored password hash.
    pub fn get_credentials_by_email(&self, email: &str) -> Result<Option<(User, String)>> {
        let row = self.with_conn(|conn| query_user(conn, "email", email))?;
        match row {
            Some(row) => {
                let password = row.password.clone();
                Ok(Some((User::try_from(row)?, password)))
            }
            None => Ok(None),
        }
    }

    /// Overwrites only the fields that are `Some`.
    pub fn update_profile(
        &self,
        id: Uuid,
        name: Option<&str>,
        age: Option<i32>,
        bio: Option<&str>,
        company_name: Option<&str>,
    ) -> Result<Option<User>> {
        let changed = self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE users SET
                    name = COALESCE(?2, name),
                    age = COALESCE(?3, age),
                    bio = COALESCE(?4, bio),
                    company_name = COALESCE(?5, company_name)
                 WHERE id = ?1",
                rusqlite::params![id.to_string(), name, age, bio, company_name],
            )?;
            Ok(n > 0)
        })?;

        if !changed {
            return Ok(None);
        }
        let user = self.get_user_by_id(id)?;
        if let Some(user) = &user {
            self.publish(ChangeKind::Update, Record::Users(user.clone()));
        }
        Ok(user)
    }

    // -- Jobs --

    pub fn insert_job(&self, job: &Job) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO jobs (id, title, company_name, location, description, pay, employer_id, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                rusqlite::params![
                    job.id.to_string(),
                    job.title,
                    job.company_name,
                    job.location,
                    job.description,
                    job.pay,
                    job.employer_id.to_string(),
                    job.status.as_str(),
                    job.created_at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                ],
            )?;
            Ok(())
        })?;

        self.publish(ChangeKind::Insert, Record::Jobs(job.clone()));
        Ok(())
    }

    pub fn get_job(&self, id: Uuid) -> Result<Option<Job>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?1");
            conn.query_row(&sql, [id.to_string()], job_row).optional()
        })?
        .map(Job::try_from)
        .transpose()
    }

    /// Jobs in `status`, newest first. `text` is a case-insensitive substring
    /// of title, company or description; `location` of the location.
    pub fn search_jobs(
        &self,
        status: JobStatus,
        text: Option<&str>,
        location: Option<&str>,
    ) -> Result<Vec<Job>> {
        let rows = self.with_conn(|conn| {
            let sql = format!(
                "SELECT {JOB_COLUMNS} FROM jobs
                 WHERE status = ?1
                   AND (?2 IS NULL
                        OR title LIKE ?2 ESCAPE '\\'
                        OR company_name LIKE ?2 ESCAPE '\\'
                        OR description LIKE ?2 ESCAPE '\\')
                   AND (?3 IS NULL OR location LIKE ?3 ESCAPE '\\')
                 ORDER BY created_at DESC, rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(
                    rusqlite::params![
                        status.as_str(),
                        text.map(like_pattern),
                        location.map(like_pattern)
                    ],
                    job_row,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;

        rows.into_iter().map(Job::try_from).collect()
    }

    /// The review queue: pending jobs with their poster, newest first. `text`
    /// matches title, company or the poster's name.
    pub fn pending_jobs_with_employer(&self, text: Option<&str>) -> Result<Vec<PendingJob>> {
        let rows = self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT j.id, j.title, j.company_name, j.location, j.description, j.pay, j.employer_id, j.status, j.created_at,
                        u.id, u.name, u.email, u.company_name
                 FROM jobs j
                 JOIN users u ON u.id = j.employer_id
                 WHERE j.status = ?1
                   AND (?2 IS NULL
                        OR j.title LIKE ?2 ESCAPE '\\'
                        OR j.company_name LIKE ?2 ESCAPE '\\'
                        OR u.name LIKE ?2 ESCAPE '\\')
                 ORDER BY j.created_at DESC, j.rowid DESC",
            )?;
            let rows = stmt
                .query_map(
                    rusqlite::params![JobStatus::Pending.as_str(), text.map(like_pattern)],
                    |row| {
                        Ok((
                            job_row(row)?,
                            EmployerRow {
                                id: row.get(9)?,
                                name: row.get(10)?,
                                email: row.get(11)?,
                                company_name: row.get(12)?,
                            },
                        ))
                    },
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;

        rows.into_iter()
            .map(|(job, employer)| -> Result<PendingJob> {
                Ok(PendingJob {
                    job: Job::try_from(job)?,
                    employer: employer.try_into()?,
                })
            })
            .collect()
    }

    /// Newest first.
    pub fn list_jobs_by_employer(&self, employer_id: Uuid) -> Result<Vec<Job>> {
        self.list_jobs("employer_id", &employer_id.to_string())
    }

    fn list_jobs(&self, column: &str, value: &str) -> Result<Vec<Job>> {
        let rows = self.with_conn(|conn| {
            let sql = format!(
                "SELECT {JOB_COLUMNS} FROM jobs WHERE {column} = ?1 ORDER BY created_at DESC, rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([value], job_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;

        rows.into_iter().map(Job::try_from).collect()
    }

    pub fn update_job_status(&self, id: Uuid, status: JobStatus) -> Result<Option<Job>> {
        let changed = self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE jobs SET status = ?2 WHERE id = ?1",
                (id.to_string(), status.as_str()),
            )?;
            Ok(n > 0)
        })?;

        if !changed {
            return Ok(None);
        }
        let job = self.get_job(id)?;
        if let Some(job) = &job {
            self.publish(ChangeKind::Update, Record::Jobs(job.clone()));
        }
        Ok(job)
    }

    // -- Applications --

    /// Fails with a constraint violation if the student already applied.
    pub fn insert_application(&self, application: &Application) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO applications (id, job_id, student_id, applied_at, status)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    application.id.to_string(),
                    application.job_id.to_string(),
                    application.student_id.to_string(),
                    application.applied_at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                    application.status.as_str(),
                ],
            )?;
            Ok(())
        })?;

        self.publish(ChangeKind::Insert, Record::Applications(application.clone()));
        Ok(())
    }

    pub fn get_application(&self, id: Uuid) -> Result<Option<Application>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = ?1");
            conn.query_row(&sql, [id.to_string()], application_row).optional()
        })?
        .map(Application::try_from)
        .transpose()
    }

    pub fn find_application(&self, job_id: Uuid, student_id: Uuid) -> Result<Option<Application>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {APPLICATION_COLUMNS} FROM applications WHERE job_id = ?1 AND student_id = ?2"
            );
            conn.query_row(&sql, (job_id.to_string(), student_id.to_string()), application_row)
                .optional()
        })?
        .map(Application::try_from)
        .transpose()
    }

    pub fn update_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Result<Option<Application>> {
        let changed = self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE applications SET status = ?2 WHERE id = ?1",
                (id.to_string(), status.as_str()),
            )?;
            Ok(n > 0)
        })?;

        if !changed {
            return Ok(None);
        }
        let application = self.get_application(id)?;
        if let Some(application) = &application {
            self.publish(ChangeKind::Update, Record::Applications(application.clone()));
        }
        Ok(application)
    }

    /// A student's applications, newest first.
    pub fn applications_for_student(&self, student_id: Uuid) -> Result<Vec<ApplicationDetail>> {
        self.application_details(DetailScope::Student, student_id, None, true)
    }

    /// Applications to an employer's jobs, newest first.
    pub fn applications_for_employer(&self, employer_id: Uuid) -> Result<Vec<ApplicationDetail>> {
        self.application_details(DetailScope::Employer, employer_id, None, true)
    }

    /// Accepted applications sent by a student, oldest first.
    pub fn accepted_applications_for_student(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<ApplicationDetail>> {
        self.application_details(
            DetailScope::Student,
            student_id,
            Some(ApplicationStatus::Accepted),
            false,
        )
    }

    /// Accepted applications to an employer's jobs, oldest first.
    pub fn accepted_applications_for_employer(
        &self,
        employer_id: Uuid,
    ) -> Result<Vec<ApplicationDetail>> {
        self.application_details(
            DetailScope::Employer,
            employer_id,
            Some(ApplicationStatus::Accepted),
            false,
        )
    }

    /// True when some accepted application links a student of one user to a
    /// job of the other, in either direction.
    pub fn accepted_link_exists(&self, a: Uuid, b: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let found: i64 = conn.query_row(
                "SELECT EXISTS (
                    SELECT 1 FROM applications ap
                    JOIN jobs j ON j.id = ap.job_id
                    WHERE ap.status = 'accepted'
                      AND ((ap.student_id = ?1 AND j.employer_id = ?2)
                        OR (ap.student_id = ?2 AND j.employer_id = ?1))
                 )",
                (a.to_string(), b.to_string()),
                |row| row.get(0),
            )?;
            Ok(found != 0)
        })
    }

    fn application_details(
        &self,
        scope: DetailScope,
        user_id: Uuid,
        status: Option<ApplicationStatus>,
        newest_first: bool,
    ) -> Result<Vec<ApplicationDetail>> {
        let rows = self.with_conn(|conn| {
            query_application_details(conn, scope, &user_id.to_string(), status, newest_first)
        })?;

        rows.into_iter()
            .map(|(application, job, student)| {
                Ok(ApplicationDetail {
                    application: Application::try_from(application)?,
                    job: Job::try_from(job)?,
                    student: User::try_from(student)?,
                })
            })
            .collect()
    }

    // -- Messages --

    /// Insert a message and publish it on the change feed once committed.
    pub fn insert_message(&self, new: &NewMessage) -> Result<Message> {
        let id = Uuid::new_v4();

        // Stamp under the connection lock so created_at order matches rowid order.
        let created_at = self.with_conn(|conn| {
            let (created_at, created_at_text) = now_timestamp();
            conn.execute(
                "INSERT INTO messages (id, sender_id, receiver_id, content, created_at, conversation_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    id.to_string(),
                    new.sender_id.to_string(),
                    new.receiver_id.to_string(),
                    new.content,
                    created_at_text,
                    new.conversation_id.as_str(),
                ],
            )?;
            Ok(created_at)
        })?;

        let message = Message {
            id,
            sender_id: new.sender_id,
            receiver_id: new.receiver_id,
            content: new.content.clone(),
            created_at,
            conversation_id: new.conversation_id.clone(),
        };
        self.publish(ChangeKind::Insert, Record::Messages(message.clone()));
        Ok(message)
    }

    /// Full history, oldest first; equal timestamps keep insert order.
    pub fn messages_in_conversation(&self, conversation_id: &ConversationId) -> Result<Vec<Message>> {
        let rows = self.with_conn(|conn| {
            let sql = format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE conversation_id = ?1
                 ORDER BY created_at ASC, rowid ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([conversation_id.as_str()], message_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;

        rows.into_iter().map(Message::try_from).collect()
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1");
    let mut stmt = conn.prepare(&sql)?;
    stmt.query_row([value], |row| user_row(row, 0)).optional()
}

fn query_application_details(
    conn: &Connection,
    scope: DetailScope,
    user_id: &str,
    status: Option<ApplicationStatus>,
    newest_first: bool,
) -> Result<Vec<(ApplicationRow, JobRow, UserRow)>> {
    let owner = match scope {
        DetailScope::Student => "a.student_id = ?1",
        DetailScope::Employer => "j.employer_id = ?1",
    };
    let order = if newest_first { "DESC" } else { "ASC" };

    let sql = format!(
        "SELECT a.id, a.job_id, a.student_id, a.applied_at, a.status,
                j.id, j.title, j.company_name, j.location, j.description, j.pay, j.employer_id, j.status, j.created_at,
                u.id, u.email, u.password, u.name, u.age, u.bio, u.user_type, u.company_name, u.created_at
         FROM applications a
         JOIN jobs j ON j.id = a.job_id
         JOIN users u ON u.id = a.student_id
         WHERE {owner} AND (?2 IS NULL OR a.status = ?2)
         ORDER BY a.applied_at {order}, a.rowid {order}"
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(rusqlite::params![user_id, status.map(|s| s.as_str())], |row| {
            Ok((
                ApplicationRow {
                    id: row.get(0)?,
                    job_id: row.get(1)?,
                    student_id: row.get(2)?,
                    applied_at: row.get(3)?,
                    status: row.get(4)?,
                },
                JobRow {
                    id: row.get(5)?,
                    title: row.get(6)?,
                    company_name: row.get(7)?,
                    location: row.get(8)?,
                    description: row.get(9)?,
                    pay: row.get(10)?,
                    employer_id: row.get(11)?,
                    status: row.get(12)?,
                    created_at: row.get(13)?,
                },
                user_row(row, 14)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// `%text%` with LIKE wildcards in `text` escaped, for `ESCAPE '\'`.
fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn user_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(offset)?,
        email: row.get(offset + 1)?,
        password: row.get(offset + 2)?,
        name: row.get(offset + 3)?,
        age: row.get(offset + 4)?,
        bio: row.get(offset + 5)?,
        user_type: row.get(offset + 6)?,
        company_name: row.get(offset + 7)?,
        created_at: row.get(offset + 8)?,
    })
}

fn job_row(row: &Row<'_>) -> rusqlite::Result<JobRow> {
    Ok(JobRow {
        id: row.get(0)?,
        title: row.get(1)?,
        company_name: row.get(2)?,
        location: row.get(3)?,
        description: row.get(4)?,
        pay: row.get(5)?,
        employer_id: row.get(6)?,
        status: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn application_row(row: &Row<'_>) -> rusqlite::Result<ApplicationRow> {
    Ok(ApplicationRow {
        id: row.get(0)?,
        job_id: row.get(1)?,
        student_id: row.get(2)?,
        applied_at: row.get(3)?,
        status: row.get(4)?,
    })
}

fn message_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        receiver_id: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
        conversation_id: row.get(5)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
