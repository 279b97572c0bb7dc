use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use sezora_core::jobs;
use sezora_types::api::{Claims, CreateJobRequest, JobSearch, PendingJobSearch, ReviewJobRequest};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::with_session;

/// Approved jobs, newest first, filtered by `?q=` and `?location=`. Any
/// signed-in user may browse.
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(search): Query<JobSearch>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let jobs = with_session(&state, claims, move |state, _| {
        jobs::list_approved_jobs(&state.db, &search)
    })
    .await?;
    Ok(Json(jobs))
}

pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let job = with_session(&state, claims, move |state, _| {
        jobs::get_approved_job(&state.db, job_id)
    })
    .await?;
    Ok(Json(job))
}

pub async fn create_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateJobRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let job = with_session(&state, claims, move |state, session| {
        jobs::post_job(&state.db, session, req)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(job)))
}

pub async fn my_jobs(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let jobs = with_session(&state, claims, |state, session| {
        jobs::list_employer_jobs(&state.db, session)
    })
    .await?;
    Ok(Json(jobs))
}

pub async fn pending_jobs(
    State(state): State<AppState>,
    Query(search): Query<PendingJobSearch>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let jobs = with_session(&state, claims, move |state, session| {
        jobs::list_pending_jobs(&state.db, session, search.q.as_deref())
    })
    .await?;
    Ok(Json(jobs))
}

pub async fn review_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ReviewJobRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let job = with_session(&state, claims, move |state, session| {
        jobs::review_job(&state.db, session, job_id, req.status)
    })
    .await?;
    Ok(Json(job))
}
