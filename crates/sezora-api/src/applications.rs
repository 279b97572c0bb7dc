use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use sezora_core::applications;
use sezora_types::api::{Claims, ReviewApplicationRequest};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::with_session;

pub async fn apply(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let application = with_session(&state, claims, move |state, session| {
        applications::apply(&state.db, session, job_id)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(application)))
}

pub async fn list_applications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let details = with_session(&state, claims, |state, session| {
        applications::list_applications(&state.db, session)
    })
    .await?;
    Ok(Json(details))
}

pub async fn review_application(
    State(state): State<AppState>,
    Path(application_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ReviewApplicationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let application = with_session(&state, claims, move |state, session| {
        applications::review_application(&state.db, session, application_id, req.status)
    })
    .await?;
    Ok(Json(application))
}
