use axum::{Extension, Json, extract::State, response::IntoResponse};

use sezora_core::profile;
use sezora_types::api::{Claims, UpdateProfileRequest};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::with_session;

pub async fn get_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user = with_session(&state, claims, |state, session| {
        profile::get_profile(&state.db, session)
    })
    .await?;
    Ok(Json(user))
}

pub async fn update_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = with_session(&state, claims, move |state, session| {
        profile::update_profile(&state.db, session, req)
    })
    .await?;
    Ok(Json(user))
}
