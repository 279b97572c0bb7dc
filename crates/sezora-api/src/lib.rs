//! HTTP surface: auth, profiles, the job board and message history. Handlers
//! resolve a [`Session`] from the bearer token and hand the work to
//! `sezora-core` on a blocking thread.

use axum::{
    Router,
    routing::{get, post, put},
};
use tracing::error;

use sezora_core::Session;
use sezora_types::api::Claims;

pub mod applications;
pub mod auth;
pub mod error;
pub mod jobs;
pub mod messages;
pub mod middleware;
pub mod profile;

pub use auth::{AppState, AppStateInner};
pub use error::ApiError;

/// All REST routes. The gateway route and the tower layers are added by the
/// server binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    let protected_routes = Router::new()
        .route("/me", get(profile::get_me).put(profile::update_me))
        .route("/jobs", get(jobs::list_jobs).post(jobs::create_job))
        .route("/jobs/mine", get(jobs::my_jobs))
        .route("/jobs/{job_id}", get(jobs::get_job))
        .route("/jobs/{job_id}/applications", post(applications::apply))
        .route("/admin/jobs/pending", get(jobs::pending_jobs))
        .route("/admin/jobs/{job_id}/status", put(jobs::review_job))
        .route("/applications", get(applications::list_applications))
        .route(
            "/applications/{application_id}/status",
            put(applications::review_application),
        )
        .route("/conversations", get(messages::list_conversations))
        .route(
            "/conversations/{conversation_id}/messages",
            get(messages::get_messages).post(messages::send_message),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

/// Run blocking store work off the async runtime.
pub(crate) async fn run_blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&AppStateInner) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&*state))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?
}

/// Like [`run_blocking`], with the caller's session loaded first. A token
/// whose user no longer exists is rejected.
pub(crate) async fn with_session<F, T, E>(state: &AppState, claims: Claims, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&AppStateInner, &Session) -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<ApiError>,
{
    run_blocking(state, move |state| {
        let session = auth::load_session(state, &claims)?;
        f(state, &session).map_err(Into::into)
    })
    .await
}
