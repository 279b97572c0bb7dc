use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use sezora_core::conversation::ConversationList;
use sezora_core::{aggregator, composer};
use sezora_types::api::{Claims, SendMessageRequest};
use sezora_types::conversation::ConversationId;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::with_session;

/// The caller's conversations with full history. Live updates go over the
/// gateway; this is the snapshot a client starts from or reloads to.
pub async fn list_conversations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let conversations = with_session(&state, claims, |state, session| {
        aggregator::list_conversations(&*state.db, session).map(ConversationList::into_vec)
    })
    .await?;
    Ok(Json(conversations))
}

pub async fn get_messages(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let conversation_id = parse_conversation_id(&conversation_id)?;
    let messages = with_session(&state, claims, move |state, session| {
        aggregator::load_history(&*state.db, session, &conversation_id)
    })
    .await?;
    Ok(Json(messages))
}

/// The created row is returned, but the sender's open gateway session still
/// learns about it from the change feed like everyone else.
pub async fn send_message(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let conversation_id = parse_conversation_id(&conversation_id)?;
    let message = with_session(&state, claims, move |state, session| {
        composer::send(
            &*state.db,
            session,
            &conversation_id,
            req.receiver_id,
            &req.content,
        )
    })
    .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

fn parse_conversation_id(raw: &str) -> Result<ConversationId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest("malformed conversation id"))
}
