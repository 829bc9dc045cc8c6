use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::CallerId;
use crate::routes::threads::SendMessageBody;
use crate::state::AppState;
use infra::{
    models::{MessageThreadRow, ThreadMessageRow},
    repos::{NewThreadMessage, ThreadRepo},
};

#[derive(Deserialize)]
pub struct EditMessageBody {
    pub content: String,
}

#[derive(Serialize)]
pub struct MatchConversation {
    pub thread: MessageThreadRow,
    pub messages: Vec<ThreadMessageRow>,
}

/// Returns the caller's private thread for a match, creating it on first
/// access, together with its messages.
pub async fn match_messages(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Path(match_id): Path<Uuid>,
) -> Result<Json<MatchConversation>, AppError> {
    let repo = ThreadRepo::new(state.db.clone());
    let thread = repo
        .get_or_create_match_thread(match_id, user_id, None, None)
        .await?;
    let messages = repo.messages(thread.id).await?;
    Ok(Json(MatchConversation { thread, messages }))
}

/// Sends into the caller's private thread for a match, creating the thread
/// on first message.
pub async fn send_match_message(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Path(match_id): Path<Uuid>,
    Json(body): Json<SendMessageBody>,
) -> Result<(StatusCode, Json<ThreadMessageRow>), AppError> {
    let repo = ThreadRepo::new(state.db.clone());
    let thread = repo
        .get_or_create_match_thread(match_id, user_id, None, None)
        .await?;
    let message = repo
        .append_message(
            thread.id,
            NewThreadMessage {
                sender_id: user_id,
                content: body.content,
                image_url: body.image_url,
                tournament_ref: body.tournament_ref,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// Only the sender may edit their message.
pub async fn edit_message(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Path(message_id): Path<Uuid>,
    Json(body): Json<EditMessageBody>,
) -> Result<Json<ThreadMessageRow>, AppError> {
    let message = ThreadRepo::new(state.db.clone())
        .update_message(message_id, user_id, body.content)
        .await?;
    Ok(Json(message))
}

/// Only the sender may delete their message.
pub async fn delete_message(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Path(message_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    ThreadRepo::new(state.db.clone())
        .delete_message(message_id, user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
