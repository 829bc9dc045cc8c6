use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::CallerId;
use crate::services::ThreadService;
use crate::state::AppState;
use infra::{
    models::{MessageThreadRow, ThreadMessageRow},
    repos::{NewThreadMessage, ThreadRepo},
};

#[derive(Deserialize)]
pub struct CreateDirectThreadBody {
    pub participant_id: Uuid,
    pub participant_name: Option<String>,
    pub participant_avatar: Option<String>,
}

#[derive(Deserialize)]
pub struct SendMessageBody {
    pub content: String,
    pub image_url: Option<String>,
    pub tournament_ref: Option<Uuid>,
}

/// All threads the caller may see, newest last-message first.
pub async fn list(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
) -> Result<Json<Vec<MessageThreadRow>>, AppError> {
    let threads = ThreadService::new(state).resolve_threads(user_id).await?;
    Ok(Json(threads))
}

/// Creates (or returns) the direct thread between the caller and the
/// participant; direction does not matter.
pub async fn create_direct(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Json(body): Json<CreateDirectThreadBody>,
) -> Result<(StatusCode, Json<MessageThreadRow>), AppError> {
    if body.participant_id == user_id {
        return Err(AppError::BadRequest(
            "cannot open a direct thread with yourself".to_string(),
        ));
    }

    let thread = ThreadRepo::new(state.db.clone())
        .get_or_create_direct(
            user_id,
            body.participant_id,
            body.participant_name,
            body.participant_avatar,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(thread)))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Path(thread_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    ThreadRepo::new(state.db.clone()).mark_read(thread_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_messages(
    State(state): State<AppState>,
    Path(thread_id): Path<Uuid>,
) -> Result<Json<Vec<ThreadMessageRow>>, AppError> {
    let messages = ThreadRepo::new(state.db.clone()).messages(thread_id).await?;
    Ok(Json(messages))
}

pub async fn send_message(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Path(thread_id): Path<Uuid>,
    Json(body): Json<SendMessageBody>,
) -> Result<(StatusCode, Json<ThreadMessageRow>), AppError> {
    let message = ThreadRepo::new(state.db.clone())
        .append_message(
            thread_id,
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
