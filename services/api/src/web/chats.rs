//! services/api/src/web/chats.rs
//!
//! Chat inbox, history and sending over REST. Live delivery goes through `/ws`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::web::dto::{
    ChatResponse, ChatSummaryResponse, CreateChatRequest, MessageResponse, SendMessageRequest,
};
use crate::web::rest::{port_error, HandlerError};
use crate::web::state::AppState;

/// Open (or reopen) the chat with another user.
#[utoipa::path(
    post,
    path = "/chats",
    request_body = CreateChatRequest,
    responses(
        (status = 200, description = "The chat for this pair", body = ChatResponse),
        (status = 404, description = "Unknown peer"),
        (status = 422, description = "Cannot chat with yourself")
    )
)]
pub async fn create_chat_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(body): Json<CreateChatRequest>,
) -> Result<Json<ChatResponse>, HandlerError> {
    let chat = state
        .chats
        .get_or_create_chat(user_id, body.peer_id)
        .await
        .map_err(port_error)?;
    Ok(Json(chat.into()))
}

/// The caller's chats, most recently active first.
#[utoipa::path(
    get,
    path = "/chats",
    responses((status = 200, description = "Inbox", body = [ChatSummaryResponse]))
)]
pub async fn list_chats_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<Vec<ChatSummaryResponse>>, HandlerError> {
    let chats = state
        .chats
        .get_user_chats(user_id)
        .await
        .map_err(port_error)?;
    Ok(Json(chats.into_iter().map(Into::into).collect()))
}

/// Message history, oldest first.
#[utoipa::path(
    get,
    path = "/chats/{id}/messages",
    params(("id" = Uuid, Path, description = "Chat id")),
    responses(
        (status = 200, description = "Messages", body = [MessageResponse]),
        (status = 403, description = "Caller is not a participant"),
        (status = 404, description = "Unknown chat")
    )
)]
pub async fn list_messages_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(chat_id): Path<Uuid>,
) -> Result<Json<Vec<MessageResponse>>, HandlerError> {
    let messages = state
        .chats
        .messages(user_id, chat_id)
        .await
        .map_err(port_error)?;
    Ok(Json(messages.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/chats/{id}/messages",
    params(("id" = Uuid, Path, description = "Chat id")),
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Stored message", body = MessageResponse),
        (status = 403, description = "Caller is not a participant"),
        (status = 422, description = "Empty message")
    )
)]
pub async fn send_message_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(chat_id): Path<Uuid>,
    Json(body): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let message = state
        .chats
        .send_message(user_id, chat_id, &body.content)
        .await
        .map_err(port_error)?;
    Ok((StatusCode::CREATED, Json(MessageResponse::from(message))))
}
