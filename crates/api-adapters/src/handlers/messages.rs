use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use domains::{ConversationMessage, MessageId, UserId};
use serde::Deserialize;
use services::Conversation;
use serde_json::{json, Value};

use super::message;
use crate::error::ApiResult;
use crate::extract::{ApiJson, AuthUser};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SendMessage {
    #[serde(alias = "receiverId")]
    pub receiver_id: UserId,
    pub content: Option<String>,
    #[serde(alias = "attachmentUrl")]
    pub attachment_url: Option<String>,
}

pub async fn conversations(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Value>> {
    let conversations = state.services.messages.conversations(user).await?;
    Ok(Json(json!({ "conversations": conversations })))
}

pub async fn conversation(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(peer): Path<UserId>,
) -> ApiResult<Json<Conversation>> {
    Ok(Json(state.services.messages.conversation(user, peer).await?))
}

pub async fn send(
    State(state): State<AppState>,
    AuthUser(sender): AuthUser,
    ApiJson(body): ApiJson<SendMessage>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let sent = state
        .services
        .messages
        .send(sender, body.receiver_id, body.content, body.attachment_url)
        .await?;
    let data = ConversationMessage {
        message: sent,
        is_outgoing: true,
    };
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Message sent successfully", "data": data })),
    ))
}

pub async fn mark_conversation_read(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(peer): Path<UserId>,
) -> ApiResult<Json<Value>> {
    let count = state.services.interactions.mark_conversation_read(peer, user).await?;
    Ok(Json(json!({ "message": "Messages marked as read", "count": count })))
}

pub async fn mark_read(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<MessageId>,
) -> ApiResult<Json<Value>> {
    state.services.interactions.mark_message_read(id, user).await?;
    Ok(message("Message marked as read"))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<MessageId>,
) -> ApiResult<Json<Value>> {
    state.services.messages.delete(id, user).await?;
    Ok(message("Message deleted successfully"))
}

pub async fn unread_count(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Value>> {
    let count = state.services.interactions.unread_messages(user).await?;
    Ok(Json(json!({ "count": count })))
}
