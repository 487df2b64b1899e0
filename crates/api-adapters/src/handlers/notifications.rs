use axum::extract::{Path, State};
use axum::Json;
use domains::NotificationId;
use serde_json::{json, Value};

use super::message;
use crate::error::ApiResult;
use crate::extract::AuthUser;
use crate::state::AppState;

pub async fn list(State(state): State<AppState>, AuthUser(user): AuthUser) -> ApiResult<Json<Value>> {
    let notifications = state.services.notifications.list(user).await?;
    Ok(Json(json!({ "notifications": notifications })))
}

pub async fn unread_count(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Value>> {
    let count = state.services.notifications.unread_count(user).await?;
    Ok(Json(json!({ "count": count })))
}

pub async fn mark_read(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<NotificationId>,
) -> ApiResult<Json<Value>> {
    state.services.notifications.mark_read(id, user).await?;
    Ok(message("Notification marked as read"))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Value>> {
    let count = state.services.notifications.mark_all_read(user).await?;
    Ok(Json(json!({ "message": "All notifications marked as read", "count": count })))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<NotificationId>,
) -> ApiResult<Json<Value>> {
    state.services.notifications.delete(id, user).await?;
    Ok(message("Notification deleted"))
}

pub async fn clear_all(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Value>> {
    let count = state.services.notifications.clear_all(user).await?;
    Ok(Json(json!({ "message": "All notifications deleted", "count": count })))
}
