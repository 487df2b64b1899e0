use axum::extract::{Path, State};
use axum::Json;
use domains::{NotificationId, PostId};
use serde::Deserialize;
use serde_json::{json, Value};

use super::message;
use crate::error::ApiResult;
use crate::extract::{ApiJson, AuthUser};
use crate::state::AppState;

/// `reminderTime` is a delay in whole hours.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReminder {
    #[serde(alias = "post_id")]
    pub post_id: PostId,
    #[serde(alias = "hours")]
    pub reminder_time: i64,
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(body): ApiJson<CreateReminder>,
) -> ApiResult<Json<Value>> {
    let reminder = state
        .services
        .reminders
        .schedule(user, body.post_id, body.reminder_time)
        .await?;
    Ok(Json(json!({ "message": "Reminder set successfully", "reminder": reminder })))
}

pub async fn list(State(state): State<AppState>, AuthUser(user): AuthUser) -> ApiResult<Json<Value>> {
    let reminders = state.services.reminders.list(user).await?;
    Ok(Json(json!({ "reminders": reminders })))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<NotificationId>,
) -> ApiResult<Json<Value>> {
    state.services.reminders.cancel(id, user).await?;
    Ok(message("Reminder deleted successfully"))
}
