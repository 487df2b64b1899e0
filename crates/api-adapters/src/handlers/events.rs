use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use domains::{AttendanceStatus, EventId, UserId};
use serde::Deserialize;
use serde_json::{json, Value};

use super::message;
use crate::error::ApiResult;
use crate::extract::{ApiJson, AuthUser};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateEvent {
    #[serde(default)]
    pub title: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "attendees")]
    pub invitees: Vec<UserId>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEvent {
    #[serde(default)]
    pub title: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct Respond {
    pub status: AttendanceStatus,
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(creator): AuthUser,
    ApiJson(body): ApiJson<CreateEvent>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let event = state
        .services
        .events
        .create(creator, body.title, body.description, body.date, body.invitees)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Event created successfully", "event": event })),
    ))
}

pub async fn list(State(state): State<AppState>, AuthUser(user): AuthUser) -> ApiResult<Json<Value>> {
    let events = state.services.events.list(user).await?;
    Ok(Json(json!({ "events": events })))
}

pub async fn get(
    State(state): State<AppState>,
    AuthUser(viewer): AuthUser,
    Path(id): Path<EventId>,
) -> ApiResult<Json<Value>> {
    let event = state.services.events.get(id, viewer).await?;
    Ok(Json(json!({ "event": event })))
}

pub async fn attendees(
    State(state): State<AppState>,
    AuthUser(viewer): AuthUser,
    Path(id): Path<EventId>,
) -> ApiResult<Json<Value>> {
    let attendees = state.services.events.attendees(id, viewer).await?;
    Ok(Json(json!({ "attendees": attendees })))
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<EventId>,
    ApiJson(body): ApiJson<UpdateEvent>,
) -> ApiResult<Json<Value>> {
    state
        .services
        .events
        .update(id, user, body.title, body.description, body.date)
        .await?;
    Ok(message("Event updated successfully"))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<EventId>,
) -> ApiResult<Json<Value>> {
    state.services.events.delete(id, user).await?;
    Ok(message("Event cancelled successfully"))
}

pub async fn respond(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<EventId>,
    ApiJson(body): ApiJson<Respond>,
) -> ApiResult<Json<Value>> {
    state.services.events.respond(id, user, body.status).await?;
    Ok(message("Attendance status updated"))
}
