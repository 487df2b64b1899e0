use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use domains::CommunityId;
use serde::Deserialize;
use serde_json::{json, Value};

use super::message;
use crate::error::ApiResult;
use crate::extract::{ApiJson, AuthUser};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCommunity {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(admin): AuthUser,
    ApiJson(body): ApiJson<CreateCommunity>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let community = state
        .services
        .communities
        .create(admin, body.name, body.description)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Community created successfully", "community": community })),
    ))
}

pub async fn list(State(state): State<AppState>, AuthUser(_): AuthUser) -> ApiResult<Json<Value>> {
    let communities = state.services.communities.list().await?;
    Ok(Json(json!({ "communities": communities })))
}

pub async fn mine(State(state): State<AppState>, AuthUser(user): AuthUser) -> ApiResult<Json<Value>> {
    let communities = state.services.communities.mine(user).await?;
    Ok(Json(json!({ "communities": communities })))
}

pub async fn get(
    State(state): State<AppState>,
    AuthUser(viewer): AuthUser,
    Path(id): Path<CommunityId>,
) -> ApiResult<Json<Value>> {
    let communities = &state.services.communities;
    let community = communities.get(id).await?;
    let is_member = communities.is_member(id, viewer).await?;
    Ok(Json(json!({
        "is_admin": community.admin_id == viewer,
        "is_member": is_member,
        "community": community,
    })))
}

pub async fn join(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<CommunityId>,
) -> ApiResult<Json<Value>> {
    state.services.communities.join(id, user).await?;
    Ok(message("Joined community successfully"))
}

pub async fn leave(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<CommunityId>,
) -> ApiResult<Json<Value>> {
    state.services.communities.leave(id, user).await?;
    Ok(message("Left community successfully"))
}
