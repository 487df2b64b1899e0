use axum::extract::{Path, State};
use axum::Json;
use domains::{ProfileUpdate, UserId};
use serde_json::{json, Value};

use super::message;
use crate::error::ApiResult;
use crate::extract::{ApiJson, AuthUser};
use crate::state::AppState;

pub async fn me(State(state): State<AppState>, AuthUser(user): AuthUser) -> ApiResult<Json<Value>> {
    let profile = state.services.profiles.me(user).await?;
    Ok(Json(json!({ "user": profile })))
}

pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> ApiResult<Json<Value>> {
    state.services.profiles.update_profile(user, update).await?;
    Ok(message("Profile updated successfully"))
}

pub async fn view(
    State(state): State<AppState>,
    AuthUser(viewer): AuthUser,
    Path(id): Path<UserId>,
) -> ApiResult<Json<Value>> {
    let profile = state.services.profiles.view(viewer, id).await?;
    Ok(Json(json!({ "user": profile })))
}

pub async fn posts(
    State(state): State<AppState>,
    AuthUser(viewer): AuthUser,
    Path(id): Path<UserId>,
) -> ApiResult<Json<Value>> {
    let posts = state.services.posts.by_author(id, viewer).await?;
    Ok(Json(json!({ "posts": posts })))
}

pub async fn followers(
    State(state): State<AppState>,
    AuthUser(viewer): AuthUser,
    Path(id): Path<UserId>,
) -> ApiResult<Json<Value>> {
    let users = state.services.graph.followers(id, viewer).await?;
    Ok(Json(json!({ "users": users })))
}

pub async fn following(
    State(state): State<AppState>,
    AuthUser(viewer): AuthUser,
    Path(id): Path<UserId>,
) -> ApiResult<Json<Value>> {
    let users = state.services.graph.following(id, viewer).await?;
    Ok(Json(json!({ "users": users })))
}

pub async fn follow(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<UserId>,
) -> ApiResult<Json<Value>> {
    state.services.graph.follow(user, id).await?;
    Ok(message("User followed successfully"))
}

pub async fn unfollow(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<UserId>,
) -> ApiResult<Json<Value>> {
    state.services.graph.unfollow(user, id).await?;
    Ok(message("User unfollowed successfully"))
}

pub async fn block(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<UserId>,
) -> ApiResult<Json<Value>> {
    state.services.graph.block(user, id).await?;
    Ok(message("User blocked successfully"))
}

pub async fn unblock(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<UserId>,
) -> ApiResult<Json<Value>> {
    state.services.graph.unblock(user, id).await?;
    Ok(message("User unblocked successfully"))
}
