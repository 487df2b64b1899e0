use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use domains::{FeedMode, Poll, PostId, PostUpdate};
use serde::Deserialize;
use serde_json::{json, Value};

use super::message;
use crate::error::ApiResult;
use crate::extract::{ApiJson, AuthUser};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FeedParams {
    pub filter: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePost {
    #[serde(default)]
    pub content: String,
    pub image_url: Option<String>,
    #[serde(alias = "poll_data")]
    pub poll: Option<Poll>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct Vote {
    pub option: i64,
}

pub async fn feed(
    State(state): State<AppState>,
    AuthUser(viewer): AuthUser,
    Query(params): Query<FeedParams>,
) -> ApiResult<Json<Value>> {
    let mode = FeedMode::from_filter(params.filter.as_deref());
    let posts = state.services.feed.compose(viewer, mode, params.limit).await?;
    Ok(Json(json!({ "posts": posts })))
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    ApiJson(body): ApiJson<CreatePost>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let post = state
        .services
        .posts
        .create(owner, body.content, body.image_url, body.poll, body.scheduled_at)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Post created successfully", "post_id": post.id })),
    ))
}

pub async fn saved(State(state): State<AppState>, AuthUser(user): AuthUser) -> ApiResult<Json<Value>> {
    let posts = state.services.posts.saved(user).await?;
    Ok(Json(json!({ "posts": posts })))
}

pub async fn get(
    State(state): State<AppState>,
    AuthUser(viewer): AuthUser,
    Path(id): Path<PostId>,
) -> ApiResult<Json<Value>> {
    let post = state.services.posts.get(id, viewer).await?;
    Ok(Json(json!({ "post": post })))
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<PostId>,
    ApiJson(update): ApiJson<PostUpdate>,
) -> ApiResult<Json<Value>> {
    state.services.posts.update(id, user, update).await?;
    Ok(message("Post updated successfully"))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<PostId>,
) -> ApiResult<Json<Value>> {
    state.services.posts.delete(id, user).await?;
    Ok(message("Post deleted successfully"))
}

pub async fn archive(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<PostId>,
) -> ApiResult<Json<Value>> {
    state.services.posts.archive(id, user).await?;
    Ok(message("Post archived successfully"))
}

pub async fn interest(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<PostId>,
) -> ApiResult<Json<Value>> {
    let count = state.services.interactions.toggle_interest(id, user).await?;
    Ok(Json(json!({ "interested_count": count })))
}

pub async fn save(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<PostId>,
) -> ApiResult<Json<Value>> {
    state.services.interactions.save(id, user).await?;
    Ok(message("Post saved successfully"))
}

pub async fn vote(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<PostId>,
    ApiJson(body): ApiJson<Vote>,
) -> ApiResult<Json<Value>> {
    let votes = state.services.posts.vote(id, user, body.option).await?;
    Ok(Json(json!({ "message": "Vote recorded successfully", "poll_votes": votes })))
}
