//! # api-adapters
//!
//! The HTTP surface of Innovate: the `/api` JSON routes, the `/ws` live
//! channel, `/metrics` and `/health`. Handlers stay thin; every decision
//! lives in the services crate.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod metrics;
pub mod state;
pub mod ws;

use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::Method;
use axum::routing::{delete, get, post, put};
use axum::{middleware, Json, Router};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ApiResult};
pub use extract::AuthUser;
pub use metrics::Metrics;
pub use state::AppState;

use handlers::{communities, events, messages, notifications, posts, reminders, users};

/// Builds the complete application router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/users/me", get(users::me).put(users::update_me))
        .route("/users/{id}", get(users::view))
        .route("/users/{id}/posts", get(users::posts))
        .route("/users/{id}/followers", get(users::followers))
        .route("/users/{id}/following", get(users::following))
        .route("/users/{id}/follow", post(users::follow))
        .route("/users/{id}/unfollow", post(users::unfollow))
        .route("/users/{id}/block", post(users::block))
        .route("/users/{id}/unblock", post(users::unblock))
        .route("/posts", get(posts::feed).post(posts::create))
        .route("/posts/saved", get(posts::saved))
        .route(
            "/posts/{id}",
            get(posts::get).put(posts::update).delete(posts::delete),
        )
        .route("/posts/{id}/archive", put(posts::archive))
        .route("/posts/{id}/interest", post(posts::interest))
        .route("/posts/{id}/save", post(posts::save))
        .route("/posts/{id}/vote", post(posts::vote))
        .route(
            "/notifications",
            get(notifications::list).delete(notifications::clear_all),
        )
        .route("/notifications/unread-count", get(notifications::unread_count))
        .route("/notifications/mark-all-read", post(notifications::mark_all_read))
        .route("/notifications/{id}", delete(notifications::delete))
        .route("/notifications/{id}/read", put(notifications::mark_read))
        .route("/messages", post(messages::send))
        .route("/messages/conversations", get(messages::conversations))
        .route("/messages/unread-count", get(messages::unread_count))
        .route("/messages/conversation/{id}", get(messages::conversation))
        .route(
            "/messages/conversation/{id}/read",
            put(messages::mark_conversation_read),
        )
        .route("/messages/{id}", delete(messages::delete))
        .route("/messages/{id}/read", put(messages::mark_read))
        .route("/reminders", get(reminders::list).post(reminders::create))
        .route("/reminders/{id}", delete(reminders::delete))
        .route("/communities", get(communities::list).post(communities::create))
        .route("/communities/my-communities", get(communities::mine))
        .route("/communities/{id}", get(communities::get))
        .route("/communities/{id}/join", post(communities::join))
        .route("/communities/{id}/leave", post(communities::leave))
        .route("/events", get(events::list).post(events::create))
        .route(
            "/events/{id}",
            get(events::get).put(events::update).delete(events::delete),
        )
        .route("/events/{id}/attendees", get(events::attendees))
        .route("/events/{id}/status", put(events::respond));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .nest("/api", api)
        .route("/ws", get(ws::upgrade))
        .route("/metrics", get(metrics::scrape))
        .route("/health", get(health))
        .layer(middleware::from_fn_with_state(state.clone(), metrics::track))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(cors),
        )
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
