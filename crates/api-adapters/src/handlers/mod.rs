//! REST handlers, one module per resource. Each handler authenticates, calls
//! exactly one service operation and shapes the JSON body.

pub mod communities;
pub mod events;
pub mod messages;
pub mod notifications;
pub mod posts;
pub mod reminders;
pub mod users;

use axum::Json;
use serde_json::{json, Value};

pub(crate) fn message(text: &str) -> Json<Value> {
    Json(json!({ "message": text }))
}
