//! Prometheus metrics exposed on `/metrics`.

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;
use tracing::error;

use crate::state::AppState;

#[derive(Debug, Clone, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ResponseLabels {
    pub class: String,
}

pub struct Metrics {
    registry: Registry,
    responses: Family<ResponseLabels, Counter>,
    live_connections: Gauge,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::with_prefix("innovate");
        let responses = Family::<ResponseLabels, Counter>::default();
        let live_connections = Gauge::default();
        registry.register(
            "http_responses",
            "HTTP responses by status class",
            responses.clone(),
        );
        registry.register(
            "live_connections",
            "Users with an open live channel",
            live_connections.clone(),
        );
        Self {
            registry,
            responses,
            live_connections,
        }
    }

    pub fn observe(&self, status: StatusCode) {
        let class = format!("{}xx", status.as_u16() / 100);
        self.responses.get_or_create(&ResponseLabels { class }).inc();
    }

    pub fn set_live_connections(&self, count: usize) {
        self.live_connections
            .set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    pub fn render(&self) -> Result<String, std::fmt::Error> {
        let mut body = String::new();
        encode(&mut body, &self.registry)?;
        Ok(body)
    }
}

/// Counts every response by its status class.
pub async fn track(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let response = next.run(req).await;
    state.metrics.observe(response.status());
    response
}

pub async fn scrape(State(state): State<AppState>) -> Response {
    state.metrics.set_live_connections(state.live.len());
    match state.metrics.render() {
        Ok(body) => (
            [(
                header::CONTENT_TYPE,
                "application/openmetrics-text; version=1.0.0; charset=utf-8",
            )],
            body,
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "metrics encoding failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
