//! Shared fixtures for the end-to-end scenarios: a migrated in-memory
//! SQLite store, the full service graph wired to it, a clock the test can
//! move, and the HTTP router with real token verification.

use std::sync::{Arc, Mutex};

use api_adapters::AppState;
use auth_adapters::JwtAuth;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Duration, Utc};
use domains::{Clock, NewPost, NewUser, Post, PostRepository, UserId, UserRepository};
use secrecy::SecretString;
use serde_json::Value;
use services::{FeedSettings, LiveRegistry, Ports, Services};
use storage_adapters::SqliteStore;
use tower::ServiceExt;

/// A clock that only moves when told to.
pub struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self(Mutex::new(start))
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.0.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

pub struct Harness {
    pub store: SqliteStore,
    pub services: Services,
    pub live: Arc<LiveRegistry>,
    pub clock: Arc<ManualClock>,
    pub auth: Arc<JwtAuth>,
}

impl Harness {
    pub async fn new() -> Self {
        let store = SqliteStore::in_memory().await.unwrap();
        let live = Arc::new(LiveRegistry::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let ports = Ports {
            users: Arc::new(store.users()),
            graph: Arc::new(store.graph()),
            posts: Arc::new(store.posts()),
            interactions: Arc::new(store.interactions()),
            messages: Arc::new(store.messages()),
            notifications: Arc::new(store.notifications()),
            communities: Arc::new(store.communities()),
            events: Arc::new(store.events()),
            live: live.clone(),
            clock: clock.clone(),
        };
        let services = Services::new(ports, FeedSettings::default());
        let auth = Arc::new(JwtAuth::new(&SecretString::from(
            "integration-secret".to_string(),
        )));
        Self {
            store,
            services,
            live,
            clock,
            auth,
        }
    }

    pub async fn user(&self, name: &str) -> UserId {
        self.store
            .users()
            .create(NewUser {
                username: name.into(),
                email: format!("{name}@example.com"),
            })
            .await
            .unwrap()
            .id
    }

    pub async fn post(&self, owner: UserId, content: &str) -> Post {
        self.store
            .posts()
            .create(NewPost {
                owner,
                content: content.into(),
                image_url: None,
                poll: None,
                scheduled_at: None,
            })
            .await
            .unwrap()
    }

    pub fn token(&self, user: UserId) -> String {
        self.auth.issue(user, Utc::now(), Duration::hours(1)).unwrap()
    }

    pub fn router(&self) -> Router {
        api_adapters::router(AppState::new(
            self.services.clone(),
            self.auth.clone(),
            self.live.clone(),
        ))
    }

    /// Sends one request through a fresh router and decodes the JSON body.
    pub async fn call(
        &self,
        method: &str,
        uri: &str,
        user: Option<UserId>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header("authorization", format!("Bearer {}", self.token(user)));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }
}
