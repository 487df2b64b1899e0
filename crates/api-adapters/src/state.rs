use std::sync::Arc;

use domains::TokenVerifier;
use services::{LiveRegistry, Services};

use crate::metrics::Metrics;

/// Shared by every handler; cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub verifier: Arc<dyn TokenVerifier>,
    pub live: Arc<LiveRegistry>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(
        services: Services,
        verifier: Arc<dyn TokenVerifier>,
        live: Arc<LiveRegistry>,
    ) -> Self {
        Self {
            services,
            verifier,
            live,
            metrics: Arc::new(Metrics::new()),
        }
    }
}
