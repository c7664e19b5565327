use std::sync::Arc;

use crate::config::Config;
use crate::session::store::SessionStore;
use crate::upstream::JobAssistantApi;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The remote backend. `HttpUpstream` in production, an in-memory fake in tests.
    pub upstream: Arc<dyn JobAssistantApi>,
    pub sessions: SessionStore,
    pub config: Config,
}
