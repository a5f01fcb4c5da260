//! Application state for the alumni RAG server

use std::sync::Arc;
use std::time::Instant;

use crate::config::RagConfig;
use crate::service::AlumniRagService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Answering service
    service: Arc<AlumniRagService>,
    /// Process start, reported by the info endpoint
    started_at: Instant,
}

impl AppState {
    /// Wrap an initialized service
    pub fn new(service: Arc<AlumniRagService>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                service,
                started_at: Instant::now(),
            }),
        }
    }

    pub fn service(&self) -> &Arc<AlumniRagService> {
        &self.inner.service
    }

    pub fn config(&self) -> &RagConfig {
        self.inner.service.config()
    }

    /// Seconds since the state was created
    pub fn uptime_secs(&self) -> u64 {
        self.inner.started_at.elapsed().as_secs()
    }
}
