//! HTTP server for the resume parser

pub mod routes;
pub mod state;

use axum::{extract::DefaultBodyLimit, Router};
use std::future::Future;
use std::net::SocketAddr;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::ResumeParserConfig;
use crate::error::{Error, Result};
use crate::parser::ResumeParser;
use crate::storage::ResumeDb;
use state::AppState;

/// Resume parser HTTP server
pub struct ResumeServer {
    state: AppState,
}

impl ResumeServer {
    pub fn new(config: ResumeParserConfig, parser: ResumeParser, db: Option<ResumeDb>) -> Self {
        Self {
            state: AppState::new(config, parser, db),
        }
    }

    /// Build the router with all routes
    pub fn router(&self) -> Router {
        let config = self.state.config();
        let router = routes::routes()
            .with_state(self.state.clone())
            .layer(DefaultBodyLimit::max(config.server.max_upload_size))
            .layer(TraceLayer::new_for_http());

        if config.server.enable_cors {
            router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
        } else {
            router
        }
    }

    /// Serve until `shutdown` resolves
    pub async fn start<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = self
            .address()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {}", e)))?;

        let router = self.router();
        tracing::info!("Starting resume parser on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Config(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| Error::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Get the server address
    pub fn address(&self) -> String {
        let server = &self.state.config().server;
        format!("{}:{}", server.host, server.port)
    }
}
