//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router around a compiled [`Dispatcher`]
//! - Wire up middleware (tracing, limits, timeouts, request ID)
//! - Bind server to listener
//! - Stop on the lifecycle shutdown signal

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::context::Env;
use crate::http::request::{UuidRequestId, X_REQUEST_ID};
use crate::http::service::DispatchService;
use crate::routing::Dispatcher;

/// HTTP server hosting one dispatcher.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
}

impl HttpServer {
    /// Create a new HTTP server. A non-empty `env` table in the config selects
    /// the environment-carrying host model.
    pub fn new(config: ServerConfig, dispatcher: Arc<Dispatcher>) -> Self {
        let mut service = DispatchService::new(dispatcher);
        if !config.env.is_empty() {
            service = service.with_env(Env::new(config.env.clone()));
        }

        let router = Self::build_router(&config, service);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, service: DispatchService) -> Router {
        Router::new()
            .fallback_service(service)
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
    }

    /// The layered router, for embedding or in-process testing.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Run the server until a shutdown signal arrives.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            request_timeout_secs = self.config.timeouts.request_secs,
            max_body_size = self.config.limits.max_body_size,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}
