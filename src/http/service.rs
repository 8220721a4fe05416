//! Tower adapter for a compiled dispatcher.
//!
//! # Responsibilities
//! - Expose a [`Dispatcher`] as a `tower::Service`
//! - Pick the host model: plain, or environment-carrying
//! - Turn handler failures into `500` responses at the host boundary
//!
//! # Design Decisions
//! - Never fails at the service level (`Error = Infallible`)
//! - Background work scheduled through the execution context is drained on a
//!   detached task after the response is produced

use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::future::BoxFuture;
use tower::Service;

use crate::context::{Env, ExecutionContext};
use crate::routing::Dispatcher;

/// `tower::Service` running every request through a [`Dispatcher`].
#[derive(Debug, Clone)]
pub struct DispatchService {
    dispatcher: Arc<Dispatcher>,
    env: Option<Env>,
}

impl DispatchService {
    /// Plain host model: handlers see no environment.
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            env: None,
        }
    }

    /// Environment-carrying host model: every request gets `env` and a fresh
    /// execution context.
    pub fn with_env(mut self, env: Env) -> Self {
        self.env = Some(env);
        self
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }
}

impl Service<Request<Body>> for DispatchService {
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let dispatcher = self.dispatcher.clone();
        let env = self.env.clone();

        Box::pin(async move {
            let method = request.method().clone();
            let uri = request.uri().clone();

            let result = match env {
                Some(env) => {
                    let execution = ExecutionContext::new();
                    let result = dispatcher.fetch_with(request, env, execution.clone()).await;
                    if execution.pending() > 0 {
                        tokio::spawn(async move { execution.drain().await });
                    }
                    result
                }
                None => dispatcher.fetch(request).await,
            };

            Ok(result.unwrap_or_else(|e| {
                tracing::error!(method = %method, uri = %uri, error = %e, "Handler failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }))
        })
    }
}
