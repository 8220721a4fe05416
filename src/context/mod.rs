//! Per-request context.
//!
//! # Data Flow
//! ```text
//! Request (from host adapter)
//!     → Context::new (path located once)
//!     → [host bindings attached, environment-carrying hosts only]
//!     → Dispatcher installs chain + params, cursor before first handler
//!     → next() → handler 0 → next() → handler 1 → ... → response builder
//! ```
//!
//! # Design Decisions
//! - One context per request, owned by the dispatch call, never shared
//! - The chain is shared by reference count, never copied
//! - Cursor starts before the first handler; each `next()` advances it once

pub mod bindings;
pub mod path;

use std::ops::Range;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{
    header::{self, HeaderValue},
    Extensions, HeaderMap, Method, Request, StatusCode,
};
use axum::response::Response;
use futures_util::future::{self, BoxFuture};
use serde::Serialize;

use crate::handler::{BoxedHandler, Chain, HandlerResult};
use crate::http::response::RedirectStatus;
use crate::routing::errors::DispatchError;
use crate::routing::matcher::Params;

pub use bindings::{Env, ExecutionContext};

/// Request-scoped state threaded through a handler chain.
pub struct Context {
    request: Request<Body>,
    path: String,
    path_range: Range<usize>,

    /// Status used by the response builders.
    pub status: StatusCode,
    /// Headers used by the response builders.
    pub headers: HeaderMap,

    params: Params,
    chain: Chain,
    cursor: Option<usize>,
    extensions: Extensions,
    env: Option<Env>,
    execution: Option<ExecutionContext>,
}

impl Context {
    /// Wrap an inbound request. The path is located here and never re-parsed.
    pub fn new(request: Request<Body>) -> Self {
        let target = request.uri().to_string();
        let path_range = path::locate(&target);
        let path = path::materialize(&target, &path_range);

        Self {
            request,
            path,
            path_range,
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            params: Params::default(),
            chain: Arc::from(Vec::<BoxedHandler>::new()),
            cursor: None,
            extensions: Extensions::new(),
            env: None,
            execution: None,
        }
    }

    /// Attach host bindings. Only environment-carrying hosts call this.
    pub fn bind(&mut self, env: Env, execution: ExecutionContext) {
        self.env = Some(env);
        self.execution = Some(execution);
    }

    /// Install a resolved chain and its parameters, rewinding the cursor.
    pub(crate) fn install(&mut self, chain: Chain, params: Params) {
        self.chain = chain;
        self.params = params;
        self.cursor = None;
    }

    pub fn request(&self) -> &Request<Body> {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut Request<Body> {
        &mut self.request
    }

    /// Take the request body, leaving an empty one behind.
    pub fn take_body(&mut self) -> Body {
        std::mem::take(self.request.body_mut())
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Offsets of the path inside the request target.
    pub fn path_range(&self) -> Range<usize> {
        self.path_range.clone()
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// Typed state that earlier handlers leave for later ones.
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    pub fn env(&self) -> Option<&Env> {
        self.env.as_ref()
    }

    pub fn execution(&self) -> Option<&ExecutionContext> {
        self.execution.as_ref()
    }

    /// Index of the handler currently running, `None` before the chain starts.
    /// Equal to the chain length once `next()` was called past the end.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn chain_len(&self) -> usize {
        self.chain.len()
    }

    /// Advance the cursor and run the handler it lands on.
    ///
    /// The last handler of a chain is expected to finish the request. Calling
    /// `next()` past the end is a programming error and yields
    /// [`DispatchError::ChainExhausted`].
    pub fn next(&mut self) -> BoxFuture<'_, HandlerResult> {
        let index = self.cursor.map_or(0, |c| c + 1);
        self.cursor = Some(index);

        let Some(handler) = self.chain.get(index).cloned() else {
            let err = DispatchError::ChainExhausted {
                index,
                len: self.chain.len(),
                method: self.method().clone(),
                path: self.path.clone(),
            };
            tracing::error!(error = %err, "Handler chain exhausted");
            return Box::pin(future::ready(HandlerResult::Err(err.into())));
        };

        handler.call(self)
    }

    /// Finish with an arbitrary body.
    pub fn body(&mut self, body: impl Into<Body>) -> Response {
        self.finish(body.into())
    }

    /// Finish with a plain-text body.
    pub fn text(&mut self, body: impl Into<String>) -> Response {
        self.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        self.finish(Body::from(body.into()))
    }

    /// Finish with a JSON body.
    pub fn json<T: Serialize + ?Sized>(&mut self, value: &T) -> HandlerResult {
        let body = serde_json::to_vec(value)?;
        self.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        Ok(self.finish(Body::from(body)))
    }

    /// Finish with an HTML body.
    pub fn html(&mut self, body: impl Into<Body>) -> Response {
        self.headers
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html"));
        self.finish(body.into())
    }

    /// Finish with an empty redirect response.
    pub fn redirect(&mut self, location: &str, status: RedirectStatus) -> HandlerResult {
        let location = HeaderValue::from_str(location)?;
        self.headers.insert(header::LOCATION, location);
        self.status = status.into();
        Ok(self.finish(Body::empty()))
    }

    fn finish(&self, body: Body) -> Response {
        let mut response = Response::new(body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers.clone();
        response
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("method", self.method())
            .field("path", &self.path)
            .field("status", &self.status)
            .field("params", &self.params)
            .field("cursor", &self.cursor)
            .field("chain_len", &self.chain.len())
            .finish()
    }
}
