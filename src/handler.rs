//! Handler contract.
//!
//! A handler receives the request context and either finishes the request by
//! returning a response, or hands control to the next handler in the chain
//! with [`Context::next`]. Middleware and endpoints share the same shape.
//!
//! # Design Decisions
//! - The future returned by [`Handler::call`] borrows the context only, so the
//!   chain can be walked without holding a borrow on the handler itself
//! - Failures are plain `Err` values; nothing in the core catches them
//! - Synchronous handlers are wrapped in a ready future

use std::sync::Arc;

use axum::response::Response;
use futures_util::future::{self, BoxFuture};
use tower::BoxError;

use crate::context::Context;

/// What every handler resolves to.
pub type HandlerResult = Result<Response, BoxError>;

/// A step in a request's handler chain.
pub trait Handler: Send + Sync + 'static {
    fn call<'a>(&self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult>;
}

/// Shared, type-erased handler.
pub type BoxedHandler = Arc<dyn Handler>;

/// An ordered handler chain, shared between the route table and every request
/// that resolves to it.
pub type Chain = Arc<[BoxedHandler]>;

struct AsyncFn<F>(F);

impl<F> Handler for AsyncFn<F>
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
{
    fn call<'a>(&self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        (self.0)(ctx)
    }
}

struct SyncFn<F>(F);

impl<F> Handler for SyncFn<F>
where
    F: Fn(&mut Context) -> HandlerResult + Send + Sync + 'static,
{
    fn call<'a>(&self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        Box::pin(future::ready((self.0)(ctx)))
    }
}

/// Wrap an async closure as a handler.
///
/// ```ignore
/// let timing = handler(|ctx| Box::pin(async move {
///     let started = std::time::Instant::now();
///     let response = ctx.next().await?;
///     tracing::debug!(elapsed = ?started.elapsed(), "request finished");
///     Ok(response)
/// }));
/// ```
pub fn handler<F>(f: F) -> BoxedHandler
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
{
    Arc::new(AsyncFn(f))
}

/// Wrap a synchronous closure that always produces the response itself.
pub fn terminal<F>(f: F) -> BoxedHandler
where
    F: Fn(&mut Context) -> HandlerResult + Send + Sync + 'static,
{
    Arc::new(SyncFn(f))
}

/// Box any [`Handler`] implementation.
pub fn boxed<H: Handler>(h: H) -> BoxedHandler {
    Arc::new(h)
}

/// Anything that can be turned into the route-specific part of a chain.
pub trait IntoChain {
    fn into_chain(self) -> Vec<BoxedHandler>;
}

impl IntoChain for BoxedHandler {
    fn into_chain(self) -> Vec<BoxedHandler> {
        vec![self]
    }
}

impl IntoChain for Vec<BoxedHandler> {
    fn into_chain(self) -> Vec<BoxedHandler> {
        self
    }
}

impl<const N: usize> IntoChain for [BoxedHandler; N] {
    fn into_chain(self) -> Vec<BoxedHandler> {
        self.into()
    }
}
