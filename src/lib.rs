//! Request routing and middleware dispatch.
//!
//! Routes are registered on a [`RouteBuilder`] as ordered handler chains,
//! compiled once into a [`Dispatcher`], and served either in-process via
//! [`Dispatcher::fetch`] or over HTTP through [`HttpServer`].

pub mod config;
pub mod context;
pub mod handler;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::ServerConfig;
pub use context::{Context, Env, ExecutionContext};
pub use handler::{boxed, handler, terminal, BoxedHandler, Chain, Handler, HandlerResult, IntoChain};
pub use http::{DispatchService, HttpServer};
pub use lifecycle::Shutdown;
pub use routing::{Dispatcher, MethodSelector, RouteBuilder, RouteError};
