//! HTTP hosting subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, limits, timeout, trace)
//!     → service.rs (tower::Service → Dispatcher::fetch / fetch_with)
//!     → [handler chain, middleware/ for reusable steps]
//!     → response.rs (redirects, prebuilt responses)
//!     → Send to client
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;
pub mod service;

pub use request::{request_id, UuidRequestId, X_REQUEST_ID};
pub use response::{send, RedirectStatus, ResponseInit};
pub use server::HttpServer;
pub use service::DispatchService;
