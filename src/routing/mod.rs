//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (builder.rs):
//!     use_middleware / handle / get / post / ... / mount / nest
//!     → Route { method, pattern, standing middlewares ++ handlers }
//!
//! Compilation (router.rs, first dispatcher() call):
//!     Route[]
//!     → partition by method (ANY → fallback partition)
//!     → compile one matcher per partition (matcher.rs)
//!     → freeze as immutable Dispatcher
//!
//! Request:
//!     Dispatcher::fetch / fetch_with
//!     → method partition, or the fallback partition if the method has none
//!     → hit: install chain on Context, run handler 0
//!     → miss: "Cannot {METHOD} {PATH}"
//! ```
//!
//! # Design Decisions
//! - Routes compiled once, immutable at runtime
//! - The matcher engine is pluggable behind a trait
//! - Chains are shared by reference count, never copied per request

pub mod builder;
pub mod errors;
pub mod matcher;
pub mod route;
pub mod router;

pub use builder::RouteBuilder;
pub use errors::{DispatchError, RouteError};
pub use matcher::{ExactMatcher, Params, PathMatcher, SegmentMatcher};
pub use route::{MethodSelector, Route};
pub use router::{not_matched, Dispatcher, MethodRouter};
