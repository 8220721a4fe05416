//! Routing error types.
//!
//! Build-time errors surface from the registration API or from the first
//! compilation. Request-time failures are limited to chain misuse; an
//! unmatched route is a regular response, never an error.

use axum::http::Method;
use thiserror::Error;

use crate::routing::matcher::MatcherError;
use crate::routing::route::MethodSelector;

/// Errors raised while assembling or compiling a route table.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("invalid mount prefix {prefix:?}: {reason}")]
    InvalidMountPrefix { prefix: String, reason: &'static str },

    #[error("invalid route {method} {pattern:?}: {reason}")]
    InvalidPattern {
        method: MethodSelector,
        pattern: String,
        reason: &'static str,
    },

    #[error("route {method} {pattern} conflicts with {existing}")]
    DuplicateRoute {
        method: MethodSelector,
        pattern: String,
        existing: String,
    },

    #[error("route {method} {pattern} has no handlers")]
    EmptyChain { method: MethodSelector, pattern: String },
}

impl RouteError {
    /// Attach the method partition a matcher error was raised in.
    pub(crate) fn from_matcher(method: MethodSelector, error: MatcherError) -> Self {
        match error {
            MatcherError::InvalidPattern { pattern, reason } => RouteError::InvalidPattern {
                method,
                pattern,
                reason,
            },
            MatcherError::Conflict { pattern, existing } => RouteError::DuplicateRoute {
                method,
                pattern,
                existing,
            },
        }
    }
}

/// Errors raised while driving a handler chain.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("next() called at index {index} of a {len}-handler chain for {method} {path}")]
    ChainExhausted {
        index: usize,
        len: usize,
        method: Method,
        path: String,
    },
}
