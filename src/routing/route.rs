//! Route registrations.

use std::fmt;

use axum::http::Method;

use crate::handler::Chain;

/// Which requests a route answers: one method, or any method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MethodSelector {
    Exact(Method),
    /// Method-agnostic registration, consulted when no method-specific route matches.
    Any,
}

impl From<Method> for MethodSelector {
    fn from(method: Method) -> Self {
        MethodSelector::Exact(method)
    }
}

impl fmt::Display for MethodSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodSelector::Exact(method) => write!(f, "{}", method),
            MethodSelector::Any => f.write_str("ANY"),
        }
    }
}

/// An immutable (method, pattern, chain) registration.
#[derive(Clone)]
pub struct Route {
    method: MethodSelector,
    path: String,
    chain: Chain,
}

impl Route {
    pub fn new(method: MethodSelector, path: impl Into<String>, chain: Chain) -> Self {
        Self {
            method,
            path: path.into(),
            chain,
        }
    }

    pub fn method(&self) -> &MethodSelector {
        &self.method
    }

    /// Path pattern, opaque to everything but the matcher.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("handlers", &self.chain.len())
            .finish()
    }
}
