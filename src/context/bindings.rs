//! Host bindings.
//!
//! Hosts that follow the environment-carrying model hand every request an
//! environment map and an execution context. Hosts that follow the plain
//! single-argument model attach neither.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinSet;

/// Immutable environment bindings shared by every request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Env {
    vars: Arc<HashMap<String, String>>,
}

impl Env {
    pub fn new(vars: HashMap<String, String>) -> Self {
        Self {
            vars: Arc::new(vars),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for Env {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Per-request execution context.
///
/// Work handed to [`ExecutionContext::wait_until`] starts immediately and may
/// outlive the response. The host drains the context once the response is
/// written; tasks still pending when the last clone is dropped undrained are
/// aborted.
#[derive(Clone, Default)]
pub struct ExecutionContext {
    tasks: Arc<Mutex<JoinSet<()>>>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule background work tied to this request.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn wait_until<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.lock().spawn(task);
    }

    /// Number of scheduled tasks not yet collected by [`drain`](Self::drain).
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    /// Wait for every scheduled task to finish.
    pub async fn drain(&self) {
        let mut tasks = std::mem::take(&mut *self.lock());
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::warn!(error = %e, "Background task did not complete");
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("pending", &self.pending())
            .finish()
    }
}
