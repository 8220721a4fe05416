//! Route composition.
//!
//! # Responsibilities
//! - Accumulate (method, pattern, chain) registrations in order
//! - Prepend the standing middlewares captured at registration time
//! - Merge other builders under a path prefix
//! - Freeze into a compiled [`Dispatcher`] on first use
//!
//! # Design Decisions
//! - Middlewares apply only to routes registered after them
//! - Compilation is memoized behind a race-safe `OnceCell`
//! - Registration after freezing lands in the table but never reaches the
//!   memoized dispatcher; it is logged, not rejected

use std::sync::Arc;

use axum::http::Method;
use once_cell::sync::OnceCell;

use crate::handler::{BoxedHandler, Chain, IntoChain};
use crate::routing::errors::RouteError;
use crate::routing::matcher::{PathMatcher, SegmentMatcher};
use crate::routing::route::{MethodSelector, Route};
use crate::routing::router::{Dispatcher, MethodRouter};

/// Accumulates routes and standing middlewares.
#[derive(Default)]
pub struct RouteBuilder {
    routes: Vec<Route>,
    middlewares: Vec<BoxedHandler>,
    rejected: Vec<RouteError>,
    compiled: OnceCell<Arc<Dispatcher>>,
}

impl RouteBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a standing middleware for every route registered from now on.
    pub fn use_middleware(mut self, handler: BoxedHandler) -> Self {
        self.middlewares.push(handler);
        self
    }

    /// Register a route. The chain is the current standing middlewares followed
    /// by `handlers`.
    pub fn handle(
        mut self,
        method: impl Into<MethodSelector>,
        path: impl Into<String>,
        handlers: impl IntoChain,
    ) -> Self {
        let method = method.into();
        let path = path.into();
        let handlers = handlers.into_chain();

        if handlers.is_empty() {
            tracing::warn!(method = %method, path = %path, "Route registered without handlers");
            self.rejected.push(RouteError::EmptyChain {
                method,
                pattern: path,
            });
            return self;
        }

        let chain: Chain = self.middlewares.iter().cloned().chain(handlers).collect();
        self.push(Route::new(method, path, chain));
        self
    }

    pub fn get(self, path: impl Into<String>, handlers: impl IntoChain) -> Self {
        self.handle(Method::GET, path, handlers)
    }

    pub fn post(self, path: impl Into<String>, handlers: impl IntoChain) -> Self {
        self.handle(Method::POST, path, handlers)
    }

    pub fn put(self, path: impl Into<String>, handlers: impl IntoChain) -> Self {
        self.handle(Method::PUT, path, handlers)
    }

    pub fn patch(self, path: impl Into<String>, handlers: impl IntoChain) -> Self {
        self.handle(Method::PATCH, path, handlers)
    }

    pub fn delete(self, path: impl Into<String>, handlers: impl IntoChain) -> Self {
        self.handle(Method::DELETE, path, handlers)
    }

    pub fn head(self, path: impl Into<String>, handlers: impl IntoChain) -> Self {
        self.handle(Method::HEAD, path, handlers)
    }

    pub fn options(self, path: impl Into<String>, handlers: impl IntoChain) -> Self {
        self.handle(Method::OPTIONS, path, handlers)
    }

    /// Register a route for every method.
    pub fn any(self, path: impl Into<String>, handlers: impl IntoChain) -> Self {
        self.handle(MethodSelector::Any, path, handlers)
    }

    /// Copy `source`'s routes under `prefix`, chains untouched.
    pub fn mount(mut self, prefix: &str, source: &RouteBuilder) -> Result<Self, RouteError> {
        check_prefix(prefix)?;
        for route in &source.routes {
            let path = join_paths(prefix, route.path());
            self.push(Route::new(route.method().clone(), path, route.chain().clone()));
        }
        self.rejected.extend(source.rejected.iter().cloned());
        Ok(self)
    }

    /// Like [`mount`](Self::mount), but this builder's current standing
    /// middlewares run before each mounted chain.
    pub fn nest(mut self, prefix: &str, source: &RouteBuilder) -> Result<Self, RouteError> {
        check_prefix(prefix)?;
        for route in &source.routes {
            let path = join_paths(prefix, route.path());
            let chain: Chain = self
                .middlewares
                .iter()
                .chain(route.chain().iter())
                .cloned()
                .collect();
            self.push(Route::new(route.method().clone(), path, chain));
        }
        self.rejected.extend(source.rejected.iter().cloned());
        Ok(self)
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn middlewares(&self) -> &[BoxedHandler] {
        &self.middlewares
    }

    /// Whether the memoized dispatcher has been compiled.
    pub fn is_frozen(&self) -> bool {
        self.compiled.get().is_some()
    }

    /// The compiled entry point, built with [`SegmentMatcher`] on first call
    /// and shared afterwards.
    pub fn dispatcher(&self) -> Result<Arc<Dispatcher>, RouteError> {
        self.compiled
            .get_or_try_init(|| self.build_with::<SegmentMatcher<Chain>>().map(Arc::new))
            .cloned()
    }

    /// Compile a fresh dispatcher with the given matcher engine. Not memoized.
    pub fn build_with<M: PathMatcher<Chain>>(&self) -> Result<Dispatcher, RouteError> {
        if let Some(err) = self.rejected.first() {
            return Err(err.clone());
        }

        let dispatcher = MethodRouter::<M>::from_routes(&self.routes)?.compile()?;
        tracing::info!(
            routes = self.routes.len(),
            methods = dispatcher.methods().count(),
            fallback = dispatcher.has_fallback(),
            "Route table compiled"
        );
        Ok(dispatcher)
    }

    fn push(&mut self, route: Route) {
        if self.is_frozen() {
            tracing::warn!(
                method = %route.method(),
                path = %route.path(),
                "Route registered after the dispatcher was compiled; it will not be served"
            );
        }
        self.routes.push(route);
    }
}

impl std::fmt::Debug for RouteBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteBuilder")
            .field("routes", &self.routes)
            .field("middlewares", &self.middlewares.len())
            .field("frozen", &self.is_frozen())
            .finish()
    }
}

fn check_prefix(prefix: &str) -> Result<(), RouteError> {
    let reason = if prefix.is_empty() {
        "prefix cannot be empty"
    } else if prefix.len() > 1 && prefix.ends_with('/') {
        "prefix cannot end with a slash"
    } else {
        return Ok(());
    };

    Err(RouteError::InvalidMountPrefix {
        prefix: prefix.to_string(),
        reason,
    })
}

/// Concatenate a mount prefix and a route path.
pub(crate) fn join_paths(prefix: &str, path: &str) -> String {
    if prefix == "/" {
        path.to_string()
    } else if path == "/" {
        prefix.to_string()
    } else {
        format!("{}{}", prefix, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::terminal;

    fn ok(name: &'static str) -> BoxedHandler {
        terminal(move |ctx| Ok(ctx.text(name)))
    }

    fn paths(b: &RouteBuilder) -> Vec<(String, String)> {
        b.routes()
            .iter()
            .map(|r| (r.method().to_string(), r.path().to_string()))
            .collect()
    }

    #[test]
    fn test_join_paths() {
        assert_eq!(join_paths("/", "/users"), "/users");
        assert_eq!(join_paths("/api", "/"), "/api");
        assert_eq!(join_paths("/api", "/users"), "/api/users");
        assert_eq!(join_paths("/", "/"), "/");
    }

    #[test]
    fn test_mount_rewrites_paths() {
        let users = RouteBuilder::new()
            .get("/", ok("list"))
            .post("/users", ok("create"))
            .any("/health", ok("health"));

        let app = RouteBuilder::new().mount("/api", &users).unwrap();
        assert_eq!(
            paths(&app),
            vec![
                ("GET".into(), "/api".into()),
                ("POST".into(), "/api/users".into()),
                ("ANY".into(), "/api/health".into()),
            ]
        );

        let app = RouteBuilder::new().mount("/", &users).unwrap();
        assert_eq!(paths(&app), paths(&users));
    }

    #[test]
    fn test_mount_rejects_trailing_slash() {
        let users = RouteBuilder::new().get("/users", ok("u"));

        let err = RouteBuilder::new().mount("/api/", &users).err().unwrap();
        assert_eq!(
            err,
            RouteError::InvalidMountPrefix {
                prefix: "/api/".into(),
                reason: "prefix cannot end with a slash",
            }
        );
        assert!(RouteBuilder::new().mount("", &users).is_err());
        assert!(RouteBuilder::new().nest("/v1/", &users).is_err());
    }

    #[test]
    fn test_middleware_snapshot_per_route() {
        let a = ok("a");
        let b = ok("b");

        let app = RouteBuilder::new()
            .use_middleware(a.clone())
            .get("/first", ok("first"))
            .use_middleware(b.clone())
            .get("/second", ok("second"));

        let first = app.routes()[0].chain();
        let second = app.routes()[1].chain();

        assert_eq!(first.len(), 2);
        assert!(Arc::ptr_eq(&first[0], &a));

        assert_eq!(second.len(), 3);
        assert!(Arc::ptr_eq(&second[0], &a));
        assert!(Arc::ptr_eq(&second[1], &b));

        let standing = app.middlewares();
        assert_eq!(standing.len(), 2);
        assert!(Arc::ptr_eq(&standing[1], &b));
    }

    #[test]
    fn test_mount_preserves_chain_nest_prepends() {
        let outer = ok("outer");
        let inner = ok("inner");
        let child = RouteBuilder::new().use_middleware(inner.clone()).get("/x", ok("x"));

        let mounted = RouteBuilder::new()
            .use_middleware(outer.clone())
            .mount("/m", &child)
            .unwrap();
        let chain = mounted.routes()[0].chain();
        assert!(Arc::ptr_eq(chain, child.routes()[0].chain()));

        let nested = RouteBuilder::new()
            .use_middleware(outer.clone())
            .nest("/n", &child)
            .unwrap();
        let chain = nested.routes()[0].chain();
        assert_eq!(chain.len(), 3);
        assert!(Arc::ptr_eq(&chain[0], &outer));
        assert!(Arc::ptr_eq(&chain[1], &inner));
    }

    #[test]
    fn test_dispatcher_is_memoized() {
        let app = RouteBuilder::new().get("/hi", ok("hi"));
        assert!(!app.is_frozen());

        let first = app.dispatcher().unwrap();
        let second = app.dispatcher().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(app.is_frozen());

        let app = app.post("/late", ok("late"));
        let third = app.dispatcher().unwrap();
        assert!(Arc::ptr_eq(&first, &third));
        assert_eq!(third.methods().count(), 1);
    }

    #[test]
    fn test_empty_handler_list_fails_compilation() {
        let app = RouteBuilder::new().get("/nothing", Vec::<BoxedHandler>::new());
        assert!(app.routes().is_empty());
        assert!(matches!(app.dispatcher(), Err(RouteError::EmptyChain { .. })));
    }

    #[test]
    fn test_duplicate_surfaces_at_compile() {
        let app = RouteBuilder::new().get("/a", ok("1")).get("/a", ok("2"));
        assert!(matches!(app.dispatcher(), Err(RouteError::DuplicateRoute { .. })));
        assert!(!app.is_frozen());
    }
}
