//! Method partitioning and dispatch.
//!
//! # Responsibilities
//! - Partition a route table by method, `ANY` routes into the fallback partition
//! - Compile one matcher per partition
//! - Resolve (method, path) to a chain and start it
//! - Synthesize the not-matched response
//!
//! # Design Decisions
//! - Compiled once, immutable afterwards (shared without locks)
//! - The fallback partition answers only methods without a partition of their
//!   own; a method partition that misses the path is a miss
//! - An unmatched request is a response, never an error

use std::collections::HashMap;
use std::time::Instant;

use axum::body::Body;
use axum::http::{
    header::{self, HeaderValue},
    Method, Request, StatusCode,
};
use axum::response::Response;

use crate::context::{Context, Env, ExecutionContext};
use crate::handler::{Chain, HandlerResult};
use crate::observability::metrics;
use crate::routing::errors::RouteError;
use crate::routing::matcher::{CompiledMatcher, Params, PathMatcher};
use crate::routing::route::{MethodSelector, Route};

type Compiled = Box<dyn CompiledMatcher<Chain>>;

/// Per-method registration tables, before compilation.
pub struct MethodRouter<M> {
    methods: HashMap<Method, M>,
    fallback: Option<M>,
}

impl<M: PathMatcher<Chain>> Default for MethodRouter<M> {
    fn default() -> Self {
        Self {
            methods: HashMap::new(),
            fallback: None,
        }
    }
}

impl<M: PathMatcher<Chain>> MethodRouter<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Partition a whole route table.
    pub fn from_routes(routes: &[Route]) -> Result<Self, RouteError> {
        let mut router = Self::new();
        for route in routes {
            router.add(route)?;
        }
        Ok(router)
    }

    /// Register one route in its partition.
    pub fn add(&mut self, route: &Route) -> Result<(), RouteError> {
        if route.chain().is_empty() {
            return Err(RouteError::EmptyChain {
                method: route.method().clone(),
                pattern: route.path().to_string(),
            });
        }

        let matcher = match route.method() {
            MethodSelector::Any => self.fallback.get_or_insert_with(M::default),
            MethodSelector::Exact(method) => self.methods.entry(method.clone()).or_default(),
        };

        matcher
            .register(route.path(), route.chain().clone())
            .map_err(|e| RouteError::from_matcher(route.method().clone(), e))
    }

    /// Compile every partition into a dispatcher.
    pub fn compile(self) -> Result<Dispatcher, RouteError> {
        let mut methods: HashMap<Method, Compiled> = HashMap::with_capacity(self.methods.len());
        for (method, matcher) in self.methods {
            let compiled = matcher
                .compile()
                .map_err(|e| RouteError::from_matcher(method.clone().into(), e))?;
            methods.insert(method, Box::new(compiled));
        }

        let fallback = match self.fallback {
            Some(matcher) => {
                let compiled = matcher
                    .compile()
                    .map_err(|e| RouteError::from_matcher(MethodSelector::Any, e))?;
                Some(Box::new(compiled) as Compiled)
            }
            None => None,
        };

        Ok(Dispatcher { methods, fallback })
    }
}

/// The compiled entry point. Immutable, shared by every in-flight request.
pub struct Dispatcher {
    methods: HashMap<Method, Compiled>,
    fallback: Option<Compiled>,
}

impl Dispatcher {
    /// Resolve the context's request and run the matched chain.
    pub async fn dispatch(&self, ctx: &mut Context) -> HandlerResult {
        let started = Instant::now();

        let Some((chain, params)) = self.resolve(ctx.method(), ctx.path()) else {
            tracing::debug!(method = %ctx.method(), path = %ctx.path(), "No route matched");
            metrics::record_dispatch(ctx.method(), "unmatched", started);
            return Ok(not_matched(ctx.method(), ctx.path()));
        };

        tracing::debug!(
            method = %ctx.method(),
            path = %ctx.path(),
            handlers = chain.len(),
            params = params.len(),
            "Route matched"
        );
        ctx.install(chain, params);
        let result = ctx.next().await;

        let outcome = if result.is_ok() { "matched" } else { "failed" };
        metrics::record_dispatch(ctx.method(), outcome, started);
        result
    }

    /// Single-argument host model: request in, response out.
    pub async fn fetch(&self, request: Request<Body>) -> HandlerResult {
        let mut ctx = Context::new(request);
        self.dispatch(&mut ctx).await
    }

    /// Environment-carrying host model.
    pub async fn fetch_with(
        &self,
        request: Request<Body>,
        env: Env,
        execution: ExecutionContext,
    ) -> HandlerResult {
        let mut ctx = Context::new(request);
        ctx.bind(env, execution);
        self.dispatch(&mut ctx).await
    }

    /// Methods with a dedicated partition.
    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.methods.keys()
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    fn resolve(&self, method: &Method, path: &str) -> Option<(Chain, Params)> {
        let matcher = match self.methods.get(method) {
            Some(matcher) => matcher,
            None => self.fallback.as_ref()?,
        };
        matcher
            .find(path)
            .map(|hit| (hit.payload.clone(), hit.params))
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

/// `404` with body `Cannot {METHOD} {PATH}`.
pub fn not_matched(method: &Method, path: &str) -> Response {
    let mut response = Response::new(Body::from(format!("Cannot {} {}", method, path)));
    *response.status_mut() = StatusCode::NOT_FOUND;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{terminal, BoxedHandler};
    use crate::routing::matcher::{ExactMatcher, SegmentMatcher};

    fn reply(text: &'static str) -> Chain {
        let h: BoxedHandler = terminal(move |ctx| Ok(ctx.text(text)));
        vec![h].into()
    }

    fn route(method: MethodSelector, path: &str, text: &'static str) -> Route {
        Route::new(method, path, reply(text))
    }

    async fn call(d: &Dispatcher, method: Method, uri: &str) -> (StatusCode, String) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let res = d.fetch(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[test]
    fn test_partitions_by_method() {
        let routes = vec![
            route(Method::GET.into(), "/a", "get"),
            route(Method::POST.into(), "/a", "post"),
            route(MethodSelector::Any, "/b", "any"),
        ];
        let d = MethodRouter::<SegmentMatcher<Chain>>::from_routes(&routes)
            .unwrap()
            .compile()
            .unwrap();

        let mut methods: Vec<_> = d.methods().cloned().collect();
        methods.sort_by_key(|m| m.to_string());
        assert_eq!(methods, vec![Method::GET, Method::POST]);
        assert!(d.has_fallback());
    }

    #[tokio::test]
    async fn test_fallback_only_table() {
        let routes = vec![route(MethodSelector::Any, "/ping", "pong")];
        let d = MethodRouter::<SegmentMatcher<Chain>>::from_routes(&routes)
            .unwrap()
            .compile()
            .unwrap();

        assert_eq!(call(&d, Method::DELETE, "/ping").await, (StatusCode::OK, "pong".into()));
        assert_eq!(
            call(&d, Method::GET, "/nope").await,
            (StatusCode::NOT_FOUND, "Cannot GET /nope".into())
        );
    }

    #[tokio::test]
    async fn test_method_partition_miss_does_not_reach_fallback() {
        let routes = vec![
            route(Method::GET.into(), "/a", "get-a"),
            route(MethodSelector::Any, "/b", "any-b"),
        ];
        let d = MethodRouter::<SegmentMatcher<Chain>>::from_routes(&routes)
            .unwrap()
            .compile()
            .unwrap();

        assert_eq!(call(&d, Method::GET, "/a").await.1, "get-a");
        assert_eq!(call(&d, Method::GET, "/b").await.1, "Cannot GET /b");
        assert_eq!(call(&d, Method::PUT, "/b").await.1, "any-b");
        assert_eq!(call(&d, Method::PUT, "/a").await.1, "Cannot PUT /a");
    }

    #[test]
    fn test_duplicate_route_rejected_with_method() {
        let routes = vec![
            route(Method::GET.into(), "/a", "one"),
            route(Method::GET.into(), "/a", "two"),
        ];
        let err = MethodRouter::<SegmentMatcher<Chain>>::from_routes(&routes)
            .err()
            .unwrap();
        assert_eq!(
            err,
            RouteError::DuplicateRoute {
                method: Method::GET.into(),
                pattern: "/a".into(),
                existing: "/a".into(),
            }
        );
    }

    #[test]
    fn test_same_path_different_methods_is_fine() {
        let routes = vec![
            route(Method::GET.into(), "/a", "one"),
            route(MethodSelector::Any, "/a", "two"),
        ];
        assert!(MethodRouter::<ExactMatcher<Chain>>::from_routes(&routes).is_ok());
    }

    #[test]
    fn test_empty_chain_rejected() {
        let routes = vec![Route::new(Method::GET.into(), "/a", Vec::<BoxedHandler>::new().into())];
        let err = MethodRouter::<SegmentMatcher<Chain>>::from_routes(&routes)
            .err()
            .unwrap();
        assert!(matches!(err, RouteError::EmptyChain { .. }));
    }

    #[tokio::test]
    async fn test_not_matched_body() {
        let res = not_matched(&Method::POST, "/hi");
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"Cannot POST /hi");
    }
}
