//! Response building helpers.
//!
//! # Responsibilities
//! - Redirect status selection
//! - Prebuilt terminal handlers that always answer with a fixed body
//!
//! # Design Decisions
//! - Fixed bodies are encoded once at registration, cloned per request
//! - Headers given at registration are merged over the context's headers
//! - The content type of `text`, `html` and `json` always wins over one
//!   given in [`ResponseInit`]

use axum::body::{Body, Bytes};
use axum::http::{
    header::{self, HeaderValue},
    HeaderMap, StatusCode,
};
use axum::response::Response;

/// Status codes accepted by [`Context::redirect`](crate::context::Context::redirect).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RedirectStatus {
    /// 301
    Permanent,
    /// 302
    #[default]
    Found,
    /// 307
    Temporary,
    /// 308
    PermanentRedirect,
}

impl From<RedirectStatus> for StatusCode {
    fn from(status: RedirectStatus) -> Self {
        match status {
            RedirectStatus::Permanent => StatusCode::MOVED_PERMANENTLY,
            RedirectStatus::Found => StatusCode::FOUND,
            RedirectStatus::Temporary => StatusCode::TEMPORARY_REDIRECT,
            RedirectStatus::PermanentRedirect => StatusCode::PERMANENT_REDIRECT,
        }
    }
}

/// Status and headers for a prebuilt response.
#[derive(Debug, Clone)]
pub struct ResponseInit {
    pub status: StatusCode,
    pub headers: HeaderMap,
}

impl Default for ResponseInit {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
        }
    }
}

impl ResponseInit {
    pub fn status(status: StatusCode) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }
}

/// Terminal handlers answering with a fixed body.
///
/// ```ignore
/// RouteBuilder::new()
///     .get("/", send::text("hello", ResponseInit::default()))
///     .get(
///         "/teapot",
///         send::text("short and stout", ResponseInit::status(StatusCode::IM_A_TEAPOT)),
///     );
/// ```
pub mod send {
    use std::sync::Arc;

    use futures_util::future::{self, BoxFuture};
    use serde::Serialize;

    use super::*;
    use crate::context::Context;
    use crate::handler::{BoxedHandler, Handler, HandlerResult};

    struct StaticResponse {
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
    }

    impl StaticResponse {
        fn new(
            init: ResponseInit,
            content_type: Option<&'static str>,
            body: Bytes,
        ) -> BoxedHandler {
            let mut headers = init.headers;
            if let Some(content_type) = content_type {
                headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
            }
            Arc::new(Self {
                status: init.status,
                headers,
                body,
            })
        }

        fn respond(&self, ctx: &Context) -> Response {
            let mut response = Response::new(Body::from(self.body.clone()));
            *response.status_mut() = self.status;
            let headers = response.headers_mut();
            for (name, value) in ctx.headers.iter() {
                headers.append(name, value.clone());
            }
            for (name, value) in self.headers.iter() {
                headers.insert(name, value.clone());
            }
            response
        }
    }

    impl Handler for StaticResponse {
        fn call<'a>(&self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
            Box::pin(future::ready(Ok(self.respond(ctx))))
        }
    }

    pub fn body(body: impl Into<Bytes>, init: ResponseInit) -> BoxedHandler {
        StaticResponse::new(init, None, body.into())
    }

    pub fn text(body: impl Into<String>, init: ResponseInit) -> BoxedHandler {
        StaticResponse::new(init, Some("text/plain; charset=utf-8"), Bytes::from(body.into()))
    }

    pub fn html(body: impl Into<String>, init: ResponseInit) -> BoxedHandler {
        StaticResponse::new(init, Some("text/html"), Bytes::from(body.into()))
    }

    /// Serialization happens here, once.
    pub fn json<T: Serialize + ?Sized>(
        value: &T,
        init: ResponseInit,
    ) -> Result<BoxedHandler, serde_json::Error> {
        let body = serde_json::to_vec(value)?;
        Ok(StaticResponse::new(init, Some("application/json"), Bytes::from(body)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::handler::Handler;
    use axum::http::Request;

    #[test]
    fn test_redirect_status_codes() {
        assert_eq!(StatusCode::from(RedirectStatus::Permanent), 301);
        assert_eq!(StatusCode::from(RedirectStatus::Found), 302);
        assert_eq!(StatusCode::from(RedirectStatus::Temporary), 307);
        assert_eq!(StatusCode::from(RedirectStatus::PermanentRedirect), 308);
        assert_eq!(RedirectStatus::default(), RedirectStatus::Found);
    }

    #[tokio::test]
    async fn test_send_text_merges_context_headers() {
        let mut init = ResponseInit::status(StatusCode::ACCEPTED);
        init.headers.insert("x-fixed", HeaderValue::from_static("1"));
        let h = send::text("done", init);

        let mut ctx = Context::new(Request::builder().uri("/").body(Body::empty()).unwrap());
        ctx.headers.insert("x-from-middleware", HeaderValue::from_static("yes"));

        let res = h.call(&mut ctx).await.unwrap();
        assert_eq!(res.status(), StatusCode::ACCEPTED);
        assert_eq!(res.headers()["content-type"], "text/plain; charset=utf-8");
        assert_eq!(res.headers()["x-fixed"], "1");
        assert_eq!(res.headers()["x-from-middleware"], "yes");

        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"done");
    }

    #[tokio::test]
    async fn test_send_json_forces_content_type() {
        let mut init = ResponseInit::default();
        init.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain"),
        );
        let h = send::json(&serde_json::json!({ "title": "nope" }), init).unwrap();

        let mut ctx = Context::new(Request::builder().uri("/").body(Body::empty()).unwrap());
        let res = h.call(&mut ctx).await.unwrap();
        assert_eq!(res.headers()["content-type"], "application/json");
    }
}
