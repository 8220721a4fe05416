//! CORS response headers.
//!
//! The header set is computed once from [`CorsOptions`]; each request only
//! copies it into the context before handing off to the next handler.

use std::sync::Arc;

use axum::http::{
    header::{self, HeaderValue, InvalidHeaderValue},
    HeaderMap,
};
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::handler::{BoxedHandler, Handler, HandlerResult};

/// A header value given either as a single string or as a list joined with `,`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum HeaderList {
    One(String),
    Many(Vec<String>),
}

impl HeaderList {
    fn to_header_value(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        match self {
            HeaderList::One(value) => HeaderValue::from_str(value),
            HeaderList::Many(values) => HeaderValue::from_str(&values.join(",")),
        }
    }
}

/// CORS settings, deserializable from the `[cors]` config table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsOptions {
    /// A specific origin, or `*` (the default).
    pub allow_origin: Option<String>,
    pub allow_methods: Option<HeaderList>,
    pub expose_headers: Option<HeaderList>,
    /// Preflight cache lifetime in seconds.
    pub max_age: Option<u64>,
    pub allow_credentials: bool,
    pub allow_headers: Option<HeaderList>,
}

/// Middleware adding a fixed set of CORS headers.
#[derive(Debug, Clone)]
pub struct Cors {
    headers: Arc<HeaderMap>,
}

impl Cors {
    pub fn new(options: Option<&CorsOptions>) -> Result<Self, InvalidHeaderValue> {
        let mut headers = HeaderMap::new();

        let Some(options) = options else {
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static("*"),
            );
            return Ok(Self::from_headers(headers));
        };

        if let Some(list) = &options.allow_headers {
            headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, list.to_header_value()?);
        }
        if let Some(list) = &options.allow_methods {
            headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, list.to_header_value()?);
        }
        if let Some(list) = &options.expose_headers {
            headers.insert(header::ACCESS_CONTROL_EXPOSE_HEADERS, list.to_header_value()?);
        }
        if let Some(max_age) = options.max_age {
            headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from(max_age));
        }
        if options.allow_credentials {
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
        }

        match options.allow_origin.as_deref() {
            Some(origin) if origin != "*" => {
                headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_str(origin)?);
                headers.insert(header::VARY, HeaderValue::from_static("Origin"));
            }
            _ => {
                headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
            }
        }

        Ok(Self::from_headers(headers))
    }

    fn from_headers(headers: HeaderMap) -> Self {
        Self {
            headers: Arc::new(headers),
        }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn into_handler(self) -> BoxedHandler {
        Arc::new(self)
    }
}

impl Handler for Cors {
    fn call<'a>(&self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        for (name, value) in self.headers.iter() {
            ctx.headers.insert(name, value.clone());
        }
        ctx.next()
    }
}
