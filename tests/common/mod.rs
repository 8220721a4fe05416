//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use chainroute::config::ServerConfig;
use chainroute::lifecycle::Shutdown;
use chainroute::{handler, terminal, BoxedHandler, Dispatcher, HttpServer};
use tokio::net::TcpListener;

/// Ordered record of which handlers ran.
pub type Trace = Arc<Mutex<Vec<&'static str>>>;

pub fn trace() -> Trace {
    Arc::new(Mutex::new(Vec::new()))
}

/// Middleware that records `name` and continues.
pub fn step(name: &'static str, trace: &Trace) -> BoxedHandler {
    let trace = trace.clone();
    handler(move |ctx| {
        trace.lock().unwrap().push(name);
        ctx.next()
    })
}

/// Terminal handler that records `name` and answers with it.
pub fn reply(name: &'static str, trace: &Trace) -> BoxedHandler {
    let trace = trace.clone();
    terminal(move |ctx| {
        trace.lock().unwrap().push(name);
        Ok(ctx.text(name))
    })
}

pub fn text(body: &'static str) -> BoxedHandler {
    terminal(move |ctx| Ok(ctx.text(body)))
}

pub fn request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Dispatch in-process and return the body text.
pub async fn fetch_text(dispatcher: &Dispatcher, method: Method, uri: &str) -> String {
    let response = dispatcher.fetch(request(method, uri)).await.unwrap();
    body_string(response).await
}

/// Serve `dispatcher` on an ephemeral local port.
#[allow(dead_code)]
pub async fn start_server(
    config: ServerConfig,
    dispatcher: Arc<Dispatcher>,
) -> (SocketAddr, Shutdown, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let server = HttpServer::new(config, dispatcher);
    let handle = tokio::spawn(async move {
        server.run(listener, rx).await.unwrap();
    });

    (addr, shutdown, handle)
}
