//! Live-server tests over a real socket.

use std::collections::HashMap;
use std::time::Duration;

use chainroute::config::ServerConfig;
use chainroute::http::middleware::CorsOptions;
use chainroute::http::{send, ResponseInit};
use chainroute::{handler, terminal, RouteBuilder};

mod common;

#[tokio::test]
async fn test_serves_routes_and_not_matched() {
    let api = RouteBuilder::new().get("/health", send::text("ok", ResponseInit::default()));
    let dispatcher = RouteBuilder::new()
        .get("/hi", common::text("hello"))
        .post(
            "/echo",
            handler(|ctx| {
                Box::pin(async move {
                    let body = axum::body::to_bytes(ctx.take_body(), usize::MAX).await?;
                    Ok(ctx.body(body))
                })
            }),
        )
        .mount("/api", &api)
        .unwrap()
        .dispatcher()
        .unwrap();

    let (addr, shutdown, handle) = common::start_server(ServerConfig::default(), dispatcher).await;
    let client = reqwest::Client::new();
    let base = format!("http://{}", addr);

    let res = client.get(format!("{}/hi", base)).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), "hello");

    let res = client
        .post(format!("{}/echo", base))
        .body("ping")
        .send()
        .await
        .unwrap();
    assert_eq!(res.text().await.unwrap(), "ping");

    let res = client.get(format!("{}/api/health", base)).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "ok");

    let res = client.get(format!("{}/missing?x=1", base)).send().await.unwrap();
    assert_eq!(res.status(), 404);
    assert_eq!(res.text().await.unwrap(), "Cannot GET /missing");

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop")
        .unwrap();
}

#[tokio::test]
async fn test_env_bindings_and_cors_from_config() {
    let mut config = ServerConfig::default();
    config.env = HashMap::from([("REGION".to_string(), "eu-west".to_string())]);
    config.cors = Some(CorsOptions {
        allow_origin: Some("https://app.example".into()),
        ..Default::default()
    });

    let cors = chainroute::http::middleware::Cors::new(config.cors.as_ref()).unwrap();
    let dispatcher = RouteBuilder::new()
        .use_middleware(cors.into_handler())
        .get(
            "/region",
            terminal(|ctx| {
                let region = ctx
                    .env()
                    .and_then(|env| env.get("REGION"))
                    .unwrap_or("unbound")
                    .to_string();
                Ok(ctx.text(region))
            }),
        )
        .dispatcher()
        .unwrap();

    let (addr, shutdown, _handle) = common::start_server(config, dispatcher).await;

    let res = reqwest::get(format!("http://{}/region", addr)).await.unwrap();
    assert_eq!(
        res.headers()["access-control-allow-origin"],
        "https://app.example"
    );
    assert_eq!(res.headers()["vary"], "Origin");
    assert_eq!(res.text().await.unwrap(), "eu-west");

    shutdown.trigger();
}
