//! chainroute demo server.
//!
//! ```text
//!     Client Request
//!         → http::server (request ID, limits, timeout, trace)
//!         → http::service (host model: plain or env-carrying)
//!         → routing::Dispatcher (method partition → fallback partition)
//!         → handler chain: access log → [cors] → endpoint
//! ```

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use serde::Serialize;

use chainroute::config::ServerConfig;
use chainroute::http::middleware::Cors;
use chainroute::http::{send, HttpServer, ResponseInit};
use chainroute::lifecycle::{spawn_signal_handler, startup, Shutdown};
use chainroute::{handler, terminal, BoxedHandler, RouteBuilder};

#[derive(Parser)]
#[command(name = "chainroute")]
#[command(about = "Serve a demo route table over HTTP", long_about = None)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[derive(Serialize)]
struct User<'a> {
    id: &'a str,
    name: String,
}

fn access_log() -> BoxedHandler {
    handler(|ctx| {
        Box::pin(async move {
            let started = Instant::now();
            let method = ctx.method().clone();
            let path = ctx.path().to_string();
            let response = ctx.next().await?;
            tracing::info!(
                method = %method,
                path = %path,
                status = response.status().as_u16(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Request handled"
            );
            Ok(response)
        })
    })
}

fn routes(config: &ServerConfig) -> Result<RouteBuilder, Box<dyn std::error::Error>> {
    let api = RouteBuilder::new()
        .get("/", send::text("chainroute api", ResponseInit::default()))
        .get(
            "/health",
            send::json(&serde_json::json!({ "status": "ok" }), ResponseInit::default())?,
        );

    let mut app = RouteBuilder::new().use_middleware(access_log());
    if let Some(options) = &config.cors {
        app = app.use_middleware(Cors::new(Some(options))?.into_handler());
    }

    let app = app
        .get("/", send::text("Hello from chainroute", ResponseInit::default()))
        .get(
            "/users/:id",
            terminal(|ctx| {
                let id = ctx.param("id").unwrap_or_default().to_string();
                let user = User {
                    id: &id,
                    name: format!("user-{}", id),
                };
                ctx.json(&user)
            }),
        )
        .any(
            "/echo",
            handler(|ctx| {
                Box::pin(async move {
                    let body = axum::body::to_bytes(ctx.take_body(), usize::MAX).await?;
                    Ok(ctx.body(body))
                })
            }),
        )
        .get(
            "/env/:key",
            terminal(|ctx| {
                let value = ctx
                    .param("key")
                    .and_then(|key| ctx.env().and_then(|env| env.get(key)))
                    .map(str::to_string);
                match value {
                    Some(value) => Ok(ctx.text(value)),
                    None => {
                        ctx.status = axum::http::StatusCode::NOT_FOUND;
                        Ok(ctx.text("unbound"))
                    }
                }
            }),
        )
        .mount("/api", &api)?;

    Ok(app)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = startup::resolve_config(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    startup::init_observability(&config)?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        env_bindings = config.env.len(),
        cors = config.cors.is_some(),
        "Configuration loaded"
    );

    let dispatcher = routes(&config)?.dispatcher()?;
    let listener = startup::bind(&config).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    spawn_signal_handler(shutdown);

    HttpServer::new(config, dispatcher)
        .run(listener, server_shutdown)
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
