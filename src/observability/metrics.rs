//! Metrics collection and exposition.
//!
//! # Metrics
//! - `chainroute_requests_total` (counter): dispatches by method, outcome
//! - `chainroute_dispatch_duration_seconds` (histogram): time spent in the chain
//!
//! Outcomes are `matched`, `unmatched` and `failed`.
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - The Prometheus exporter is opt-in through config

use std::net::SocketAddr;
use std::time::Instant;

use axum::http::Method;
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

pub const REQUESTS_TOTAL: &str = "chainroute_requests_total";
pub const DISPATCH_DURATION: &str = "chainroute_dispatch_duration_seconds";

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one dispatch.
pub fn record_dispatch(method: &Method, outcome: &'static str, started: Instant) {
    let method = method.as_str().to_owned();
    counter!(REQUESTS_TOTAL, "method" => method.clone(), "outcome" => outcome).increment(1);
    histogram!(DISPATCH_DURATION, "method" => method, "outcome" => outcome)
        .record(started.elapsed().as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::terminal;
    use crate::routing::RouteBuilder;
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;

    fn request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_dispatch_outcomes_are_labelled() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        let dispatcher = RouteBuilder::new()
            .get("/ok", terminal(|ctx| Ok(ctx.text("ok"))))
            .post("/boom", terminal(|_| Err("kaboom".into())))
            .dispatcher()
            .unwrap();

        metrics::with_local_recorder(&recorder, || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();
            rt.block_on(async {
                assert!(dispatcher.fetch(request(Method::GET, "/ok")).await.is_ok());
                assert!(dispatcher.fetch(request(Method::GET, "/ok")).await.is_ok());
                assert!(dispatcher.fetch(request(Method::GET, "/nope")).await.is_ok());
                assert!(dispatcher.fetch(request(Method::POST, "/boom")).await.is_err());
            });
        });

        let rendered = handle.render();
        assert!(rendered.contains(&format!(
            r#"{REQUESTS_TOTAL}{{method="GET",outcome="matched"}} 2"#
        )));
        assert!(rendered.contains(&format!(
            r#"{REQUESTS_TOTAL}{{method="GET",outcome="unmatched"}} 1"#
        )));
        assert!(rendered.contains(&format!(
            r#"{REQUESTS_TOTAL}{{method="POST",outcome="failed"}} 1"#
        )));
        assert!(rendered.contains(&format!(
            r#"{DISPATCH_DURATION}_count{{method="GET",outcome="matched"}} 2"#
        )));
    }

    #[test]
    fn test_recording_without_recorder_is_a_noop() {
        record_dispatch(&Method::DELETE, "unmatched", Instant::now());
    }
}
