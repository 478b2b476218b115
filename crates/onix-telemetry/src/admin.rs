//! The `/health` and `/metrics` routes mounted by both servers. Kept here
//! so the two binaries don't each hand-roll a Prometheus text encoder.

use axum::{routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
    service: &'static str,
}

async fn metrics_handler() -> ([(axum::http::HeaderName, String); 1], axum::body::Bytes) {
    let encoder = prometheus::TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buf = Vec::with_capacity(1 << 16);
    if let Err(e) = encoder.encode(&metric_families, &mut buf) {
        tracing::error!(error = %e, "failed to encode prometheus metrics");
    }
    ([(axum::http::header::CONTENT_TYPE, encoder.format_type().to_string())], buf.into())
}

/// Builds a `/health` + `/metrics` router. `service` is reported in the
/// health body (`"registry"` or `"subscriber"`) so a shared dashboard can
/// tell the two surfaces apart.
pub fn admin_router(service: &'static str) -> Router {
    Router::new()
        .route("/health", get(move || async move { Json(HealthBody { status: "ok", service }) }))
        .route("/metrics", get(metrics_handler))
}
