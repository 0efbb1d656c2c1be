//! Prometheus metrics endpoint.

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use metrics_exporter_prometheus::PrometheusHandle;

/// GET /metrics — exposition text for the order counters
/// (`orders_created_total`, `orders_canceled_total`,
/// `stock_insufficient_total`) and whatever else the recorder holds.
pub async fn get(State(handle): State<PrometheusHandle>) -> Response {
    (
        [(
            header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        handle.render(),
    )
        .into_response()
}
