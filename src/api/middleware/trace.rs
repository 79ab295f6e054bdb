use super::request_id::X_REQUEST_ID;
use axum::{extract::Request, response::Response};
use std::time::Duration;
use tracing::{Span, info};

/// Span for one request. Runs inside the request id middleware, so the id
/// is always set by the time the span is created.
pub fn make_request_span(request: &Request) -> Span {
    let request_id = request
        .headers()
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");
    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}

pub fn log_request(request: &Request, _span: &Span) {
    info!("📥 {} {}", request.method(), request.uri());
}

pub fn log_response(response: &Response, latency: Duration, _span: &Span) {
    info!(
        "📤 Finished in {:?} with status {}",
        latency,
        response.status()
    );
}
