//! Request middleware

pub mod rate_limit;

use axum::{extract::MatchedPath, extract::Request, middleware::Next, response::Response};
use fronteira_common::metrics::RequestMetrics;

/// Record request count and latency per route and status
pub async fn track_metrics(request: Request, next: Next) -> Response {
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let method = request.method().to_string();

    let metrics = RequestMetrics::start(&method, &endpoint);
    let response = next.run(request).await;
    metrics.finish(response.status().as_u16());

    response
}
