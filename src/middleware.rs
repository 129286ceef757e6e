//! Request ID middleware for correlating logs with requests.
//!
//! Generates a UUID v4 for each request the secure listener handles and wraps
//! the handling in a tracing span carrying method, path, and outcome. The
//! redirect listener stays bare: it answers every request the same way and
//! logs one debug event per redirect instead.

use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use tracing::Instrument;
use uuid::Uuid;

/// Extension type for accessing the request ID in handlers if needed.
#[derive(Clone, Debug)]
pub struct RequestId(pub Uuid);

/// Middleware that assigns a request ID and creates a request span.
///
/// Installed as the outermost layer so the span covers the other layers and
/// the handler itself.
pub async fn request_span_layer(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %path,
        status = tracing::field::Empty,
        duration_ms = tracing::field::Empty,
    );

    let start = Instant::now();

    let mut request = request;
    request.extensions_mut().insert(RequestId(request_id));

    async move {
        let response = next.run(request).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let span = tracing::Span::current();
        span.record("status", response.status().as_u16());
        span.record("duration_ms", duration_ms);
        tracing::info!(
            status = response.status().as_u16(),
            duration_ms,
            "Request completed"
        );

        response
    }
    .instrument(span)
    .await
}
