//! HTTP route handlers for the secure listener.
//!
//! The route table is deliberately closed: the landing document at `/` and a
//! fallback that maps every other path to a 404. Per-route Cache-Control
//! headers are attached here, along with the HSTS header that every secure
//! response carries.
//!
//! Request tracing is enabled via middleware that generates a unique request ID
//! for each incoming request, allowing correlation of all logs within a request.

pub mod landing;
pub mod not_found;

use std::time::Duration;

use axum::{middleware, routing::get, Router};
use http::header::{HeaderValue, CACHE_CONTROL, STRICT_TRANSPORT_SECURITY};
use http::StatusCode;
use tower_http::{set_header::SetResponseHeaderLayer, timeout::TimeoutLayer};

use crate::config::{CACHE_CONTROL_LANDING, HSTS_POLICY, REQUEST_TIMEOUT_SECS};
use crate::middleware::request_span_layer;

/// Creates the Axum router with all routes and cache headers.
pub fn create_router() -> Router {
    // Landing document - short cache, content changes only on redeploy
    let landing_routes = Router::new()
        .route("/", get(landing::index))
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_LANDING),
        ));

    Router::new()
        .merge(landing_routes)
        // Everything off the route table is a 404, never a redirect
        .fallback(not_found::fallback)
        .layer(SetResponseHeaderLayer::if_not_present(
            STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static(HSTS_POLICY),
        ))
        // Bound per-request time so a stalled client cannot pin a worker
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        ))
        // Request ID middleware - creates root span with request_id for correlation
        .layer(middleware::from_fn(request_span_layer))
}
