//! Fallback handler for paths outside the route table.

use axum::http::Uri;
use tracing::instrument;

use crate::error::AppError;

/// Fallback handler.
///
/// Any path other than the root is a route miss. The error response closes the
/// request, not the connection, so a client on a kept-alive connection can keep
/// issuing requests.
#[instrument(name = "not_found::fallback")]
pub async fn fallback(uri: Uri) -> AppError {
    tracing::debug!(path = %uri.path(), "No route matched");
    AppError::RouteMiss(uri.path().to_string())
}
