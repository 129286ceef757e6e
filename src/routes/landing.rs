//! Landing page handler.

use axum::response::Html;
use tracing::instrument;

use crate::config::LANDING_PAGE;

/// Landing page handler.
///
/// Serves the fixed document byte-for-byte. Monitoring tooling matches on the
/// exact markup, so the body must never be reformatted or templated.
#[instrument(name = "landing::index")]
pub async fn index() -> Html<&'static str> {
    Html(LANDING_PAGE)
}
