//! HTTP to HTTPS redirect listener.
//!
//! Spawns a lightweight plaintext server on port 80 (or the configured port)
//! that answers every request with `301 Moved Permanently` pointing at the
//! same host and path on the secure origin. Scheme substitution only: the
//! path and query survive untouched, the plaintext port is dropped from the
//! host, and the secure port is appended only when it is not 443.
//!
//! The status code is pinned to 301 by the external contract, so the
//! response is assembled by hand; axum's `Redirect::permanent` would emit
//! 308 instead.

use std::net::SocketAddr;

use axum::http::{StatusCode, Uri};
use axum::response::IntoResponse;
use axum::routing::any;
use axum::Router;
use axum_extra::extract::Host;
use http::header::{HeaderValue, LOCATION};

use crate::config::DEFAULT_HTTPS_PORT;
use crate::error::AppError;

/// Spawn the plaintext listener that redirects all requests to HTTPS.
///
/// Runs in the background and does not block. Requests that cannot be
/// redirected (no usable host) get a 400-class answer; the listener itself
/// keeps accepting.
pub fn spawn_redirect_server(addr: SocketAddr, https_port: u16) {
    tokio::spawn(async move {
        tracing::info!(
            %addr,
            https_port,
            "Starting HTTP->HTTPS redirect listener"
        );

        let app = Router::new().fallback(any(move |Host(host): Host, uri: Uri| async move {
            redirect_to_https(&host, &uri, https_port)
        }));

        match axum_server::bind(addr).serve(app.into_make_service()).await {
            Ok(()) => {
                tracing::debug!("HTTP redirect listener stopped");
            }
            Err(e) => {
                tracing::error!(error = %e, "HTTP redirect listener failed");
            }
        }
    });
}

/// Answer one plaintext request with a permanent redirect to the secure
/// origin.
fn redirect_to_https(
    host: &str,
    uri: &Uri,
    https_port: u16,
) -> Result<impl IntoResponse, AppError> {
    let location = secure_location(host, uri, https_port);

    let location = HeaderValue::from_str(&location)
        .map_err(|e| AppError::BadRequest(format!("Unusable redirect target: {e}")))?;

    tracing::debug!(from = %uri, to = ?location, "Redirecting to HTTPS");

    Ok((StatusCode::MOVED_PERMANENTLY, [(LOCATION, location)]))
}

/// Rewrite a request URL onto the secure origin: same host, same path and
/// query, scheme swapped. Any port in the request host is the plaintext
/// listener's and is dropped; the secure port is appended when non-standard.
fn secure_location(host: &str, uri: &Uri, https_port: u16) -> String {
    // Bracketed IPv6 authorities keep their brackets; only a port after the
    // closing bracket is dropped. Everything else splits on the first colon.
    let host = match host.rfind(']') {
        Some(end) => &host[..=end],
        None => host.split(':').next().unwrap_or(host),
    };
    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");

    if https_port == DEFAULT_HTTPS_PORT {
        format!("https://{host}{path_and_query}")
    } else {
        format!("https://{host}:{https_port}{path_and_query}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(s: &str) -> Uri {
        s.parse().expect("test uri")
    }

    #[test]
    fn root_redirects_to_plain_secure_origin() {
        assert_eq!(
            secure_location("localhost", &uri("/"), 443),
            "https://localhost/"
        );
    }

    #[test]
    fn path_and_query_survive_the_rewrite() {
        assert_eq!(
            secure_location("localhost", &uri("/some/path?q=1&lang=en"), 443),
            "https://localhost/some/path?q=1&lang=en"
        );
    }

    #[test]
    fn plaintext_port_is_dropped_from_host() {
        assert_eq!(
            secure_location("localhost:8080", &uri("/index.html"), 443),
            "https://localhost/index.html"
        );
    }

    #[test]
    fn ipv6_host_keeps_its_brackets() {
        assert_eq!(
            secure_location("[::1]:8080", &uri("/"), 443),
            "https://[::1]/"
        );
        assert_eq!(
            secure_location("[2001:db8::1]", &uri("/a?b=c"), 8443),
            "https://[2001:db8::1]:8443/a?b=c"
        );
    }

    #[test]
    fn non_standard_secure_port_is_appended() {
        assert_eq!(
            secure_location("127.0.0.1:8080", &uri("/a"), 8443),
            "https://127.0.0.1:8443/a"
        );
    }

    #[test]
    fn redirect_response_is_301_with_location() {
        let response = redirect_to_https("localhost", &uri("/"), 443)
            .expect("redirect should build")
            .into_response();

        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(
            response.headers().get(LOCATION).expect("location header"),
            "https://localhost/"
        );
    }
}
