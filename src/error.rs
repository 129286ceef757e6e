//! Request-level errors and their HTTP mapping.
//!
//! Only two things can go wrong while handling a request: the path matches no
//! route (404), or the request itself is unusable (400). Both are isolated to
//! the connection that produced them; neither ever takes a listener down.
//! Fatal startup errors live with the code that raises them
//! ([`crate::config::ConfigError`], [`crate::tls::TlsError`],
//! [`crate::http::ServerError`]).

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use http::header::{HeaderValue, CACHE_CONTROL};

use crate::config::CACHE_CONTROL_ERROR;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("No route matches path: {0}")]
    RouteMiss(String),

    #[error("Malformed request: {0}")]
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::RouteMiss(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        // Minimal body that still names the status. External checks grep the
        // body text, not just the status line, so "404 Not Found" has to
        // appear in it.
        let body = format!(
            "<body><h1>{} {}</h1></body>",
            status.as_u16(),
            status.canonical_reason().unwrap_or("")
        );

        let mut response = (status, Html(body)).into_response();
        response
            .headers_mut()
            .insert(CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL_ERROR));
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_miss_maps_to_404_with_status_text_in_body() {
        let response = AppError::RouteMiss("/nonexistent".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(CACHE_CONTROL).unwrap(),
            CACHE_CONTROL_ERROR
        );
    }

    #[test]
    fn bad_request_maps_to_400() {
        let response = AppError::BadRequest("unusable host".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
