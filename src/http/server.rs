//! HTTPS server startup logic.
//!
//! Loads and validates the provisioned TLS identity (failing fast before any
//! socket is bound), starts the plaintext redirect listener when enabled,
//! and serves the secure router until shutdown. Certificate issuance is an
//! external concern; this server only presents what it was given.

use std::net::SocketAddr;

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;

use crate::config::AppConfig;
use crate::tls::{TlsError, TlsIdentity};

use super::redirect;
use super::shutdown;

/// Server startup error. All variants are fatal: the process reports them
/// and exits instead of listening with a broken configuration.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid listen address: {0}")]
    Address(String),

    #[error("Failed to load TLS material: {0}")]
    Tls(#[from] TlsError),

    #[error("Server error: {0}")]
    Server(String),
}

/// Start the HTTPS server and, when enabled, its redirect front end.
///
/// This function blocks until the server shuts down.
pub async fn start_server(app: Router, config: &AppConfig) -> Result<(), ServerError> {
    let addr: SocketAddr = format!("{}:{}", config.http.host, config.http.port)
        .parse()
        .map_err(|e| ServerError::Address(format!("Invalid http.host or http.port: {e}")))?;

    let tls = &config.http.tls;

    // Fail fast on absent, malformed, or out-of-window material.
    let identity = TlsIdentity::load(&tls.cert_path, &tls.key_path)?;
    tracing::info!(
        common_name = ?identity.info().common_name,
        issuer = %identity.info().issuer,
        not_before = %identity.info().not_before,
        not_after = %identity.info().not_after,
        "Loaded TLS certificate"
    );

    let rustls_config = RustlsConfig::from_config(identity.into_server_config()?);

    let handle = Handle::new();

    // Setup graceful shutdown
    shutdown::setup_shutdown_handler(handle.clone());

    // Setup SIGHUP handler for certificate reload
    shutdown::setup_reload_handler(
        rustls_config.clone(),
        tls.cert_path.clone(),
        tls.key_path.clone(),
    );

    // Start HTTP->HTTPS redirect if enabled, on the same interface
    if tls.redirect_http {
        let redirect_addr = SocketAddr::new(addr.ip(), tls.redirect_port);
        redirect::spawn_redirect_server(redirect_addr, addr.port());
    }

    tracing::info!(%addr, cert = %tls.cert_path, key = %tls.key_path, "Starting HTTPS server");

    axum_server::bind_rustls(addr, rustls_config)
        .handle(handle)
        .serve(app.into_make_service())
        .await
        .map_err(|e| ServerError::Server(e.to_string()))
}
