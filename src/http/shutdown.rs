//! Graceful shutdown and signal handling.
//!
//! Handles:
//! - SIGTERM/SIGINT: Graceful shutdown with connection draining
//! - SIGHUP: Certificate reload from the provisioned paths
//!
//! A SIGHUP reload passes the replacement pair through the same validation
//! as startup; material that is unreadable or outside its validity window is
//! rejected and the serving certificate stays in place.

use std::time::Duration;

use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;

use crate::config::SHUTDOWN_GRACE_SECS;
use crate::tls::TlsIdentity;

/// Wait for either Ctrl+C or SIGTERM, whichever arrives first.
async fn shutdown_signal() -> &'static str {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => "Ctrl+C",
        _ = terminate => "SIGTERM",
    }
}

/// Setup graceful shutdown on SIGTERM and SIGINT.
///
/// When either signal is received, the server stops accepting new
/// connections and drains the existing ones before exiting.
pub fn setup_shutdown_handler(handle: Handle) {
    tokio::spawn(async move {
        let signal = shutdown_signal().await;
        tracing::info!(signal, "Initiating graceful shutdown");

        handle.graceful_shutdown(Some(Duration::from_secs(SHUTDOWN_GRACE_SECS)));
        tracing::info!(
            grace_secs = SHUTDOWN_GRACE_SECS,
            "Waiting for open connections to close"
        );
    });
}

/// Setup the SIGHUP handler that re-reads the certificate/key pair.
///
/// The replacement is validated before it is swapped in, so the secure
/// listener never starts presenting a certificate that would have been
/// refused at startup.
#[cfg(unix)]
pub fn setup_reload_handler(tls_config: RustlsConfig, cert_path: String, key_path: String) {
    tokio::spawn(async move {
        let mut sighup = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::hangup())
            .expect("Failed to install SIGHUP handler");

        loop {
            sighup.recv().await;
            tracing::info!("Received SIGHUP, reloading TLS certificate");

            let identity = match TlsIdentity::load(&cert_path, &key_path) {
                Ok(identity) => identity,
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        cert = %cert_path,
                        key = %key_path,
                        "Rejected replacement TLS certificate, keeping the current one"
                    );
                    continue;
                }
            };

            // Install the exact bytes that passed validation, not a second
            // read of the paths.
            let info = identity.info().clone();
            let (cert_chain, key) = identity.into_der();
            match tls_config.reload_from_der(cert_chain, key).await {
                Ok(()) => {
                    tracing::info!(
                        common_name = ?info.common_name,
                        not_after = %info.not_after,
                        "TLS certificate reloaded"
                    );
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        cert = %cert_path,
                        key = %key_path,
                        "Failed to reload TLS certificate"
                    );
                }
            }
        }
    });
}

/// No-op reload handler for non-Unix platforms.
#[cfg(not(unix))]
pub fn setup_reload_handler(_tls_config: RustlsConfig, _cert_path: String, _key_path: String) {
    tracing::warn!("Certificate hot-reload via SIGHUP not supported on this platform");
}
