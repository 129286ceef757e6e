//! The two listeners: plaintext redirector and TLS responder.
//!
//! The plaintext listener answers every request with a 301 to the secure
//! origin; the secure listener terminates TLS with the provisioned
//! certificate and serves the routes. Each accepted connection is handled by
//! its own task, so a bad request or failed handshake never takes a listener
//! down.
//!
//! Also provides:
//! - Graceful shutdown on SIGTERM/SIGINT
//! - Certificate hot-reload via SIGHUP (validated before the swap)

mod redirect;
mod server;
mod shutdown;

pub use server::{start_server, ServerError};
