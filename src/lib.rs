//! Vestibule - a minimal HTTPS front door.
//!
//! Two listeners make up the whole service: a plaintext redirector that
//! answers every request with a permanent redirect to the HTTPS origin, and
//! a TLS listener that serves one fixed landing page at the root and a 404
//! everywhere else. Certificates are provisioned externally and validated
//! at startup.

pub mod config;
pub mod error;
pub mod http;
pub mod middleware;
pub mod routes;
pub mod tls;

pub use config::AppConfig;
pub use error::AppError;
pub use http::{start_server, ServerError};
pub use routes::create_router;
pub use tls::{TlsError, TlsIdentity};
