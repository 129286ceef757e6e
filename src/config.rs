//! Configuration loading and constants.
//!
//! Loads application configuration from a TOML file and defines the constants
//! for the served landing document, response header values, timeouts, and
//! default paths. `AppConfig` is the root configuration struct; the shipped
//! defaults reproduce the core contract (plaintext redirect on port 80,
//! TLS responder on port 443).

use const_format::formatcp;
use serde::Deserialize;
use std::path::Path;

// =============================================================================
// Served Document
// =============================================================================

/// The one document this server exists to serve, returned verbatim for `GET /`.
pub const LANDING_PAGE: &str = "<body><h1>Hello World!</h1></body>";

// =============================================================================
// HTTP Response Headers
// =============================================================================
// Cache-Control values are in seconds. The landing page is immutable in
// practice but kept on a short TTL so a redeploy propagates quickly; error
// responses use a very short TTL to keep upstream caches from pinning a 404.

/// Landing page freshness window
pub const HTTP_CACHE_LANDING_MAX_AGE: u32 = 300;

/// Error responses - short TTL so misses recover quickly
pub const HTTP_CACHE_ERROR_MAX_AGE: u32 = 5;

/// HSTS lifetime advertised on every secure response (one year)
pub const HSTS_MAX_AGE: u32 = 31_536_000;

// Pre-formatted header values (compile-time string concatenation)
pub const CACHE_CONTROL_LANDING: &str =
    formatcp!("public, max-age={}", HTTP_CACHE_LANDING_MAX_AGE);

pub const CACHE_CONTROL_ERROR: &str = formatcp!("public, max-age={}", HTTP_CACHE_ERROR_MAX_AGE);

pub const HSTS_POLICY: &str = formatcp!("max-age={}", HSTS_MAX_AGE);

// =============================================================================
// Timeouts
// =============================================================================

/// Upper bound on a single in-flight request, so a stalled exchange cannot
/// pin a connection task indefinitely
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// How long graceful shutdown waits for open connections to drain
pub const SHUTDOWN_GRACE_SECS: u64 = 30;

// =============================================================================
// Default Paths and Strings
// =============================================================================

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Default log filter when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = "vestibule=info";

/// Default log format (text or json)
pub const DEFAULT_LOG_FORMAT: &str = "text";

/// Standard HTTPS port; redirect targets omit the port suffix when the
/// secure listener sits here
pub const DEFAULT_HTTPS_PORT: u16 = 443;

/// Standard plaintext port for the redirect listener
pub const DEFAULT_HTTP_REDIRECT_PORT: u16 = 80;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP server configuration
    pub http: HttpServerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Secure listener configuration. Immutable after startup.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    /// Bind address for both listeners
    #[serde(default = "HttpServerConfig::default_host")]
    pub host: String,
    /// Port the TLS responder binds
    #[serde(default = "HttpServerConfig::default_port")]
    pub port: u16,
    /// Transport security material and redirect settings
    pub tls: TlsConfig,
}

impl HttpServerConfig {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        DEFAULT_HTTPS_PORT
    }
}

/// TLS material paths and plaintext-redirect settings.
///
/// The certificate and key are provisioned externally; the server only loads
/// and presents them. Both paths are required.
#[derive(Debug, Clone, Deserialize)]
pub struct TlsConfig {
    /// Path to the PEM certificate chain (leaf first)
    pub cert_path: String,
    /// Path to the PEM private key
    pub key_path: String,
    /// Whether to run the plaintext HTTP->HTTPS redirect listener
    #[serde(default = "TlsConfig::default_redirect_http")]
    pub redirect_http: bool,
    /// Port the redirect listener binds
    #[serde(default = "TlsConfig::default_redirect_port")]
    pub redirect_port: u16,
}

impl TlsConfig {
    fn default_redirect_http() -> bool {
        true
    }

    fn default_redirect_port() -> u16 {
        DEFAULT_HTTP_REDIRECT_PORT
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log format: "text" (human-readable, default) or "json" (structured)
    #[serde(default = "LoggingConfig::default_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: DEFAULT_LOG_FORMAT.to_string(),
        }
    }
}

impl LoggingConfig {
    fn default_format() -> String {
        DEFAULT_LOG_FORMAT.to_string()
    }
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot produce a working pair of listeners.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.http.tls.redirect_http && self.http.tls.redirect_port == self.http.port {
            return Err(ConfigError::Validation(format!(
                "redirect_port and port are both {}; the redirect listener needs its own port",
                self.http.port
            )));
        }

        if self.http.tls.cert_path.is_empty() || self.http.tls.key_path.is_empty() {
            return Err(ConfigError::Validation(
                "tls.cert_path and tls.key_path must both be set".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Configuration error: {0}")]
    Validation(String),
}
