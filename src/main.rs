//! Vestibule: a minimal HTTPS front door.
//!
//! This is the application entry point. It initializes tracing, loads
//! configuration from a TOML file, pins the process-wide TLS crypto provider,
//! builds the Axum router, and starts the HTTPS server together with the
//! plaintext redirector.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vestibule::config::{AppConfig, DEFAULT_CONFIG_PATH, DEFAULT_LOG_FILTER};
use vestibule::routes::create_router;

/// Vestibule: permanent HTTP to HTTPS redirect plus a fixed landing page
#[derive(Parser, Debug)]
#[command(name = "vestibule", version, about)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Log level filter (e.g., "vestibule=debug,tower_http=info")
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args = Args::parse();

    // Configuration is loaded before tracing init so the configured log
    // format applies from the first event. A load failure still reaches the
    // operator through the error return.
    let config = AppConfig::load(&args.config)?;

    // Initialize tracing with priority: CLI > env > default
    let log_filter = args
        .log_level
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    let registry =
        tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(&log_filter));
    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!(path = %args.config, "Loaded configuration");

    // The crypto provider must be pinned before any rustls config is built.
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| "a TLS crypto provider was already installed")?;

    // Create router
    let app = create_router();

    // Start the TLS listener (and the redirector, unless disabled)
    vestibule::http::start_server(app, &config).await?;

    Ok(())
}
