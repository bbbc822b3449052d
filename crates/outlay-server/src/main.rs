//! Outlay server binary
//!
//! Usage:
//!   outlay --db outlay.db --port 8080
//!
//! The JWT signing secret comes from the OUTLAY_JWT_SECRET environment
//! variable; the server refuses to start without one.

use anyhow::{bail, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use outlay_core::db::Database;
use outlay_server::{run_server, ServerConfig, JWT_SECRET_ENV};

#[derive(Parser)]
#[command(name = "outlay", about = "Personal expense tracker REST API")]
struct Cli {
    /// Path to the SQLite database file
    #[arg(long, default_value = "outlay.db")]
    db: String,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Access token lifetime in hours
    #[arg(long, default_value_t = 24)]
    token_ttl: i64,

    /// Allowed CORS origins (repeatable)
    #[arg(long = "allow-origin")]
    allowed_origins: Vec<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let Ok(jwt_secret) = std::env::var(JWT_SECRET_ENV) else {
        bail!(
            "{} is not set; refusing to start with an unsigned-token configuration",
            JWT_SECRET_ENV
        );
    };

    let db = Database::new(&cli.db)?;
    tracing::info!(path = %db.path(), "Database ready");

    let config = ServerConfig {
        jwt_secret,
        token_ttl_hours: cli.token_ttl,
        allowed_origins: cli.allowed_origins,
    };

    run_server(db, config, &cli.host, cli.port).await
}
