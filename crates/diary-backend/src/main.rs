//! # diary-backend
//!
//! Diary backend binary: loads settings, opens the store, serves the HTTP API
//! until SIGINT or SIGTERM.

#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use diary_server::{build_router, AppState, ShutdownCoordinator};
use diary_settings::Settings;
use diary_store::{ConnectionConfig, Database};
use tokio::net::TcpListener;
use tracing::info;

/// Diary backend server.
#[derive(Parser, Debug)]
#[command(name = "diary-backend", about = "Diary backend server")]
struct Cli {
    /// Host to bind (overrides `SERVER_HOST`).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides `SERVER_PORT`, 0 for auto-assign).
    #[arg(long)]
    port: Option<u16>,

    /// Path to the `SQLite` database (overrides `DB_PATH`).
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// `.env` file to load instead of searching the working directory.
    #[arg(long)]
    env_file: Option<PathBuf>,
}

impl Cli {
    /// Layer command-line flags over loaded settings.
    fn apply(self, mut settings: Settings) -> Settings {
        if let Some(host) = self.host {
            settings.server.host = host;
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(path) = self.db_path {
            settings.database.path = Some(path);
        }
        settings
    }
}

fn open_database(settings: &Settings) -> Result<Database> {
    let path = settings.database.resolved_path();
    let config = ConnectionConfig {
        pool_size: settings.database.pool_size,
        busy_timeout_ms: settings.database.busy_timeout_ms,
        ..ConnectionConfig::default()
    };
    Database::open(&path, &config)
        .with_context(|| format!("Failed to open database: {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let settings = diary_settings::load_settings_with_dotenv(args.env_file.as_deref())
        .context("Failed to load settings")?;
    let settings = args.apply(settings);

    diary_core::logging::init_subscriber(&settings.log_level);

    let db = open_database(&settings)?;
    let state = AppState::from_settings(db, &settings);

    let addr = settings.server.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    let local = listener.local_addr().context("Failed to read bound address")?;
    info!(%local, origins = ?settings.cors.allowed_origins, "diary backend listening");

    let shutdown = ShutdownCoordinator::new();
    shutdown.listen_for_signals();
    let token = shutdown.token();

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move { token.cancelled().await })
        .await
        .context("Server error")?;

    info!("server stopped");
    Ok(())
}
