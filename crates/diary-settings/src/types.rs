//! Settings types with compiled defaults.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Relational store.
    pub database: DatabaseSettings,
    /// HTTP listener.
    pub server: ServerSettings,
    /// Cross-origin policy.
    pub cors: CorsSettings,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: DatabaseSettings::default(),
            server: ServerSettings::default(),
            cors: CorsSettings::default(),
            log_level: "info".into(),
        }
    }
}

/// Database connection settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Explicit database file. Takes precedence over `name`.
    pub path: Option<PathBuf>,
    /// Logical database name; the file is `<name>.db` when `path` is unset.
    pub name: String,
    /// Maximum pooled connections.
    pub pool_size: u32,
    /// `SQLite` busy timeout in milliseconds.
    pub busy_timeout_ms: u32,
}

impl DatabaseSettings {
    /// The file the store should open.
    pub fn resolved_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}.db", self.name)))
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: None,
            name: "diary_app".into(),
            pool_size: 8,
            busy_timeout_ms: 5_000,
        }
    }
}

/// HTTP listener settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

impl ServerSettings {
    /// `host:port` string suitable for `TcpListener::bind`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 8080,
        }
    }
}

/// Cross-origin settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsSettings {
    /// Allowed origins, exactly as they appear in the `Origin` header.
    pub allowed_origins: Vec<String>,
}

impl CorsSettings {
    /// Parse a comma-separated origin list, trimming entries and dropping blanks.
    pub fn parse_origins(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(String::from)
            .collect()
    }
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3000".into()],
        }
    }
}
