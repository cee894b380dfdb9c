//! Pooled `SQLite` connections.
//!
//! [`Database`] is the single handle the rest of the system holds. It is
//! cheap to clone (the pool is reference counted) and is injected into the
//! HTTP layer at startup. Every checkout runs [`PragmaCustomizer`] so WAL
//! mode, foreign keys, the busy timeout and the custom SQL functions are
//! always in effect.

use std::path::Path;
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use tracing::{debug, info};

use crate::errors::{Result, StoreError};
use crate::{migrations, sql};

/// Alias for the connection pool type.
pub type ConnectionPool = Pool<SqliteConnectionManager>;

/// Configuration for the connection pool.
#[derive(Clone, Debug)]
pub struct ConnectionConfig {
    /// Maximum pool size (default: 8).
    pub pool_size: u32,
    /// Busy timeout in milliseconds (default: 5000).
    pub busy_timeout_ms: u32,
    /// How long a request may wait for a free connection (default: 5s).
    pub checkout_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            pool_size: 8,
            busy_timeout_ms: 5_000,
            checkout_timeout: Duration::from_secs(5),
        }
    }
}

/// `SQLite` pragma customizer that runs on each new connection.
#[derive(Debug)]
struct PragmaCustomizer {
    busy_timeout_ms: u32,
}

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for PragmaCustomizer {
    fn on_acquire(&self, conn: &mut Connection) -> std::result::Result<(), rusqlite::Error> {
        conn.execute_batch(&format!(
            "PRAGMA journal_mode = WAL;\
             PRAGMA busy_timeout = {};\
             PRAGMA foreign_keys = ON;\
             PRAGMA synchronous = NORMAL;",
            self.busy_timeout_ms
        ))?;
        sql::register_functions(conn)
    }
}

/// Shared handle to the relational store.
#[derive(Clone)]
pub struct Database {
    pool: ConnectionPool,
}

impl Database {
    /// Open (or create) a file-backed database and bring its schema up to date.
    pub fn open(path: &Path, config: &ConnectionConfig) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder()
            .max_size(config.pool_size)
            .connection_timeout(config.checkout_timeout)
            .connection_customizer(Box::new(PragmaCustomizer {
                busy_timeout_ms: config.busy_timeout_ms,
            }))
            .build(manager)?;

        let db = Self { pool };
        db.migrate()?;
        info!(path = %path.display(), pool_size = config.pool_size, "database opened");
        Ok(db)
    }

    /// Open a private in-memory database (for tests).
    ///
    /// Every `SQLite` in-memory connection is its own database, so the pool
    /// holds exactly one connection that never expires.
    pub fn in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connection_timeout(Duration::from_secs(5))
            .connection_customizer(Box::new(PragmaCustomizer {
                busy_timeout_ms: 5_000,
            }))
            .build(manager)?;

        let db = Self { pool };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version = self.with_conn(migrations::run_migrations)?;
        debug!(version, "schema up to date");
        Ok(())
    }

    /// Run `f` with a pooled connection on the current thread.
    pub fn with_conn<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&Connection) -> std::result::Result<T, E>,
        E: From<StoreError>,
    {
        let conn = self.pool.get().map_err(StoreError::from)?;
        f(&conn)
    }

    /// Run `f` with a pooled connection on the blocking thread pool.
    ///
    /// If the awaiting future is dropped the query still runs to completion;
    /// its result is discarded.
    pub async fn call<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&Connection) -> std::result::Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
    {
        let pool = self.pool.clone();
        let handle = tokio::task::spawn_blocking(move || {
            let conn = pool.get().map_err(StoreError::from)?;
            f(&conn)
        });
        match handle.await {
            Ok(result) => result,
            Err(e) => Err(StoreError::Join(e.to_string()).into()),
        }
    }

    /// Maximum number of pooled connections.
    pub fn pool_size(&self) -> u32 {
        self.pool.max_size()
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("pool_size", &self.pool.max_size())
            .finish_non_exhaustive()
    }
}
