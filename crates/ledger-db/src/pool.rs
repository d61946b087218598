//! # Database Pool
//!
//! Opens the ledger's SQLite file and hands out the repository and the
//! ledger service built on one shared pool.
//!
//! ```text
//! ApiConfig ──► DbConfig ──► Database::new ──► SqlitePool (WAL)
//!                                                  │
//!                          db.ledger() ◄── db.discounts()
//! ```
//!
//! Handlers share the pool. Usage increments from different connections
//! never need an application lock: each one is a single guarded UPDATE,
//! and SQLite serializes writers.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::ledger::DiscountLedger;
use crate::migrations;
use crate::repository::discount::DiscountRepository;

/// How long a request waits for a free connection before failing.
const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/ledger/ledger.db")
///     .max_connections(8)
///     .acquire_timeout(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite file, created on first open. `:memory:` for tests.
    pub database_path: PathBuf,

    /// Pool size. Default: 5
    pub max_connections: u32,

    /// Wait for a pooled connection. Default: 30 seconds
    pub acquire_timeout: Duration,

    /// Apply pending migrations on open. Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Private in-memory database, one per call.
    ///
    /// Pinned to a single connection: every new connection to
    /// `:memory:` would open an empty database of its own.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Handle to the ledger database. Clones share the pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and, when configured, migrates the schema.
    ///
    /// ## Errors
    /// * `DbError::ConnectionFailed` - bad path or unreachable file
    /// * `DbError::MigrationFailed` - schema could not be brought up to date
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Opening discount ledger database"
        );

        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .create_if_missing(true);

        debug!(
            max_connections = config.max_connections,
            acquire_timeout_secs = config.acquire_timeout.as_secs(),
            "Connection options configured"
        );

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(max_connections = config.max_connections, "Database pool ready");

        let db = Database { pool };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Applies pending migrations. Safe to repeat.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// Raw pool, for migrations and tests.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Unscoped repository. Callers outside this crate should go through
    /// [`Database::ledger`], which applies store scope.
    pub fn discounts(&self) -> DiscountRepository {
        DiscountRepository::new(self.pool.clone())
    }

    /// The discount ledger service.
    ///
    /// ```rust,ignore
    /// let active = db.ledger().list_active(&caller, PageRequest::default()).await?;
    /// ```
    pub fn ledger(&self) -> DiscountLedger {
        DiscountLedger::new(self.discounts())
    }

    /// Closes the pool; later queries fail.
    pub async fn close(&self) {
        info!("Closing discount ledger database");
        self.pool.close().await;
    }

    /// Whether a trivial query still succeeds. Backs `GET /healthz`.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
