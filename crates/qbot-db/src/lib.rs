pub mod error;
pub mod migrations;
pub mod queries;
pub mod record;

pub use error::{Result, StorageError};
pub use record::Record;

use std::path::Path;
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, TransactionBehavior};
use tracing::info;

/// Connection pool limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Upper bound on open connections.
    pub max_open: u32,
    /// Idle connections kept warm. Idle connections above this are reaped.
    pub max_idle: u32,
    /// Connections are recycled after this long regardless of use. Zero means never.
    pub max_lifetime: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_open: 200,
            max_idle: 50,
            max_lifetime: Duration::from_secs(100),
        }
    }
}

/// Applied to every connection the pool opens.
#[derive(Debug)]
struct ConnectionCustomizer;

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for ConnectionCustomizer {
    fn on_acquire(&self, conn: &mut Connection) -> std::result::Result<(), rusqlite::Error> {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(())
    }
}

/// Pooled handle to the Q&A store. Cheap to clone.
#[derive(Clone)]
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    pub fn open(path: &Path, config: &PoolConfig) -> anyhow::Result<Self> {
        if config.max_open == 0 {
            anyhow::bail!("connection pool needs at least one open connection");
        }

        // Schema and WAL are set up on a dedicated connection before the pool fills.
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run(&conn)?;
        drop(conn);

        let pool = Pool::builder()
            .max_size(config.max_open)
            .min_idle(Some(config.max_idle.min(config.max_open)))
            .max_lifetime(Some(config.max_lifetime).filter(|d| !d.is_zero()))
            .connection_customizer(Box::new(ConnectionCustomizer))
            .build(SqliteConnectionManager::file(path))?;

        info!(
            "Database opened at {} (max {} open, {} idle, {}s lifetime)",
            path.display(),
            config.max_open,
            config.max_idle,
            config.max_lifetime.as_secs()
        );
        Ok(Self { pool })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.pool.get()?;
        f(&conn)
    }

    /// Runs `f` inside an immediate transaction. Nothing is committed if `f` fails.
    pub fn with_tx<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }
}
