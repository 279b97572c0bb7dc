pub mod migrations;
pub mod models;
pub mod queries;
pub mod realtime;

use anyhow::Result;
use rusqlite::{Connection, ErrorCode};
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

use crate::realtime::ChangeFeed;

/// Default number of change events buffered per subscriber before it lags.
pub const DEFAULT_FEED_CAPACITY: usize = 1024;

pub struct Database {
    conn: Mutex<Connection>,
    feed: ChangeFeed,
}

impl Database {
    pub fn open(path: &Path, feed_capacity: usize) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;

        let db = Self::from_connection(conn, feed_capacity)?;
        info!("Database opened at {}", path.display());
        Ok(db)
    }

    /// Private in-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::open_in_memory_with_feed(DEFAULT_FEED_CAPACITY)
    }

    /// In-memory store whose change feed buffers `feed_capacity` events.
    pub fn open_in_memory_with_feed(feed_capacity: usize) -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?, feed_capacity)
    }

    fn from_connection(conn: Connection, feed_capacity: usize) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            feed: ChangeFeed::new(feed_capacity),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
        f(&conn)
    }

    /// Change events for every committed insert and update.
    pub fn changes(&self) -> &ChangeFeed {
        &self.feed
    }
}

/// True when the error came from a UNIQUE / CHECK / FOREIGN KEY violation.
pub fn is_constraint_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<rusqlite::Error>(),
        Some(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation
    )
}
