//! SQLite access for the resource store.
//!
//! The schema and migrations are applied once, when the pool is opened. Every
//! unit of work afterwards opens its own configured connection. Analytics
//! reads go through [`DbPool::with_read_connection`], which refuses writes.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, Transaction};
use tracing::{debug, info};

use crate::error::AppResult;

pub mod migrations;

pub mod repositories;

const SCHEMA_SQL: &str = include_str!("schema.sql");

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    ReadWrite,
    ReadOnly,
}

#[derive(Clone, Debug)]
pub struct DbPool {
    path: PathBuf,
}

impl DbPool {
    /// Opens (or creates) the database at `path` and brings its schema up to date.
    pub fn new<P: Into<PathBuf>>(path: P) -> AppResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let pool = Self { path };
        let conn = pool.open(Access::ReadWrite)?;
        conn.execute_batch(SCHEMA_SQL)?;
        migrations::run(&conn)?;
        let schema_version = pool_schema_version(&conn)?;

        info!(
            target: "app::db",
            db_path = %pool.path.display(),
            schema_version,
            "resource database ready"
        );
        Ok(pool)
    }

    pub fn with_connection<F, T>(&self, callback: F) -> AppResult<T>
    where
        F: FnOnce(&Connection) -> AppResult<T>,
    {
        let conn = self.open(Access::ReadWrite)?;
        callback(&conn)
    }

    /// Like [`with_connection`](Self::with_connection), but any write fails.
    pub fn with_read_connection<F, T>(&self, callback: F) -> AppResult<T>
    where
        F: FnOnce(&Connection) -> AppResult<T>,
    {
        let conn = self.open(Access::ReadOnly)?;
        callback(&conn)
    }

    /// Runs `callback` in one transaction. Nothing is committed when it fails.
    pub fn with_transaction<F, T>(&self, callback: F) -> AppResult<T>
    where
        F: FnOnce(&Transaction<'_>) -> AppResult<T>,
    {
        let mut conn = self.open(Access::ReadWrite)?;
        let tx = conn.transaction()?;
        let value = callback(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self, access: Access) -> AppResult<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "foreign_keys", 1)?;
        match access {
            Access::ReadWrite => conn.pragma_update(None, "journal_mode", "WAL")?,
            Access::ReadOnly => conn.pragma_update(None, "query_only", 1)?,
        }
        debug!(target: "app::db", ?access, "connection opened");
        Ok(conn)
    }
}

fn pool_schema_version(conn: &Connection) -> AppResult<i32> {
    let version = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    Ok(version)
}
