//! SQLite persistence layer.
//!
//! RULE: Only the store modules talk to the database.
//! The engine, query façade and aggregator call store functions; they never
//! execute SQL directly.
//!
//! Connections are opened per unit of work and dropped on every exit path.
//! An anchor connection held by `LedgerStore` keeps in-memory databases
//! alive between operations and marks the store's lifetime: once `close()`
//! takes it, no new connections are handed out.

mod account;
mod payment;

pub use account::NewAccount;
pub(crate) use account::{find_due, write_due};
pub(crate) use payment::insert_payment;

use crate::{
    config::LedgerConfig,
    error::{LedgerError, LedgerResult},
};
use rusqlite::{types::ValueRef, Connection, OpenFlags, Row};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;
use uuid::Uuid;

const MEMORY_PATH: &str = ":memory:";

pub struct LedgerStore {
    uri: String,
    busy_timeout: Duration,
    retry: RetryPolicy,
    anchor: Mutex<Option<Connection>>,
}

impl LedgerStore {
    /// Open (or create) the database named by `config.db_path`.
    pub fn open(config: &LedgerConfig) -> LedgerResult<Self> {
        if config.db_path == MEMORY_PATH {
            return Self::in_memory_with(config);
        }
        let store = Self::connect_anchor(config.db_path.clone(), config)?;
        // WAL: readers do not block the single writer. Only meaningful for files.
        if let Some(anchor) = store.anchor().as_ref() {
            let _ = anchor.execute_batch("PRAGMA journal_mode=WAL;");
        }
        Ok(store)
    }

    /// Open a private in-memory database (used in tests).
    pub fn in_memory() -> LedgerResult<Self> {
        Self::in_memory_with(&LedgerConfig::default_test())
    }

    /// Every connection of this store shares one named in-memory database;
    /// other stores get their own. The memdb VFS takes ordinary database
    /// locks, so writers and readers wait on the busy timeout exactly as they
    /// do against a file.
    pub fn in_memory_with(config: &LedgerConfig) -> LedgerResult<Self> {
        let uri = format!("file:/emi_ledger_{}?vfs=memdb", Uuid::new_v4().simple());
        Self::connect_anchor(uri, config)
    }

    fn connect_anchor(uri: String, config: &LedgerConfig) -> LedgerResult<Self> {
        let busy_timeout = config.busy_timeout();
        let anchor = open_connection(&uri, busy_timeout)?;
        log::info!("ledger store opened at {uri}");
        Ok(Self {
            uri,
            busy_timeout,
            retry: RetryPolicy::from_config(config),
            anchor: Mutex::new(Some(anchor)),
        })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> LedgerResult<()> {
        let conn = self.connect()?;
        conn.execute_batch(include_str!("../../../migrations/001_ledger.sql"))?;
        log::debug!("ledger schema migrated");
        Ok(())
    }

    /// A fresh connection for one unit of work.
    pub fn connect(&self) -> LedgerResult<Connection> {
        if self.is_closed() {
            return Err(LedgerError::StoreClosed);
        }
        open_connection(&self.uri, self.busy_timeout)
    }

    pub fn is_closed(&self) -> bool {
        self.anchor().is_none()
    }

    /// Release the anchor connection. In-memory data is discarded once the
    /// last in-flight operation drops its connection.
    pub fn close(&self) -> LedgerResult<()> {
        let anchor = self.anchor().take();
        if let Some(conn) = anchor {
            conn.close().map_err(|(_, e)| LedgerError::Database(e))?;
            log::info!("ledger store closed at {}", self.uri);
        }
        Ok(())
    }

    /// Run `op` until it succeeds, fails for a reason other than lock
    /// contention, or the retry budget is spent. `op` must be a complete unit
    /// of work: each attempt starts from a clean connection.
    pub fn with_retry<T>(
        &self,
        label: &str,
        mut op: impl FnMut() -> LedgerResult<T>,
    ) -> LedgerResult<T> {
        let mut attempt = 0;
        loop {
            match op() {
                Err(err) if err.is_contention() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    let pause = self.retry.backoff(attempt);
                    log::debug!("{label}: store contention ({err}), retry {attempt} in {pause:?}");
                    thread::sleep(pause);
                }
                Err(err) if err.is_contention() => {
                    log::warn!("{label}: giving up after {attempt} retries: {err}");
                    return Err(err);
                }
                result => return result,
            }
        }
    }

    fn anchor(&self) -> MutexGuard<'_, Option<Connection>> {
        self.anchor.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Linear backoff with a cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RetryPolicy {
    max_retries: u32,
    step: Duration,
    cap: Duration,
}

impl RetryPolicy {
    fn from_config(config: &LedgerConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            step: Duration::from_millis(config.retry_backoff_ms),
            cap: Duration::from_millis(config.max_backoff_ms),
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.step.saturating_mul(attempt).min(self.cap)
    }
}

fn open_connection(uri: &str, busy_timeout: Duration) -> LedgerResult<Connection> {
    let conn = Connection::open_with_flags(
        uri,
        OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    conn.busy_timeout(busy_timeout)?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

/// Decode a money column. The ledger writes decimal text; rows provisioned by
/// other tools may hold integers or reals. NULL reads as zero.
pub(crate) fn read_decimal(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    use rusqlite::types::Type;
    let conversion = |ty: Type, e: Box<dyn std::error::Error + Send + Sync>| {
        rusqlite::Error::FromSqlConversionFailure(idx, ty, e)
    };
    match row.get_ref(idx)? {
        ValueRef::Null => Ok(Decimal::ZERO),
        ValueRef::Integer(i) => Ok(Decimal::from(i)),
        ValueRef::Real(f) => Decimal::try_from(f).map_err(|e| conversion(Type::Real, Box::new(e))),
        ValueRef::Text(bytes) => {
            let text = std::str::from_utf8(bytes).map_err(|e| conversion(Type::Text, Box::new(e)))?;
            Decimal::from_str(text.trim()).map_err(|e| conversion(Type::Text, Box::new(e)))
        }
        ValueRef::Blob(_) => Err(rusqlite::Error::InvalidColumnType(
            idx,
            "money".to_string(),
            Type::Blob,
        )),
    }
}
