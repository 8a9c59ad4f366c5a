use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

use crate::queries::{limits, usage};
use crate::records::{Admission, LimitRecord, QuotaRecord};
use crate::{Result, schema};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Durable quota ledger backed by a single SQLite file.
///
/// `Connection` is not `Sync`; callers that share a ledger across tasks wrap
/// it in a mutex. Cross-process safety comes from SQLite's own locking.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "FULL")?;

        schema::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::init_schema(&conn)?;
        Ok(Self { conn })
    }

    // Limits

    pub fn get_limit(&self, operation: &str) -> Result<Option<LimitRecord>> {
        limits::get(&self.conn, operation)
    }

    pub fn set_limit(&self, operation: &str, daily_limit: u64, now: DateTime<Utc>) -> Result<()> {
        limits::set(&self.conn, operation, daily_limit, &now.to_rfc3339())
    }

    /// Create limit rows for operations that have none. Existing rows win.
    pub fn seed_limits<'a>(
        &self,
        operations: impl IntoIterator<Item = &'a str>,
        default_limit: u64,
        now: DateTime<Utc>,
    ) -> Result<usize> {
        let now = now.to_rfc3339();
        let mut created = 0;
        for operation in operations {
            if limits::seed(&self.conn, operation, default_limit, &now)? {
                created += 1;
            }
        }
        Ok(created)
    }

    pub fn list_limits(&self) -> Result<Vec<LimitRecord>> {
        limits::list(&self.conn)
    }

    // Usage

    /// Atomic check-then-increment of the (operation, day) request counter.
    pub fn admit(
        &mut self,
        operation: &str,
        day: NaiveDate,
        default_limit: u64,
        now: DateTime<Utc>,
    ) -> Result<Admission> {
        usage::admit(&mut self.conn, operation, day, default_limit, &now.to_rfc3339())
    }

    pub fn add_tokens(
        &self,
        operation: &str,
        day: NaiveDate,
        tokens: u64,
        now: DateTime<Utc>,
    ) -> Result<()> {
        usage::add_tokens(&self.conn, operation, day, tokens, &now.to_rfc3339())
    }

    pub fn usage_for(&self, operation: &str, day: NaiveDate) -> Result<Option<QuotaRecord>> {
        usage::get(&self.conn, operation, day)
    }

    pub fn usage_on(&self, day: NaiveDate) -> Result<Vec<QuotaRecord>> {
        usage::list_for_day(&self.conn, day)
    }

    pub fn history(&self, operation: Option<&str>, limit: usize) -> Result<Vec<QuotaRecord>> {
        usage::history(&self.conn, operation, limit)
    }
}
