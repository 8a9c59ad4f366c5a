use rusqlite::Connection;

use crate::{Error, Result};

// Schema version (increment when changing table definitions)
pub const SCHEMA_VERSION: i32 = 1;

// NOTE: Ledger Design Rationale
//
// Why one row per (operation, day)?
// - Admission only ever touches a single row, so the check-then-increment
//   transaction stays short and contention is per operation
// - Day rollover needs no job: a new day is simply a new primary key
//
// Why refuse newer schemas instead of dropping tables?
// - usage_log rows are retained for audit; silently recreating tables would lose them

pub fn init_schema(conn: &Connection) -> Result<()> {
    let current_version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if current_version > SCHEMA_VERSION {
        return Err(Error::IncompatibleSchema {
            found: current_version,
            supported: SCHEMA_VERSION,
        });
    }

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS operation_limits (
            operation TEXT PRIMARY KEY,
            daily_limit INTEGER NOT NULL CHECK (daily_limit >= 0),
            updated_at TEXT
        );

        CREATE TABLE IF NOT EXISTS usage_log (
            operation TEXT NOT NULL,
            log_date TEXT NOT NULL,
            request_count INTEGER NOT NULL DEFAULT 0,
            total_tokens INTEGER NOT NULL DEFAULT 0,
            last_updated TEXT,
            PRIMARY KEY (operation, log_date)
        );

        CREATE INDEX IF NOT EXISTS idx_usage_date ON usage_log(log_date DESC);
        "#,
    )?;

    conn.execute(&format!("PRAGMA user_version = {}", SCHEMA_VERSION), [])?;

    Ok(())
}
