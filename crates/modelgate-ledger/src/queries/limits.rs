use rusqlite::{Connection, OptionalExtension, params};

use crate::{Result, records::LimitRecord};

pub fn get(conn: &Connection, operation: &str) -> Result<Option<LimitRecord>> {
    let result = conn
        .query_row(
            r#"
        SELECT operation, daily_limit, updated_at
        FROM operation_limits
        WHERE operation = ?1
        "#,
            [operation],
            |row| {
                Ok(LimitRecord {
                    operation: row.get(0)?,
                    daily_limit: row.get::<_, i64>(1)? as u64,
                    updated_at: row.get(2)?,
                })
            },
        )
        .optional()?;

    Ok(result)
}

pub fn set(conn: &Connection, operation: &str, daily_limit: u64, now: &str) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO operation_limits (operation, daily_limit, updated_at)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(operation) DO UPDATE SET
            daily_limit = ?2,
            updated_at = ?3
        "#,
        params![operation, daily_limit as i64, now],
    )?;

    Ok(())
}

/// Insert a limit row only when none exists. Returns true if a row was created.
pub fn seed(conn: &Connection, operation: &str, daily_limit: u64, now: &str) -> Result<bool> {
    let inserted = conn.execute(
        r#"
        INSERT OR IGNORE INTO operation_limits (operation, daily_limit, updated_at)
        VALUES (?1, ?2, ?3)
        "#,
        params![operation, daily_limit as i64, now],
    )?;

    Ok(inserted > 0)
}

pub fn list(conn: &Connection) -> Result<Vec<LimitRecord>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT operation, daily_limit, updated_at
        FROM operation_limits
        ORDER BY operation
        "#,
    )?;

    let limits = stmt
        .query_map([], |row| {
            Ok(LimitRecord {
                operation: row.get(0)?,
                daily_limit: row.get::<_, i64>(1)? as u64,
                updated_at: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    Ok(limits)
}
