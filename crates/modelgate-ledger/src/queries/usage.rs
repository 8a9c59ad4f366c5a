use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};

use crate::{
    Result,
    queries::limits,
    records::{Admission, QuotaRecord},
};

fn map_record(row: &Row<'_>) -> rusqlite::Result<QuotaRecord> {
    Ok(QuotaRecord {
        operation: row.get(0)?,
        day: row.get(1)?,
        request_count: row.get::<_, i64>(2)? as u64,
        total_tokens: row.get::<_, i64>(3)? as u64,
        last_updated: row.get(4)?,
    })
}

pub fn get(conn: &Connection, operation: &str, day: NaiveDate) -> Result<Option<QuotaRecord>> {
    let result = conn
        .query_row(
            r#"
        SELECT operation, log_date, request_count, total_tokens, last_updated
        FROM usage_log
        WHERE operation = ?1 AND log_date = ?2
        "#,
            params![operation, day],
            map_record,
        )
        .optional()?;

    Ok(result)
}

/// Check the (operation, day) counter against its limit and count the request.
///
/// Runs under `BEGIN IMMEDIATE`, which takes the database write lock before the
/// first read, so no other writer (in this process or another one sharing the
/// file) can interleave between the check and the increment.
pub fn admit(
    conn: &mut Connection,
    operation: &str,
    day: NaiveDate,
    default_limit: u64,
    now: &str,
) -> Result<Admission> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let limit = limits::get(&tx, operation)?
        .map(|record| record.daily_limit)
        .unwrap_or(default_limit);
    let used = get(&tx, operation, day)?
        .map(|record| record.request_count)
        .unwrap_or(0);

    if limit != 0 && used >= limit {
        // Nothing written; dropping the transaction rolls it back.
        return Ok(Admission::Denied { used, limit });
    }

    tx.execute(
        r#"
        INSERT INTO usage_log (operation, log_date, request_count, total_tokens, last_updated)
        VALUES (?1, ?2, 1, 0, ?3)
        ON CONFLICT(operation, log_date) DO UPDATE SET
            request_count = request_count + 1,
            last_updated = ?3
        "#,
        params![operation, day, now],
    )?;
    tx.commit()?;

    Ok(Admission::Admitted {
        request_count: used + 1,
        limit,
    })
}

pub fn add_tokens(
    conn: &Connection,
    operation: &str,
    day: NaiveDate,
    tokens: u64,
    now: &str,
) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO usage_log (operation, log_date, request_count, total_tokens, last_updated)
        VALUES (?1, ?2, 0, ?3, ?4)
        ON CONFLICT(operation, log_date) DO UPDATE SET
            total_tokens = total_tokens + ?3,
            last_updated = ?4
        "#,
        params![operation, day, tokens as i64, now],
    )?;

    Ok(())
}

pub fn list_for_day(conn: &Connection, day: NaiveDate) -> Result<Vec<QuotaRecord>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT operation, log_date, request_count, total_tokens, last_updated
        FROM usage_log
        WHERE log_date = ?1
        ORDER BY operation
        "#,
    )?;

    let records = stmt
        .query_map([day], map_record)?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    Ok(records)
}

/// Most recent records first, across days.
pub fn history(conn: &Connection, operation: Option<&str>, limit: usize) -> Result<Vec<QuotaRecord>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT operation, log_date, request_count, total_tokens, last_updated
        FROM usage_log
        WHERE (?1 IS NULL OR operation = ?1)
        ORDER BY log_date DESC, operation
        LIMIT ?2
        "#,
    )?;

    let records = stmt
        .query_map(params![operation, limit as i64], map_record)?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    Ok(records)
}
