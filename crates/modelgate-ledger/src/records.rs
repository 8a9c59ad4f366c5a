use chrono::NaiveDate;

/// Per-operation, per-day counters.
///
/// Created on the first admission of the day and only ever incremented.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct QuotaRecord {
    /// Operation name (summarize, translate, classify).
    pub operation: String,
    /// Calendar day the counters belong to.
    pub day: NaiveDate,
    /// Requests admitted on this day.
    pub request_count: u64,
    /// Generated tokens accounted on this day (best effort).
    pub total_tokens: u64,
    /// Last write (RFC 3339).
    pub last_updated: Option<String>,
}

/// Admin-configured daily limit of one operation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LimitRecord {
    pub operation: String,
    /// 0 means unlimited.
    pub daily_limit: u64,
    pub updated_at: Option<String>,
}

/// Outcome of a check-then-increment against one (operation, day) record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The request was counted; `request_count` includes it.
    Admitted { request_count: u64, limit: u64 },
    /// The record is already at its limit; nothing was written.
    Denied { used: u64, limit: u64 },
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted { .. })
    }
}
