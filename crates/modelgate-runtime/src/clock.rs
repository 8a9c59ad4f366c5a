use chrono::{DateTime, Local, NaiveDate, Utc};

/// Source of "today" for quota bookkeeping.
pub trait Clock: Send + Sync {
    /// Current calendar day; quota records are keyed by it.
    fn today(&self) -> NaiveDate;

    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock; days follow the host's local calendar.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
