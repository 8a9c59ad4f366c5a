use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use modelgate_runtime::Clock;
use std::sync::Mutex;

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Noon UTC on `day`.
    pub fn on(day: NaiveDate) -> Self {
        let noon = day.and_hms_opt(12, 0, 0).unwrap();
        Self {
            now: Mutex::new(Utc.from_utc_datetime(&noon)),
        }
    }

    pub fn ymd(year: i32, month: u32, day: u32) -> Self {
        Self::on(NaiveDate::from_ymd_opt(year, month, day).unwrap())
    }

    pub fn set_day(&self, day: NaiveDate) {
        let noon = day.and_hms_opt(12, 0, 0).unwrap();
        *self.now.lock().unwrap() = Utc.from_utc_datetime(&noon);
    }

    pub fn advance_days(&self, days: u64) {
        let mut now = self.now.lock().unwrap();
        *now = now.checked_add_days(Days::new(days)).unwrap();
    }
}

impl Clock for ManualClock {
    fn today(&self) -> NaiveDate {
        self.now.lock().unwrap().date_naive()
    }

    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_crosses_midnight() {
        let clock = ManualClock::ymd(2025, 12, 31);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());

        clock.advance_days(1);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
    }
}
