use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use modelgate_ledger::{Admission, Database, QuotaRecord};
use modelgate_types::{LimitsResponse, Operation, OperationLimit, OperationUsage, UsageResponse};

use crate::clock::Clock;
use crate::config::{OperationSpec, QuotaConfig};
use crate::{Error, Result};

/// Admission control and usage accounting on top of the quota ledger.
///
/// Every ledger call runs on a blocking thread; the in-process mutex plus the
/// ledger's immediate transaction make check-then-increment atomic.
#[derive(Clone)]
pub struct QuotaService {
    ledger: Arc<Mutex<Database>>,
    clock: Arc<dyn Clock>,
    operations: Arc<BTreeMap<Operation, OperationSpec>>,
    default_limit: u64,
    max_limit: u64,
}

impl QuotaService {
    pub fn new(
        ledger: Database,
        clock: Arc<dyn Clock>,
        operations: BTreeMap<Operation, OperationSpec>,
        quota: &QuotaConfig,
    ) -> Self {
        Self {
            ledger: Arc::new(Mutex::new(ledger)),
            clock,
            operations: Arc::new(operations),
            default_limit: quota.default_daily_limit,
            max_limit: quota.max_daily_limit,
        }
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    async fn with_ledger<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Database) -> modelgate_ledger::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let ledger = Arc::clone(&self.ledger);
        tokio::task::spawn_blocking(move || {
            let mut db = ledger
                .lock()
                .map_err(|_| Error::Internal("quota ledger lock poisoned".to_string()))?;
            f(&mut db).map_err(Error::from)
        })
        .await?
    }

    /// Insert default limit rows for configured operations that have none.
    pub async fn seed_limits(&self) -> Result<usize> {
        let names: Vec<&'static str> = self.operations.keys().map(Operation::as_str).collect();
        let default_limit = self.default_limit;
        let now = self.clock.now();

        let created = self
            .with_ledger(move |db| db.seed_limits(names, default_limit, now))
            .await?;
        if created > 0 {
            tracing::info!(created, default_limit, "seeded operation limits");
        }
        Ok(created)
    }

    /// Admit one request for `operation` against today's record.
    pub async fn check_and_admit(&self, operation: Operation) -> Result<()> {
        self.admit_on(operation, self.clock.today()).await
    }

    /// Admit one request for `operation` against the record of `day`.
    ///
    /// Fails with `QuotaExceeded` when the day's count has reached a non-zero
    /// limit; otherwise the count is incremented in the same transaction.
    pub async fn admit_on(&self, operation: Operation, day: NaiveDate) -> Result<()> {
        let default_limit = self.default_limit;
        let now = self.clock.now();

        let admission = self
            .with_ledger(move |db| db.admit(operation.as_str(), day, default_limit, now))
            .await?;

        match admission {
            Admission::Admitted {
                request_count,
                limit,
            } => {
                tracing::debug!(%operation, %day, used = request_count, limit, "request admitted");
                Ok(())
            }
            Admission::Denied { used, limit } => {
                tracing::warn!(%operation, %day, used, limit, "daily quota exceeded");
                Err(Error::QuotaExceeded {
                    operation,
                    used,
                    limit,
                })
            }
        }
    }

    pub async fn record_tokens(&self, operation: Operation, tokens: u64) -> Result<()> {
        self.record_tokens_on(operation, self.clock.today(), tokens)
            .await
    }

    pub async fn record_tokens_on(
        &self,
        operation: Operation,
        day: NaiveDate,
        tokens: u64,
    ) -> Result<()> {
        let now = self.clock.now();
        self.with_ledger(move |db| db.add_tokens(operation.as_str(), day, tokens, now))
            .await
    }

    /// Stored daily limit, or the configured default when none is stored.
    pub async fn get_limit(&self, operation: Operation) -> Result<u64> {
        let default_limit = self.default_limit;
        let record = self
            .with_ledger(move |db| db.get_limit(operation.as_str()))
            .await?;
        Ok(record.map(|r| r.daily_limit).unwrap_or(default_limit))
    }

    /// Change an operation's daily limit; applies to the next admission.
    pub async fn set_limit(&self, operation: Operation, daily_limit: u64) -> Result<()> {
        if !self.operations.contains_key(&operation) {
            return Err(Error::Configuration(format!(
                "operation '{}' has no configured model",
                operation
            )));
        }
        if daily_limit > self.max_limit {
            return Err(Error::InvalidInput(format!(
                "daily_limit must be between 0 and {}, got {}",
                self.max_limit, daily_limit
            )));
        }

        let now = self.clock.now();
        self.with_ledger(move |db| db.set_limit(operation.as_str(), daily_limit, now))
            .await?;
        tracing::info!(%operation, daily_limit, "daily limit updated");
        Ok(())
    }

    async fn limits_by_name(&self) -> Result<BTreeMap<String, u64>> {
        let records = self.with_ledger(|db| db.list_limits()).await?;
        Ok(records
            .into_iter()
            .map(|r| (r.operation, r.daily_limit))
            .collect())
    }

    /// Today's counters for every configured operation.
    pub async fn snapshot_usage(&self) -> Result<UsageResponse> {
        let day = self.clock.today();
        let limits = self.limits_by_name().await?;
        let records = self.with_ledger(move |db| db.usage_on(day)).await?;
        let records: BTreeMap<String, QuotaRecord> = records
            .into_iter()
            .map(|r| (r.operation.clone(), r))
            .collect();

        let usage = self
            .operations
            .keys()
            .map(|operation| {
                let name = operation.as_str();
                let daily_limit = limits.get(name).copied().unwrap_or(self.default_limit);
                let (request_count, total_tokens) = records
                    .get(name)
                    .map(|r| (r.request_count, r.total_tokens))
                    .unwrap_or((0, 0));
                OperationUsage {
                    operation: *operation,
                    date: day.format("%Y-%m-%d").to_string(),
                    request_count,
                    total_tokens,
                    daily_limit,
                    remaining: (daily_limit != 0)
                        .then(|| daily_limit.saturating_sub(request_count)),
                }
            })
            .collect();

        Ok(UsageResponse {
            usage,
            generated_at: self.clock.now(),
        })
    }

    /// Daily limit and hard caps of every configured operation.
    pub async fn snapshot_limits(&self) -> Result<LimitsResponse> {
        let limits = self.limits_by_name().await?;
        let limits = self
            .operations
            .iter()
            .map(|(operation, spec)| OperationLimit {
                operation: *operation,
                daily_limit: limits
                    .get(operation.as_str())
                    .copied()
                    .unwrap_or(self.default_limit),
                max_input_chars: spec.max_input_chars,
                max_output_tokens: spec.max_output_tokens,
            })
            .collect();

        Ok(LimitsResponse { limits })
    }

    /// Past records, most recent day first.
    pub async fn history(
        &self,
        operation: Option<Operation>,
        limit: usize,
    ) -> Result<Vec<QuotaRecord>> {
        self.with_ledger(move |db| db.history(operation.map(|op| op.as_str()), limit))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use chrono::{DateTime, TimeZone, Utc};

    struct FixedClock(NaiveDate);

    impl Clock for FixedClock {
        fn today(&self) -> NaiveDate {
            self.0
        }

        fn now(&self) -> DateTime<Utc> {
            Utc.with_ymd_and_hms(2025, 12, 10, 12, 0, 0).unwrap()
        }
    }

    fn service() -> QuotaService {
        let config = Config::default();
        QuotaService::new(
            Database::open_in_memory().unwrap(),
            Arc::new(FixedClock(NaiveDate::from_ymd_opt(2025, 12, 10).unwrap())),
            config.operations,
            &config.quota,
        )
    }

    #[tokio::test]
    async fn test_sequential_admission_stops_at_limit() {
        let quota = service();
        quota.set_limit(Operation::Summarize, 3).await.unwrap();

        for _ in 0..3 {
            quota.check_and_admit(Operation::Summarize).await.unwrap();
        }
        let err = quota.check_and_admit(Operation::Summarize).await.unwrap_err();
        assert!(matches!(
            err,
            Error::QuotaExceeded {
                operation: Operation::Summarize,
                used: 3,
                limit: 3
            }
        ));
    }

    #[tokio::test]
    async fn test_get_limit_falls_back_to_default() {
        let quota = service();
        assert_eq!(quota.get_limit(Operation::Translate).await.unwrap(), 1000);

        quota.set_limit(Operation::Translate, 0).await.unwrap();
        assert_eq!(quota.get_limit(Operation::Translate).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_set_limit_bounds() {
        let quota = service();
        let err = quota.set_limit(Operation::Classify, 100_001).await.unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
        quota.set_limit(Operation::Classify, 100_000).await.unwrap();
    }

    #[tokio::test]
    async fn test_snapshots_cover_configured_operations() {
        let quota = service();
        quota.seed_limits().await.unwrap();
        quota.set_limit(Operation::Classify, 0).await.unwrap();
        quota.check_and_admit(Operation::Translate).await.unwrap();
        quota.record_tokens(Operation::Translate, 42).await.unwrap();

        let usage = quota.snapshot_usage().await.unwrap().usage;
        assert_eq!(usage.len(), 3);

        let translate = usage
            .iter()
            .find(|u| u.operation == Operation::Translate)
            .unwrap();
        assert_eq!(translate.date, "2025-12-10");
        assert_eq!(translate.request_count, 1);
        assert_eq!(translate.total_tokens, 42);
        assert_eq!(translate.remaining, Some(999));

        let classify = usage
            .iter()
            .find(|u| u.operation == Operation::Classify)
            .unwrap();
        assert_eq!(classify.remaining, None);

        let limits = quota.snapshot_limits().await.unwrap().limits;
        let summarize = limits
            .iter()
            .find(|l| l.operation == Operation::Summarize)
            .unwrap();
        assert_eq!(summarize.daily_limit, 1000);
        assert_eq!(summarize.max_input_chars, 8000);
        assert_eq!(summarize.max_output_tokens, 512);
    }
}
