use std::sync::Arc;

use chrono::NaiveDate;
use modelgate_ledger::Database;
use modelgate_runtime::{Config, Error, QuotaService};
use modelgate_testing::ManualClock;
use modelgate_types::Operation;
use tempfile::TempDir;

fn service(ledger: Database, clock: Arc<ManualClock>) -> QuotaService {
    let config = Config::default();
    QuotaService::new(ledger, clock, config.operations, &config.quota)
}

async fn admit_concurrently(quota: &QuotaService, operation: Operation, attempts: usize) -> (usize, Vec<Error>) {
    let tasks: Vec<_> = (0..attempts)
        .map(|_| {
            let quota = quota.clone();
            tokio::spawn(async move { quota.check_and_admit(operation).await })
        })
        .collect();

    let mut admitted = 0;
    let mut rejected = Vec::new();
    for task in tasks {
        match task.await.unwrap() {
            Ok(()) => admitted += 1,
            Err(err) => rejected.push(err),
        }
    }
    (admitted, rejected)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_admission_never_exceeds_limit() {
    let clock = Arc::new(ManualClock::ymd(2025, 12, 10));
    let quota = service(Database::open_in_memory().unwrap(), Arc::clone(&clock));
    quota.set_limit(Operation::Summarize, 5).await.unwrap();

    let (admitted, rejected) = admit_concurrently(&quota, Operation::Summarize, 20).await;

    assert_eq!(admitted, 5);
    assert_eq!(rejected.len(), 15);
    for err in rejected {
        assert!(matches!(
            err,
            Error::QuotaExceeded {
                operation: Operation::Summarize,
                used: 5,
                limit: 5
            }
        ));
    }

    let usage = quota.snapshot_usage().await.unwrap();
    let summarize = usage
        .usage
        .iter()
        .find(|u| u.operation == Operation::Summarize)
        .unwrap();
    assert_eq!(summarize.request_count, 5);
    assert_eq!(summarize.remaining, Some(0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_last_slot_goes_to_exactly_one_caller() {
    let clock = Arc::new(ManualClock::ymd(2025, 12, 10));
    let quota = service(Database::open_in_memory().unwrap(), Arc::clone(&clock));
    quota.set_limit(Operation::Translate, 1).await.unwrap();

    let (admitted, rejected) = admit_concurrently(&quota, Operation::Translate, 10).await;

    assert_eq!(admitted, 1);
    assert_eq!(rejected.len(), 9);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_zero_limit_never_rejects() {
    let clock = Arc::new(ManualClock::ymd(2025, 12, 10));
    let quota = service(Database::open_in_memory().unwrap(), Arc::clone(&clock));
    quota.set_limit(Operation::Classify, 0).await.unwrap();

    let (admitted, rejected) = admit_concurrently(&quota, Operation::Classify, 50).await;

    assert_eq!(admitted, 50);
    assert!(rejected.is_empty());
}

#[tokio::test]
async fn test_new_day_gets_a_fresh_record() {
    let clock = Arc::new(ManualClock::ymd(2025, 12, 31));
    let quota = service(Database::open_in_memory().unwrap(), Arc::clone(&clock));
    quota.set_limit(Operation::Summarize, 1).await.unwrap();

    quota.check_and_admit(Operation::Summarize).await.unwrap();
    assert!(quota.check_and_admit(Operation::Summarize).await.is_err());

    clock.advance_days(1);
    quota.check_and_admit(Operation::Summarize).await.unwrap();

    let history = quota.history(Some(Operation::Summarize), 10).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].day, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
    assert_eq!(history[1].day, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
    assert!(history.iter().all(|r| r.request_count == 1));
}

#[tokio::test]
async fn test_limit_change_applies_to_next_admission() {
    let clock = Arc::new(ManualClock::ymd(2025, 12, 10));
    let quota = service(Database::open_in_memory().unwrap(), Arc::clone(&clock));
    quota.set_limit(Operation::Translate, 1).await.unwrap();

    quota.check_and_admit(Operation::Translate).await.unwrap();
    assert!(quota.check_and_admit(Operation::Translate).await.is_err());

    quota.set_limit(Operation::Translate, 3).await.unwrap();
    quota.check_and_admit(Operation::Translate).await.unwrap();
}

#[tokio::test]
async fn test_token_accounting_does_not_touch_request_count() {
    let clock = Arc::new(ManualClock::ymd(2025, 12, 10));
    let quota = service(Database::open_in_memory().unwrap(), Arc::clone(&clock));

    quota.check_and_admit(Operation::Classify).await.unwrap();
    quota.record_tokens(Operation::Classify, 30).await.unwrap();
    quota.record_tokens(Operation::Classify, 12).await.unwrap();

    let usage = quota.snapshot_usage().await.unwrap();
    let classify = usage
        .usage
        .iter()
        .find(|u| u.operation == Operation::Classify)
        .unwrap();
    assert_eq!(classify.request_count, 1);
    assert_eq!(classify.total_tokens, 42);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_services_sharing_a_ledger_file_respect_one_limit() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledger.db");
    let clock = Arc::new(ManualClock::ymd(2025, 12, 10));

    let first = service(Database::open(&path).unwrap(), Arc::clone(&clock));
    let second = service(Database::open(&path).unwrap(), Arc::clone(&clock));
    first.set_limit(Operation::Summarize, 4).await.unwrap();

    let (a, b) = tokio::join!(
        admit_concurrently(&first, Operation::Summarize, 6),
        admit_concurrently(&second, Operation::Summarize, 6),
    );

    assert_eq!(a.0 + b.0, 4);
}
