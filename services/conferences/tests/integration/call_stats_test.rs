use std::collections::{HashMap, HashSet};
use std::sync::atomic::Ordering;

use confline_conferences::error::ConfServiceError;
use confline_conferences::usecase::call_stats::{
    CallStatsReport, CollectCallStatsOptions, CollectCallStatsUseCase,
};

use crate::helpers::{MockCallStatsRepo, MockProvider};

fn numbers(count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("00331000000{i:02}")).collect()
}

/// Every number has two calls: `n*10` and `n*10 + 1`.
fn provider_with_calls(count: usize) -> MockProvider {
    let numbers = numbers(count);
    let calls = numbers
        .iter()
        .enumerate()
        .map(|(i, n)| {
            let base = (i as u64 + 1) * 10;
            (n.clone(), vec![base, base + 1])
        })
        .collect::<HashMap<_, _>>();
    MockProvider {
        numbers,
        calls,
        ..MockProvider::default()
    }
}

fn use_case(
    provider: MockProvider,
    repo: MockCallStatsRepo,
    dry_run: bool,
    small_run: bool,
) -> CollectCallStatsUseCase<MockProvider, MockCallStatsRepo> {
    CollectCallStatsUseCase {
        provider,
        call_stats: repo,
        options: CollectCallStatsOptions { dry_run, small_run },
    }
}

#[tokio::test]
async fn should_rebuild_table_with_every_call() {
    let repo = MockCallStatsRepo::default();
    let rows = repo.rows.clone();
    let (drops, creates) = (repo.drops.clone(), repo.creates.clone());

    let report = use_case(provider_with_calls(3), repo, false, false)
        .execute()
        .await
        .unwrap();

    assert_eq!(
        report,
        CallStatsReport {
            numbers_done: 3,
            numbers_failed: 0,
            calls_collected: 6,
            calls_failed: 0,
        }
    );
    assert_eq!(drops.load(Ordering::SeqCst), 1);
    assert_eq!(creates.load(Ordering::SeqCst), 1);

    let rows = rows.lock().unwrap();
    assert_eq!(rows.len(), 6);
    assert!(
        rows.iter()
            .any(|r| r.phone_number == "0033100000002" && r.history.call_id == 21)
    );
}

#[tokio::test]
async fn dry_run_reads_but_never_writes() {
    let repo = MockCallStatsRepo::default();
    let rows = repo.rows.clone();
    let (drops, creates) = (repo.drops.clone(), repo.creates.clone());

    let report = use_case(provider_with_calls(2), repo, true, false)
        .execute()
        .await
        .unwrap();

    assert_eq!(report.calls_collected, 4);
    assert!(rows.lock().unwrap().is_empty());
    assert_eq!(drops.load(Ordering::SeqCst), 0);
    assert_eq!(creates.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn small_run_walks_only_the_first_five_numbers() {
    let repo = MockCallStatsRepo::default();
    let rows = repo.rows.clone();

    let report = use_case(provider_with_calls(8), repo, false, true)
        .execute()
        .await
        .unwrap();

    assert_eq!(report.numbers_done, 5);
    let walked: HashSet<String> = rows
        .lock()
        .unwrap()
        .iter()
        .map(|r| r.phone_number.clone())
        .collect();
    assert_eq!(walked, numbers(5).into_iter().collect());
}

#[tokio::test]
async fn failing_number_and_call_are_skipped() {
    let mut provider = provider_with_calls(3);
    provider.calls.remove("0033100000001");
    provider.failing_histories = HashSet::from([21]);
    let repo = MockCallStatsRepo::default();
    let rows = repo.rows.clone();

    let report = use_case(provider, repo, false, false)
        .execute()
        .await
        .unwrap();

    assert_eq!(
        report,
        CallStatsReport {
            numbers_done: 2,
            numbers_failed: 1,
            calls_collected: 3,
            calls_failed: 1,
        }
    );
    assert_eq!(rows.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn drop_failure_is_tolerated() {
    let repo = MockCallStatsRepo {
        fail_drop: true,
        ..MockCallStatsRepo::default()
    };

    let report = use_case(provider_with_calls(1), repo, false, false)
        .execute()
        .await
        .unwrap();

    assert_eq!(report.calls_collected, 2);
}

#[tokio::test]
async fn create_failure_aborts_the_run() {
    let repo = MockCallStatsRepo {
        fail_create: true,
        ..MockCallStatsRepo::default()
    };
    let rows = repo.rows.clone();

    let result = use_case(provider_with_calls(2), repo, false, false)
        .execute()
        .await;

    assert!(
        matches!(result, Err(ConfServiceError::Persistence(_))),
        "expected Persistence, got {result:?}"
    );
    assert!(rows.lock().unwrap().is_empty());
}
