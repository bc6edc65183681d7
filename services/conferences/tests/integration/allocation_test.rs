use std::collections::HashSet;
use std::sync::atomic::Ordering;

use chrono::{Duration, Utc};
use futures::future::join_all;

use confline_conferences::domain::types::MAX_ALLOCATION_ATTEMPTS;
use confline_conferences::error::ConfServiceError;
use confline_conferences::usecase::allocation::Allocator;

use crate::helpers::{
    ContendedPhoneNumberRepo, MockPhoneNumberRepo, TEST_NUMBER, allocator, free_number,
    reserved_number,
};

#[tokio::test]
async fn should_book_the_number_free_the_longest() {
    let now = Utc::now();
    let mut older = free_number("0033100000001", now);
    older.free_at = now - Duration::days(2);
    let repo = MockPhoneNumberRepo::new(vec![free_number("0033100000002", now), older]);
    let alloc = allocator(repo.clone());

    let booked = alloc.book_next_free_phone_number(60).await.unwrap();

    assert_eq!(booked.phone_number, "0033100000001");
    assert_eq!(booked.used, 1);
    let expected = Utc::now() + Duration::minutes(60);
    assert!((booked.free_at - expected).num_seconds().abs() < 5);
    assert_eq!(repo.get("0033100000001"), booked);
}

#[tokio::test]
async fn should_return_no_availability_when_every_number_is_reserved() {
    let now = Utc::now();
    let alloc = allocator(MockPhoneNumberRepo::new(vec![reserved_number(
        TEST_NUMBER,
        now,
    )]));

    let result = alloc.book_next_free_phone_number(60).await;

    assert!(
        matches!(result, Err(ConfServiceError::NoAvailability)),
        "expected NoAvailability, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_non_positive_duration() {
    let alloc = allocator(MockPhoneNumberRepo::new(vec![free_number(
        TEST_NUMBER,
        Utc::now(),
    )]));

    for duration in [0, -30] {
        let result = alloc.book_next_free_phone_number(duration).await;
        assert!(
            matches!(result, Err(ConfServiceError::InvalidDuration)),
            "expected InvalidDuration for {duration}, got {result:?}"
        );
    }
}

#[tokio::test]
async fn concurrent_bookings_never_share_a_number() {
    let now = Utc::now();
    let repo = MockPhoneNumberRepo::new(vec![
        free_number("0033100000001", now),
        free_number("0033100000002", now),
        free_number("0033100000003", now),
    ]);
    let alloc = allocator(repo.clone());

    let results = join_all((0..5).map(|_| alloc.book_next_free_phone_number(60))).await;

    let booked: Vec<String> = results
        .iter()
        .filter_map(|r| r.as_ref().ok())
        .map(|n| n.phone_number.clone())
        .collect();
    let distinct: HashSet<&String> = booked.iter().collect();
    assert_eq!(booked.len(), 3, "got {results:?}");
    assert_eq!(distinct.len(), 3, "a number was handed out twice: {booked:?}");

    let unavailable = results
        .iter()
        .filter(|r| matches!(r, Err(ConfServiceError::NoAvailability)))
        .count();
    assert_eq!(unavailable, 2);

    for number in ["0033100000001", "0033100000002", "0033100000003"] {
        assert_eq!(repo.get(number).used, 1, "{number} reserved more than once");
    }
}

#[tokio::test]
async fn should_give_up_after_losing_every_race() {
    let repo = ContendedPhoneNumberRepo::default();
    let attempts = repo.reserve_attempts.clone();
    let alloc = Allocator {
        phone_numbers: repo,
    };

    let result = alloc.book_next_free_phone_number(60).await;

    assert!(
        matches!(result, Err(ConfServiceError::AllocationRaceExhausted)),
        "expected AllocationRaceExhausted, got {result:?}"
    );
    assert_eq!(attempts.load(Ordering::SeqCst), MAX_ALLOCATION_ATTEMPTS);
}

#[tokio::test]
async fn release_is_idempotent() {
    let repo = MockPhoneNumberRepo::new(vec![reserved_number(TEST_NUMBER, Utc::now())]);
    let alloc = allocator(repo.clone());

    assert!(alloc.release_phone_number(TEST_NUMBER).await.unwrap());
    let after_first = repo.get(TEST_NUMBER);
    assert!(after_first.free_at <= Utc::now());

    assert!(!alloc.release_phone_number(TEST_NUMBER).await.unwrap());
    assert_eq!(repo.get(TEST_NUMBER), after_first);
}

#[tokio::test]
async fn released_number_can_be_booked_again() {
    let repo = MockPhoneNumberRepo::new(vec![free_number(TEST_NUMBER, Utc::now())]);
    let alloc = allocator(repo.clone());

    alloc.book_next_free_phone_number(60).await.unwrap();
    alloc.release_phone_number(TEST_NUMBER).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let again = alloc.book_next_free_phone_number(30).await.unwrap();

    assert_eq!(again.phone_number, TEST_NUMBER);
    assert_eq!(again.used, 2);
}
