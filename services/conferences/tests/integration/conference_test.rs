use std::sync::atomic::Ordering;

use chrono::{Duration, Utc};
use uuid::Uuid;

use confline_conferences::error::ConfServiceError;
use confline_conferences::usecase::conference::{
    BookConferenceUseCase, CancelConferenceUseCase, GetConferenceUseCase,
};

use crate::helpers::{
    MockConferenceRepo, MockLoginTokenRepo, MockPhoneNumberRepo, MockProvider, TEST_NUMBER,
    free_number, provisioner, reserved_number, test_conference, test_login_token,
};

fn book_use_case(
    tokens: MockLoginTokenRepo,
    conferences: MockConferenceRepo,
    phone_numbers: MockPhoneNumberRepo,
) -> BookConferenceUseCase<MockLoginTokenRepo, MockConferenceRepo, MockPhoneNumberRepo, MockProvider>
{
    BookConferenceUseCase {
        tokens,
        conferences,
        provisioner: provisioner(phone_numbers, MockProvider::default()),
    }
}

#[tokio::test]
async fn should_book_conference_with_valid_token() {
    let conferences = MockConferenceRepo::default();
    let stored = conferences.conferences.clone();
    let uc = book_use_case(
        MockLoginTokenRepo::new(vec![test_login_token("tok")]),
        conferences,
        MockPhoneNumberRepo::new(vec![free_number(TEST_NUMBER, Utc::now())]),
    );

    let booked = uc.execute("tok").await.unwrap();

    assert_eq!(booked.conference.email, "a@b.com");
    assert_eq!(booked.conference.phone_number, TEST_NUMBER);
    assert_eq!(booked.conference.duration_in_minutes, 60);
    assert!(booked.conference.canceled_at.is_none());
    assert_eq!(booked.pin.len(), 4);
    assert_eq!(*stored.lock().unwrap(), vec![booked.conference.clone()]);
}

#[tokio::test]
async fn token_is_consumed_by_the_first_booking() {
    let now = Utc::now();
    let uc = book_use_case(
        MockLoginTokenRepo::new(vec![test_login_token("tok")]),
        MockConferenceRepo::default(),
        MockPhoneNumberRepo::new(vec![
            free_number("0033100000001", now),
            free_number("0033100000002", now),
        ]),
    );

    uc.execute("tok").await.unwrap();
    let second = uc.execute("tok").await;

    assert!(
        matches!(second, Err(ConfServiceError::TokenNotFound)),
        "expected TokenNotFound, got {second:?}"
    );
}

#[tokio::test]
async fn should_reject_expired_token() {
    let mut expired = test_login_token("tok");
    expired.expires_at = Utc::now() - Duration::minutes(1);
    let uc = book_use_case(
        MockLoginTokenRepo::new(vec![expired]),
        MockConferenceRepo::default(),
        MockPhoneNumberRepo::new(vec![free_number(TEST_NUMBER, Utc::now())]),
    );

    let result = uc.execute("tok").await;

    assert!(
        matches!(result, Err(ConfServiceError::TokenNotFound)),
        "expected TokenNotFound, got {result:?}"
    );
}

#[tokio::test]
async fn should_release_number_when_conference_cannot_be_stored() {
    let phone_numbers = MockPhoneNumberRepo::new(vec![free_number(TEST_NUMBER, Utc::now())]);
    let uc = book_use_case(
        MockLoginTokenRepo::new(vec![test_login_token("tok")]),
        MockConferenceRepo::failing_insert(),
        phone_numbers.clone(),
    );

    let result = uc.execute("tok").await;

    assert!(
        matches!(result, Err(ConfServiceError::Persistence(_))),
        "expected Persistence, got {result:?}"
    );
    assert!(phone_numbers.get(TEST_NUMBER).free_at <= Utc::now());
}

#[tokio::test]
async fn should_get_live_conference_only() {
    let live = test_conference(TEST_NUMBER);
    let mut expired = test_conference("0033100000002");
    expired.expires_at = Utc::now() - Duration::minutes(1);
    let uc = GetConferenceUseCase {
        conferences: MockConferenceRepo::new(vec![live.clone(), expired.clone()]),
    };

    assert_eq!(uc.execute(live.id).await.unwrap(), live);

    for id in [expired.id, Uuid::new_v4()] {
        let result = uc.execute(id).await;
        assert!(
            matches!(result, Err(ConfServiceError::ConferenceNotFound)),
            "expected ConferenceNotFound, got {result:?}"
        );
    }
}

#[tokio::test]
async fn cancel_is_idempotent_and_releases_once() {
    let conf = test_conference(TEST_NUMBER);
    let phone_numbers = MockPhoneNumberRepo::new(vec![reserved_number(TEST_NUMBER, Utc::now())]);
    let uc = CancelConferenceUseCase {
        conferences: MockConferenceRepo::with_phone_numbers(
            vec![conf.clone()],
            phone_numbers.clone(),
        ),
    };

    let first = uc.execute(conf.id).await.unwrap();
    assert!(first.canceled_at.is_some());
    let released = phone_numbers.get(TEST_NUMBER);
    assert!(released.free_at <= Utc::now());

    // Someone else books the line before the second cancel arrives.
    let rebooked = reserved_number(TEST_NUMBER, Utc::now());
    *phone_numbers.numbers.lock().unwrap() = vec![rebooked.clone()];

    let second = uc.execute(conf.id).await.unwrap();
    assert_eq!(second, first);
    assert_eq!(phone_numbers.get(TEST_NUMBER), rebooked);
}

#[tokio::test]
async fn failed_cancel_keeps_conference_live_and_retry_releases() {
    let conf = test_conference(TEST_NUMBER);
    let phone_numbers = MockPhoneNumberRepo::new(vec![reserved_number(TEST_NUMBER, Utc::now())]);
    let conferences =
        MockConferenceRepo::with_phone_numbers(vec![conf.clone()], phone_numbers.clone());
    conferences.failing_releases.store(1, Ordering::SeqCst);
    let stored = conferences.conferences.clone();
    let uc = CancelConferenceUseCase { conferences };

    let first = uc.execute(conf.id).await;
    assert!(
        matches!(first, Err(ConfServiceError::Persistence(_))),
        "expected Persistence, got {first:?}"
    );
    assert!(stored.lock().unwrap()[0].canceled_at.is_none());
    assert!(phone_numbers.get(TEST_NUMBER).free_at > Utc::now());

    let retried = uc.execute(conf.id).await.unwrap();
    assert!(retried.canceled_at.is_some());
    assert!(
        phone_numbers.get(TEST_NUMBER).free_at <= Utc::now(),
        "number still reserved after the cancel was retried"
    );
}

#[tokio::test]
async fn cancel_unknown_conference_is_not_found() {
    let uc = CancelConferenceUseCase {
        conferences: MockConferenceRepo::default(),
    };

    let result = uc.execute(Uuid::new_v4()).await;

    assert!(
        matches!(result, Err(ConfServiceError::ConferenceNotFound)),
        "expected ConferenceNotFound, got {result:?}"
    );
}
