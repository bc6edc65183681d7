use std::collections::{HashMap, HashSet};

use chrono::{Duration, Utc};

use confline_conferences::error::ConfServiceError;

use crate::helpers::{
    MockPhoneNumberRepo, MockProvider, TEST_NUMBER, free_number, provisioner, reserved_number,
};

#[tokio::test]
async fn should_provision_a_line_end_to_end() {
    let repo = MockPhoneNumberRepo::new(vec![free_number(TEST_NUMBER, Utc::now())]);
    let provider = MockProvider {
        participants: HashMap::from([(TEST_NUMBER.to_owned(), vec![11, 12])]),
        ..MockProvider::default()
    };
    let pins = provider.pins.clone();
    let kicked = provider.kicked.clone();
    let prov = provisioner(repo.clone(), provider);

    let conf = prov.create_conference("a@b.com", 60).await.unwrap();

    assert_eq!(conf.phone_number, TEST_NUMBER);
    assert_eq!(conf.pin.len(), 4);
    assert!(conf.pin.chars().all(|c| c.is_ascii_digit()));
    let expected = Utc::now() + Duration::minutes(60);
    assert!((conf.free_at - expected).num_seconds().abs() < 5);

    assert_eq!(
        *pins.lock().unwrap(),
        vec![(TEST_NUMBER.to_owned(), conf.pin.clone())]
    );
    let mut kicked = kicked.lock().unwrap().clone();
    kicked.sort_unstable();
    assert_eq!(kicked, vec![11, 12]);

    let again = prov.create_conference("c@d.com", 60).await;
    assert!(
        matches!(again, Err(ConfServiceError::NoAvailability)),
        "expected NoAvailability, got {again:?}"
    );
}

#[tokio::test]
async fn should_release_number_when_set_pin_fails() {
    let repo = MockPhoneNumberRepo::new(vec![free_number(TEST_NUMBER, Utc::now())]);
    let prov = provisioner(
        repo.clone(),
        MockProvider {
            fail_set_pin: true,
            ..MockProvider::default()
        },
    );

    let result = prov.create_conference("a@b.com", 60).await;

    assert!(
        matches!(result, Err(ConfServiceError::Provider(_))),
        "expected Provider, got {result:?}"
    );
    let number = repo.get(TEST_NUMBER);
    assert!(number.free_at <= Utc::now(), "number still reserved");
    assert_eq!(number.used, 1);
}

#[tokio::test]
async fn failed_kick_does_not_stop_the_others() {
    let repo = MockPhoneNumberRepo::new(vec![free_number(TEST_NUMBER, Utc::now())]);
    let provider = MockProvider {
        participants: HashMap::from([(TEST_NUMBER.to_owned(), vec![1, 2, 3])]),
        failing_kicks: HashSet::from([2]),
        ..MockProvider::default()
    };
    let kicked = provider.kicked.clone();
    let prov = provisioner(repo.clone(), provider);

    let result = prov.create_conference("a@b.com", 60).await;

    assert!(
        matches!(result, Err(ConfServiceError::Provider(_))),
        "expected Provider, got {result:?}"
    );
    let mut kicked = kicked.lock().unwrap().clone();
    kicked.sort_unstable();
    assert_eq!(kicked, vec![1, 3]);
    assert!(repo.get(TEST_NUMBER).free_at <= Utc::now());
}

#[tokio::test]
async fn kick_all_on_an_empty_line_is_a_no_op() {
    let prov = provisioner(
        MockPhoneNumberRepo::new(vec![reserved_number(TEST_NUMBER, Utc::now())]),
        MockProvider::default(),
    );

    assert_eq!(prov.kick_all_participants(TEST_NUMBER).await.unwrap(), 0);
}
