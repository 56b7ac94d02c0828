//! Activation ledger tests: seat accounting, re-activation, and the
//! concurrent limit enforcement.

#[path = "common/mod.rs"]
mod common;

use common::*;
use ratchet::db::queries::AcquireOutcome;
use rusqlite::Connection;

fn acquire(
    conn: &mut Connection,
    license: &License,
    hardware_id: &str,
) -> Result<AcquireOutcome, AppError> {
    queries::acquire_activation_atomic(
        conn,
        license,
        hardware_id,
        Some("Test Machine"),
        Some("linux x86_64"),
        Some("127.0.0.1"),
    )
}

#[test]
fn first_activation_creates_active_row() {
    let mut conn = setup_test_db();
    let codec = test_codec();
    let customer = create_test_customer(&conn, "Acme");
    let license = issue_default_license(&conn, &codec, &customer.id, 3);

    let outcome = acquire(&mut conn, &license, "hw-1").expect("activation should succeed");
    assert!(outcome.is_new(), "first activation should create a row");

    let activation = outcome.activation();
    assert!(activation.id.starts_with("rl_act_"));
    assert!(activation.is_active);
    assert_eq!(activation.hardware_id, "hw-1");
    assert_eq!(activation.machine_name, Some("Test Machine".to_string()));

    let count = queries::count_active_activations(&conn, &license.id).unwrap();
    assert_eq!(count, 1);
}

#[test]
fn repeat_activation_refreshes_without_consuming_a_seat() {
    let mut conn = setup_test_db();
    let codec = test_codec();
    let customer = create_test_customer(&conn, "Acme");
    let license = issue_default_license(&conn, &codec, &customer.id, 3);

    let first = acquire(&mut conn, &license, "hw-1").unwrap();
    let first_id = first.activation().id.clone();

    let second = acquire(&mut conn, &license, "hw-1").unwrap();
    assert!(!second.is_new(), "repeat activation should refresh");
    assert_eq!(
        second.activation().id,
        first_id,
        "refresh should reuse the existing row"
    );

    let count = queries::count_active_activations(&conn, &license.id).unwrap();
    assert_eq!(count, 1, "re-activation must not consume another seat");
}

#[test]
fn limit_is_enforced_and_carries_the_limit() {
    let mut conn = setup_test_db();
    let codec = test_codec();
    let customer = create_test_customer(&conn, "Acme");
    let license = issue_default_license(&conn, &codec, &customer.id, 2);

    acquire(&mut conn, &license, "hw-1").unwrap();
    acquire(&mut conn, &license, "hw-2").unwrap();

    let result = acquire(&mut conn, &license, "hw-3");
    assert_validation_error(result, ValidationError::ActivationLimitReached { limit: 2 });

    // Seats unchanged after the failed attempt.
    let count = queries::count_active_activations(&conn, &license.id).unwrap();
    assert_eq!(count, 2);
}

#[test]
fn deactivate_frees_a_seat_and_keeps_history() {
    let mut conn = setup_test_db();
    let codec = test_codec();
    let customer = create_test_customer(&conn, "Acme");
    let license = issue_default_license(&conn, &codec, &customer.id, 1);

    // maxActivations=1: A activates, B is rejected, A deactivates, B succeeds.
    acquire(&mut conn, &license, "hw-a").unwrap();
    assert_validation_error(
        acquire(&mut conn, &license, "hw-b"),
        ValidationError::ActivationLimitReached { limit: 1 },
    );

    let released = queries::deactivate_activation(&conn, &license.id, "hw-a").unwrap();
    assert!(!released.is_active);
    assert!(released.deactivated_at.is_some());

    let outcome = acquire(&mut conn, &license, "hw-b").expect("seat should be free now");
    assert!(outcome.is_new());

    // History row for hw-a is retained but not counted.
    let all = queries::list_activations(&conn, &license.id).unwrap();
    assert_eq!(all.len(), 2);
    let count = queries::count_active_activations(&conn, &license.id).unwrap();
    assert_eq!(count, 1);
}

#[test]
fn deactivate_unknown_hardware_is_not_found() {
    let conn = setup_test_db();
    let codec = test_codec();
    let customer = create_test_customer(&conn, "Acme");
    let license = issue_default_license(&conn, &codec, &customer.id, 1);

    assert_validation_error(
        queries::deactivate_activation(&conn, &license.id, "hw-never-seen"),
        ValidationError::NotFound,
    );
}

#[test]
fn reactivation_after_deactivation_creates_a_new_row() {
    let mut conn = setup_test_db();
    let codec = test_codec();
    let customer = create_test_customer(&conn, "Acme");
    let license = issue_default_license(&conn, &codec, &customer.id, 3);

    let first = acquire(&mut conn, &license, "hw-1").unwrap();
    let first_id = first.activation().id.clone();
    queries::deactivate_activation(&conn, &license.id, "hw-1").unwrap();

    let second = acquire(&mut conn, &license, "hw-1").unwrap();
    assert!(second.is_new(), "a released pair activates fresh");
    assert_ne!(second.activation().id, first_id);

    let all = queries::list_activations(&conn, &license.id).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all.iter().filter(|a| a.is_active).count(), 1);
}

#[test]
fn touch_phone_home_updates_timestamp_and_ip() {
    let mut conn = setup_test_db();
    let codec = test_codec();
    let customer = create_test_customer(&conn, "Acme");
    let license = issue_default_license(&conn, &codec, &customer.id, 1);

    let outcome = acquire(&mut conn, &license, "hw-1").unwrap();
    let id = outcome.activation().id.clone();

    queries::touch_phone_home(&conn, &id, Some("10.1.2.3")).unwrap();
    let updated = queries::get_activation(&conn, &id).unwrap().unwrap();
    assert_eq!(updated.last_ip_address, Some("10.1.2.3".to_string()));
    assert!(updated.last_phone_home >= outcome.activation().last_phone_home);
}

// ============ Concurrency ============

/// Many machines race to activate a license with fewer seats than racers.
/// The IMMEDIATE transaction serializes the count-then-insert region, so
/// exactly `max_activations` must win regardless of interleaving.
#[test]
fn concurrent_activations_never_exceed_the_limit() {
    use std::sync::{Arc, Barrier};

    const RACERS: usize = 8;
    const SEATS: i64 = 3;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("ratchet_test.db");

    let license = {
        let conn = Connection::open(&db_path).unwrap();
        init_db(&conn).unwrap();
        let codec = test_codec();
        let customer = create_test_customer(&conn, "Race Co");
        issue_default_license(&conn, &codec, &customer.id, SEATS)
    };

    let barrier = Arc::new(Barrier::new(RACERS));
    let mut handles = Vec::new();

    for i in 0..RACERS {
        let barrier = Arc::clone(&barrier);
        let db_path = db_path.clone();
        let license = license.clone();

        handles.push(std::thread::spawn(move || {
            let mut conn = Connection::open(&db_path).unwrap();
            conn.busy_timeout(std::time::Duration::from_secs(10)).unwrap();

            barrier.wait();
            queries::acquire_activation_atomic(
                &mut conn,
                &license,
                &format!("hw-{i}"),
                None,
                None,
                None,
            )
            .is_ok()
        }));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.join().expect("racer thread panicked") {
            successes += 1;
        }
    }
    assert_eq!(successes as i64, SEATS, "exactly the seat count must win");

    let conn = Connection::open(&db_path).unwrap();
    let count = queries::count_active_activations(&conn, &license.id).unwrap();
    assert_eq!(count, SEATS);
}
