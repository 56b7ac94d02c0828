//! Validation engine tests: the ordered checks on activate, the
//! phone-home verdicts, and the status projection.

#[path = "common/mod.rs"]
mod common;

use common::*;
use ratchet::engine::{InvalidReason, PhoneHomeOutcome};
use rusqlite::Connection;

const WARNING_DAYS: i64 = 14;

fn activate(
    conn: &mut Connection,
    codec: &KeyCodec,
    license_key: &str,
    hardware_id: &str,
) -> Result<(License, ratchet::db::queries::AcquireOutcome), AppError> {
    engine::activate(
        conn,
        codec,
        license_key,
        hardware_id,
        Some("Test Machine"),
        Some("linux x86_64"),
        None,
    )
}

fn phone_home(
    conn: &Connection,
    codec: &KeyCodec,
    license_key: &str,
    hardware_id: &str,
) -> Result<PhoneHomeOutcome, AppError> {
    engine::phone_home(conn, codec, license_key, hardware_id, None, WARNING_DAYS)
}

// ============ Key validation ============

#[test]
fn garbage_keys_are_invalid() {
    let conn = setup_test_db();
    let codec = test_codec();

    for key in ["", "no-dot", "a.b", "!!!.???"] {
        assert_validation_error(
            engine::validate_key(&conn, &codec, key),
            ValidationError::InvalidKey,
        );
    }
}

#[test]
fn key_signed_by_another_server_is_invalid() {
    let conn = setup_test_db();
    let codec = test_codec();
    let other = KeyCodec::from_seed([99u8; 32]);
    let customer = create_test_customer(&conn, "Acme");

    // Signed by a different keypair but present in our database.
    let license = issue_default_license(&conn, &other, &customer.id, 3);

    assert_validation_error(
        engine::validate_key(&conn, &codec, &license.license_key),
        ValidationError::InvalidKey,
    );
}

#[test]
fn well_signed_key_for_unknown_license_is_invalid() {
    let conn = setup_test_db();
    let codec = test_codec();

    // Valid signature, but the license was never inserted.
    let payload = LicensePayload {
        license_id: EntityType::License.gen_id(),
        customer_id: "rl_cust_ghost".to_string(),
        tier: Tier::Pro,
        max_activations: 3,
        issued_at: now(),
        expires_at: now() + SECONDS_PER_DAY,
        features: features_for_tier(Tier::Pro),
    };
    let key = codec.issue(&payload).unwrap();

    assert_validation_error(
        engine::validate_key(&conn, &codec, &key),
        ValidationError::InvalidKey,
    );
}

#[test]
fn superseded_key_is_invalid_after_extension() {
    let conn = setup_test_db();
    let codec = test_codec();
    let customer = create_test_customer(&conn, "Acme");
    let license = issue_default_license(&conn, &codec, &customer.id, 3);
    let old_key = license.license_key.clone();

    // Re-sign with a later expiry, as the extend operation does.
    let payload = LicensePayload {
        license_id: license.id.clone(),
        customer_id: license.customer_id.clone(),
        tier: license.tier,
        max_activations: license.max_activations,
        issued_at: license.issued_at,
        expires_at: license.expires_at + 30 * SECONDS_PER_DAY,
        features: license.features.clone(),
    };
    let new_key = codec.issue(&payload).unwrap();
    queries::update_license_expiry(&conn, &license.id, payload.expires_at, &new_key).unwrap();

    assert_validation_error(
        engine::validate_key(&conn, &codec, &old_key),
        ValidationError::InvalidKey,
    );
    assert!(engine::validate_key(&conn, &codec, &new_key).is_ok());
}

#[test]
fn revoked_license_fails_validation() {
    let conn = setup_test_db();
    let codec = test_codec();
    let customer = create_test_customer(&conn, "Acme");
    let license = issue_default_license(&conn, &codec, &customer.id, 3);

    queries::revoke_license(&conn, &license.id, Some("chargeback")).unwrap();

    assert_validation_error(
        engine::validate_key(&conn, &codec, &license.license_key),
        ValidationError::Revoked,
    );
}

#[test]
fn expired_license_fails_validation() {
    let conn = setup_test_db();
    let codec = test_codec();
    let customer = create_test_customer(&conn, "Acme");
    let license = issue_test_license(&conn, &codec, &customer.id, Tier::Basic, 3, -SECONDS_PER_DAY);

    assert_validation_error(
        engine::validate_key(&conn, &codec, &license.license_key),
        ValidationError::Expired,
    );
}

#[test]
fn disabled_customer_fails_validation() {
    let conn = setup_test_db();
    let codec = test_codec();
    let customer = create_test_customer(&conn, "Acme");
    let license = issue_default_license(&conn, &codec, &customer.id, 3);

    queries::set_customer_active(&conn, &customer.id, false).unwrap();

    assert_validation_error(
        engine::validate_key(&conn, &codec, &license.license_key),
        ValidationError::CustomerInactive,
    );
}

// ============ Activate ============

#[test]
fn activate_success_and_reactivation() {
    let mut conn = setup_test_db();
    let codec = test_codec();
    let customer = create_test_customer(&conn, "Acme");
    let license = issue_default_license(&conn, &codec, &customer.id, 2);

    let (returned, outcome) = activate(&mut conn, &codec, &license.license_key, "hw-1").unwrap();
    assert_eq!(returned.id, license.id);
    assert!(outcome.is_new());

    let (_, again) = activate(&mut conn, &codec, &license.license_key, "hw-1").unwrap();
    assert!(!again.is_new(), "same hardware should refresh, not re-bind");
}

#[test]
fn expired_license_fails_activate() {
    let mut conn = setup_test_db();
    let codec = test_codec();
    let customer = create_test_customer(&conn, "Acme");
    let license = issue_test_license(&conn, &codec, &customer.id, Tier::Pro, 3, -1);

    assert_validation_error(
        activate(&mut conn, &codec, &license.license_key, "hw-1"),
        ValidationError::Expired,
    );
}

#[test]
fn activate_limit_scenario_with_single_seat() {
    let mut conn = setup_test_db();
    let codec = test_codec();
    let customer = create_test_customer(&conn, "Acme");
    let license = issue_default_license(&conn, &codec, &customer.id, 1);

    activate(&mut conn, &codec, &license.license_key, "hw-a").unwrap();
    assert_validation_error(
        activate(&mut conn, &codec, &license.license_key, "hw-b"),
        ValidationError::ActivationLimitReached { limit: 1 },
    );

    engine::deactivate(&conn, &codec, &license.license_key, "hw-a").unwrap();
    activate(&mut conn, &codec, &license.license_key, "hw-b")
        .expect("freed seat should be claimable");
}

// ============ Deactivate ============

#[test]
fn deactivate_works_on_a_revoked_license() {
    let mut conn = setup_test_db();
    let codec = test_codec();
    let customer = create_test_customer(&conn, "Acme");
    let license = issue_default_license(&conn, &codec, &customer.id, 1);

    activate(&mut conn, &codec, &license.license_key, "hw-1").unwrap();
    queries::revoke_license(&conn, &license.id, None).unwrap();

    // Seats can still be reclaimed after revocation.
    let (_, released) =
        engine::deactivate(&conn, &codec, &license.license_key, "hw-1").unwrap();
    assert!(!released.is_active);
}

#[test]
fn deactivate_without_activation_is_not_found() {
    let conn = setup_test_db();
    let codec = test_codec();
    let customer = create_test_customer(&conn, "Acme");
    let license = issue_default_license(&conn, &codec, &customer.id, 1);

    assert_validation_error(
        engine::deactivate(&conn, &codec, &license.license_key, "hw-1"),
        ValidationError::NotFound,
    );
}

// ============ Phone-home ============

#[test]
fn phone_home_with_bad_key_is_an_error() {
    let conn = setup_test_db();
    let codec = test_codec();

    assert_validation_error(
        phone_home(&conn, &codec, "garbage.key", "hw-1"),
        ValidationError::InvalidKey,
    );
}

#[test]
fn phone_home_without_activation_is_invalid_not_error() {
    let conn = setup_test_db();
    let codec = test_codec();
    let customer = create_test_customer(&conn, "Acme");
    let license = issue_default_license(&conn, &codec, &customer.id, 1);

    match phone_home(&conn, &codec, &license.license_key, "hw-1").unwrap() {
        PhoneHomeOutcome::Invalid {
            reason, message, ..
        } => {
            assert_eq!(reason, InvalidReason::NoActiveActivation);
            assert!(message.contains("no active activation"), "got: {message}");
        }
        other => panic!("expected invalid verdict, got {:?}", other),
    }
}

#[test]
fn phone_home_after_revocation_reports_invalid_but_keeps_the_row() {
    let mut conn = setup_test_db();
    let codec = test_codec();
    let customer = create_test_customer(&conn, "Acme");
    let license = issue_default_license(&conn, &codec, &customer.id, 1);

    activate(&mut conn, &codec, &license.license_key, "hw-1").unwrap();
    queries::revoke_license(&conn, &license.id, Some("non-payment")).unwrap();

    match phone_home(&conn, &codec, &license.license_key, "hw-1").unwrap() {
        PhoneHomeOutcome::Invalid {
            reason, message, ..
        } => {
            assert_eq!(reason, InvalidReason::Revoked);
            assert!(message.contains("non-payment"), "reason should be relayed");
        }
        other => panic!("expected invalid verdict, got {:?}", other),
    }

    // The binding stays active; revocation is a ledger verdict, not a
    // deactivation.
    let row = queries::get_active_activation(&conn, &license.id, "hw-1")
        .unwrap()
        .expect("activation row should remain active");
    assert!(row.is_active);
}

#[test]
fn phone_home_rechecks_expiry() {
    let mut conn = setup_test_db();
    let codec = test_codec();
    let customer = create_test_customer(&conn, "Acme");
    // Valid long enough to activate, then expire it underneath the client.
    let license = issue_default_license(&conn, &codec, &customer.id, 1);
    activate(&mut conn, &codec, &license.license_key, "hw-1").unwrap();

    conn.execute(
        "UPDATE licenses SET expires_at = ?2 WHERE id = ?1",
        rusqlite::params![license.id, now() - 10],
    )
    .unwrap();

    match phone_home(&conn, &codec, &license.license_key, "hw-1").unwrap() {
        PhoneHomeOutcome::Invalid {
            reason, message, ..
        } => {
            assert_eq!(reason, InvalidReason::Expired);
            assert!(message.contains("expired"), "got: {message}");
        }
        other => panic!("expected invalid verdict, got {:?}", other),
    }
}

#[test]
fn phone_home_after_customer_disabled_is_invalid() {
    let mut conn = setup_test_db();
    let codec = test_codec();
    let customer = create_test_customer(&conn, "Acme");
    let license = issue_default_license(&conn, &codec, &customer.id, 1);
    activate(&mut conn, &codec, &license.license_key, "hw-1").unwrap();

    queries::set_customer_active(&conn, &customer.id, false).unwrap();

    match phone_home(&conn, &codec, &license.license_key, "hw-1").unwrap() {
        PhoneHomeOutcome::Invalid { reason, .. } => {
            assert_eq!(reason, InvalidReason::CustomerDisabled);
        }
        other => panic!("expected invalid verdict, got {:?}", other),
    }

    // The binding survives; re-enabling the customer restores service
    // without a fresh activation.
    let row = queries::get_active_activation(&conn, &license.id, "hw-1")
        .unwrap()
        .expect("activation row should remain active");
    assert!(row.is_active);

    queries::set_customer_active(&conn, &customer.id, true).unwrap();
    assert!(matches!(
        phone_home(&conn, &codec, &license.license_key, "hw-1").unwrap(),
        PhoneHomeOutcome::Valid { .. }
    ));
}

#[test]
fn phone_home_valid_updates_ledger_and_computes_days() {
    let mut conn = setup_test_db();
    let codec = test_codec();
    let customer = create_test_customer(&conn, "Acme");
    let license = issue_default_license(&conn, &codec, &customer.id, 1);
    activate(&mut conn, &codec, &license.license_key, "hw-1").unwrap();

    match engine::phone_home(
        &conn,
        &codec,
        &license.license_key,
        "hw-1",
        Some("10.0.0.5"),
        WARNING_DAYS,
    )
    .unwrap()
    {
        PhoneHomeOutcome::Valid {
            days_until_expiry,
            warning,
            ..
        } => {
            assert!(days_until_expiry > 300, "year-long license");
            assert!(warning.is_none(), "no warning far from expiry");
        }
        other => panic!("expected valid verdict, got {:?}", other),
    }

    let row = queries::get_active_activation(&conn, &license.id, "hw-1")
        .unwrap()
        .unwrap();
    assert_eq!(row.last_ip_address, Some("10.0.0.5".to_string()));
}

#[test]
fn phone_home_warns_near_expiry() {
    let mut conn = setup_test_db();
    let codec = test_codec();
    let customer = create_test_customer(&conn, "Acme");
    let license =
        issue_test_license(&conn, &codec, &customer.id, Tier::Pro, 1, 5 * SECONDS_PER_DAY);
    activate(&mut conn, &codec, &license.license_key, "hw-1").unwrap();

    match phone_home(&conn, &codec, &license.license_key, "hw-1").unwrap() {
        PhoneHomeOutcome::Valid {
            days_until_expiry,
            warning,
            ..
        } => {
            assert!(days_until_expiry <= 5);
            let warning = warning.expect("warning expected within the threshold");
            assert!(warning.contains("expires in"), "got: {warning}");
        }
        other => panic!("expected valid verdict, got {:?}", other),
    }
}

// ============ Status ============

#[test]
fn status_reports_counts_and_expiry() {
    let mut conn = setup_test_db();
    let codec = test_codec();
    let customer = create_test_customer(&conn, "Acme");
    let license = issue_default_license(&conn, &codec, &customer.id, 3);

    activate(&mut conn, &codec, &license.license_key, "hw-1").unwrap();
    activate(&mut conn, &codec, &license.license_key, "hw-2").unwrap();

    let status = engine::license_status(&conn, &license.id).unwrap();
    assert_eq!(status.customer_name, "Acme");
    assert_eq!(status.active_activations, 2);
    assert!(!status.is_expired);
    assert!(!status.license.revoked);
}

#[test]
fn status_for_unknown_license_is_not_found() {
    let conn = setup_test_db();

    // Malformed ids are rejected before the lookup; well-formed but absent
    // ids after it. Both read as not-found to the caller.
    let malformed = engine::license_status(&conn, "rl_lic_missing");
    assert!(matches!(malformed, Err(AppError::NotFound(_))));

    let absent = engine::license_status(&conn, &EntityType::License.gen_id());
    assert!(matches!(absent, Err(AppError::NotFound(_))));
}
