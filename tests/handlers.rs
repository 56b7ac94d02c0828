//! Handler-level tests: drive the HTTP handlers directly with a full
//! `AppState` and check the side effects, above all the audit trail that
//! the lower-level engine tests never touch.

mod common;

use axum::extract::State;
use axum::http::HeaderMap;

use common::*;
use ratchet::extractors::{Json, Path};
use ratchet::handlers::{admin, public};

fn audit_actions(state: &AppState, license_id: &str) -> Vec<String> {
    let audit_conn = state.audit.get().unwrap();
    queries::list_audit_logs(&audit_conn, license_id, 100)
        .unwrap()
        .into_iter()
        .map(|entry| entry.action)
        .collect()
}

#[tokio::test]
async fn activate_writes_an_activated_audit_row() {
    let (state, _dir) = setup_test_state();
    let license = {
        let conn = state.db.get().unwrap();
        let customer = create_test_customer(&conn, "Audit Activate Co");
        issue_default_license(&conn, &state.codec, &customer.id, 3)
    };

    let Json(resp) = public::activate::activate(
        State(state.clone()),
        HeaderMap::new(),
        Json(public::activate::ActivateRequest {
            license_key: license.license_key.clone(),
            hardware_id: "hw-audit-1".to_string(),
            machine_name: Some("shop-floor-pc".to_string()),
            os_info: None,
        }),
    )
    .await
    .expect("activation should succeed");

    assert_eq!(resp.tier, Tier::Pro);

    let actions = audit_actions(&state, &license.id);
    assert_eq!(actions, vec!["activated"]);

    let audit_conn = state.audit.get().unwrap();
    let rows = queries::list_audit_logs(&audit_conn, &license.id, 100).unwrap();
    assert_eq!(rows[0].hardware_id.as_deref(), Some("hw-audit-1"));
}

#[tokio::test]
async fn repeat_activation_is_audited_as_reactivated() {
    let (state, _dir) = setup_test_state();
    let license = {
        let conn = state.db.get().unwrap();
        let customer = create_test_customer(&conn, "Audit Reactivate Co");
        issue_default_license(&conn, &state.codec, &customer.id, 1)
    };

    for _ in 0..2 {
        public::activate::activate(
            State(state.clone()),
            HeaderMap::new(),
            Json(public::activate::ActivateRequest {
                license_key: license.license_key.clone(),
                hardware_id: "hw-audit-2".to_string(),
                machine_name: None,
                os_info: None,
            }),
        )
        .await
        .expect("activation should succeed");
    }

    let mut actions = audit_actions(&state, &license.id);
    actions.sort();
    assert_eq!(actions, vec!["activated", "reactivated"]);
}

#[tokio::test]
async fn deactivate_writes_a_deactivated_audit_row() {
    let (state, _dir) = setup_test_state();
    let license = {
        let conn = state.db.get().unwrap();
        let customer = create_test_customer(&conn, "Audit Deactivate Co");
        issue_default_license(&conn, &state.codec, &customer.id, 2)
    };

    public::activate::activate(
        State(state.clone()),
        HeaderMap::new(),
        Json(public::activate::ActivateRequest {
            license_key: license.license_key.clone(),
            hardware_id: "hw-audit-3".to_string(),
            machine_name: None,
            os_info: None,
        }),
    )
    .await
    .expect("activation should succeed");

    public::deactivate::deactivate(
        State(state.clone()),
        HeaderMap::new(),
        Json(public::deactivate::DeactivateRequest {
            license_key: license.license_key.clone(),
            hardware_id: "hw-audit-3".to_string(),
        }),
    )
    .await
    .expect("deactivation should succeed");

    let mut actions = audit_actions(&state, &license.id);
    actions.sort();
    assert_eq!(actions, vec!["activated", "deactivated"]);

    let conn = state.db.get().unwrap();
    assert_eq!(
        queries::count_active_activations(&conn, &license.id).unwrap(),
        0
    );
}

#[tokio::test]
async fn revoke_writes_a_revoked_audit_row() {
    let (state, _dir) = setup_test_state();
    let license = {
        let conn = state.db.get().unwrap();
        let customer = create_test_customer(&conn, "Audit Revoke Co");
        issue_default_license(&conn, &state.codec, &customer.id, 2)
    };

    let Json(revoked) = admin::licenses::revoke(
        State(state.clone()),
        HeaderMap::new(),
        Path(license.id.clone()),
        Json(admin::licenses::RevokeRequest {
            reason: Some("chargeback".to_string()),
        }),
    )
    .await
    .expect("revocation should succeed");

    assert!(revoked.revoked);
    assert_eq!(revoked.revoked_reason.as_deref(), Some("chargeback"));

    let audit_conn = state.audit.get().unwrap();
    let rows = queries::list_audit_logs(&audit_conn, &license.id, 100).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].action, "revoked");
    assert_eq!(
        rows[0].details.as_ref().and_then(|d| d["reason"].as_str()),
        Some("chargeback")
    );
}
