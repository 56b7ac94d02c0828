//! Test utilities and fixtures for Ratchet integration tests

#![allow(dead_code)]

use std::sync::Arc;

use rusqlite::Connection;
use tempfile::TempDir;

pub use ratchet::db::{create_pool, init_audit_db, init_db, queries, AppState};
pub use ratchet::engine;
pub use ratchet::error::{AppError, ValidationError};
pub use ratchet::features::{features_for_tier, Tier};
pub use ratchet::id::EntityType;
pub use ratchet::keycodec::KeyCodec;
pub use ratchet::models::*;
pub use ratchet::util::{now, SECONDS_PER_DAY};

/// Create a test codec with a fixed seed so keys are reproducible.
pub fn test_codec() -> KeyCodec {
    KeyCodec::from_seed([42u8; 32])
}

/// Create an in-memory test database with schema initialized
pub fn setup_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    init_db(&conn).expect("Failed to initialize schema");
    conn
}

/// Create an in-memory test audit database with schema initialized
pub fn setup_test_audit_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory audit database");
    init_audit_db(&conn).expect("Failed to initialize audit schema");
    conn
}

/// Build a full [`AppState`] backed by file databases in a temp dir, for
/// calling handlers directly. In-memory pools will not do here: each pooled
/// connection would see its own empty database.
pub fn setup_test_state() -> (AppState, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("ratchet.db");
    let audit_path = dir.path().join("audit.db");

    let db = create_pool(db_path.to_str().unwrap()).expect("Failed to create db pool");
    let audit = create_pool(audit_path.to_str().unwrap()).expect("Failed to create audit pool");
    init_db(&db.get().unwrap()).expect("Failed to initialize schema");
    init_audit_db(&audit.get().unwrap()).expect("Failed to initialize audit schema");

    let state = AppState {
        db,
        audit,
        codec: Arc::new(test_codec()),
        base_url: "http://localhost:8080".to_string(),
        release_dir: dir.path().to_string_lossy().into_owned(),
        admin_api_key: Some("test-admin-key".to_string()),
        expiry_warning_days: 14,
        audit_log_enabled: true,
    };
    (state, dir)
}

/// Create a test customer with default values
pub fn create_test_customer(conn: &Connection, name: &str) -> Customer {
    queries::create_customer(
        conn,
        &CreateCustomer {
            name: name.to_string(),
            contact_email: Some(format!("{}@test.local", name.to_lowercase().replace(' ', "-"))),
        },
    )
    .expect("Failed to create test customer")
}

/// Issue and insert a signed test license.
///
/// `valid_secs` is relative to now and may be negative to produce an
/// already-expired license.
pub fn issue_test_license(
    conn: &Connection,
    codec: &KeyCodec,
    customer_id: &str,
    tier: Tier,
    max_activations: i64,
    valid_secs: i64,
) -> License {
    let ts = now();
    let payload = LicensePayload {
        license_id: EntityType::License.gen_id(),
        customer_id: customer_id.to_string(),
        tier,
        max_activations,
        issued_at: ts,
        expires_at: ts + valid_secs,
        features: features_for_tier(tier),
    };
    let license_key = codec.issue(&payload).expect("Failed to sign test license");

    let license = License {
        id: payload.license_id.clone(),
        customer_id: payload.customer_id.clone(),
        license_key,
        tier,
        max_activations,
        features: payload.features.clone(),
        issued_at: payload.issued_at,
        expires_at: payload.expires_at,
        revoked: false,
        revoked_at: None,
        revoked_reason: None,
    };
    queries::insert_license(conn, &license).expect("Failed to insert test license");
    license
}

/// Shorthand: a healthy pro license valid for a year.
pub fn issue_default_license(
    conn: &Connection,
    codec: &KeyCodec,
    customer_id: &str,
    max_activations: i64,
) -> License {
    issue_test_license(
        conn,
        codec,
        customer_id,
        Tier::Pro,
        max_activations,
        365 * SECONDS_PER_DAY,
    )
}

/// Assert an AppError wraps a specific validation failure.
pub fn assert_validation_error(result: Result<impl std::fmt::Debug, AppError>, expected: ValidationError) {
    match result {
        Err(AppError::License(v)) => assert_eq!(v, expected),
        other => panic!("expected validation error {:?}, got {:?}", expected, other),
    }
}
