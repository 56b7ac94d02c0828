//! All SQL lives here. Handlers and the validation engine call these
//! functions; nothing else touches rusqlite directly.

use rusqlite::{params, Connection, TransactionBehavior};

use crate::db::from_row::{
    query_all, query_one, ACTIVATION_COLS, AUDIT_LOG_COLS, CUSTOMER_COLS, LICENSE_COLS,
    RELEASE_COLS,
};
use crate::error::{AppError, Result, ValidationError};
use crate::id::EntityType;
use crate::models::*;
use crate::util::now;

// ============ Customers ============

pub fn create_customer(conn: &Connection, req: &CreateCustomer) -> Result<Customer> {
    let customer = Customer {
        id: EntityType::Customer.gen_id(),
        name: req.name.clone(),
        contact_email: req.contact_email.clone(),
        is_active: true,
        created_at: now(),
    };
    conn.execute(
        "INSERT INTO customers (id, name, contact_email, is_active, created_at)
         VALUES (?1, ?2, ?3, 1, ?4)",
        params![
            customer.id,
            customer.name,
            customer.contact_email,
            customer.created_at
        ],
    )?;
    Ok(customer)
}

pub fn get_customer(conn: &Connection, id: &str) -> Result<Option<Customer>> {
    query_one(
        conn,
        &format!("SELECT {CUSTOMER_COLS} FROM customers WHERE id = ?1"),
        &[&id],
    )
}

pub fn list_customers(conn: &Connection) -> Result<Vec<Customer>> {
    query_all(
        conn,
        &format!("SELECT {CUSTOMER_COLS} FROM customers ORDER BY created_at DESC"),
        &[],
    )
}

/// Disable a customer. All of their licenses fail validation from the next
/// request onward; no per-license state is touched.
pub fn set_customer_active(conn: &Connection, id: &str, active: bool) -> Result<Customer> {
    let n = conn.execute(
        "UPDATE customers SET is_active = ?2 WHERE id = ?1",
        params![id, active as i32],
    )?;
    if n == 0 {
        return Err(AppError::NotFound(format!("customer {id} not found")));
    }
    get_customer(conn, id)?.ok_or_else(|| AppError::NotFound(format!("customer {id} not found")))
}

// ============ Licenses ============

/// Insert a fully-formed license row. The caller (issuance) generates the
/// id first, signs the payload, and hands us the finished record, so there
/// is no unsigned intermediate state in the database.
pub fn insert_license(conn: &Connection, license: &License) -> Result<()> {
    conn.execute(
        "INSERT INTO licenses (id, customer_id, license_key, tier, max_activations, features, issued_at, expires_at, revoked)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0)",
        params![
            license.id,
            license.customer_id,
            license.license_key,
            license.tier.as_ref(),
            license.max_activations,
            serde_json::to_string(&license.features)?,
            license.issued_at,
            license.expires_at,
        ],
    )?;
    Ok(())
}

pub fn get_license(conn: &Connection, id: &str) -> Result<Option<License>> {
    query_one(
        conn,
        &format!("SELECT {LICENSE_COLS} FROM licenses WHERE id = ?1"),
        &[&id],
    )
}

/// Revoke a license. Idempotent in effect but we reject double revocation
/// so the audit trail records exactly one revoked event per license.
pub fn revoke_license(conn: &Connection, id: &str, reason: Option<&str>) -> Result<License> {
    let license =
        get_license(conn, id)?.ok_or_else(|| AppError::NotFound(format!("license {id} not found")))?;
    if license.revoked {
        return Err(AppError::BadRequest("license is already revoked".into()));
    }
    conn.execute(
        "UPDATE licenses SET revoked = 1, revoked_at = ?2, revoked_reason = ?3 WHERE id = ?1",
        params![id, now(), reason],
    )?;
    get_license(conn, id)?.ok_or_else(|| AppError::NotFound(format!("license {id} not found")))
}

/// Replace a license's expiry and signed key in one statement. Extension
/// re-signs the payload, so the stored key is swapped atomically with the
/// new expires_at.
pub fn update_license_expiry(
    conn: &Connection,
    id: &str,
    new_expires_at: i64,
    new_key: &str,
) -> Result<License> {
    let n = conn.execute(
        "UPDATE licenses SET expires_at = ?2, license_key = ?3 WHERE id = ?1",
        params![id, new_expires_at, new_key],
    )?;
    if n == 0 {
        return Err(AppError::NotFound(format!("license {id} not found")));
    }
    get_license(conn, id)?.ok_or_else(|| AppError::NotFound(format!("license {id} not found")))
}

// ============ Activations ============

pub fn get_activation(conn: &Connection, id: &str) -> Result<Option<Activation>> {
    query_one(
        conn,
        &format!("SELECT {ACTIVATION_COLS} FROM activations WHERE id = ?1"),
        &[&id],
    )
}

/// The currently active binding for a (license, hardware) pair, if any.
pub fn get_active_activation(
    conn: &Connection,
    license_id: &str,
    hardware_id: &str,
) -> Result<Option<Activation>> {
    query_one(
        conn,
        &format!(
            "SELECT {ACTIVATION_COLS} FROM activations
             WHERE license_id = ?1 AND hardware_id = ?2 AND is_active = 1"
        ),
        &[&license_id, &hardware_id],
    )
}

pub fn count_active_activations(conn: &Connection, license_id: &str) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM activations WHERE license_id = ?1 AND is_active = 1",
        params![license_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn list_activations(conn: &Connection, license_id: &str) -> Result<Vec<Activation>> {
    query_all(
        conn,
        &format!(
            "SELECT {ACTIVATION_COLS} FROM activations
             WHERE license_id = ?1 ORDER BY activated_at DESC"
        ),
        &[&license_id],
    )
}

/// Outcome of an activation attempt. A repeat activation from hardware that
/// already holds an active binding refreshes that binding instead of
/// consuming another seat.
#[derive(Debug)]
pub enum AcquireOutcome {
    Created(Activation),
    Refreshed(Activation),
}

impl AcquireOutcome {
    pub fn activation(&self) -> &Activation {
        match self {
            AcquireOutcome::Created(a) | AcquireOutcome::Refreshed(a) => a,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, AcquireOutcome::Created(_))
    }
}

/// Bind hardware to a license, enforcing the activation limit atomically.
///
/// Uses an IMMEDIATE transaction so SQLite takes the write lock up front.
/// The existing-binding check, the seat count, and the insert all happen
/// under that lock, which closes the race where two machines activating
/// concurrently could both observe count < max and both insert. The partial
/// unique index on (license_id, hardware_id) WHERE is_active = 1 backstops
/// the same-pair variant of the race.
pub fn acquire_activation_atomic(
    conn: &mut Connection,
    license: &License,
    hardware_id: &str,
    machine_name: Option<&str>,
    os_info: Option<&str>,
    ip_address: Option<&str>,
) -> Result<AcquireOutcome> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let ts = now();

    // Idempotent re-activation: refresh the existing binding in place.
    if let Some(existing) = get_active_activation(&tx, &license.id, hardware_id)? {
        tx.execute(
            "UPDATE activations
             SET machine_name = ?2, os_info = ?3, last_phone_home = ?4, last_ip_address = ?5
             WHERE id = ?1",
            params![existing.id, machine_name, os_info, ts, ip_address],
        )?;
        let refreshed = get_activation(&tx, &existing.id)?
            .ok_or_else(|| AppError::Internal("activation row vanished mid-transaction".into()))?;
        tx.commit()?;
        return Ok(AcquireOutcome::Refreshed(refreshed));
    }

    let active = count_active_activations(&tx, &license.id)?;
    if active >= license.max_activations {
        return Err(ValidationError::ActivationLimitReached {
            limit: license.max_activations,
        }
        .into());
    }

    let activation = Activation {
        id: EntityType::Activation.gen_id(),
        license_id: license.id.clone(),
        hardware_id: hardware_id.to_string(),
        machine_name: machine_name.map(str::to_string),
        os_info: os_info.map(str::to_string),
        is_active: true,
        activated_at: ts,
        deactivated_at: None,
        last_phone_home: ts,
        last_ip_address: ip_address.map(str::to_string),
    };
    tx.execute(
        "INSERT INTO activations (id, license_id, hardware_id, machine_name, os_info, is_active, activated_at, last_phone_home, last_ip_address)
         VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?7, ?8)",
        params![
            activation.id,
            activation.license_id,
            activation.hardware_id,
            activation.machine_name,
            activation.os_info,
            activation.activated_at,
            activation.last_phone_home,
            activation.last_ip_address,
        ],
    )?;
    tx.commit()?;
    Ok(AcquireOutcome::Created(activation))
}

/// Release a hardware binding, freeing its seat. The row is kept with
/// is_active = 0 as history.
pub fn deactivate_activation(
    conn: &Connection,
    license_id: &str,
    hardware_id: &str,
) -> Result<Activation> {
    let existing = get_active_activation(conn, license_id, hardware_id)?
        .ok_or(ValidationError::NotFound)?;
    conn.execute(
        "UPDATE activations SET is_active = 0, deactivated_at = ?2 WHERE id = ?1",
        params![existing.id, now()],
    )?;
    get_activation(conn, &existing.id)?
        .ok_or_else(|| AppError::Internal("activation row vanished after update".into()))
}

pub fn touch_phone_home(
    conn: &Connection,
    activation_id: &str,
    ip_address: Option<&str>,
) -> Result<()> {
    conn.execute(
        "UPDATE activations SET last_phone_home = ?2, last_ip_address = ?3 WHERE id = ?1",
        params![activation_id, now(), ip_address],
    )?;
    Ok(())
}

// ============ Releases ============

pub fn create_release(conn: &Connection, req: &CreateRelease) -> Result<Release> {
    let release = Release {
        id: EntityType::Release.gen_id(),
        version: req.version.clone(),
        file_name: req.file_name.clone(),
        sha256: req.sha256.clone(),
        is_required: req.is_required,
        released_at: now(),
    };
    conn.execute(
        "INSERT INTO releases (id, version, file_name, sha256, is_required, released_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            release.id,
            release.version,
            release.file_name,
            release.sha256,
            release.is_required as i32,
            release.released_at
        ],
    )?;
    Ok(release)
}

pub fn get_release(conn: &Connection, id: &str) -> Result<Option<Release>> {
    query_one(
        conn,
        &format!("SELECT {RELEASE_COLS} FROM releases WHERE id = ?1"),
        &[&id],
    )
}

pub fn get_latest_release(conn: &Connection) -> Result<Option<Release>> {
    query_one(
        conn,
        &format!("SELECT {RELEASE_COLS} FROM releases ORDER BY released_at DESC LIMIT 1"),
        &[],
    )
}

pub fn list_releases(conn: &Connection) -> Result<Vec<Release>> {
    query_all(
        conn,
        &format!("SELECT {RELEASE_COLS} FROM releases ORDER BY released_at DESC"),
        &[],
    )
}

// ============ Audit Logs ============

pub fn insert_audit_log(conn: &Connection, entry: &AuditLog) -> Result<()> {
    let details = entry
        .details
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;
    conn.execute(
        "INSERT INTO audit_logs (id, timestamp, license_id, action, details, hardware_id, ip_address)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            entry.id,
            entry.timestamp,
            entry.license_id,
            entry.action,
            details,
            entry.hardware_id,
            entry.ip_address
        ],
    )?;
    Ok(())
}

pub fn list_audit_logs(conn: &Connection, license_id: &str, limit: i64) -> Result<Vec<AuditLog>> {
    query_all(
        conn,
        &format!(
            "SELECT {AUDIT_LOG_COLS} FROM audit_logs
             WHERE license_id = ?1 ORDER BY timestamp DESC LIMIT ?2"
        ),
        &[&license_id, &limit],
    )
}

// Used in tier parsing round trips from the DB; keeps the CHECK constraint
// and the enum in sync.
#[cfg(test)]
mod tests {
    use crate::features::Tier;
    use strum::IntoEnumIterator;

    #[test]
    fn tier_variants_match_check_constraint() {
        let allowed = ["basic", "pro", "enterprise"];
        for tier in Tier::iter() {
            assert!(allowed.contains(&tier.as_ref()));
        }
    }
}
