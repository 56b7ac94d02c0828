//! License validation engine.
//!
//! Every client-facing operation funnels through [`validate_key`], so the
//! signature check, ledger lookup, and health checks happen in one place
//! and in one order. The ledger is authoritative: a cryptographically
//! valid key for a revoked or expired license still fails here.

use rusqlite::Connection;
use serde::Serialize;

use crate::db::queries::{self, AcquireOutcome};
use crate::error::{AppError, Result, ValidationError};
use crate::id::is_valid_prefixed_id;
use crate::keycodec::KeyCodec;
use crate::models::{Activation, License};
use crate::util::{days_until, now};

/// Verify a license key and check the ledger health of the license it
/// names.
///
/// Order: signature → lookup by embedded id → stored-key comparison →
/// revoked → expired → customer active. Unknown, malformed, and
/// superseded keys all collapse to `InvalidKey` so responses never reveal
/// which license ids exist.
pub fn validate_key(conn: &Connection, codec: &KeyCodec, license_key: &str) -> Result<License> {
    let payload = codec
        .verify(license_key)
        .ok_or(ValidationError::InvalidKey)?;

    let license = queries::get_license(conn, &payload.license_id)?
        .ok_or(ValidationError::InvalidKey)?;

    // Extension re-signs and stores a fresh key; an old key with a valid
    // signature no longer matches and is rejected.
    if license.license_key != license_key {
        return Err(ValidationError::InvalidKey.into());
    }

    if license.revoked {
        return Err(ValidationError::Revoked.into());
    }
    if license.is_expired(now()) {
        return Err(ValidationError::Expired.into());
    }

    let customer = queries::get_customer(conn, &license.customer_id)?
        .ok_or(ValidationError::InvalidKey)?;
    if !customer.is_active {
        return Err(ValidationError::CustomerInactive.into());
    }

    Ok(license)
}

/// Activate a license on a piece of hardware.
///
/// Returns the acquisition outcome (new binding vs refreshed binding)
/// along with the validated license for response building.
pub fn activate(
    conn: &mut Connection,
    codec: &KeyCodec,
    license_key: &str,
    hardware_id: &str,
    machine_name: Option<&str>,
    os_info: Option<&str>,
    ip: Option<&str>,
) -> Result<(License, AcquireOutcome)> {
    let license = validate_key(conn, codec, license_key)?;
    let outcome = queries::acquire_activation_atomic(
        conn,
        &license,
        hardware_id,
        machine_name,
        os_info,
        ip,
    )?;
    Ok((license, outcome))
}

/// Release the hardware binding for a license, freeing one seat.
///
/// Deactivation only needs a syntactically valid key that names a real
/// license; a revoked or expired license can still be deactivated so
/// customers can reclaim seats.
pub fn deactivate(
    conn: &Connection,
    codec: &KeyCodec,
    license_key: &str,
    hardware_id: &str,
) -> Result<(License, Activation)> {
    let payload = codec
        .verify(license_key)
        .ok_or(ValidationError::InvalidKey)?;
    let license = queries::get_license(conn, &payload.license_id)?
        .ok_or(ValidationError::InvalidKey)?;
    if license.license_key != license_key {
        return Err(ValidationError::InvalidKey.into());
    }

    let activation = queries::deactivate_activation(conn, &license.id, hardware_id)?;
    Ok((license, activation))
}

/// Machine-readable reason attached to a `valid = false` phone-home
/// verdict. Clients branch on this, not on the message prose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum InvalidReason {
    NoActiveActivation,
    Revoked,
    Expired,
    CustomerDisabled,
}

/// Result of a phone-home check.
///
/// Key-level failures (bad signature, unknown license) are returned as
/// errors and become HTTP 400. Ledger-level failures are a successful
/// response with `valid = false`, so a client with a real key always gets
/// an answer it can cache.
#[derive(Debug)]
pub enum PhoneHomeOutcome {
    Valid {
        license: License,
        days_until_expiry: i64,
        warning: Option<String>,
    },
    Invalid {
        license: License,
        reason: InvalidReason,
        message: String,
    },
}

/// Periodic revalidation from an activated client.
pub fn phone_home(
    conn: &Connection,
    codec: &KeyCodec,
    license_key: &str,
    hardware_id: &str,
    ip: Option<&str>,
    expiry_warning_days: i64,
) -> Result<PhoneHomeOutcome> {
    let payload = codec
        .verify(license_key)
        .ok_or(ValidationError::InvalidKey)?;
    let license = queries::get_license(conn, &payload.license_id)?
        .ok_or(ValidationError::InvalidKey)?;
    if license.license_key != license_key {
        return Err(ValidationError::InvalidKey.into());
    }

    let Some(activation) = queries::get_active_activation(conn, &license.id, hardware_id)? else {
        return Ok(PhoneHomeOutcome::Invalid {
            license,
            reason: InvalidReason::NoActiveActivation,
            message: "no active activation for this hardware".to_string(),
        });
    };

    // Revocation does not deactivate the row; the client learns it is
    // invalid here and the binding history stays intact.
    if license.revoked {
        let message = match &license.revoked_reason {
            Some(reason) => format!("license has been revoked: {reason}"),
            None => "license has been revoked".to_string(),
        };
        return Ok(PhoneHomeOutcome::Invalid {
            license,
            reason: InvalidReason::Revoked,
            message,
        });
    }

    let ts = now();
    if license.is_expired(ts) {
        return Ok(PhoneHomeOutcome::Invalid {
            license,
            reason: InvalidReason::Expired,
            message: "license has expired".to_string(),
        });
    }

    // Disabling a customer cuts off every license they hold at the next
    // phone-home, without touching the licenses themselves.
    let customer = queries::get_customer(conn, &license.customer_id)?
        .ok_or(ValidationError::InvalidKey)?;
    if !customer.is_active {
        return Ok(PhoneHomeOutcome::Invalid {
            license,
            reason: InvalidReason::CustomerDisabled,
            message: "customer account is disabled".to_string(),
        });
    }

    queries::touch_phone_home(conn, &activation.id, ip)?;

    let days = days_until(license.expires_at, ts);
    let warning = (days <= expiry_warning_days)
        .then(|| format!("license expires in {days} day(s)"));

    Ok(PhoneHomeOutcome::Valid {
        license,
        days_until_expiry: days,
        warning,
    })
}

/// Read-only status projection for a license id.
pub struct LicenseStatus {
    pub license: License,
    pub customer_name: String,
    pub is_expired: bool,
    pub active_activations: i64,
}

pub fn license_status(conn: &Connection, license_id: &str) -> Result<LicenseStatus> {
    // Reject ids that cannot possibly exist before touching the database.
    if !is_valid_prefixed_id(license_id) {
        return Err(AppError::NotFound(format!("license {license_id} not found")));
    }
    let license = queries::get_license(conn, license_id)?
        .ok_or_else(|| AppError::NotFound(format!("license {license_id} not found")))?;
    let customer = queries::get_customer(conn, &license.customer_id)?
        .ok_or_else(|| AppError::Internal("license references missing customer".into()))?;
    let active_activations = queries::count_active_activations(conn, &license.id)?;
    let is_expired = license.is_expired(now());
    Ok(LicenseStatus {
        license,
        customer_name: customer.name,
        is_expired,
        active_activations,
    })
}
