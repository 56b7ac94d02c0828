//! Row mapping trait and helpers for reducing boilerplate in queries.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::*;

/// Parse a string column into an enum type, converting parse errors to
/// rusqlite errors instead of panicking on corrupt data.
fn parse_enum<T: std::str::FromStr>(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<T> {
    row.get::<_, String>(col)?.parse::<T>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

/// Trait for constructing a type from a database row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ SQL SELECT Constants ============

pub const CUSTOMER_COLS: &str = "id, name, contact_email, is_active, created_at";

pub const LICENSE_COLS: &str = "id, customer_id, license_key, tier, max_activations, features, issued_at, expires_at, revoked, revoked_at, revoked_reason";

pub const ACTIVATION_COLS: &str = "id, license_id, hardware_id, machine_name, os_info, is_active, activated_at, deactivated_at, last_phone_home, last_ip_address";

pub const RELEASE_COLS: &str = "id, version, file_name, sha256, is_required, released_at";

pub const AUDIT_LOG_COLS: &str =
    "id, timestamp, license_id, action, details, hardware_id, ip_address";

// ============ FromRow Implementations ============

impl FromRow for Customer {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Customer {
            id: row.get(0)?,
            name: row.get(1)?,
            contact_email: row.get(2)?,
            is_active: row.get::<_, i32>(3)? != 0,
            created_at: row.get(4)?,
        })
    }
}

impl FromRow for License {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let features_str: String = row.get(5)?;
        Ok(License {
            id: row.get(0)?,
            customer_id: row.get(1)?,
            license_key: row.get(2)?,
            tier: parse_enum(row, 3, "tier")?,
            max_activations: row.get(4)?,
            features: serde_json::from_str(&features_str).unwrap_or_default(),
            issued_at: row.get(6)?,
            expires_at: row.get(7)?,
            revoked: row.get::<_, i32>(8)? != 0,
            revoked_at: row.get(9)?,
            revoked_reason: row.get(10)?,
        })
    }
}

impl FromRow for Activation {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Activation {
            id: row.get(0)?,
            license_id: row.get(1)?,
            hardware_id: row.get(2)?,
            machine_name: row.get(3)?,
            os_info: row.get(4)?,
            is_active: row.get::<_, i32>(5)? != 0,
            activated_at: row.get(6)?,
            deactivated_at: row.get(7)?,
            last_phone_home: row.get(8)?,
            last_ip_address: row.get(9)?,
        })
    }
}

impl FromRow for Release {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Release {
            id: row.get(0)?,
            version: row.get(1)?,
            file_name: row.get(2)?,
            sha256: row.get(3)?,
            is_required: row.get::<_, i32>(4)? != 0,
            released_at: row.get(5)?,
        })
    }
}

impl FromRow for AuditLog {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let details_str: Option<String> = row.get(4)?;
        Ok(AuditLog {
            id: row.get(0)?,
            timestamp: row.get(1)?,
            license_id: row.get(2)?,
            action: row.get(3)?,
            details: details_str.and_then(|s| serde_json::from_str(&s).ok()),
            hardware_id: row.get(5)?,
            ip_address: row.get(6)?,
        })
    }
}
