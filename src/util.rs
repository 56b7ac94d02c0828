//! Shared utility functions for the Ratchet server.

use axum::http::HeaderMap;
use chrono::Utc;
use rusqlite::Connection;

use crate::db::queries;
use crate::error::Result;
use crate::id::EntityType;
use crate::models::{AuditAction, AuditLog};

pub const SECONDS_PER_DAY: i64 = 86400;

/// Current Unix timestamp in seconds.
pub fn now() -> i64 {
    Utc::now().timestamp()
}

/// Whole days remaining until `expires_at`, clamped at zero.
pub fn days_until(expires_at: i64, now_ts: i64) -> i64 {
    ((expires_at - now_ts).max(0)) / SECONDS_PER_DAY
}

/// Extract client IP address from request headers.
///
/// Tries `x-forwarded-for` first (for proxied requests), then `x-real-ip`.
pub fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .or_else(|| headers.get("x-real-ip"))
        .and_then(|v| v.to_str().ok())
        .map(|s| s.split(',').next().unwrap_or(s).trim().to_string())
}

/// Extract a Bearer token from the Authorization header.
///
/// Returns the token string without the "Bearer " prefix, or None if
/// the header is missing, malformed, or empty after the prefix.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

/// Builder for creating audit log entries.
///
/// # Example
/// ```ignore
/// AuditLogBuilder::new(&audit_conn, state.audit_log_enabled)
///     .license(&license.id)
///     .action(AuditAction::Activated)
///     .hardware(&req.hardware_id)
///     .ip(ip.as_deref())
///     .details(serde_json::json!({ "machineName": req.machine_name }))
///     .save()?;
/// ```
pub struct AuditLogBuilder<'a> {
    conn: &'a Connection,
    enabled: bool,
    license_id: &'a str,
    action: Option<AuditAction>,
    details: Option<serde_json::Value>,
    hardware_id: Option<&'a str>,
    ip_address: Option<&'a str>,
}

impl<'a> AuditLogBuilder<'a> {
    pub fn new(conn: &'a Connection, enabled: bool) -> Self {
        Self {
            conn,
            enabled,
            license_id: "",
            action: None,
            details: None,
            hardware_id: None,
            ip_address: None,
        }
    }

    pub fn license(mut self, license_id: &'a str) -> Self {
        self.license_id = license_id;
        self
    }

    pub fn action(mut self, action: AuditAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn hardware(mut self, hardware_id: &'a str) -> Self {
        self.hardware_id = Some(hardware_id);
        self
    }

    pub fn ip(mut self, ip_address: Option<&'a str>) -> Self {
        self.ip_address = ip_address;
        self
    }

    /// Write the entry. No-op when audit logging is disabled or no action
    /// was set.
    pub fn save(self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let Some(action) = self.action else {
            return Ok(());
        };
        let entry = AuditLog {
            id: EntityType::AuditLog.gen_id(),
            timestamp: now(),
            license_id: self.license_id.to_string(),
            action: action.as_ref().to_string(),
            details: self.details,
            hardware_id: self.hardware_id.map(str::to_string),
            ip_address: self.ip_address.map(str::to_string),
        };
        queries::insert_audit_log(self.conn, &entry)
    }
}
