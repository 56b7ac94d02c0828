use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

/// Actions recorded in the append-only audit log. One entry is written as
/// a side effect of every state-changing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AuditAction {
    Issued,
    Activated,
    Reactivated,
    Deactivated,
    Revoked,
    Extended,
    CustomerDisabled,
    Download,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub id: String,
    pub timestamp: i64,
    pub license_id: String,
    pub action: String,
    pub details: Option<serde_json::Value>,
    pub hardware_id: Option<String>,
    pub ip_address: Option<String>,
}
