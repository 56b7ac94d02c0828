use serde::{Deserialize, Serialize};

/// One binding of a license to a hardware fingerprint.
///
/// At most one row per (license_id, hardware_id) may have `is_active`
/// set - enforced by a partial unique index. Deactivated rows are kept as
/// history and never counted against the activation limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activation {
    pub id: String,
    pub license_id: String,
    /// Opaque client-supplied fingerprint, presumed stable per machine
    pub hardware_id: String,
    pub machine_name: Option<String>,
    pub os_info: Option<String>,
    pub is_active: bool,
    pub activated_at: i64,
    pub deactivated_at: Option<i64>,
    pub last_phone_home: i64,
    pub last_ip_address: Option<String>,
}
