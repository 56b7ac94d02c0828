//! Wire types and the client-side license state machine.

use serde::{Deserialize, Serialize};

/// Client-side view of the license lifecycle.
///
/// `GracePeriod` is a degraded-but-working state: the server has been
/// unreachable for longer than the phone-home interval but less than the
/// grace window, so the cached verdict is still honored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseState {
    /// No activation has been performed on this machine.
    NotActivated,
    /// The last phone-home succeeded recently.
    Valid,
    /// The server is unreachable; running on the cached verdict.
    GracePeriod,
    /// The license is past its expiry date.
    Expired,
    /// The server reported the license revoked.
    Revoked,
}

impl LicenseState {
    /// Whether the application should stop gating features open.
    /// NotActivated is deliberately permissive - the app decides how to
    /// handle unlicensed use; Expired and Revoked are hard blocks.
    pub fn is_blocked(&self) -> bool {
        matches!(self, LicenseState::Expired | LicenseState::Revoked)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateRequest {
    pub license_key: String,
    pub hardware_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub machine_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_info: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateResponse {
    pub tier: String,
    pub features: Vec<String>,
    pub expires_at: i64,
    pub activation_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeactivateRequest {
    pub license_key: String,
    pub hardware_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneHomeRequest {
    pub license_key: String,
    pub hardware_id: String,
}

/// Machine-readable reasons the server attaches to `valid = false`
/// phone-home answers. The free-text `message` is for humans only.
pub mod reason {
    pub const NO_ACTIVE_ACTIVATION: &str = "noActiveActivation";
    pub const REVOKED: &str = "revoked";
    pub const EXPIRED: &str = "expired";
    pub const CUSTOMER_DISABLED: &str = "customerDisabled";
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneHomeResponse {
    pub valid: bool,
    pub reason: Option<String>,
    pub tier: Option<String>,
    pub expires_at: Option<i64>,
    pub days_until_expiry: Option<i64>,
    pub warning: Option<String>,
    pub message: Option<String>,
    pub latest_version: Option<String>,
    pub download_url: Option<String>,
    pub sha256_hash: Option<String>,
    pub is_required: Option<bool>,
}

/// Update metadata extracted from a phone-home answer.
#[derive(Debug, Clone)]
pub struct UpdateInfo {
    pub version: String,
    pub download_url: Option<String>,
    pub sha256: Option<String>,
    pub is_required: bool,
}

impl PhoneHomeResponse {
    /// Latest-release side channel, when the server included one.
    pub fn update_info(&self) -> Option<UpdateInfo> {
        Some(UpdateInfo {
            version: self.latest_version.clone()?,
            download_url: self.download_url.clone(),
            sha256: self.sha256_hash.clone(),
            is_required: self.is_required.unwrap_or(false),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
}
