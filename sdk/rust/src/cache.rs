//! Cached license state and the offline state machine.

use serde::{Deserialize, Serialize};

use crate::types::LicenseState;

/// Snapshot of the last successful server interaction, persisted through
/// the storage adapter so the application keeps working offline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedLicense {
    pub license_key: String,
    pub hardware_id: String,
    pub activation_id: String,
    pub tier: String,
    pub features: Vec<String>,
    pub expires_at: i64,
    /// Unix timestamp of the last phone-home the server answered with
    /// `valid = true`.
    pub last_validated: i64,
    /// Set when the server reports the license revoked; sticky until a
    /// later phone-home says otherwise.
    pub revoked: bool,
}

impl CachedLicense {
    /// Derive the license state at `now`.
    ///
    /// Revocation and expiry always win. Otherwise the verdict ages:
    /// within `interval_secs` of the last successful phone-home the
    /// license is `Valid`, within `grace_secs` it degrades to
    /// `GracePeriod`, and past the grace window it is treated as
    /// `Expired` even though the dates alone would allow it.
    pub fn state(&self, now: i64, interval_secs: i64, grace_secs: i64) -> LicenseState {
        if self.revoked {
            return LicenseState::Revoked;
        }
        if self.expires_at < now {
            return LicenseState::Expired;
        }

        let elapsed = now - self.last_validated;
        if elapsed <= interval_secs {
            LicenseState::Valid
        } else if elapsed <= grace_secs {
            LicenseState::GracePeriod
        } else {
            LicenseState::Expired
        }
    }

    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }
}
