use serde::{Deserialize, Serialize};

use crate::features::Tier;

/// The signed, immutable content of a license key.
///
/// Serialized as flat camelCase JSON inside the key. `features` is a
/// snapshot of the tier's feature set at issuance time - a later change to
/// the feature table does not alter keys already in the field unless the
/// license is re-issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicensePayload {
    pub license_id: String,
    pub customer_id: String,
    pub tier: Tier,
    pub max_activations: i64,
    pub issued_at: i64,
    pub expires_at: i64,
    pub features: Vec<String>,
}

/// The mutable server-side license record. Never physically deleted - the
/// row is the audit anchor for its activations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct License {
    pub id: String,
    pub customer_id: String,
    /// Opaque signed key: `base64(payload).base64(signature)`
    pub license_key: String,
    pub tier: Tier,
    pub max_activations: i64,
    /// Feature snapshot embedded in the signed payload (JSON array)
    pub features: Vec<String>,
    pub issued_at: i64,
    pub expires_at: i64,
    pub revoked: bool,
    pub revoked_at: Option<i64>,
    pub revoked_reason: Option<String>,
}

impl License {
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at < now
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueLicense {
    pub customer_id: String,
    pub tier: Tier,
    pub max_activations: i64,
    /// Days until expiry, counted from issuance
    pub valid_days: i64,
}
