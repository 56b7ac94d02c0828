use serde::{Deserialize, Serialize};

/// A downloadable release artifact. Metadata is surfaced as a phone-home
/// side channel; the binary itself is served by the license-gated download
/// endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    pub id: String,
    pub version: String,
    /// File name within the configured release directory
    pub file_name: String,
    pub sha256: String,
    /// Mandatory update flag relayed to clients
    pub is_required: bool,
    pub released_at: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRelease {
    pub version: String,
    pub file_name: String,
    pub sha256: String,
    #[serde(default)]
    pub is_required: bool,
}
