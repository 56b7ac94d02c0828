use axum::{extract::State, http::HeaderMap};
use serde::{Deserialize, Serialize};

use crate::db::{queries, AppState};
use crate::engine::{self, InvalidReason, PhoneHomeOutcome};
use crate::error::Result;
use crate::extractors::Json;
use crate::features::Tier;
use crate::util::extract_client_ip;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneHomeRequest {
    pub license_key: String,
    pub hardware_id: String,
}

/// Phone-home answer. Ledger-level failures come back as 200 with
/// `valid = false` so the client can cache the verdict; only key-level
/// failures are HTTP errors.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneHomeResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<InvalidReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_until_expiry: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_required: Option<bool>,
}

impl PhoneHomeResponse {
    fn invalid(reason: InvalidReason, message: String) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
            tier: None,
            expires_at: None,
            days_until_expiry: None,
            warning: None,
            message: Some(message),
            latest_version: None,
            download_url: None,
            sha256_hash: None,
            is_required: None,
        }
    }
}

/// POST /phone-home - periodic revalidation from an activated client.
///
/// Valid responses also carry the latest release as a side channel so
/// clients learn about updates without a separate poll.
pub async fn phone_home(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PhoneHomeRequest>,
) -> Result<Json<PhoneHomeResponse>> {
    let conn = state.db.get()?;
    let ip = extract_client_ip(&headers);

    let outcome = engine::phone_home(
        &conn,
        &state.codec,
        &req.license_key,
        &req.hardware_id,
        ip.as_deref(),
        state.expiry_warning_days,
    )?;

    let response = match outcome {
        PhoneHomeOutcome::Invalid {
            license,
            reason,
            message,
        } => {
            tracing::debug!(license_id = %license.id, ?reason, %message, "phone-home invalid");
            PhoneHomeResponse::invalid(reason, message)
        }
        PhoneHomeOutcome::Valid {
            license,
            days_until_expiry,
            warning,
        } => {
            let latest = queries::get_latest_release(&conn)?;
            let (latest_version, download_url, sha256_hash, is_required) = match latest {
                Some(r) => (
                    Some(r.version),
                    Some(format!("{}/releases/{}/download", state.base_url, r.id)),
                    Some(r.sha256),
                    Some(r.is_required),
                ),
                None => (None, None, None, None),
            };
            PhoneHomeResponse {
                valid: true,
                reason: None,
                tier: Some(license.tier),
                expires_at: Some(license.expires_at),
                days_until_expiry: Some(days_until_expiry),
                warning,
                message: None,
                latest_version,
                download_url,
                sha256_hash,
                is_required,
            }
        }
    };

    Ok(Json(response))
}
