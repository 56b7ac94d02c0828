use axum::extract::State;
use serde::Serialize;

use crate::db::AppState;
use crate::engine;
use crate::error::Result;
use crate::extractors::{Json, Path};
use crate::features::Tier;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseStatusResponse {
    pub license_id: String,
    pub tier: Tier,
    pub customer_name: String,
    pub is_revoked: bool,
    pub expires_at: i64,
    pub is_expired: bool,
    pub active_activations: i64,
    pub max_activations: i64,
}

/// GET /licenses/{id}/status - read-only projection of a license's health.
pub async fn license_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LicenseStatusResponse>> {
    let conn = state.db.get()?;
    let status = engine::license_status(&conn, &id)?;

    Ok(Json(LicenseStatusResponse {
        license_id: status.license.id,
        tier: status.license.tier,
        customer_name: status.customer_name,
        is_revoked: status.license.revoked,
        expires_at: status.license.expires_at,
        is_expired: status.is_expired,
        active_activations: status.active_activations,
        max_activations: status.license.max_activations,
    }))
}
