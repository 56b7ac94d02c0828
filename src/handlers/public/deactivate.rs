use axum::{extract::State, http::HeaderMap};
use serde::{Deserialize, Serialize};

use crate::db::AppState;
use crate::engine;
use crate::error::Result;
use crate::extractors::Json;
use crate::models::AuditAction;
use crate::util::{extract_client_ip, AuditLogBuilder};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeactivateRequest {
    pub license_key: String,
    pub hardware_id: String,
}

#[derive(Debug, Serialize)]
pub struct DeactivateResponse {
    pub message: String,
}

/// POST /deactivate - release this hardware's binding, freeing a seat.
pub async fn deactivate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<DeactivateRequest>,
) -> Result<Json<DeactivateResponse>> {
    let conn = state.db.get()?;
    let ip = extract_client_ip(&headers);

    let (license, _activation) =
        engine::deactivate(&conn, &state.codec, &req.license_key, &req.hardware_id)?;

    tracing::info!(license_id = %license.id, hardware_id = %req.hardware_id, "deactivation");

    let audit_conn = state.audit.get()?;
    AuditLogBuilder::new(&audit_conn, state.audit_log_enabled)
        .license(&license.id)
        .action(AuditAction::Deactivated)
        .hardware(&req.hardware_id)
        .ip(ip.as_deref())
        .save()?;

    Ok(Json(DeactivateResponse {
        message: "deactivated".to_string(),
    }))
}
