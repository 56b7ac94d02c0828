use axum::{extract::State, http::HeaderMap};
use serde::{Deserialize, Serialize};

use crate::db::AppState;
use crate::engine;
use crate::error::Result;
use crate::extractors::Json;
use crate::features::Tier;
use crate::models::AuditAction;
use crate::util::{extract_client_ip, AuditLogBuilder};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateRequest {
    pub license_key: String,
    pub hardware_id: String,
    pub machine_name: Option<String>,
    pub os_info: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateResponse {
    pub tier: Tier,
    pub features: Vec<String>,
    pub expires_at: i64,
    pub activation_id: String,
}

/// POST /activate - bind this hardware to a license.
pub async fn activate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ActivateRequest>,
) -> Result<Json<ActivateResponse>> {
    let mut conn = state.db.get()?;
    let ip = extract_client_ip(&headers);

    let (license, outcome) = engine::activate(
        &mut conn,
        &state.codec,
        &req.license_key,
        &req.hardware_id,
        req.machine_name.as_deref(),
        req.os_info.as_deref(),
        ip.as_deref(),
    )?;

    let action = if outcome.is_new() {
        AuditAction::Activated
    } else {
        AuditAction::Reactivated
    };
    tracing::info!(
        license_id = %license.id,
        hardware_id = %req.hardware_id,
        new = outcome.is_new(),
        "activation"
    );

    let audit_conn = state.audit.get()?;
    AuditLogBuilder::new(&audit_conn, state.audit_log_enabled)
        .license(&license.id)
        .action(action)
        .hardware(&req.hardware_id)
        .ip(ip.as_deref())
        .details(serde_json::json!({
            "machineName": req.machine_name,
            "osInfo": req.os_info,
        }))
        .save()?;

    let activation_id = outcome.activation().id.clone();
    Ok(Json(ActivateResponse {
        tier: license.tier,
        features: license.features,
        expires_at: license.expires_at,
        activation_id,
    }))
}
