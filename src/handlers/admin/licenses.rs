use axum::{extract::State, http::HeaderMap};
use serde::Deserialize;

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path, Query};
use crate::features::features_for_tier;
use crate::id::EntityType;
use crate::models::{
    Activation, AuditAction, AuditLog, IssueLicense, License, LicensePayload,
};
use crate::util::{extract_client_ip, now, AuditLogBuilder, SECONDS_PER_DAY};

/// POST /admin/licenses - issue a new signed license.
///
/// The id is generated up front so the signed payload and the stored row
/// carry the same identity; there is never an unsigned license in the
/// database.
pub async fn issue(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<IssueLicense>,
) -> Result<Json<License>> {
    if req.max_activations < 1 {
        return Err(AppError::BadRequest("maxActivations must be >= 1".into()));
    }
    if req.valid_days < 1 {
        return Err(AppError::BadRequest("validDays must be >= 1".into()));
    }

    let conn = state.db.get()?;
    let customer = queries::get_customer(&conn, &req.customer_id)?
        .ok_or_else(|| AppError::NotFound(format!("customer {} not found", req.customer_id)))?;
    if !customer.is_active {
        return Err(AppError::BadRequest("customer is disabled".into()));
    }

    let ts = now();
    let payload = LicensePayload {
        license_id: EntityType::License.gen_id(),
        customer_id: customer.id.clone(),
        tier: req.tier,
        max_activations: req.max_activations,
        issued_at: ts,
        expires_at: ts + req.valid_days * SECONDS_PER_DAY,
        features: features_for_tier(req.tier),
    };
    let license_key = state.codec.issue(&payload)?;

    let license = License {
        id: payload.license_id.clone(),
        customer_id: payload.customer_id.clone(),
        license_key,
        tier: payload.tier,
        max_activations: payload.max_activations,
        features: payload.features.clone(),
        issued_at: payload.issued_at,
        expires_at: payload.expires_at,
        revoked: false,
        revoked_at: None,
        revoked_reason: None,
    };
    queries::insert_license(&conn, &license)?;

    tracing::info!(license_id = %license.id, customer_id = %customer.id, tier = %license.tier.as_ref(), "issued license");

    let audit_conn = state.audit.get()?;
    AuditLogBuilder::new(&audit_conn, state.audit_log_enabled)
        .license(&license.id)
        .action(AuditAction::Issued)
        .ip(extract_client_ip(&headers).as_deref())
        .details(serde_json::json!({
            "customerId": customer.id,
            "tier": license.tier,
            "maxActivations": license.max_activations,
            "expiresAt": license.expires_at,
        }))
        .save()?;

    Ok(Json(license))
}

/// GET /admin/licenses/{id}
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<License>> {
    let conn = state.db.get()?;
    let license = queries::get_license(&conn, &id)?
        .ok_or_else(|| AppError::NotFound(format!("license {id} not found")))?;
    Ok(Json(license))
}

#[derive(Debug, Deserialize)]
pub struct RevokeRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

/// POST /admin/licenses/{id}/revoke
///
/// Marks the license revoked; active hardware bindings are left in place
/// and learn about the revocation on their next phone-home.
pub async fn revoke(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<RevokeRequest>,
) -> Result<Json<License>> {
    let conn = state.db.get()?;
    let license = queries::revoke_license(&conn, &id, req.reason.as_deref())?;

    tracing::info!(license_id = %license.id, reason = ?req.reason, "revoked license");

    let audit_conn = state.audit.get()?;
    AuditLogBuilder::new(&audit_conn, state.audit_log_enabled)
        .license(&license.id)
        .action(AuditAction::Revoked)
        .ip(extract_client_ip(&headers).as_deref())
        .details(serde_json::json!({ "reason": req.reason }))
        .save()?;

    Ok(Json(license))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendRequest {
    pub additional_days: i64,
}

/// POST /admin/licenses/{id}/extend
///
/// Re-signs the payload with the new expiry and stores the fresh key; the
/// previous key stops validating (stored-key comparison). An expired
/// license extends from now, a live one from its current expiry.
pub async fn extend(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<ExtendRequest>,
) -> Result<Json<License>> {
    if req.additional_days < 1 {
        return Err(AppError::BadRequest("additionalDays must be >= 1".into()));
    }

    let conn = state.db.get()?;
    let license = queries::get_license(&conn, &id)?
        .ok_or_else(|| AppError::NotFound(format!("license {id} not found")))?;
    if license.revoked {
        return Err(AppError::BadRequest("cannot extend a revoked license".into()));
    }

    let ts = now();
    let new_expires_at = license.expires_at.max(ts) + req.additional_days * SECONDS_PER_DAY;

    let payload = LicensePayload {
        license_id: license.id.clone(),
        customer_id: license.customer_id.clone(),
        tier: license.tier,
        max_activations: license.max_activations,
        issued_at: license.issued_at,
        expires_at: new_expires_at,
        features: license.features.clone(),
    };
    let new_key = state.codec.issue(&payload)?;
    let updated = queries::update_license_expiry(&conn, &license.id, new_expires_at, &new_key)?;

    tracing::info!(license_id = %updated.id, expires_at = updated.expires_at, "extended license");

    let audit_conn = state.audit.get()?;
    AuditLogBuilder::new(&audit_conn, state.audit_log_enabled)
        .license(&updated.id)
        .action(AuditAction::Extended)
        .ip(extract_client_ip(&headers).as_deref())
        .details(serde_json::json!({
            "additionalDays": req.additional_days,
            "newExpiresAt": new_expires_at,
        }))
        .save()?;

    Ok(Json(updated))
}

/// GET /admin/licenses/{id}/activations - full binding history.
pub async fn activations(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Activation>>> {
    let conn = state.db.get()?;
    if queries::get_license(&conn, &id)?.is_none() {
        return Err(AppError::NotFound(format!("license {id} not found")));
    }
    Ok(Json(queries::list_activations(&conn, &id)?))
}

#[derive(Debug, Deserialize)]
pub struct AuditLogQuery {
    #[serde(default = "default_audit_limit")]
    pub limit: i64,
}

fn default_audit_limit() -> i64 {
    100
}

/// GET /admin/licenses/{id}/audit-logs - most recent entries first.
pub async fn audit_logs(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<AuditLogQuery>,
) -> Result<Json<Vec<AuditLog>>> {
    let audit_conn = state.audit.get()?;
    let logs = queries::list_audit_logs(&audit_conn, &id, query.limit.clamp(1, 1000))?;
    Ok(Json(logs))
}
