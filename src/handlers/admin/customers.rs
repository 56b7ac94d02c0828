use axum::{extract::State, http::HeaderMap};

use crate::db::{queries, AppState};
use crate::error::Result;
use crate::extractors::{Json, Path};
use crate::models::{AuditAction, CreateCustomer, Customer};
use crate::util::{extract_client_ip, AuditLogBuilder};

/// POST /admin/customers
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateCustomer>,
) -> Result<Json<Customer>> {
    let conn = state.db.get()?;
    let customer = queries::create_customer(&conn, &req)?;
    tracing::info!(customer_id = %customer.id, "created customer");
    Ok(Json(customer))
}

/// GET /admin/customers
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Customer>>> {
    let conn = state.db.get()?;
    Ok(Json(queries::list_customers(&conn)?))
}

/// POST /admin/customers/{id}/disable
///
/// Every license owned by the customer fails validation from the next
/// request onward; nothing is written to the licenses themselves. The
/// audit entry is recorded against the customer id.
pub async fn disable(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Customer>> {
    let conn = state.db.get()?;
    let customer = queries::set_customer_active(&conn, &id, false)?;

    tracing::info!(customer_id = %customer.id, "disabled customer");

    let audit_conn = state.audit.get()?;
    AuditLogBuilder::new(&audit_conn, state.audit_log_enabled)
        .license(&customer.id)
        .action(AuditAction::CustomerDisabled)
        .ip(extract_client_ip(&headers).as_deref())
        .details(serde_json::json!({ "name": customer.name }))
        .save()?;

    Ok(Json(customer))
}
