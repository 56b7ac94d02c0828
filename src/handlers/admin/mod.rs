//! Admin endpoints, guarded by the configured bearer key.
//!
//! This is the interface boundary for the management UI; the UI itself
//! lives elsewhere.

pub mod customers;
pub mod licenses;
pub mod releases;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::db::AppState;
use crate::middleware::require_admin_key;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/licenses", post(licenses::issue))
        .route("/licenses/{id}", get(licenses::get))
        .route("/licenses/{id}/revoke", post(licenses::revoke))
        .route("/licenses/{id}/extend", post(licenses::extend))
        .route("/licenses/{id}/activations", get(licenses::activations))
        .route("/licenses/{id}/audit-logs", get(licenses::audit_logs))
        .route("/customers", post(customers::create).get(customers::list))
        .route("/customers/{id}/disable", post(customers::disable))
        .route("/releases", post(releases::create).get(releases::list))
        .layer(from_fn_with_state(state, require_admin_key))
}
