//! Unauthenticated client-facing endpoints.

pub mod activate;
pub mod deactivate;
pub mod download;
pub mod phone_home;
pub mod status;

use axum::{
    routing::{get, post},
    Router,
};
use serde::Serialize;

use crate::db::AppState;
use crate::extractors::Json;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/public-key", get(public_key))
        .route("/activate", post(activate::activate))
        .route("/deactivate", post(deactivate::deactivate))
        .route("/phone-home", post(phone_home::phone_home))
        .route("/licenses/{id}/status", get(status::license_status))
        .route("/releases/{id}/download", get(download::download))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PublicKeyResponse {
    public_key: String,
}

/// The server's Ed25519 verifying key, for optional client-side
/// pre-validation of license keys. The server stays authoritative.
async fn public_key(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Json<PublicKeyResponse> {
    Json(PublicKeyResponse {
        public_key: state.codec.public_key_b64(),
    })
}
