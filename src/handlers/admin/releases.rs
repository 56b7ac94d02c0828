use axum::extract::State;

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::extractors::Json;
use crate::models::{CreateRelease, Release};

/// POST /admin/releases - register a release artifact.
///
/// The file itself is placed in the release directory out of band; this
/// records the metadata surfaced to clients.
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateRelease>,
) -> Result<Json<Release>> {
    if req.version.trim().is_empty() {
        return Err(AppError::BadRequest("version must not be empty".into()));
    }
    if req.file_name.contains('/') || req.file_name.contains("..") {
        return Err(AppError::BadRequest("fileName must be a bare file name".into()));
    }

    let conn = state.db.get()?;
    let release = queries::create_release(&conn, &req)?;
    tracing::info!(release_id = %release.id, version = %release.version, "registered release");
    Ok(Json(release))
}

/// GET /admin/releases - newest first.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Release>>> {
    let conn = state.db.get()?;
    Ok(Json(queries::list_releases(&conn)?))
}
