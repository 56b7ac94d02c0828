use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap},
    response::Response,
};
use serde::Deserialize;
use tokio_util::io::ReaderStream;

use crate::db::{queries, AppState};
use crate::engine::{self, PhoneHomeOutcome};
use crate::error::{AppError, Result};
use crate::extractors::{Path, Query};
use crate::models::AuditAction;
use crate::util::{extract_client_ip, AuditLogBuilder};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadQuery {
    pub license_key: String,
    pub hardware_id: String,
}

/// GET /releases/{id}/download - stream a release artifact.
///
/// Gated on a full phone-home check: the caller needs a currently valid,
/// activated license. Anything short of that is a 401, without detail
/// about which check failed.
pub async fn download(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(release_id): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response> {
    let ip = extract_client_ip(&headers);

    let license = {
        let conn = state.db.get()?;
        let outcome = engine::phone_home(
            &conn,
            &state.codec,
            &query.license_key,
            &query.hardware_id,
            ip.as_deref(),
            state.expiry_warning_days,
        )
        .map_err(|_| AppError::Unauthorized)?;

        match outcome {
            PhoneHomeOutcome::Valid { license, .. } => license,
            PhoneHomeOutcome::Invalid { .. } => return Err(AppError::Unauthorized),
        }
    };

    let release = {
        let conn = state.db.get()?;
        queries::get_release(&conn, &release_id)?
            .ok_or_else(|| AppError::NotFound(format!("release {release_id} not found")))?
    };

    // Release file names are admin-supplied; still refuse anything that
    // could escape the release directory.
    if release.file_name.contains('/') || release.file_name.contains("..") {
        return Err(AppError::Internal("invalid release file name".into()));
    }
    let path = std::path::Path::new(&state.release_dir).join(&release.file_name);

    let file = tokio::fs::File::open(&path).await.map_err(|e| {
        tracing::error!(release_id = %release.id, path = %path.display(), "release file unreadable: {e}");
        AppError::Internal("release file unavailable".into())
    })?;
    let len = file.metadata().await.ok().map(|m| m.len());

    let audit_conn = state.audit.get()?;
    AuditLogBuilder::new(&audit_conn, state.audit_log_enabled)
        .license(&license.id)
        .action(AuditAction::Download)
        .hardware(&query.hardware_id)
        .ip(ip.as_deref())
        .details(serde_json::json!({ "releaseId": release.id, "version": release.version }))
        .save()?;

    let stream = ReaderStream::new(file);
    let mut builder = Response::builder()
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", release.file_name),
        );
    if let Some(len) = len {
        builder = builder.header(header::CONTENT_LENGTH, len);
    }
    builder
        .body(Body::from_stream(stream))
        .map_err(|e| AppError::Internal(format!("failed to build response: {e}")))
}
