//! Axum route handlers for document generation.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::cv::repository::load_cv_aggregate;
use crate::document::responsibilities::{PgResponsibilityLoader, PrefetchedResponsibilities};
use crate::document::{generate_export, DocumentDescription, ExportOptions, GeneratedDocument};
use crate::errors::AppError;
use crate::models::cv::RawCvAggregate;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

/// Body of `POST /api/v1/documents`: CV data supplied by the caller.
#[derive(Debug, Deserialize)]
pub struct ComposeRequest {
    pub cv: RawCvAggregate,
    #[serde(default)]
    pub options: ExportOptions,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/cvs/:cv_id/document
///
/// Returns the document description only; body is optional `ExportOptions`.
pub async fn handle_compose_document(
    State(state): State<AppState>,
    Path(cv_id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<DocumentDescription>, AppError> {
    let options = parse_options(&body)?;
    let generated = generate_for_cv(&state, cv_id, &options).await?;
    Ok(Json(generated.document))
}

/// POST /api/v1/cvs/:cv_id/export
///
/// Same document, wrapped with the download file name, which is also sent as
/// `Content-Disposition` so the client saves the rendered file under it.
pub async fn handle_export(
    State(state): State<AppState>,
    Path(cv_id): Path<Uuid>,
    body: Bytes,
) -> Result<Response, AppError> {
    let options = parse_options(&body)?;
    let generated = generate_for_cv(&state, cv_id, &options).await?;

    let disposition = HeaderValue::from_str(&content_disposition(&generated.file_name))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid Content-Disposition: {e}")))?;

    Ok(([(header::CONTENT_DISPOSITION, disposition)], Json(generated)).into_response())
}

/// POST /api/v1/documents
///
/// Composes from posted CV data. Responsibilities are still read from the
/// database, one work experience at a time.
pub async fn handle_compose_posted(
    State(state): State<AppState>,
    Json(request): Json<ComposeRequest>,
) -> Result<Json<GeneratedDocument>, AppError> {
    let loader = PgResponsibilityLoader::new(state.db.clone());
    let generated = generate_export(
        request.cv,
        &request.options,
        &loader,
        state.photos.as_ref(),
    )
    .await?;
    Ok(Json(generated))
}

/// Loads the stored CV, prefetches all responsibilities in one query, and
/// runs the generation pipeline.
async fn generate_for_cv(
    state: &AppState,
    cv_id: Uuid,
    options: &ExportOptions,
) -> Result<GeneratedDocument, AppError> {
    let raw = load_cv_aggregate(&state.db, cv_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("CV {cv_id} not found")))?;

    let work_experience_ids: Vec<Uuid> = if options.sections.work_experience {
        raw.work_experiences.iter().map(|w| w.id).collect()
    } else {
        Vec::new()
    };
    let loader = PrefetchedResponsibilities::prefetch(&state.db, &work_experience_ids).await;

    info!("Generating document for CV {cv_id}");
    let generated = generate_export(raw, options, &loader, state.photos.as_ref()).await?;
    Ok(generated)
}

/// An absent or blank body means "all defaults". Anything else must be valid
/// `ExportOptions`; a body that does not parse is rejected rather than
/// replaced with defaults, so disabled sections never reappear.
fn parse_options(body: &[u8]) -> Result<ExportOptions, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ExportOptions::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("Invalid export options: {e}")))
}

/// `attachment; filename="..."` with an ASCII-only name; other characters
/// become `_`.
fn content_disposition(file_name: &str) -> String {
    let ascii: String = file_name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("attachment; filename=\"{ascii}\"")
}
