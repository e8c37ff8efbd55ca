use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use uuid::Uuid;

use crate::cv::repository::{profile_exists, update_profile_photo};
use crate::errors::AppError;
use crate::state::AppState;
use crate::uploads::store::{photo_extension, photo_key, put_photo};

/// Multipart field carrying the image.
pub const PHOTO_FIELD: &str = "photo";

#[derive(Debug, Serialize)]
pub struct PhotoUploadResponse {
    pub photo_url: String,
    pub key: String,
}

struct PhotoUpload {
    content_type: String,
    extension: &'static str,
    bytes: Bytes,
}

/// POST /api/v1/profiles/:profile_id/photo
///
/// Validates type and size before touching the database or the bucket.
pub async fn handle_upload_photo(
    State(state): State<AppState>,
    Path(profile_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<PhotoUploadResponse>, AppError> {
    let upload = read_photo_field(multipart, state.config.max_photo_bytes).await?;

    if !profile_exists(&state.db, profile_id).await? {
        return Err(AppError::NotFound(format!("Profile {profile_id} not found")));
    }

    let key = photo_key(profile_id, upload.extension);
    put_photo(
        &state.s3,
        &state.config.s3_bucket,
        &key,
        &upload.content_type,
        upload.bytes,
    )
    .await?;

    let photo_url = state.config.public_object_url(&key);
    if !update_profile_photo(&state.db, profile_id, &photo_url).await? {
        return Err(AppError::NotFound(format!("Profile {profile_id} not found")));
    }

    Ok(Json(PhotoUploadResponse { photo_url, key }))
}

async fn read_photo_field(mut multipart: Multipart, max_bytes: usize) -> Result<PhotoUpload, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(PHOTO_FIELD) {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        let extension = photo_extension(&content_type).ok_or_else(|| {
            AppError::UnsupportedMediaType(format!(
                "'{content_type}' is not an accepted photo type (jpeg, png, webp, gif)"
            ))
        })?;

        let bytes = field.bytes().await.map_err(multipart_error)?;
        if bytes.is_empty() {
            return Err(AppError::Validation("Photo file is empty".to_string()));
        }
        if bytes.len() > max_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "Photo is {} bytes; the limit is {max_bytes}",
                bytes.len()
            )));
        }

        return Ok(PhotoUpload {
            content_type,
            extension,
            bytes,
        });
    }

    Err(AppError::Validation(format!(
        "Multipart field '{PHOTO_FIELD}' is required"
    )))
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::Validation(format!("Invalid multipart body: {}", e.body_text()))
    }
}
