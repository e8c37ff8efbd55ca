//! Object storage for profile photos.

use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;

/// File extension for the image types accepted as profile photos.
pub fn photo_extension(content_type: &str) -> Option<&'static str> {
    let mime = content_type.split(';').next()?.trim().to_ascii_lowercase();
    match mime.as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

/// Every upload gets a fresh key so cached photo URLs never go stale.
pub fn photo_key(profile_id: Uuid, extension: &str) -> String {
    format!("profiles/{profile_id}/{}.{extension}", Uuid::new_v4())
}

pub async fn put_photo(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    content_type: &str,
    body: Bytes,
) -> Result<(), AppError> {
    let size = body.len();
    s3.put_object()
        .bucket(bucket)
        .key(key)
        .body(ByteStream::from(body))
        .content_type(content_type)
        .send()
        .await
        .map_err(|e| AppError::S3(format!("Photo upload failed: {e}")))?;

    info!("Uploaded profile photo ({size} bytes) to s3://{bucket}/{key}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_extension_known_types() {
        assert_eq!(photo_extension("image/png"), Some("png"));
        assert_eq!(photo_extension("IMAGE/JPEG"), Some("jpg"));
        assert_eq!(photo_extension("image/webp; q=0.9"), Some("webp"));
    }

    #[test]
    fn test_photo_extension_rejects_non_images() {
        assert_eq!(photo_extension("text/plain"), None);
        assert_eq!(photo_extension("application/pdf"), None);
        assert_eq!(photo_extension("image/svg+xml"), None);
        assert_eq!(photo_extension(""), None);
    }

    #[test]
    fn test_photo_key_is_scoped_and_unique() {
        let profile_id = Uuid::new_v4();
        let a = photo_key(profile_id, "png");
        let b = photo_key(profile_id, "png");
        assert!(a.starts_with(&format!("profiles/{profile_id}/")));
        assert!(a.ends_with(".png"));
        assert_ne!(a, b);
    }
}
