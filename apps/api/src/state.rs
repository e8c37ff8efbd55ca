use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;

use crate::config::Config;
use crate::document::photo::PhotoSource;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub s3: S3Client,
    pub config: Config,
    /// Where profile photos are fetched from when embedding them.
    /// Default: `HttpPhotoSource`.
    pub photos: Arc<dyn PhotoSource>,
}
