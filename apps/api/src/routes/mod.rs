pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::cv::handlers;
use crate::state::AppState;
use crate::uploads::handlers as uploads;

/// Room for multipart boundaries and headers on top of the photo itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let photo_body_limit = state.config.max_photo_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(health::health_handler))
        // Document generation
        .route(
            "/api/v1/cvs/:cv_id/document",
            post(handlers::handle_compose_document),
        )
        .route("/api/v1/cvs/:cv_id/export", post(handlers::handle_export))
        .route("/api/v1/documents", post(handlers::handle_compose_posted))
        // Uploads
        .route(
            "/api/v1/profiles/:profile_id/photo",
            post(uploads::handle_upload_photo).layer(DefaultBodyLimit::max(photo_body_limit)),
        )
        .with_state(state)
}
