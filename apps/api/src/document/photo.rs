//! Photo Embedder — turns the profile photo URL into an inline image.
//!
//! Attempt → validate → embed, or fall back to a text-only header.
//! Failures never leave this module; they are logged and reported as
//! `PhotoOutcome::Fallback` for the composer to match on.

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine};
use bytes::{Bytes, BytesMut};
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};

use crate::document::blocks::ImageBlock;

/// Displayed size of the header photo, in points.
const PHOTO_SIZE_PT: f32 = 80.0;

#[derive(Debug, Error)]
pub enum PhotoError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("photo request returned status {0}")]
    Status(u16),

    #[error("payload is not an image (content type {0:?})")]
    NotAnImage(Option<String>),

    #[error("photo payload is empty")]
    Empty,

    #[error("photo exceeds the {limit} byte limit")]
    TooLarge { limit: usize },
}

/// Raw fetched photo.
#[derive(Debug, Clone)]
pub struct PhotoPayload {
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

#[async_trait]
pub trait PhotoSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<PhotoPayload, PhotoError>;
}

/// Fetches photos over HTTP. No retries, and no timeout beyond the
/// client's defaults. Bodies larger than `max_bytes` are abandoned.
#[derive(Clone)]
pub struct HttpPhotoSource {
    client: Client,
    max_bytes: usize,
}

impl HttpPhotoSource {
    pub fn new(client: Client, max_bytes: usize) -> Self {
        Self { client, max_bytes }
    }
}

#[async_trait]
impl PhotoSource for HttpPhotoSource {
    async fn fetch(&self, url: &str) -> Result<PhotoPayload, PhotoError> {
        let mut response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PhotoError::Status(status.as_u16()));
        }

        let too_large = PhotoError::TooLarge {
            limit: self.max_bytes,
        };
        if response
            .content_length()
            .is_some_and(|len| len > self.max_bytes as u64)
        {
            return Err(too_large);
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        // Content-Length may be absent or wrong; enforce the cap while reading.
        let mut body = BytesMut::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(too_large);
            }
            body.extend_from_slice(&chunk);
        }

        Ok(PhotoPayload {
            content_type,
            bytes: body.freeze(),
        })
    }
}

/// Why the header is rendered without a photo.
#[derive(Debug, Clone, PartialEq)]
pub enum FallbackReason {
    /// Photo disabled in the export options.
    Disabled,
    /// Profile has no photo URL.
    NoPhoto,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PhotoOutcome {
    Embedded(ImageBlock),
    Fallback(FallbackReason),
}

/// Fetches and validates the profile photo, converting it to a data URI.
pub async fn embed_photo(
    source: &dyn PhotoSource,
    photo_url: Option<&str>,
    include_photo: bool,
) -> PhotoOutcome {
    if !include_photo {
        return PhotoOutcome::Fallback(FallbackReason::Disabled);
    }
    let Some(url) = photo_url.map(str::trim).filter(|u| !u.is_empty()) else {
        debug!("Profile has no photo URL, using text-only header");
        return PhotoOutcome::Fallback(FallbackReason::NoPhoto);
    };

    match fetch_image(source, url).await {
        Ok(image) => {
            debug!("Embedded profile photo from {url}");
            PhotoOutcome::Embedded(image)
        }
        Err(e) => {
            warn!("Could not embed profile photo from {url}: {e}");
            PhotoOutcome::Fallback(FallbackReason::Failed(e.to_string()))
        }
    }
}

async fn fetch_image(source: &dyn PhotoSource, url: &str) -> Result<ImageBlock, PhotoError> {
    let payload = source.fetch(url).await?;

    let mime = payload
        .content_type
        .as_deref()
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .filter(|ct| ct.starts_with("image/"))
        .ok_or_else(|| PhotoError::NotAnImage(payload.content_type.clone()))?;

    if payload.bytes.is_empty() {
        return Err(PhotoError::Empty);
    }

    Ok(ImageBlock {
        data_uri: to_data_uri(&mime, &payload.bytes),
        width_pt: PHOTO_SIZE_PT,
        height_pt: PHOTO_SIZE_PT,
    })
}

fn to_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", general_purpose::STANDARD.encode(bytes))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::{http::header, http::StatusCode, routing::get, Router};

    /// Source returning a canned result without touching the network.
    pub(crate) struct StubSource(pub Result<(Option<&'static str>, &'static [u8]), u16>);

    #[async_trait]
    impl PhotoSource for StubSource {
        async fn fetch(&self, _url: &str) -> Result<PhotoPayload, PhotoError> {
            match &self.0 {
                Ok((ct, bytes)) => Ok(PhotoPayload {
                    content_type: ct.map(str::to_string),
                    bytes: Bytes::from_static(*bytes),
                }),
                Err(status) => Err(PhotoError::Status(*status)),
            }
        }
    }

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G'];
    const TEST_LIMIT: usize = 1024;

    #[tokio::test]
    async fn test_embeds_image_as_data_uri() {
        let source = StubSource(Ok((Some("image/png"), PNG_MAGIC)));
        let outcome = embed_photo(&source, Some("https://cdn/p.png"), true).await;
        match outcome {
            PhotoOutcome::Embedded(image) => {
                assert_eq!(image.data_uri, "data:image/png;base64,iVBORw==");
                assert_eq!(image.width_pt, PHOTO_SIZE_PT);
            }
            other => panic!("expected embedded photo, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_content_type_parameters_are_ignored() {
        let source = StubSource(Ok((Some("Image/JPEG; charset=binary"), PNG_MAGIC)));
        let outcome = embed_photo(&source, Some("https://cdn/p.jpg"), true).await;
        assert!(matches!(
            outcome,
            PhotoOutcome::Embedded(ref img) if img.data_uri.starts_with("data:image/jpeg;base64,")
        ));
    }

    #[tokio::test]
    async fn test_disabled_never_fetches() {
        let source = StubSource(Err(500));
        let outcome = embed_photo(&source, Some("https://cdn/p.png"), false).await;
        assert_eq!(outcome, PhotoOutcome::Fallback(FallbackReason::Disabled));
    }

    #[tokio::test]
    async fn test_missing_url_falls_back() {
        let source = StubSource(Ok((Some("image/png"), PNG_MAGIC)));
        assert_eq!(
            embed_photo(&source, None, true).await,
            PhotoOutcome::Fallback(FallbackReason::NoPhoto)
        );
        assert_eq!(
            embed_photo(&source, Some("  "), true).await,
            PhotoOutcome::Fallback(FallbackReason::NoPhoto)
        );
    }

    #[tokio::test]
    async fn test_non_image_falls_back() {
        let source = StubSource(Ok((Some("text/html"), &b"<html></html>"[..])));
        let outcome = embed_photo(&source, Some("https://cdn/p.png"), true).await;
        assert!(matches!(outcome, PhotoOutcome::Fallback(FallbackReason::Failed(_))));
    }

    #[tokio::test]
    async fn test_empty_image_falls_back() {
        let source = StubSource(Ok((Some("image/png"), &b""[..])));
        let outcome = embed_photo(&source, Some("https://cdn/p.png"), true).await;
        assert!(matches!(outcome, PhotoOutcome::Fallback(FallbackReason::Failed(_))));
    }

    /// Serves a few fixed responses on a random local port.
    async fn start_photo_server() -> String {
        let app = Router::new()
            .route("/missing.png", get(|| async { StatusCode::NOT_FOUND }))
            .route(
                "/page.html",
                get(|| async { ([(header::CONTENT_TYPE, "text/html")], "<p>hi</p>") }),
            )
            .route(
                "/photo.png",
                get(|| async { ([(header::CONTENT_TYPE, "image/png")], PNG_MAGIC.to_vec()) }),
            )
            .route(
                "/huge.png",
                get(|| async { ([(header::CONTENT_TYPE, "image/png")], vec![0u8; TEST_LIMIT * 4]) }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_http_non_ok_status_falls_back() {
        let base = start_photo_server().await;
        let source = HttpPhotoSource::new(Client::new(), TEST_LIMIT);
        let outcome = embed_photo(&source, Some(&format!("{base}/missing.png")), true).await;
        assert_eq!(
            outcome,
            PhotoOutcome::Fallback(FallbackReason::Failed(
                "photo request returned status 404".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn test_http_html_payload_falls_back() {
        let base = start_photo_server().await;
        let source = HttpPhotoSource::new(Client::new(), TEST_LIMIT);
        let outcome = embed_photo(&source, Some(&format!("{base}/page.html")), true).await;
        assert!(matches!(outcome, PhotoOutcome::Fallback(FallbackReason::Failed(_))));
    }

    #[tokio::test]
    async fn test_http_image_is_embedded() {
        let base = start_photo_server().await;
        let source = HttpPhotoSource::new(Client::new(), TEST_LIMIT);
        let outcome = embed_photo(&source, Some(&format!("{base}/photo.png")), true).await;
        assert!(matches!(outcome, PhotoOutcome::Embedded(_)));
    }

    #[tokio::test]
    async fn test_http_oversized_image_falls_back() {
        let base = start_photo_server().await;
        let source = HttpPhotoSource::new(Client::new(), TEST_LIMIT);
        let outcome = embed_photo(&source, Some(&format!("{base}/huge.png")), true).await;
        assert_eq!(
            outcome,
            PhotoOutcome::Fallback(FallbackReason::Failed(
                "photo exceeds the 1024 byte limit".to_string()
            ))
        );
    }

    /// One-shot server whose image body has no Content-Length and ends at EOF.
    async fn start_unsized_server() -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let head = "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nConnection: close\r\n\r\n";
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(&vec![0u8; TEST_LIMIT * 4]).await;
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_http_body_without_length_is_capped_while_reading() {
        let base = start_unsized_server().await;
        let source = HttpPhotoSource::new(Client::new(), TEST_LIMIT);
        let outcome = embed_photo(&source, Some(&format!("{base}/photo.png")), true).await;
        assert!(matches!(outcome, PhotoOutcome::Fallback(FallbackReason::Failed(_))));
    }

    #[tokio::test]
    async fn test_unreachable_host_falls_back() {
        let source = HttpPhotoSource::new(Client::new(), TEST_LIMIT);
        let outcome = embed_photo(&source, Some("http://127.0.0.1:1/photo.png"), true).await;
        assert!(matches!(outcome, PhotoOutcome::Fallback(FallbackReason::Failed(_))));
    }
}
