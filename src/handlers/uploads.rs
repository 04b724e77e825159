use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    response::IntoResponse,
    routing::post,
    Router,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::errors::ApiError;
use crate::handlers::common::created_response;
use crate::AppState;

const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

// Headroom over the image cap for multipart boundaries and part headers
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// The route carries its own body limit; axum's built-in 2 MB default
/// would otherwise reject images under the configured cap.
pub fn admin_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new().route("/uploads", post(upload_image)).layer(
        DefaultBodyLimit::max(max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES)),
    )
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
}

/// Accepts a multipart `image` field and stores it under the uploads
/// directory with a collision-resistant generated name. The public URL
/// is served by the static `/uploads` mount.
async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let original_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ApiError::BadRequest("Image field must carry a filename".into()))?;
        let extension = Path::new(&original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| ApiError::BadRequest("Image filename has no extension".into()))?;
        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ApiError::BadRequest(format!(
                "Unsupported image type '.{}'; allowed: {}",
                extension,
                ALLOWED_EXTENSIONS.join(", ")
            )));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;
        if data.is_empty() {
            return Err(ApiError::BadRequest("Uploaded image is empty".into()));
        }
        if data.len() > state.config.max_upload_bytes {
            return Err(ApiError::BadRequest(format!(
                "Image exceeds the {} byte limit",
                state.config.max_upload_bytes
            )));
        }

        let filename = format!(
            "{}-{:09}.{}",
            chrono::Utc::now().timestamp_millis(),
            rand::thread_rng().gen_range(0..1_000_000_000u32),
            extension
        );

        tokio::fs::create_dir_all(&state.config.uploads_dir)
            .await
            .map_err(|_| ApiError::InternalServerError)?;
        let path = Path::new(&state.config.uploads_dir).join(&filename);
        tokio::fs::write(&path, &data)
            .await
            .map_err(|_| ApiError::InternalServerError)?;

        info!("Stored upload {} ({} bytes)", filename, data.len());
        return Ok(created_response(UploadResponse {
            url: format!("/uploads/{}", filename),
        }));
    }

    Err(ApiError::BadRequest(
        "Multipart body must contain an 'image' field".into(),
    ))
}
