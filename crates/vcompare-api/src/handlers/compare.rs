//! Comparison handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use serde::Deserialize;
use tracing::info;
use vcompare_models::{ComparisonResponse, PlaybackSpeed};

use crate::error::{ApiError, ApiResult};
use crate::services::{CompareUpload, UploadedVideo};
use crate::state::AppState;

/// Compare two uploaded videos.
///
/// Multipart fields: `video1`, `video2`, `comparison_method`, `playback_speed`.
pub async fn compare_videos(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<ComparisonResponse>> {
    info!("Received request to /compare");

    let mut upload = CompareUpload::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart request: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "video1" | "video2" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {}", e)))?;
                let video = Some(UploadedVideo { filename, data });
                if name == "video1" {
                    upload.video1 = video;
                } else {
                    upload.video2 = video;
                }
            }
            "comparison_method" | "playback_speed" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Invalid form field {}: {}", name, e)))?;
                if name == "comparison_method" {
                    upload.comparison_method = Some(value);
                } else {
                    upload.playback_speed = Some(PlaybackSpeed::Text(value));
                }
            }
            _ => {}
        }
    }

    let response = state.comparisons.compare_uploads(upload).await?;
    Ok(Json(response))
}

/// Body of a `/compare_local` request.
#[derive(Debug, Default, Deserialize)]
pub struct CompareLocalRequest {
    #[serde(default)]
    pub comparison_method: Option<String>,
    #[serde(default)]
    pub playback_speed: Option<PlaybackSpeed>,
}

/// Compare the server's two sample videos.
///
/// Malformed or mistyped bodies are reported through `ApiError` as 400s.
pub async fn compare_local(
    State(state): State<AppState>,
    payload: Result<Json<CompareLocalRequest>, JsonRejection>,
) -> ApiResult<Json<ComparisonResponse>> {
    info!("Received request to /compare_local");

    let Json(request) = payload
        .map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {}", e.body_text())))?;

    let response = state
        .comparisons
        .compare_local(
            request.comparison_method.as_deref(),
            request.playback_speed.as_ref(),
        )
        .await?;
    Ok(Json(response))
}
