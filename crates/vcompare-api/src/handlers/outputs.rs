//! Output file delivery.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, Request};
use axum::response::{IntoResponse, Response};
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::{info, warn};
use vcompare_storage::StorageError;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Stream a generated comparison video inline.
///
/// Range requests are answered by `ServeFile`, so browsers can seek.
pub async fn serve_output(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    request: Request<Body>,
) -> ApiResult<Response> {
    info!(filename = %filename, "Serving output file");

    let path = match state.comparisons.store().resolve_output(&filename).await {
        Ok(path) => path,
        Err(e) => {
            if matches!(e, StorageError::NotFound(_)) {
                warn!(filename = %filename, "Requested output file not found");
            }
            return Err(e.into());
        }
    };

    let mut response = ServeFile::new(&path)
        .oneshot(request)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to serve {}: {}", path.display(), e)))?
        .into_response();

    response
        .headers_mut()
        .insert(header::CONTENT_DISPOSITION, HeaderValue::from_static("inline"));

    Ok(response)
}
