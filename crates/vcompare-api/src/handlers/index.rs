//! Front-end entry page.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use tracing::warn;

use crate::state::AppState;

/// Serve the single-page front end.
pub async fn index(State(state): State<AppState>) -> Response {
    match tokio::fs::read_to_string(&state.compare.index_page).await {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            warn!(path = %state.compare.index_page.display(), "Frontend page unavailable: {}", e);
            (StatusCode::NOT_FOUND, "Error: Frontend HTML file not found.").into_response()
        }
    }
}
