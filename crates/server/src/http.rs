//! The HTTP surface: one route serving screenshots.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::get;

use webshot_core::config::CaptureDefaults;

use crate::capture::Coordinator;
use crate::error::HttpError;
use crate::query::parse_request;

/// Shared per-process state handed to every request task.
#[derive(Clone)]
pub struct AppState {
    pub defaults: CaptureDefaults,
    pub coordinator: Arc<Coordinator>,
}

/// Build the application router: `GET /` serves screenshots, everything
/// else is a 404.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(serve_screenshot))
        .fallback(|| async { (StatusCode::NOT_FOUND, "404 - not found") })
        .with_state(state)
}

async fn serve_screenshot(
    State(state): State<AppState>, Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, HttpError> {
    let request = parse_request(&params, &state.defaults);
    let outcome = state.coordinator.handle(&request).await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], outcome.image))
}
