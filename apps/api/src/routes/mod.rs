pub mod health;

use std::path::Path;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::services::{ServeDir, ServeFile};

use crate::evaluation::handlers::handle_validate;
use crate::rubric::handlers::{handle_get_rubric, handle_update_rubric};
use crate::state::AppState;

/// Uploads are whole word-processor documents; the axum default body
/// limit (2 MB) is too tight for them.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let static_dir = Path::new(&state.config.static_dir);
    // Unmatched paths fall through to the client entry page (SPA routing)
    let spa = ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/validate",
            post(handle_validate).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/prompt", get(handle_get_rubric).put(handle_update_rubric))
        .fallback_service(spa)
        .with_state(state)
}
