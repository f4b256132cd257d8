use axum::{extract::State, http::HeaderMap, Json};
use serde_json::{json, Value};

use crate::auth::authorize;
use crate::errors::AppError;
use crate::state::AppState;

/// GET /prompt
/// Admin-gated. Returns the current rubric as stored; a missing or
/// corrupt rubric file surfaces as a server error, never as a default.
pub async fn handle_get_rubric(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    authorize(&headers, &state.config)?;
    let rubric = state.rubric.load_raw().await?;
    Ok(Json(rubric))
}

/// PUT /prompt
/// Admin-gated. Overwrites the rubric with the request body. The body
/// must be a JSON object; beyond that the operator is trusted.
pub async fn handle_update_rubric(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(new_rubric): Json<Value>,
) -> Result<Json<Value>, AppError> {
    authorize(&headers, &state.config)?;
    state.rubric.save(&new_rubric).await?;
    tracing::info!("Rubric updated via admin surface");
    Ok(Json(json!({ "msg": "Prompt updated" })))
}
