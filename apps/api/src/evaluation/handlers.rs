use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;

use crate::errors::AppError;
use crate::evaluation::{evaluate, EvaluationResult};
use crate::extract::extract_text;
use crate::state::AppState;

/// POST /validate
/// Multipart document upload → Evaluation Result JSON.
///
/// Every failure along the pipeline (upload, decoding, rubric load,
/// external calls, response parsing) comes back as a single error
/// response; a partial result is never returned.
pub async fn handle_validate(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<EvaluationResult>, AppError> {
    let document = read_document_field(&mut multipart).await?;

    let text = extract_text(&document).map_err(|e| AppError::Decoding(e.to_string()))?;
    tracing::debug!("Extracted {} chars of document text", text.len());

    let rubric = state.rubric.load().await?;
    let result = evaluate(state.llm.as_ref(), &rubric, &text).await?;

    Ok(Json(result))
}

/// Pulls the uploaded document out of the multipart body: the `file`
/// field, or failing that the first field carrying a filename.
async fn read_document_field(multipart: &mut Multipart) -> Result<Bytes, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?
    {
        let is_document = field.name() == Some("file") || field.file_name().is_some();
        if is_document {
            return field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(e.to_string()));
        }
    }

    Err(AppError::Validation(
        "multipart upload must include a document file field".to_string(),
    ))
}
