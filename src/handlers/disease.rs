use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::clients::disease::Diagnosis;
use crate::error::{AppError, AppResult};
use crate::AppState;

/// Predict rice crop disease from an uploaded leaf image (multipart field `file`)
pub async fn predict_disease(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<Diagnosis>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        if let Some(content_type) = field.content_type() {
            if !content_type.starts_with("image/") {
                return Err(AppError::BadRequest(format!(
                    "Expected an image upload, got {}",
                    content_type
                )));
            }
        }

        let filename = field.file_name().unwrap_or("upload.jpg").to_string();
        let image = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;

        if image.is_empty() {
            return Err(AppError::BadRequest("No image provided".to_string()));
        }

        let diagnosis = state.disease.predict(image.to_vec(), &filename).await?;
        tracing::info!(
            disease = %diagnosis.disease,
            confidence = ?diagnosis.confidence,
            "Disease predicted"
        );

        return Ok(Json(diagnosis));
    }

    Err(AppError::BadRequest("No image provided".to_string()))
}
