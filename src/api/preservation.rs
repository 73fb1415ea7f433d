//! Preservation comparison endpoints

use axum::{
    Json, Router,
    extract::{Multipart, State, multipart::MultipartRejection},
    routing::{get, post},
};

use super::dto::ApiResponse;
use crate::AppState;
use crate::auth::AdminIdentity;
use crate::error::AppError;
use crate::service::{ComparisonReport, ImageUpload, PreservationService};

/// Create preservation router
///
/// Routes:
/// - POST /preservation/compare - Compare two photos (admin, multipart)
/// - GET /preservation/health - Comparison service health
pub fn preservation_router() -> Router<AppState> {
    Router::new()
        .route("/preservation/compare", post(compare))
        .route("/preservation/health", get(health))
}

fn preservation_service(state: &AppState) -> PreservationService {
    PreservationService::new(
        state.http_client.clone(),
        state.config.preservation.clone(),
    )
}

/// POST /preservation/compare
///
/// Expects `baseline` and `comparison` image parts.
async fn compare(
    State(state): State<AppState>,
    AdminIdentity(admin): AdminIdentity,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ApiResponse<ComparisonReport>>, AppError> {
    let mut multipart = multipart?;
    let max_upload_bytes = state.storage.max_upload_bytes();

    let mut baseline: Option<ImageUpload> = None;
    let mut comparison: Option<ImageUpload> = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or("").to_string();
        if field_name != "baseline" && field_name != "comparison" {
            continue;
        }

        let file_name = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("{}.jpg", field_name));
        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let data = field.bytes().await?;

        if data.len() > max_upload_bytes {
            return Err(AppError::Validation(format!(
                "File too large: exceeds {} bytes",
                max_upload_bytes
            )));
        }

        let upload = ImageUpload {
            file_name,
            content_type,
            data: data.to_vec(),
        };
        if field_name == "baseline" {
            baseline = Some(upload);
        } else {
            comparison = Some(upload);
        }
    }

    let (Some(baseline), Some(comparison)) = (baseline, comparison) else {
        return Err(AppError::Validation(
            "Both baseline and comparison images are required".to_string(),
        ));
    };

    let report = preservation_service(&state)
        .compare(&admin, baseline, comparison)
        .await?;

    Ok(Json(ApiResponse::ok(report)))
}

/// GET /preservation/health
async fn health(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let upstream = preservation_service(&state).health().await?;
    Ok(Json(ApiResponse::ok(upstream)))
}
