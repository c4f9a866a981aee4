//! Human-review handlers
//!
//! Surfaces rewrites that permanently failed semantic validation.

use axum::Json;
use axum::extract::State;
use std::sync::Arc;

use crate::AppState;
use crate::services::llm::ValidationFailure;
use crate::utils::error::ApiResult;

/// List recorded validation failures, newest first
/// GET /api/review/validation-failures
#[utoipa::path(
    get,
    path = "/api/review/validation-failures",
    responses(
        (status = 200, description = "Recorded validation failures", body = [ValidationFailure]),
    ),
    tag = "Review"
)]
pub async fn list_validation_failures(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<ValidationFailure>>> {
    let failures = state.analysis_service.list_validation_failures().await?;
    Ok(Json(failures))
}
