//! LLM API Handlers
//!
//! REST API endpoints for LLM provider management.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;
use crate::services::llm::{
    CreateProviderRequest, LLMError, LLMProviderInfo, LLMService, UpdateProviderRequest,
};
use crate::utils::error::{ApiError, ApiResult};

// ============================================================================
// Provider Management APIs
// ============================================================================

/// List all LLM providers
/// GET /api/llm/providers
pub async fn list_providers(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let providers = state.llm_service.list_providers().await?;
    Ok(Json(providers))
}

/// Get provider by ID
/// GET /api/llm/providers/:id
pub async fn get_provider(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let provider = state
        .llm_service
        .get_provider(id)
        .await?
        .ok_or(ApiError::Llm(LLMError::ProviderNotFound(id.to_string())))?;
    Ok(Json(provider))
}

/// Get active provider
/// GET /api/llm/providers/active
pub async fn get_active_provider(
    State(state): State<Arc<AppState>>,
) -> ApiResult<impl IntoResponse> {
    let provider = state.llm_service.get_active_provider_info().await?;
    Ok(Json(provider))
}

/// Create a new provider
/// POST /api/llm/providers
pub async fn create_provider(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateProviderRequest>,
) -> ApiResult<impl IntoResponse> {
    let provider = state.llm_service.create_provider(req).await?;
    Ok((StatusCode::CREATED, Json(LLMProviderInfo::from(&provider))))
}

/// Update a provider
/// PUT /api/llm/providers/:id
pub async fn update_provider(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateProviderRequest>,
) -> ApiResult<impl IntoResponse> {
    let provider = state.llm_service.update_provider(id, req).await?;
    Ok(Json(LLMProviderInfo::from(&provider)))
}

/// Delete a provider
/// DELETE /api/llm/providers/:id
pub async fn delete_provider(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    state.llm_service.delete_provider(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Activate a provider
/// POST /api/llm/providers/:id/activate
pub async fn activate_provider(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    state.llm_service.activate_provider(id).await?;
    let provider = state
        .llm_service
        .get_provider(id)
        .await?
        .ok_or(ApiError::Llm(LLMError::ProviderNotFound(id.to_string())))?;
    Ok(Json(provider))
}

/// Deactivate a provider
/// POST /api/llm/providers/:id/deactivate
pub async fn deactivate_provider(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    state.llm_service.deactivate_provider(id).await?;
    let provider = state
        .llm_service
        .get_provider(id)
        .await?
        .ok_or(ApiError::Llm(LLMError::ProviderNotFound(id.to_string())))?;
    Ok(Json(provider))
}

/// Test connection to a provider
/// POST /api/llm/providers/:id/test
pub async fn test_provider_connection(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let result = state.llm_service.test_connection(id).await?;
    Ok(Json(result))
}

// ============================================================================
// Status API
// ============================================================================

/// Get LLM service status
/// GET /api/llm/status
pub async fn get_status(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let providers = state.llm_service.list_providers().await?;
    let active_provider = providers.iter().find(|p| p.is_active);

    Ok(Json(LLMStatusResponse {
        enabled: state.llm_service.is_enabled(),
        has_credential: state.llm_service.has_credential().await,
        active_provider: active_provider.cloned(),
        provider_count: providers.len(),
    }))
}

#[derive(Serialize)]
pub struct LLMStatusResponse {
    pub enabled: bool,
    pub has_credential: bool,
    pub active_provider: Option<LLMProviderInfo>,
    pub provider_count: usize,
}
