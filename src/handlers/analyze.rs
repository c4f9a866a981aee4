//! SQL Analysis Handlers
//!
//! HTTP surface over the analysis pipeline: the validated-rewrite workflow,
//! the schema-aware rewrite workflow and the heuristic-only quick check.

use axum::extract::{Json, State};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use validator::Validate;

use crate::AppState;
use crate::services::sql_analyzer::{AnalysisResult, heuristic_analysis};
use crate::utils::clean_optional_string;
use crate::utils::error::ApiResult;

// ============================================================================
// Request/Response
// ============================================================================

fn default_engine() -> String {
    "MySQL".to_string()
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AnalyzeReq {
    #[validate(length(min = 1, message = "sql must not be empty"))]
    pub sql: String,
    /// Target database engine name used in the generated report
    #[serde(default = "default_engine")]
    pub engine: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RewriteReq {
    #[validate(length(min = 1, message = "sql must not be empty"))]
    pub sql: String,
    #[serde(default = "default_engine")]
    pub engine: String,
    /// CREATE TABLE statements or schema description, passed to the
    /// generator verbatim
    #[serde(default)]
    pub schema: Option<String>,
    /// EXPLAIN output, passed to the generator verbatim
    #[serde(default)]
    pub execution_plan: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AnalyzeResp {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<AnalysisResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub err: Option<String>,
    pub ms: u64,
}

impl AnalyzeResp {
    fn ok(data: AnalysisResult, ms: u64) -> Self {
        Self { ok: true, data: Some(data), err: None, ms }
    }
    fn fail(err: impl Into<String>, ms: u64) -> Self {
        Self { ok: false, data: None, err: Some(err.into()), ms }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/sql/analyze
#[utoipa::path(
    post,
    path = "/api/sql/analyze",
    request_body = AnalyzeReq,
    responses(
        (status = 200, description = "Analysis result", body = AnalyzeResp),
    ),
    tag = "SQL Analysis"
)]
pub async fn analyze(
    State(s): State<Arc<AppState>>,
    Json(req): Json<AnalyzeReq>,
) -> ApiResult<Json<AnalyzeResp>> {
    let t0 = std::time::Instant::now();
    let ms = || t0.elapsed().as_millis() as u64;

    if let Err(e) = req.validate() {
        return Ok(Json(AnalyzeResp::fail(e.to_string(), ms())));
    }

    tracing::info!("SQL analysis requested, engine={}, {} chars", req.engine, req.sql.len());

    let result = s.analysis_service.analyze(&req.sql, &req.engine).await;
    Ok(Json(AnalyzeResp::ok(result, ms())))
}

/// POST /api/sql/rewrite
#[utoipa::path(
    post,
    path = "/api/sql/rewrite",
    request_body = RewriteReq,
    responses(
        (status = 200, description = "Validated rewrite result", body = AnalyzeResp),
    ),
    tag = "SQL Analysis"
)]
pub async fn rewrite(
    State(s): State<Arc<AppState>>,
    Json(req): Json<RewriteReq>,
) -> ApiResult<Json<AnalyzeResp>> {
    let t0 = std::time::Instant::now();
    let ms = || t0.elapsed().as_millis() as u64;

    if let Err(e) = req.validate() {
        return Ok(Json(AnalyzeResp::fail(e.to_string(), ms())));
    }

    let schema = clean_optional_string(req.schema.as_ref());
    let execution_plan = clean_optional_string(req.execution_plan.as_ref());

    tracing::info!(
        "SQL rewrite requested, engine={}, schema={}, plan={}",
        req.engine,
        schema.is_some(),
        execution_plan.is_some()
    );

    let result = s
        .analysis_service
        .rewrite(&req.sql, &req.engine, schema, execution_plan)
        .await;
    Ok(Json(AnalyzeResp::ok(result, ms())))
}

/// POST /api/sql/analyze/quick
///
/// Heuristic-only analysis; never calls the text-generation service. Serves
/// unauthenticated/free-tier callers.
#[utoipa::path(
    post,
    path = "/api/sql/analyze/quick",
    request_body = AnalyzeReq,
    responses(
        (status = 200, description = "Heuristic analysis result", body = AnalyzeResp),
    ),
    tag = "SQL Analysis"
)]
pub async fn analyze_quick(Json(req): Json<AnalyzeReq>) -> ApiResult<Json<AnalyzeResp>> {
    let t0 = std::time::Instant::now();
    let ms = || t0.elapsed().as_millis() as u64;

    if let Err(e) = req.validate() {
        return Ok(Json(AnalyzeResp::fail(e.to_string(), ms())));
    }

    let result = heuristic_analysis(&req.sql);
    Ok(Json(AnalyzeResp::ok(result, ms())))
}

// ============================================================================
// Unit Tests
// ============================================================================
