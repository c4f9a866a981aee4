//! Analysis Service - the validated-rewrite workflow
//!
//! Drives the full pipeline: structural extraction, pattern detection,
//! LLM-backed rewrite generation and semantic validation with a single
//! bounded retry. Every entry point returns a well-formed
//! [`AnalysisResult`]; failures are expressed through the result's fields,
//! never as errors.
//!
//! # Workflow states
//! ```text
//! NoCredential ──────────────────────────────▶ heuristic result
//! FirstPass ──call failed──────────────────────▶ Failed
//!     │ ok
//!     ▼
//! Validate ──valid──▶ Passed
//!     │ invalid (first time)
//!     ▼
//! Retry (with validator feedback) ──call failed─▶ Failed
//!     │ ok
//!     ▼
//! Validate ──valid──▶ Passed
//!     │ invalid
//!     ▼
//! Failed + validation-failure record persisted
//! ```
//! Transport and parse failures are terminal; only a validation failure
//! triggers the retry, and exactly once.

use sqlx::SqlitePool;
use std::sync::Arc;

use crate::services::llm::{
    LLMAnalysisRequestTrait, LLMAnalysisResponseTrait, LLMError, LLMService, RewriteCandidate,
    RewriteValidationReq, SqlAnalysisReq, SqlAnalysisResp, SqlRewriteReq, SqlRewriteResp,
    ValidationFailure, ValidatorVerdict,
};
use crate::services::sql_analyzer::models::{AnalysisResult, Severity, ValidatorStatus};
use crate::services::sql_analyzer::{detect, heuristic_analysis, parse};

/// Placeholder score for a rewrite that passed validation; there is no
/// measurement infrastructure behind it
const VALIDATED_SCORE: u8 = 85;
/// Placeholder speedup estimate for a validated rewrite
const VALIDATED_SPEEDUP: f64 = 0.5;
/// Low-confidence score for failed analyses
const FAILURE_SCORE: u8 = 70;
/// A single retry bounds external-service cost and latency
const MAX_RETRIES: u8 = 1;

/// Analysis orchestration service
pub struct AnalysisService<S: LLMService> {
    llm: Arc<S>,
    pool: SqlitePool,
}

impl<S: LLMService> AnalysisService<S> {
    pub fn new(llm: Arc<S>, pool: SqlitePool) -> Self {
        Self { llm, pool }
    }

    /// Analyze a query through the validated-rewrite workflow.
    ///
    /// Falls back to the local heuristic analyzer when no text-generation
    /// credential is configured.
    pub async fn analyze(&self, sql: &str, engine: &str) -> AnalysisResult {
        if !self.has_generation_credential().await {
            tracing::debug!("no LLM credential configured, using heuristic analysis");
            return heuristic_analysis(sql);
        }

        let structure = parse(sql);
        let patterns = detect(&structure);
        self.run_validated::<SqlAnalysisReq, SqlAnalysisResp, _>(sql, |feedback| SqlAnalysisReq {
            sql: sql.to_string(),
            engine: engine.to_string(),
            structure: structure.clone(),
            patterns: patterns.clone(),
            feedback,
        })
        .await
    }

    /// Rewrite a query with optional user-supplied schema and execution-plan
    /// context, through the same validated workflow.
    pub async fn rewrite(
        &self,
        sql: &str,
        engine: &str,
        schema: Option<String>,
        execution_plan: Option<String>,
    ) -> AnalysisResult {
        if !self.has_generation_credential().await {
            tracing::debug!("no LLM credential configured, using heuristic analysis");
            return heuristic_analysis(sql);
        }

        let structure = parse(sql);
        let patterns = detect(&structure);
        self.run_validated::<SqlRewriteReq, SqlRewriteResp, _>(sql, |feedback| SqlRewriteReq {
            sql: sql.to_string(),
            engine: engine.to_string(),
            structure: structure.clone(),
            patterns: patterns.clone(),
            schema: schema.clone(),
            execution_plan: execution_plan.clone(),
            feedback,
        })
        .await
    }

    /// Validation failures recorded for human review, newest first
    pub async fn list_validation_failures(&self) -> Result<Vec<ValidationFailure>, sqlx::Error> {
        sqlx::query_as::<_, ValidationFailure>(
            "SELECT * FROM validation_failures ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn has_generation_credential(&self) -> bool {
        self.llm.is_enabled() && self.llm.has_credential().await
    }

    /// The generate → validate → retry-once state machine
    async fn run_validated<Req, Resp, F>(&self, sql: &str, make_req: F) -> AnalysisResult
    where
        Req: LLMAnalysisRequestTrait,
        Resp: LLMAnalysisResponseTrait + RewriteCandidate,
        F: Fn(Option<String>) -> Req,
    {
        // FirstPass
        let mut candidate: Resp = match self.llm.analyze(&make_req(None)).await {
            Ok(resp) => resp,
            Err(e) => return generation_failure(e),
        };

        let mut retries = 0u8;
        loop {
            let Some(rewritten) = candidate.rewritten_query().map(str::to_string) else {
                // Generator declined to rewrite; nothing to validate
                return unvalidated(&candidate);
            };

            // Validate
            let verdict_req = RewriteValidationReq {
                original_sql: sql.to_string(),
                rewritten_sql: rewritten.clone(),
            };
            let verdict = match self.llm.analyze_text(&verdict_req).await {
                Ok(text) => ValidatorVerdict::parse(&text),
                Err(e) => return generation_failure(e),
            };

            if verdict.valid {
                tracing::info!("rewrite validated after {} retries", retries);
                return passed(&candidate, rewritten);
            }

            if retries >= MAX_RETRIES {
                tracing::warn!("rewrite failed validation twice, recording for review");
                if let Err(e) = self
                    .record_validation_failure(sql, &rewritten, &verdict.explanation)
                    .await
                {
                    tracing::error!("failed to persist validation failure: {}", e);
                }
                return validation_failure(&candidate, verdict.explanation);
            }

            // Retry with the validator's explanation as corrective input
            retries += 1;
            candidate = match self.llm.analyze(&make_req(Some(verdict.explanation))).await {
                Ok(resp) => resp,
                Err(e) => return generation_failure(e),
            };
        }
    }

    async fn record_validation_failure(
        &self,
        original_query: &str,
        attempted_rewrite: &str,
        validator_explanation: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"INSERT INTO validation_failures
               (original_query, attempted_rewrite, validator_explanation)
               VALUES (?, ?, ?)"#,
        )
        .bind(original_query)
        .bind(attempted_rewrite)
        .bind(validator_explanation)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

// ============================================================================
// Terminal-state result constructors
// ============================================================================

fn generation_failure(e: LLMError) -> AnalysisResult {
    AnalysisResult {
        score: FAILURE_SCORE,
        severity: Severity::Medium,
        issues: vec![],
        suggested_index: String::new(),
        rewritten_query: None,
        speedup_estimate: 0.0,
        validator_status: Some(ValidatorStatus::Invalid),
        semantic_warning: Some(format!("Analysis did not complete: {}", e)),
    }
}

fn passed(candidate: &impl RewriteCandidate, rewritten: String) -> AnalysisResult {
    AnalysisResult {
        score: VALIDATED_SCORE,
        severity: Severity::Medium,
        issues: candidate.issues(),
        suggested_index: candidate.index_suggestions().join("\n"),
        rewritten_query: Some(rewritten),
        speedup_estimate: VALIDATED_SPEEDUP,
        validator_status: Some(ValidatorStatus::Valid),
        semantic_warning: None,
    }
}

fn unvalidated(candidate: &impl RewriteCandidate) -> AnalysisResult {
    AnalysisResult {
        score: VALIDATED_SCORE,
        severity: Severity::Medium,
        issues: candidate.issues(),
        suggested_index: candidate.index_suggestions().join("\n"),
        rewritten_query: None,
        speedup_estimate: 0.0,
        validator_status: None,
        semantic_warning: None,
    }
}

fn validation_failure(candidate: &impl RewriteCandidate, explanation: String) -> AnalysisResult {
    AnalysisResult {
        score: FAILURE_SCORE,
        severity: Severity::Medium,
        issues: candidate.issues(),
        suggested_index: candidate.index_suggestions().join("\n"),
        rewritten_query: None,
        speedup_estimate: 0.0,
        validator_status: Some(ValidatorStatus::Invalid),
        semantic_warning: Some(explanation),
    }
}
