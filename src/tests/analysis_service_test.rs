//! Analysis service state machine tests
//!
//! Drives the validated-rewrite workflow with a scripted LLM double and an
//! in-memory SQLite database; no network involved.

use async_trait::async_trait;
use serde_json::json;
use sqlx::SqlitePool;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::db;
use crate::services::AnalysisService;
use crate::services::llm::{
    LLMAnalysisRequestTrait, LLMAnalysisResponseTrait, LLMError, LLMService, ValidationFailure,
};
use crate::services::sql_analyzer::models::{Severity, ValidatorStatus};
use crate::services::sql_analyzer::heuristic_analysis;

// ============================================================================
// Scripted LLM double
// ============================================================================

/// LLM double that replays queued replies and counts calls
struct ScriptedLlm {
    enabled: bool,
    credential: bool,
    json_replies: Mutex<VecDeque<Result<serde_json::Value, LLMError>>>,
    text_replies: Mutex<VecDeque<Result<String, LLMError>>>,
    generator_calls: AtomicUsize,
    validator_calls: AtomicUsize,
}

impl ScriptedLlm {
    fn new(
        json_replies: Vec<Result<serde_json::Value, LLMError>>,
        text_replies: Vec<Result<String, LLMError>>,
    ) -> Self {
        Self {
            enabled: true,
            credential: true,
            json_replies: Mutex::new(json_replies.into()),
            text_replies: Mutex::new(text_replies.into()),
            generator_calls: AtomicUsize::new(0),
            validator_calls: AtomicUsize::new(0),
        }
    }

    fn without_credential() -> Self {
        let mut llm = Self::new(vec![], vec![]);
        llm.credential = false;
        llm
    }

    fn generator_calls(&self) -> usize {
        self.generator_calls.load(Ordering::SeqCst)
    }

    fn validator_calls(&self) -> usize {
        self.validator_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LLMService for ScriptedLlm {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn has_credential(&self) -> bool {
        self.credential
    }

    async fn analyze<Req, Resp>(&self, _request: &Req) -> Result<Resp, LLMError>
    where
        Req: LLMAnalysisRequestTrait,
        Resp: LLMAnalysisResponseTrait,
    {
        self.generator_calls.fetch_add(1, Ordering::SeqCst);
        let value = self
            .json_replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected generator call")?;
        serde_json::from_value(value).map_err(LLMError::from)
    }

    async fn analyze_text<Req>(&self, _request: &Req) -> Result<String, LLMError>
    where
        Req: LLMAnalysisRequestTrait,
    {
        self.validator_calls.fetch_add(1, Ordering::SeqCst);
        self.text_replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected validator call")
    }
}

// ============================================================================
// Helpers
// ============================================================================

async fn test_pool() -> SqlitePool {
    let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
    db::init_schema(&pool).await.unwrap();
    pool
}

async fn service_with(llm: ScriptedLlm) -> (Arc<ScriptedLlm>, AnalysisService<ScriptedLlm>, SqlitePool) {
    let pool = test_pool().await;
    let llm = Arc::new(llm);
    let service = AnalysisService::new(Arc::clone(&llm), pool.clone());
    (llm, service, pool)
}

fn generator_reply(rewrite: Option<&str>) -> Result<serde_json::Value, LLMError> {
    Ok(json!({
        "analysis": "joins multiply rows",
        "issues": ["COUNT(*) across joins double-counts"],
        "rewrittenQuery": rewrite,
        "suggestedIndexes": ["CREATE INDEX idx_orders_user_id ON orders(user_id);"],
    }))
}

fn valid_verdict() -> Result<String, LLMError> {
    Ok("VALID: YES\nExplanation: predicates, keys and cardinality unchanged.".to_string())
}

fn invalid_verdict(reason: &str) -> Result<String, LLMError> {
    Ok(format!("VALID: NO\nExplanation: {}", reason))
}

const SQL: &str = "SELECT COUNT(*) FROM orders JOIN users ON orders.user_id = users.id";

// ============================================================================
// Credential-absent path
// ============================================================================

#[tokio::test]
async fn test_no_credential_returns_heuristic_unmodified() {
    let (llm, service, _pool) = service_with(ScriptedLlm::without_credential()).await;

    let sql = "SELECT * FROM t";
    let result = service.analyze(sql, "MySQL").await;

    assert_eq!(result, heuristic_analysis(sql));
    assert_eq!(llm.generator_calls(), 0);
    assert_eq!(llm.validator_calls(), 0);
}

#[tokio::test]
async fn test_disabled_llm_returns_heuristic() {
    let mut llm = ScriptedLlm::new(vec![], vec![]);
    llm.enabled = false;
    let (llm, service, _pool) = service_with(llm).await;

    let result = service.analyze("SELECT * FROM t", "MySQL").await;
    assert_eq!(result, heuristic_analysis("SELECT * FROM t"));
    assert_eq!(llm.generator_calls(), 0);
}

// ============================================================================
// Passed paths
// ============================================================================

#[tokio::test]
async fn test_single_pass_valid() {
    let (llm, service, _pool) = service_with(ScriptedLlm::new(
        vec![generator_reply(Some("SELECT COUNT(o.id) FROM orders o JOIN users u ON o.user_id = u.id"))],
        vec![valid_verdict()],
    ))
    .await;

    let result = service.analyze(SQL, "MySQL").await;

    assert_eq!(llm.generator_calls(), 1);
    assert_eq!(llm.validator_calls(), 1);
    assert_eq!(result.validator_status, Some(ValidatorStatus::Valid));
    assert_eq!(result.semantic_warning, None);
    assert_eq!(result.score, 85);
    assert_eq!(result.severity, Severity::Medium);
    assert!((result.speedup_estimate - 0.5).abs() < f64::EPSILON);
    assert!(result.rewritten_query.unwrap().contains("COUNT(o.id)"));
    assert_eq!(result.issues, vec!["COUNT(*) across joins double-counts"]);
    assert!(result.suggested_index.contains("idx_orders_user_id"));
}

#[tokio::test]
async fn test_retry_then_valid() {
    let (llm, service, _pool) = service_with(ScriptedLlm::new(
        vec![
            generator_reply(Some("SELECT MAX(id) FROM orders")),
            generator_reply(Some("SELECT COUNT(DISTINCT o.id) FROM orders o JOIN users u ON o.user_id = u.id")),
        ],
        vec![invalid_verdict("point 4 fails, MAX substitution"), valid_verdict()],
    ))
    .await;

    let result = service.analyze(SQL, "MySQL").await;

    assert_eq!(llm.generator_calls(), 2);
    assert_eq!(llm.validator_calls(), 2);
    assert_eq!(result.validator_status, Some(ValidatorStatus::Valid));
    assert!(result.rewritten_query.unwrap().contains("COUNT(DISTINCT"));
}

// ============================================================================
// Retry ceiling
// ============================================================================

#[tokio::test]
async fn test_always_invalid_stops_after_one_retry_and_persists() {
    let (llm, service, pool) = service_with(ScriptedLlm::new(
        vec![
            generator_reply(Some("SELECT 1")),
            generator_reply(Some("SELECT 2")),
            // A third reply would mask an over-eager loop; it must stay queued
            generator_reply(Some("SELECT 3")),
        ],
        vec![
            invalid_verdict("drops the status predicate"),
            invalid_verdict("still drops the status predicate"),
            invalid_verdict("unreachable"),
        ],
    ))
    .await;

    let result = service.analyze(SQL, "MySQL").await;

    assert_eq!(llm.generator_calls(), 2);
    assert_eq!(llm.validator_calls(), 2);
    assert_eq!(result.validator_status, Some(ValidatorStatus::Invalid));
    assert_eq!(result.rewritten_query, None);
    assert_eq!(result.score, 70);
    assert!(result
        .semantic_warning
        .unwrap()
        .contains("still drops the status predicate"));

    // The terminal failure is recorded for human review
    let failures: Vec<ValidationFailure> =
        sqlx::query_as("SELECT * FROM validation_failures ORDER BY id")
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].original_query, SQL);
    assert_eq!(failures[0].attempted_rewrite, "SELECT 2");
    assert!(failures[0]
        .validator_explanation
        .contains("still drops the status predicate"));
}

// ============================================================================
// Transport/parse failures are terminal, never retried
// ============================================================================

#[tokio::test]
async fn test_generator_transport_failure_not_retried() {
    let (llm, service, pool) = service_with(ScriptedLlm::new(
        vec![Err(LLMError::ApiError("API error 503: upstream down".into()))],
        vec![],
    ))
    .await;

    let result = service.analyze(SQL, "MySQL").await;

    assert_eq!(llm.generator_calls(), 1);
    assert_eq!(llm.validator_calls(), 0);
    assert_eq!(result.score, 70);
    assert_eq!(result.validator_status, Some(ValidatorStatus::Invalid));
    assert_eq!(result.rewritten_query, None);
    assert!(result.semantic_warning.unwrap().contains("did not complete"));

    // Transport failures are not review material
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM validation_failures")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count.0, 0);
}

#[tokio::test]
async fn test_generator_parse_failure_treated_as_transport_failure() {
    let (llm, service, _pool) = service_with(ScriptedLlm::new(
        vec![Err(LLMError::ParseError("reply was not JSON".into()))],
        vec![],
    ))
    .await;

    let result = service.analyze(SQL, "MySQL").await;

    assert_eq!(llm.generator_calls(), 1);
    assert_eq!(llm.validator_calls(), 0);
    assert_eq!(result.validator_status, Some(ValidatorStatus::Invalid));
}

#[tokio::test]
async fn test_validator_transport_failure_is_terminal() {
    let (llm, service, _pool) = service_with(ScriptedLlm::new(
        vec![generator_reply(Some("SELECT 1"))],
        vec![Err(LLMError::Timeout(60))],
    ))
    .await;

    let result = service.analyze(SQL, "MySQL").await;

    assert_eq!(llm.generator_calls(), 1);
    assert_eq!(llm.validator_calls(), 1);
    assert_eq!(result.validator_status, Some(ValidatorStatus::Invalid));
    assert_eq!(result.rewritten_query, None);
}

#[tokio::test]
async fn test_retry_transport_failure_is_terminal() {
    let (llm, service, _pool) = service_with(ScriptedLlm::new(
        vec![
            generator_reply(Some("SELECT 1")),
            Err(LLMError::ApiError("API error 502".into())),
        ],
        vec![invalid_verdict("drops a predicate")],
    ))
    .await;

    let result = service.analyze(SQL, "MySQL").await;

    assert_eq!(llm.generator_calls(), 2);
    assert_eq!(llm.validator_calls(), 1);
    assert_eq!(result.validator_status, Some(ValidatorStatus::Invalid));
}

// ============================================================================
// No-rewrite replies
// ============================================================================

#[tokio::test]
async fn test_generator_without_rewrite_skips_validation() {
    let (llm, service, _pool) =
        service_with(ScriptedLlm::new(vec![generator_reply(None)], vec![])).await;

    let result = service.analyze(SQL, "MySQL").await;

    assert_eq!(llm.generator_calls(), 1);
    assert_eq!(llm.validator_calls(), 0);
    assert_eq!(result.validator_status, None);
    assert_eq!(result.rewritten_query, None);
    assert_eq!(result.issues, vec!["COUNT(*) across joins double-counts"]);
}

// ============================================================================
// Rewrite workflow (schema/plan-aware scenario)
// ============================================================================

#[tokio::test]
async fn test_rewrite_workflow_maps_response_fields() {
    let reply = Ok(json!({
        "analysis": "full scan on orders",
        "warnings": ["statistics may be stale"],
        "rewrittenQuery": "SELECT id FROM orders WHERE status = 'PAID'",
        "recommendedIndexes": ["CREATE INDEX idx_orders_status ON orders(status);"],
        "notes": "index-backed filter",
    }));
    let (llm, service, _pool) =
        service_with(ScriptedLlm::new(vec![reply], vec![valid_verdict()])).await;

    let result = service
        .rewrite(
            "SELECT * FROM orders WHERE status = 'PAID'",
            "PostgreSQL",
            Some("CREATE TABLE orders (id BIGINT, status TEXT)".into()),
            Some("Seq Scan on orders".into()),
        )
        .await;

    assert_eq!(llm.generator_calls(), 1);
    assert_eq!(llm.validator_calls(), 1);
    assert_eq!(result.validator_status, Some(ValidatorStatus::Valid));
    assert_eq!(result.issues, vec!["statistics may be stale"]);
    assert!(result.suggested_index.contains("idx_orders_status"));
}
