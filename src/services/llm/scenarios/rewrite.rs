//! Rewrite-focused scenario
//!
//! Used when the caller supplies schema and/or execution-plan context. Same
//! preservation rules as the generic analyzer, richer working method and a
//! wider output contract.

use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::{RewriteCandidate, SEMANTIC_CHECK_PHRASE};
use crate::services::llm::models::LLMScenario;
use crate::services::llm::service::{LLMAnalysisRequestTrait, LLMAnalysisResponseTrait};
use crate::services::sql_analyzer::models::{DetectedPattern, SqlStructure};

const PROMPT: &str = include_str!("rewrite_prompt.md");

// ============================================================================
// Request
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct SqlRewriteReq {
    pub sql: String,
    pub engine: String,
    #[serde(skip_serializing)]
    pub structure: SqlStructure,
    #[serde(skip_serializing)]
    pub patterns: Vec<DetectedPattern>,
    /// User-supplied CREATE TABLE statements or schema description, verbatim
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// User-supplied EXPLAIN output, verbatim
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_plan: Option<String>,
    /// Validator explanation injected on the single retry
    #[serde(skip_serializing)]
    pub feedback: Option<String>,
}

impl SqlRewriteReq {
    pub fn build_prompt(&self) -> String {
        let mut prompt = PROMPT
            .replace("{engine}", &self.engine)
            .replace("{semantic_check_phrase}", SEMANTIC_CHECK_PHRASE);

        prompt.push_str("\n\n# Query Structure\n\n```json\n");
        prompt.push_str(
            &serde_json::to_string_pretty(&self.structure).unwrap_or_else(|_| "{}".into()),
        );
        prompt.push_str("\n```\n");

        prompt.push_str("\n# Detected Anti-Patterns\n\n");
        if self.patterns.is_empty() {
            prompt.push_str("None.\n");
        } else {
            for p in &self.patterns {
                prompt.push_str(&format!(
                    "- [{}] {}: {}\n",
                    p.severity.as_str(),
                    p.pattern_type,
                    p.message
                ));
            }
        }

        if let Some(schema) = &self.schema {
            prompt.push_str("\n# Table Schema (user-supplied)\n\n```sql\n");
            prompt.push_str(schema);
            prompt.push_str("\n```\n");
        }

        if let Some(plan) = &self.execution_plan {
            prompt.push_str("\n# Execution Plan (user-supplied)\n\n```\n");
            prompt.push_str(plan);
            prompt.push_str("\n```\n");
        }

        if let Some(feedback) = &self.feedback {
            prompt.push_str(
                "\n# Corrective Feedback\n\nYour previous rewrite failed semantic validation. \
                 Fix the problems described below or return a null rewrite:\n\n",
            );
            prompt.push_str(feedback);
            prompt.push('\n');
        }

        prompt.push_str("\n# Query To Optimize\n\n```sql\n");
        prompt.push_str(&self.sql);
        prompt.push_str("\n```\n");

        prompt
    }
}

impl LLMAnalysisRequestTrait for SqlRewriteReq {
    fn scenario(&self) -> LLMScenario {
        LLMScenario::SqlRewrite
    }

    fn system_prompt(&self) -> String {
        self.build_prompt()
    }

    fn sql_hash(&self) -> String {
        let mut h = DefaultHasher::new();
        self.sql
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .hash(&mut h);
        format!("{:x}", h.finish())
    }
}

// ============================================================================
// Response
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SqlRewriteResp {
    #[serde(default)]
    pub analysis: String,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default, rename = "rewrittenQuery")]
    pub rewritten_query: Option<String>,
    #[serde(default, rename = "recommendedIndexes")]
    pub recommended_indexes: Vec<String>,
    #[serde(default)]
    pub notes: String,
}

impl SqlRewriteResp {
    /// Whether the generator claims to have run its own semantic check
    pub fn claims_semantic_check(&self) -> bool {
        self.analysis.contains(SEMANTIC_CHECK_PHRASE) && self.notes.contains(SEMANTIC_CHECK_PHRASE)
    }
}

impl LLMAnalysisResponseTrait for SqlRewriteResp {
    fn summary(&self) -> &str {
        &self.analysis
    }
}

impl RewriteCandidate for SqlRewriteResp {
    fn analysis(&self) -> &str {
        &self.analysis
    }
    fn rewritten_query(&self) -> Option<&str> {
        self.rewritten_query.as_deref().filter(|q| !q.trim().is_empty())
    }
    fn issues(&self) -> Vec<String> {
        self.warnings.clone()
    }
    fn index_suggestions(&self) -> &[String] {
        &self.recommended_indexes
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::sql_analyzer::{detect, parse};

    fn sample_req() -> SqlRewriteReq {
        let sql = "SELECT * FROM orders WHERE status = 'PAID' ORDER BY created_at";
        let structure = parse(sql);
        let patterns = detect(&structure);
        SqlRewriteReq {
            sql: sql.to_string(),
            engine: "PostgreSQL".to_string(),
            structure,
            patterns,
            schema: Some("CREATE TABLE orders (id BIGINT PRIMARY KEY, status TEXT)".to_string()),
            execution_plan: Some("Seq Scan on orders (cost=0.00..431.00)".to_string()),
            feedback: None,
        }
    }

    #[test]
    fn test_prompt_contains_all_sections() {
        let prompt = sample_req().build_prompt();
        assert!(prompt.contains("PostgreSQL query optimizer"));
        assert!(prompt.contains("\"tables\""));
        assert!(prompt.contains("CREATE TABLE orders (id BIGINT PRIMARY KEY, status TEXT)"));
        assert!(prompt.contains("Seq Scan on orders (cost=0.00..431.00)"));
        assert!(prompt.contains("Forbidden Transformations"));
        assert!(prompt.contains("recommendedIndexes"));
        assert!(prompt.contains("SELECT * FROM orders WHERE status = 'PAID'"));
    }

    #[test]
    fn test_prompt_omits_absent_context() {
        let mut req = sample_req();
        req.schema = None;
        req.execution_plan = None;
        let prompt = req.build_prompt();
        assert!(!prompt.contains("Table Schema (user-supplied)"));
        assert!(!prompt.contains("Execution Plan (user-supplied)"));
    }

    #[test]
    fn test_prompt_mentions_forbidden_rewrites() {
        let prompt = sample_req().build_prompt();
        assert!(prompt.contains("ORDER BY ... LIMIT 1"));
        assert!(prompt.contains("COUNT(DISTINCT"));
        assert!(prompt.contains("GROUP BY keys"));
    }

    #[test]
    fn test_semantic_check_claim_requires_both_fields() {
        let mut resp = SqlRewriteResp {
            analysis: format!("Looks safe. {}", SEMANTIC_CHECK_PHRASE),
            notes: "no check".into(),
            ..Default::default()
        };
        assert!(!resp.claims_semantic_check());

        resp.notes = SEMANTIC_CHECK_PHRASE.to_string();
        assert!(resp.claims_semantic_check());
    }

    #[test]
    fn test_response_tolerates_missing_fields() {
        let resp: SqlRewriteResp = serde_json::from_str("{\"analysis\": \"x\"}").unwrap();
        assert_eq!(resp.analysis, "x");
        assert!(resp.rewritten_query.is_none());
        assert!(resp.recommended_indexes.is_empty());
    }
}
