//! Generic SQL analysis scenario
//!
//! First pass of the validated-rewrite workflow: explain the problems and
//! propose a rewrite from the query, its structure and the detected
//! patterns alone (no schema or plan context).

use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::{RewriteCandidate, SEMANTIC_CHECK_PHRASE};
use crate::services::llm::models::LLMScenario;
use crate::services::llm::service::{LLMAnalysisRequestTrait, LLMAnalysisResponseTrait};
use crate::services::sql_analyzer::models::{DetectedPattern, SqlStructure};

const PROMPT: &str = include_str!("analyze_prompt.md");

// ============================================================================
// Request
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct SqlAnalysisReq {
    pub sql: String,
    pub engine: String,
    #[serde(skip_serializing)]
    pub structure: SqlStructure,
    #[serde(skip_serializing)]
    pub patterns: Vec<DetectedPattern>,
    /// Validator explanation injected on the single retry
    #[serde(skip_serializing)]
    pub feedback: Option<String>,
}

impl SqlAnalysisReq {
    /// Assemble the full instruction document for this request.
    ///
    /// Pure string assembly; the document carries the persona, the
    /// preservation rules, the serialized structure and patterns, optional
    /// corrective feedback, the output contract and the query itself.
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

        if let Some(feedback) = &self.feedback {
            prompt.push_str(
                "\n# Corrective Feedback\n\nYour previous rewrite failed semantic validation. \
                 Fix the problems described below or return a null rewrite:\n\n",
            );
            prompt.push_str(feedback);
            prompt.push('\n');
        }

        prompt.push_str("\n# Query To Analyze\n\n```sql\n");
        prompt.push_str(&self.sql);
        prompt.push_str("\n```\n");

        prompt
    }
}

impl LLMAnalysisRequestTrait for SqlAnalysisReq {
    fn scenario(&self) -> LLMScenario {
        LLMScenario::SqlAnalysis
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
pub struct SqlAnalysisResp {
    #[serde(default)]
    pub analysis: String,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default, rename = "rewrittenQuery")]
    pub rewritten_query: Option<String>,
    #[serde(default, rename = "suggestedIndexes")]
    pub suggested_indexes: Vec<String>,
}

impl LLMAnalysisResponseTrait for SqlAnalysisResp {
    fn summary(&self) -> &str {
        &self.analysis
    }
}

impl RewriteCandidate for SqlAnalysisResp {
    fn analysis(&self) -> &str {
        &self.analysis
    }
    fn rewritten_query(&self) -> Option<&str> {
        self.rewritten_query.as_deref().filter(|q| !q.trim().is_empty())
    }
    fn issues(&self) -> Vec<String> {
        self.issues.clone()
    }
    fn index_suggestions(&self) -> &[String] {
        &self.suggested_indexes
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::sql_analyzer::{detect, parse};

    fn sample_req(feedback: Option<String>) -> SqlAnalysisReq {
        let sql = "SELECT COUNT(*) FROM orders LEFT JOIN users ON orders.user_id = users.id \
                   LEFT JOIN items ON orders.item_id = items.id";
        let structure = parse(sql);
        let patterns = detect(&structure);
        SqlAnalysisReq {
            sql: sql.to_string(),
            engine: "MySQL".to_string(),
            structure,
            patterns,
            feedback,
        }
    }

    #[test]
    fn test_prompt_contains_engine_and_query() {
        let prompt = sample_req(None).build_prompt();
        assert!(prompt.contains("MySQL performance engineer"));
        assert!(prompt.contains("SELECT COUNT(*) FROM orders"));
    }

    #[test]
    fn test_prompt_contains_structure_and_patterns() {
        let prompt = sample_req(None).build_prompt();
        assert!(prompt.contains("\"tables\""));
        assert!(prompt.contains("join_explosion"));
        assert!(prompt.contains("count_star_with_joins"));
    }

    #[test]
    fn test_prompt_contains_contract_and_rules() {
        let prompt = sample_req(None).build_prompt();
        assert!(prompt.contains("rewrittenQuery"));
        assert!(prompt.contains("suggestedIndexes"));
        assert!(prompt.contains("Forbidden Transformations"));
        assert!(prompt.contains(SEMANTIC_CHECK_PHRASE));
    }

    #[test]
    fn test_prompt_feedback_section_only_on_retry() {
        let first = sample_req(None).build_prompt();
        assert!(!first.contains("Corrective Feedback"));

        let retry = sample_req(Some("rewrite drops the status predicate".into())).build_prompt();
        assert!(retry.contains("Corrective Feedback"));
        assert!(retry.contains("rewrite drops the status predicate"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        assert_eq!(sample_req(None).build_prompt(), sample_req(None).build_prompt());
    }

    #[test]
    fn test_sql_hash_ignores_formatting() {
        let mut a = sample_req(None);
        a.sql = "SELECT  *\n FROM t".into();
        let mut b = sample_req(None);
        b.sql = "SELECT * FROM t".into();
        assert_eq!(a.sql_hash(), b.sql_hash());
    }

    #[test]
    fn test_response_tolerates_missing_fields() {
        let resp: SqlAnalysisResp = serde_json::from_str("{}").unwrap();
        assert!(resp.analysis.is_empty());
        assert!(resp.rewritten_query.is_none());
    }

    #[test]
    fn test_rewrite_candidate_filters_blank_rewrite() {
        let resp = SqlAnalysisResp { rewritten_query: Some("  ".into()), ..Default::default() };
        assert!(RewriteCandidate::rewritten_query(&resp).is_none());
    }
}
