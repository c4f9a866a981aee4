//! Rewrite validation scenario
//!
//! Second, independent LLM invocation whose sole job is a semantic
//! equivalence verdict over an (original, rewritten) query pair. The reply
//! is plain text, not JSON: `VALID: YES|NO` plus an `Explanation:` line.

use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::services::llm::models::LLMScenario;
use crate::services::llm::service::LLMAnalysisRequestTrait;

const PROMPT: &str = include_str!("validate_prompt.md");

// ============================================================================
// Request
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct RewriteValidationReq {
    pub original_sql: String,
    pub rewritten_sql: String,
}

impl RewriteValidationReq {
    pub fn build_prompt(&self) -> String {
        let mut prompt = PROMPT.to_string();
        prompt.push_str("\n\n# Original Query\n\n```sql\n");
        prompt.push_str(&self.original_sql);
        prompt.push_str("\n```\n\n# Rewritten Query\n\n```sql\n");
        prompt.push_str(&self.rewritten_sql);
        prompt.push_str("\n```\n");
        prompt
    }
}

impl LLMAnalysisRequestTrait for RewriteValidationReq {
    fn scenario(&self) -> LLMScenario {
        LLMScenario::RewriteValidation
    }

    fn system_prompt(&self) -> String {
        self.build_prompt()
    }

    fn sql_hash(&self) -> String {
        let mut h = DefaultHasher::new();
        self.original_sql
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .hash(&mut h);
        format!("{:x}", h.finish())
    }
}

// ============================================================================
// Verdict
// ============================================================================

/// Parsed validator reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorVerdict {
    pub valid: bool,
    pub explanation: String,
}

impl ValidatorVerdict {
    /// Parse a free-form validator reply.
    ///
    /// Anything that does not clearly state `VALID: YES` is treated as
    /// invalid; a wrong rewrite must never slip through on a sloppy reply.
    pub fn parse(text: &str) -> Self {
        let upper = text.to_uppercase();
        let valid = upper.contains("VALID: YES") || upper.contains("VALID:YES");

        let explanation = find_explanation(text)
            .unwrap_or_else(|| text.trim().to_string());

        Self { valid, explanation }
    }
}

fn find_explanation(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    let idx = lower.find("explanation:")?;
    let tail = &text[idx + "explanation:".len()..];
    let tail = tail.trim();
    if tail.is_empty() { None } else { Some(tail.trim_end_matches("```").trim().to_string()) }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_both_queries_and_checklist() {
        let req = RewriteValidationReq {
            original_sql: "SELECT a FROM t ORDER BY b LIMIT 1".into(),
            rewritten_sql: "SELECT MAX(a) FROM t".into(),
        };
        let prompt = req.build_prompt();
        assert!(prompt.contains("SELECT a FROM t ORDER BY b LIMIT 1"));
        assert!(prompt.contains("SELECT MAX(a) FROM t"));
        assert!(prompt.contains("Checklist"));
        assert!(prompt.contains("VALID: YES"));
        assert!(prompt.contains("VALID: NO"));
    }

    #[test]
    fn test_parse_valid_yes() {
        let verdict =
            ValidatorVerdict::parse("VALID: YES\nExplanation: predicates and keys unchanged.");
        assert!(verdict.valid);
        assert_eq!(verdict.explanation, "predicates and keys unchanged.");
    }

    #[test]
    fn test_parse_valid_no() {
        let verdict = ValidatorVerdict::parse(
            "VALID: NO\nExplanation: point 3 fails, the correlation was dropped.",
        );
        assert!(!verdict.valid);
        assert!(verdict.explanation.contains("correlation was dropped"));
    }

    #[test]
    fn test_parse_case_tolerant() {
        assert!(ValidatorVerdict::parse("valid: yes\nexplanation: fine").valid);
        assert!(!ValidatorVerdict::parse("valid: no\nexplanation: nope").valid);
    }

    #[test]
    fn test_parse_compact_form() {
        assert!(ValidatorVerdict::parse("VALID:YES").valid);
    }

    #[test]
    fn test_unrecognizable_reply_is_invalid() {
        let verdict = ValidatorVerdict::parse("I think it is probably fine");
        assert!(!verdict.valid);
        assert_eq!(verdict.explanation, "I think it is probably fine");
    }

    #[test]
    fn test_explanation_falls_back_to_full_text() {
        let verdict = ValidatorVerdict::parse("VALID: NO - rewrite widens the IN subquery");
        assert!(!verdict.valid);
        assert!(verdict.explanation.contains("widens the IN subquery"));
    }

    #[test]
    fn test_explanation_strips_code_fence() {
        let verdict = ValidatorVerdict::parse("VALID: NO\nExplanation: drops a predicate\n```");
        assert_eq!(verdict.explanation, "drops a predicate");
    }
}
