//! SQL Analyzer Data Models
//!
//! Core data structures shared by the structural extractor, the pattern
//! detector and the heuristic analyzer.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============================================================================
// Structural Summary
// ============================================================================

/// Join type recognized by the extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl JoinType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inner => "INNER",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Full => "FULL",
            Self::Cross => "CROSS",
        }
    }
}

/// A single JOIN clause as seen in the query text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct JoinClause {
    pub join_type: JoinType,
    pub target_table: String,
    /// Raw ON condition text, empty when the join carries no ON clause
    pub on_condition: String,
}

/// Coarse structural summary of a SQL query.
///
/// Derived purely from the input text by best-effort regex scanning; no
/// grammar, no nesting awareness. Callers must tolerate false
/// positives/negatives on exotic queries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SqlStructure {
    /// Distinct table identifiers from FROM/JOIN clauses, quoting stripped,
    /// first-seen order
    pub tables: Vec<String>,
    /// JOIN clauses in source order, duplicates preserved
    pub joins: Vec<JoinClause>,
    /// Aggregate function calls, verbatim, duplicates preserved
    pub aggregates: Vec<String>,
    /// Filter-shape labels found anywhere in the query text
    pub filters: Vec<String>,
    /// GROUP BY column expressions, comma-split and trimmed
    pub group_by: Vec<String>,
}

impl SqlStructure {
    pub fn left_join_count(&self) -> usize {
        self.joins
            .iter()
            .filter(|j| j.join_type == JoinType::Left)
            .count()
    }
}

// ============================================================================
// Detected Patterns
// ============================================================================

/// Severity of a detected anti-pattern
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum PatternSeverity {
    Low,
    Medium,
    High,
}

impl PatternSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// A single anti-pattern flagged by the detector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DetectedPattern {
    /// Stable identifier (e.g. "join_explosion")
    #[serde(rename = "type")]
    pub pattern_type: String,
    pub severity: PatternSeverity,
    pub message: String,
}

impl DetectedPattern {
    pub fn new(pattern_type: &str, severity: PatternSeverity, message: impl Into<String>) -> Self {
        Self { pattern_type: pattern_type.to_string(), severity, message: message.into() }
    }
}

// ============================================================================
// Analysis Result
// ============================================================================

/// Overall severity of an analysis result
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// Outcome of the semantic-equivalence validation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ValidatorStatus {
    Valid,
    Invalid,
}

/// The result contract shared by every analysis path (heuristic fallback,
/// single-pass valid, retried valid, failed).
///
/// Constructed fresh per request and never mutated afterwards. Failure is
/// expressed through the fields (`rewritten_query: None`,
/// `validator_status: Invalid`), never as an error to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AnalysisResult {
    /// 0-100, higher is better
    pub score: u8,
    pub severity: Severity,
    pub issues: Vec<String>,
    #[serde(rename = "suggestedIndex")]
    pub suggested_index: String,
    #[serde(rename = "rewrittenQuery")]
    pub rewritten_query: Option<String>,
    /// Estimated fraction of runtime saved, 0.0-1.0
    #[serde(rename = "speedupEstimate")]
    pub speedup_estimate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validator_status: Option<ValidatorStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_warning: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_severity_ordering() {
        assert!(PatternSeverity::High > PatternSeverity::Medium);
        assert!(PatternSeverity::Medium > PatternSeverity::Low);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }

    #[test]
    fn test_analysis_result_serialization() {
        let result = AnalysisResult {
            score: 85,
            severity: Severity::Low,
            issues: vec![],
            suggested_index: String::new(),
            rewritten_query: None,
            speedup_estimate: 0.1,
            validator_status: None,
            semantic_warning: None,
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"score\":85"));
        assert!(json.contains("\"severity\":\"low\""));
        assert!(json.contains("\"suggestedIndex\":\"\""));
        assert!(json.contains("\"rewrittenQuery\":null"));
        assert!(json.contains("\"speedupEstimate\":0.1"));

        assert!(!json.contains("validator_status"));
        assert!(!json.contains("semantic_warning"));
    }

    #[test]
    fn test_analysis_result_validator_fields() {
        let result = AnalysisResult {
            score: 70,
            severity: Severity::Medium,
            issues: vec![],
            suggested_index: String::new(),
            rewritten_query: None,
            speedup_estimate: 0.0,
            validator_status: Some(ValidatorStatus::Invalid),
            semantic_warning: Some("rewrite drops a WHERE predicate".into()),
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"validator_status\":\"invalid\""));
        assert!(json.contains("\"semantic_warning\":\"rewrite drops a WHERE predicate\""));
    }

    #[test]
    fn test_detected_pattern_type_field_name() {
        let p = DetectedPattern::new("join_explosion", PatternSeverity::High, "two LEFT JOINs");
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains("\"type\":\"join_explosion\""));
        assert!(json.contains("\"severity\":\"high\""));
    }

    #[test]
    fn test_join_type_serialization() {
        assert_eq!(serde_json::to_string(&JoinType::Left).unwrap(), "\"LEFT\"");
        assert_eq!(JoinType::Inner.as_str(), "INNER");
    }
}
