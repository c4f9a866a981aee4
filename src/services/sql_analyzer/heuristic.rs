//! Fallback Heuristic Analyzer
//!
//! Fully local scorer used when no LLM provider is configured and for
//! free-tier callers. Starts from a score of 85 and subtracts fixed
//! penalties per regex hit; severity is the max of per-rule escalations and
//! a score-threshold ladder.
//!
//! This is deliberately a second, simpler rule set overlapping the pattern
//! detector; the two feed different tiers and their scoring is documented
//! independently, so they are not unified.
//!
//! The textual rewrites here (`SELECT *` replacement, appended `LIMIT`) are
//! naive substitutions with no semantic verification, unlike the validated
//! LLM path. They are not guaranteed correct for an arbitrary query.

use once_cell::sync::Lazy;
use regex::Regex;

use super::models::{AnalysisResult, Severity};

static SELECT_STAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)SELECT\s+\*").unwrap());
static WHERE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bWHERE\b").unwrap());
static ORDER_BY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bORDER\s+BY\b").unwrap());
static LIMIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bLIMIT\b").unwrap());
static LEADING_WILDCARD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bLIKE\s+'%").unwrap());
static OR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bOR\b").unwrap());
static JOIN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bJOIN\b").unwrap());
static JOIN_CONDITION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(?:ON|USING)\b").unwrap());
static SUBQUERY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\(\s*SELECT\b").unwrap());

static FROM_TABLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bFROM\s+`?([A-Za-z_]\w*)`?").unwrap());
static WHERE_COLUMN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bWHERE\s+(?:[A-Za-z_]\w*\.)?([A-Za-z_]\w*)\s*(?:=|<|>|!=|<>|LIKE\b|IN\b)")
        .unwrap()
});

const MISSING_INDEX_ISSUE: &str =
    "Filtering without a supporting index forces a full table scan on every execution";

/// Analyze a query with local heuristics only. Never errors, no I/O.
pub fn heuristic_analysis(query: &str) -> AnalysisResult {
    let mut score: i32 = 85;
    let mut severity = Severity::Low;
    let mut issues: Vec<String> = Vec::new();

    let has_select_star = SELECT_STAR_RE.is_match(query);
    if has_select_star {
        score -= 15;
        issues.push("Using SELECT * retrieves unnecessary columns".to_string());
    }

    let missing_index = WHERE_RE.is_match(query) && !query.to_lowercase().contains("index");
    if missing_index {
        score -= 20;
        severity = severity.max(Severity::High);
        issues.push(MISSING_INDEX_ISSUE.to_string());
    }

    let unbounded_order_by = ORDER_BY_RE.is_match(query) && !LIMIT_RE.is_match(query);
    if unbounded_order_by {
        score -= 10;
        issues.push(
            "ORDER BY without LIMIT sorts the entire result set even when only the first rows \
             matter"
                .to_string(),
        );
    }

    if LEADING_WILDCARD_RE.is_match(query) {
        score -= 15;
        severity = severity.max(Severity::High);
        issues.push("LIKE with a leading wildcard prevents index usage".to_string());
    }

    if OR_RE.is_match(query) {
        score -= 10;
        issues.push(
            "OR conditions can defeat index optimization; consider UNION or IN".to_string(),
        );
    }

    if JOIN_RE.is_match(query) && !JOIN_CONDITION_RE.is_match(query) {
        score -= 25;
        severity = severity.max(Severity::Critical);
        issues.push(
            "JOIN without an ON or USING condition produces a cartesian product".to_string(),
        );
    }

    if SUBQUERY_RE.is_match(query) {
        score -= 12;
        issues.push("Subquery detected; a JOIN is usually cheaper than a correlated subquery"
            .to_string());
    }

    let score = score.clamp(0, 100) as u8;

    // Score ladder only raises severity when no rule escalated higher
    let ladder = if score < 40 {
        Severity::Critical
    } else if score < 60 {
        Severity::High
    } else if score < 75 {
        Severity::Medium
    } else {
        Severity::Low
    };
    let severity = severity.max(ladder);

    let suggested_index = if missing_index { build_index_suggestion(query) } else { String::new() };

    let rewritten_query = rewrite_textually(query, has_select_star, unbounded_order_by);

    let speedup_estimate = if issues.is_empty() {
        0.1
    } else {
        (0.2 + issues.len() as f64 * 0.15).min(0.9)
    };

    AnalysisResult {
        score,
        severity,
        issues,
        suggested_index,
        rewritten_query,
        speedup_estimate,
        validator_status: None,
        semantic_warning: None,
    }
}

/// Best-effort CREATE INDEX statement from the FROM table and the first
/// WHERE column
fn build_index_suggestion(query: &str) -> String {
    let table = FROM_TABLE_RE
        .captures(query)
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| "your_table".to_string());
    let column = WHERE_COLUMN_RE
        .captures(query)
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| "status".to_string());
    format!("CREATE INDEX idx_{}_{} ON {}({});", table, column, table, column)
}

/// Purely textual rewrites; `None` when nothing applied
fn rewrite_textually(
    query: &str,
    has_select_star: bool,
    unbounded_order_by: bool,
) -> Option<String> {
    if !has_select_star && !unbounded_order_by {
        return None;
    }

    let mut rewritten = query.trim().trim_end_matches(';').to_string();
    if has_select_star {
        rewritten = SELECT_STAR_RE
            .replace(&rewritten, "SELECT id, name, created_at")
            .to_string();
    }
    if unbounded_order_by {
        rewritten.push_str(" LIMIT 100");
    }
    Some(rewritten)
}

// ============================================================================
// Unit Tests
// ============================================================================
