//! Structural Extractor
//!
//! Turns a raw SQL string into a [`SqlStructure`] using case-insensitive
//! regex matching over whitespace-normalized text. This is intentionally a
//! best-effort scanner, not a SQL front end: no grammar, no nesting
//! awareness, no handling of string literals containing keywords. The
//! downstream detectors are calibrated against this triggering behavior.

use once_cell::sync::Lazy;
use regex::Regex;

use super::models::{JoinClause, JoinType, SqlStructure};

// Filter-shape labels emitted into `SqlStructure::filters`. The pattern
// detector matches on these exact strings.
pub const LABEL_LEADING_WILDCARD: &str = "LIKE with leading wildcard";
pub const LABEL_OR_CONDITION: &str = "OR condition";
pub const LABEL_CASE_CONVERSION: &str = "Case conversion function (LOWER/UPPER)";
pub const LABEL_WORDPRESS_META: &str = "WordPress meta_query pattern";
pub const LABEL_COMPLEX_WHERE: &str = "Complex WHERE clause with many conditions";

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static TABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\b(?:FROM|JOIN)\s+([A-Za-z_\[\]"`][\w.\[\]"`]*)"#).unwrap()
});

static JOIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\b(?:(LEFT|RIGHT|INNER|FULL|CROSS)\s+)?(?:OUTER\s+)?JOIN\s+([A-Za-z_\[\]"`][\w.\[\]"`]*)"#,
    )
    .unwrap()
});

/// Optional alias followed by the ON keyword, anchored at a join target's end
static ON_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(?:AS\s+)?(?:[A-Za-z_]\w*\s+)?ON\s+").unwrap());

/// Keywords that terminate an ON condition or a GROUP BY list
static CLAUSE_BOUNDARY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:LEFT|RIGHT|INNER|FULL|CROSS|JOIN|WHERE|GROUP\s+BY|ORDER\s+BY|LIMIT|HAVING|UNION)\b")
        .unwrap()
});

static AGGREGATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:COUNT|SUM|AVG|MAX|MIN|GROUP_CONCAT)\s*\([^)]*\)").unwrap()
});

static GROUP_BY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bGROUP\s+BY\s+(.+)").unwrap());

static GROUP_BY_TERMINATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:HAVING|ORDER\s+BY|LIMIT|UNION)\b").unwrap());

static LEADING_WILDCARD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bLIKE\s+'%").unwrap());
static OR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bOR\b").unwrap());
static CASE_FN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(?:LOWER|UPPER)\s*\(").unwrap());
static WP_META_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:wp_postmeta|meta_key|meta_value)\b").unwrap());
static WHERE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bWHERE\b").unwrap());
static CONNECTIVE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(?:AND|OR)\b").unwrap());

/// Parse a raw SQL string into its structural summary.
///
/// Total for any input: malformed or empty SQL yields empty collections,
/// never an error.
pub fn parse(sql: &str) -> SqlStructure {
    let normalized = normalize(sql);
    if normalized.is_empty() {
        return SqlStructure::default();
    }

    SqlStructure {
        tables: extract_tables(&normalized),
        joins: extract_joins(&normalized),
        aggregates: extract_aggregates(&normalized),
        filters: extract_filter_labels(&normalized),
        group_by: extract_group_by(&normalized),
    }
}

/// Collapse whitespace runs to single spaces and trim, so extraction is
/// independent of source formatting
fn normalize(sql: &str) -> String {
    WHITESPACE_RE.replace_all(sql.trim(), " ").to_string()
}

/// Strip quoting/bracket characters from an identifier
fn strip_quoting(ident: &str) -> String {
    ident
        .chars()
        .filter(|c| !matches!(c, '`' | '"' | '[' | ']'))
        .collect::<String>()
        .trim_matches('.')
        .to_string()
}

fn is_keyword(ident: &str) -> bool {
    matches!(
        ident.to_uppercase().as_str(),
        "SELECT"
            | "WHERE"
            | "AND"
            | "OR"
            | "ON"
            | "AS"
            | "LEFT"
            | "RIGHT"
            | "INNER"
            | "OUTER"
            | "FULL"
            | "CROSS"
            | "JOIN"
            | "FROM"
    )
}

fn extract_tables(sql: &str) -> Vec<String> {
    let mut tables = Vec::new();
    for cap in TABLE_RE.captures_iter(sql) {
        let name = strip_quoting(&cap[1]);
        if name.is_empty() || is_keyword(&name) {
            continue;
        }
        if !tables.contains(&name) {
            tables.push(name);
        }
    }
    tables
}

fn extract_joins(sql: &str) -> Vec<JoinClause> {
    let mut joins = Vec::new();
    for cap in JOIN_RE.captures_iter(sql) {
        let target = strip_quoting(&cap[2]);
        if target.is_empty() || is_keyword(&target) {
            continue;
        }

        let join_type = match cap.get(1).map(|m| m.as_str().to_uppercase()) {
            Some(t) if t == "LEFT" => JoinType::Left,
            Some(t) if t == "RIGHT" => JoinType::Right,
            Some(t) if t == "FULL" => JoinType::Full,
            Some(t) if t == "CROSS" => JoinType::Cross,
            _ => JoinType::Inner,
        };

        let rest = &sql[cap.get(0).map(|m| m.end()).unwrap_or(sql.len())..];
        let on_condition = ON_PREFIX_RE
            .find(rest)
            .map(|on| {
                let tail = &rest[on.end()..];
                let end = CLAUSE_BOUNDARY_RE
                    .find(tail)
                    .map(|b| b.start())
                    .unwrap_or(tail.len());
                tail[..end].trim().to_string()
            })
            .unwrap_or_default();

        joins.push(JoinClause { join_type, target_table: target, on_condition });
    }
    joins
}

fn extract_aggregates(sql: &str) -> Vec<String> {
    AGGREGATE_RE
        .find_iter(sql)
        .map(|m| m.as_str().to_string())
        .collect()
}

fn extract_group_by(sql: &str) -> Vec<String> {
    let Some(cap) = GROUP_BY_RE.captures(sql) else {
        return vec![];
    };
    let tail = &cap[1];
    let end = GROUP_BY_TERMINATOR_RE
        .find(tail)
        .map(|m| m.start())
        .unwrap_or(tail.len());

    tail[..end]
        .split(',')
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

fn extract_filter_labels(sql: &str) -> Vec<String> {
    let mut labels = Vec::new();

    if LEADING_WILDCARD_RE.is_match(sql) {
        labels.push(LABEL_LEADING_WILDCARD.to_string());
    }
    if OR_RE.is_match(sql) {
        labels.push(LABEL_OR_CONDITION.to_string());
    }
    if CASE_FN_RE.is_match(sql) {
        labels.push(LABEL_CASE_CONVERSION.to_string());
    }
    if WP_META_RE.is_match(sql) {
        labels.push(LABEL_WORDPRESS_META.to_string());
    }
    if let Some(m) = WHERE_RE.find(sql) {
        let where_tail = &sql[m.end()..];
        if CONNECTIVE_RE.find_iter(where_tail).count() >= 3 {
            labels.push(LABEL_COMPLEX_WHERE.to_string());
        }
    }

    labels
}

// ============================================================================
// Unit Tests
// ============================================================================
