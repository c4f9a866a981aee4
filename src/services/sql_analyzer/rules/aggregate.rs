//! Aggregate anti-pattern rules

use once_cell::sync::Lazy;
use regex::Regex;

use super::PatternRule;
use crate::services::sql_analyzer::models::{DetectedPattern, PatternSeverity, SqlStructure};

static COUNT_STAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)COUNT\s*\(\s*\*\s*\)").unwrap());
static COUNT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*COUNT\s*\(").unwrap());

/// COUNT(*) combined with joins counts multiplied rows, not entities
pub struct CountStarWithJoins;

impl PatternRule for CountStarWithJoins {
    fn id(&self) -> &'static str {
        "count_star_with_joins"
    }

    fn evaluate(&self, structure: &SqlStructure) -> Vec<DetectedPattern> {
        if structure.joins.is_empty() {
            return vec![];
        }
        let has_count_star = structure
            .aggregates
            .iter()
            .any(|a| COUNT_STAR_RE.is_match(a));
        if !has_count_star {
            return vec![];
        }
        vec![DetectedPattern::new(
            self.id(),
            PatternSeverity::High,
            "COUNT(*) over a joined result counts multiplied rows rather than distinct \
             entities; count the driving table's key or aggregate before joining",
        )]
    }
}

/// COUNT without DISTINCT across two or more joins is likely double-counting
pub struct CountWithoutDistinct;

impl PatternRule for CountWithoutDistinct {
    fn id(&self) -> &'static str {
        "missing_distinct"
    }

    fn evaluate(&self, structure: &SqlStructure) -> Vec<DetectedPattern> {
        if structure.joins.len() < 2 {
            return vec![];
        }
        let has_count = structure.aggregates.iter().any(|a| COUNT_RE.is_match(a));
        let has_distinct = structure
            .aggregates
            .iter()
            .any(|a| a.to_uppercase().contains("DISTINCT"));
        if !has_count || has_distinct {
            return vec![];
        }
        vec![DetectedPattern::new(
            self.id(),
            PatternSeverity::High,
            format!(
                "COUNT across {} joins without DISTINCT is likely to count the same entity \
                 once per joined match",
                structure.joins.len()
            ),
        )]
    }
}

pub fn get_rules() -> Vec<Box<dyn PatternRule>> {
    vec![Box::new(CountStarWithJoins), Box::new(CountWithoutDistinct)]
}
