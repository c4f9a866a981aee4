//! Non-sargable filter rules
//!
//! Maps the extractor's filter-shape labels to specific patterns. One
//! pattern per matching label, in label order.

use super::PatternRule;
use crate::services::sql_analyzer::extractor::{
    LABEL_CASE_CONVERSION, LABEL_LEADING_WILDCARD, LABEL_OR_CONDITION,
};
use crate::services::sql_analyzer::models::{DetectedPattern, PatternSeverity, SqlStructure};

pub struct NonSargableFilters;

impl PatternRule for NonSargableFilters {
    fn id(&self) -> &'static str {
        "non_sargable_filter"
    }

    fn evaluate(&self, structure: &SqlStructure) -> Vec<DetectedPattern> {
        structure
            .filters
            .iter()
            .filter_map(|label| match label.as_str() {
                LABEL_LEADING_WILDCARD => Some(DetectedPattern::new(
                    "non_sargable_like",
                    PatternSeverity::High,
                    "Leading-wildcard LIKE cannot use an index and forces a full scan of the \
                     filtered column",
                )),
                LABEL_OR_CONDITION => Some(DetectedPattern::new(
                    "non_sargable_or",
                    PatternSeverity::Medium,
                    "OR conditions often prevent index usage; consider a UNION of indexed \
                     predicates or an IN list",
                )),
                LABEL_CASE_CONVERSION => Some(DetectedPattern::new(
                    "non_sargable_function",
                    PatternSeverity::Medium,
                    "Wrapping a column in LOWER()/UPPER() defeats index lookups; store a \
                     normalized copy or use a collation/functional index",
                )),
                _ => None,
            })
            .collect()
    }
}

pub fn get_rules() -> Vec<Box<dyn PatternRule>> {
    vec![Box::new(NonSargableFilters)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::sql_analyzer::extractor::parse;

    #[test]
    fn test_leading_wildcard_is_high() {
        let s = parse("SELECT * FROM t WHERE name LIKE '%foo'");
        let patterns = NonSargableFilters.evaluate(&s);
        assert!(patterns
            .iter()
            .any(|p| p.pattern_type == "non_sargable_like" && p.severity == PatternSeverity::High));
    }

    #[test]
    fn test_or_condition_is_medium() {
        let s = parse("SELECT * FROM t WHERE a = 1 OR b = 2");
        let patterns = NonSargableFilters.evaluate(&s);
        assert!(patterns
            .iter()
            .any(|p| p.pattern_type == "non_sargable_or" && p.severity == PatternSeverity::Medium));
    }

    #[test]
    fn test_case_conversion_is_medium() {
        let s = parse("SELECT * FROM t WHERE UPPER(code) = 'X1'");
        let patterns = NonSargableFilters.evaluate(&s);
        assert!(patterns.iter().any(
            |p| p.pattern_type == "non_sargable_function" && p.severity == PatternSeverity::Medium
        ));
    }

    #[test]
    fn test_unmapped_labels_ignored() {
        let s = parse("SELECT * FROM t WHERE a = 1 AND b = 2 AND c = 3 AND d = 4");
        // Complex-WHERE label is structural context only, not a pattern
        assert!(NonSargableFilters.evaluate(&s).is_empty());
    }

    #[test]
    fn test_multiple_labels_emit_in_order() {
        let s = parse("SELECT * FROM t WHERE LOWER(a) LIKE '%x' OR b = 2");
        let patterns = NonSargableFilters.evaluate(&s);
        let types: Vec<&str> = patterns.iter().map(|p| p.pattern_type.as_str()).collect();
        assert_eq!(types, vec!["non_sargable_like", "non_sargable_or", "non_sargable_function"]);
    }
}
