//! Missing GROUP BY rule

use super::PatternRule;
use crate::services::sql_analyzer::models::{DetectedPattern, PatternSeverity, SqlStructure};

/// Aggregates without GROUP BY: ambiguous, might be intentional
pub struct MissingGroupBy;

impl PatternRule for MissingGroupBy {
    fn id(&self) -> &'static str {
        "missing_group_by"
    }

    fn evaluate(&self, structure: &SqlStructure) -> Vec<DetectedPattern> {
        if structure.aggregates.is_empty() || !structure.group_by.is_empty() {
            return vec![];
        }
        vec![DetectedPattern::new(
            self.id(),
            PatternSeverity::Medium,
            "Aggregate functions without GROUP BY collapse the result to a single row; if \
             per-group results were intended, add the grouping keys",
        )]
    }
}

pub fn get_rules() -> Vec<Box<dyn PatternRule>> {
    vec![Box::new(MissingGroupBy)]
}
