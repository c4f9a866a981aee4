//! Join anti-pattern rules

use super::PatternRule;
use crate::services::sql_analyzer::models::{DetectedPattern, PatternSeverity, SqlStructure};

/// Two or more LEFT JOINs: unmatched rows multiply the result set
pub struct LeftJoinExplosion;

impl PatternRule for LeftJoinExplosion {
    fn id(&self) -> &'static str {
        "join_explosion"
    }

    fn evaluate(&self, structure: &SqlStructure) -> Vec<DetectedPattern> {
        let left_joins = structure.left_join_count();
        if left_joins < 2 {
            return vec![];
        }
        vec![DetectedPattern::new(
            self.id(),
            PatternSeverity::High,
            format!(
                "Query contains {} LEFT JOINs; rows multiply for every match on the right side, \
                 which inflates result cardinality and any aggregate computed over it",
                left_joins
            ),
        )]
    }
}

/// Three or more joins without any aggregation: likely needless complexity
/// or a missing GROUP BY
pub struct JoinsWithoutAggregation;

impl PatternRule for JoinsWithoutAggregation {
    fn id(&self) -> &'static str {
        "join_explosion"
    }

    fn evaluate(&self, structure: &SqlStructure) -> Vec<DetectedPattern> {
        if structure.joins.len() < 3 || !structure.aggregates.is_empty() {
            return vec![];
        }
        vec![DetectedPattern::new(
            self.id(),
            PatternSeverity::Medium,
            format!(
                "Query joins {} tables without any aggregation; the intermediate result set may \
                 grow far beyond what the caller consumes",
                structure.joins.len() + 1
            ),
        )]
    }
}

pub fn get_rules() -> Vec<Box<dyn PatternRule>> {
    vec![Box::new(LeftJoinExplosion), Box::new(JoinsWithoutAggregation)]
}
