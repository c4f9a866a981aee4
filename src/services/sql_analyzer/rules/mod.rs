//! Anti-pattern detection rules
//!
//! Implements the rule battery that runs over a [`SqlStructure`]. Rules are
//! organized by category; the registry order is fixed so the same structure
//! always yields the same pattern list in the same order: join rules first,
//! then count/distinct rules, then filter rules, then the WordPress rule,
//! then the missing-GROUP-BY rule.

pub mod aggregate;
pub mod filter;
pub mod group_by;
pub mod join;
pub mod wordpress;

use super::models::{DetectedPattern, SqlStructure};

/// Trait for anti-pattern detection rules
///
/// Rules are stateless and must be `Send + Sync`. A rule may emit zero, one
/// or several patterns for a single structure (filter rules emit one per
/// matching label).
pub trait PatternRule: Send + Sync {
    /// Stable rule identifier, also used as the emitted pattern type
    fn id(&self) -> &'static str;

    /// Evaluate the rule against a structure
    fn evaluate(&self, structure: &SqlStructure) -> Vec<DetectedPattern>;
}

/// All registered rules in evaluation order
pub fn get_all_rules() -> Vec<Box<dyn PatternRule>> {
    let mut rules: Vec<Box<dyn PatternRule>> = Vec::new();

    rules.extend(join::get_rules());
    rules.extend(aggregate::get_rules());
    rules.extend(filter::get_rules());
    rules.extend(wordpress::get_rules());
    rules.extend(group_by::get_rules());

    rules
}

/// Run the full rule battery over a structure.
///
/// Pure and total: always returns, possibly an empty list, and the output
/// order is deterministic.
pub fn detect(structure: &SqlStructure) -> Vec<DetectedPattern> {
    get_all_rules()
        .iter()
        .flat_map(|rule| rule.evaluate(structure))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_is_not_empty() {
        assert!(!get_all_rules().is_empty());
    }

    #[test]
    fn test_detect_empty_structure_yields_nothing() {
        assert!(detect(&SqlStructure::default()).is_empty());
    }
}
