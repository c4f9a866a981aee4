//! WordPress meta-query rule

use super::PatternRule;
use crate::services::sql_analyzer::extractor::LABEL_WORDPRESS_META;
use crate::services::sql_analyzer::models::{DetectedPattern, PatternSeverity, SqlStructure};

/// meta_query-style filtering over wp_postmeta self-joins
pub struct WordPressMetaQuery;

impl PatternRule for WordPressMetaQuery {
    fn id(&self) -> &'static str {
        "wordpress_meta_query"
    }

    fn evaluate(&self, structure: &SqlStructure) -> Vec<DetectedPattern> {
        if !structure.filters.iter().any(|l| l == LABEL_WORDPRESS_META) {
            return vec![];
        }
        vec![DetectedPattern::new(
            self.id(),
            PatternSeverity::High,
            "meta_query filtering joins wp_postmeta once per condition; each extra meta key \
             multiplies scanned rows. Flatten hot meta keys into an indexed lookup table",
        )]
    }
}

pub fn get_rules() -> Vec<Box<dyn PatternRule>> {
    vec![Box::new(WordPressMetaQuery)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::sql_analyzer::extractor::parse;

    #[test]
    fn test_wp_postmeta_join_flagged_high() {
        let s = parse(
            "SELECT p.* FROM wp_posts p \
             JOIN wp_postmeta m1 ON p.ID = m1.post_id \
             JOIN wp_postmeta m2 ON p.ID = m2.post_id \
             WHERE m1.meta_key = '_price' AND m2.meta_key = '_stock'",
        );
        let patterns = WordPressMetaQuery.evaluate(&s);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].pattern_type, "wordpress_meta_query");
        assert_eq!(patterns[0].severity, PatternSeverity::High);
        assert!(patterns[0].message.contains("wp_postmeta"));
    }

    #[test]
    fn test_plain_query_not_flagged() {
        let s = parse("SELECT * FROM orders WHERE status = 'PAID'");
        assert!(WordPressMetaQuery.evaluate(&s).is_empty());
    }
}
