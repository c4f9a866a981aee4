//! LLM Analysis Scenarios
//!
//! Each scenario implements LLMAnalysisRequestTrait (and, for JSON replies,
//! LLMAnalysisResponseTrait). Prompt templates live next to the scenario as
//! versioned Markdown files and are immutable after construction.

pub mod analyze;
pub mod rewrite;
pub mod validate;

/// The literal confirmation sentence a generator must include if and only if
/// it has verified its rewrite against the semantic-preservation rules.
pub const SEMANTIC_CHECK_PHRASE: &str =
    "Semantic check passed: identical rows, cardinality, grouping and ordering preserved";

/// Common view over generator replies that may carry a rewritten query.
///
/// Both the generic analyzer response and the rewrite-focused response
/// implement this so the validated-rewrite workflow can drive either.
pub trait RewriteCandidate {
    fn analysis(&self) -> &str;
    fn rewritten_query(&self) -> Option<&str>;
    /// Issues/warnings to surface to the caller
    fn issues(&self) -> Vec<String>;
    /// Complete CREATE INDEX statements
    fn index_suggestions(&self) -> &[String];
}
