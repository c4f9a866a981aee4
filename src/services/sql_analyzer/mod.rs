//! SQL Analyzer Module
//!
//! The local half of the analysis pipeline: structural extraction, rule-based
//! anti-pattern detection, and the heuristic fallback scorer. Everything in
//! this module is a pure function of the input SQL text; no I/O, no shared
//! state between requests.
//!
//! # Pipeline
//! ```text
//! raw SQL ──▶ extractor::parse ──▶ SqlStructure ──▶ rules::detect ──▶ [DetectedPattern]
//!                  │
//!                  └──────────── heuristic::heuristic_analysis (independent path)
//! ```

pub mod extractor;
pub mod heuristic;
pub mod models;
pub mod rules;

pub use extractor::parse;
pub use heuristic::heuristic_analysis;
pub use models::{
    AnalysisResult, DetectedPattern, JoinClause, JoinType, PatternSeverity, Severity,
    SqlStructure, ValidatorStatus,
};
pub use rules::detect;
