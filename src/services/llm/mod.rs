//! LLM Service Module
//!
//! Provides LLM-backed analysis capabilities for DBPowerAI.
//! The LLM is a generic capability; SQL analysis, rewrite and rewrite
//! validation are the scenarios built on top of it.
//!
//! # Architecture
//! ```text
//! ┌─────────────────┐
//! │   LLMService    │  ← Trait (what the analysis pipeline consumes)
//! └────────┬────────┘
//!          │
//!    ┌─────┴─────┐
//!    ▼           ▼
//! ┌──────────┐ ┌──────────┐
//! │ OpenAI-  │ │ Scripted │
//! │ compat.  │ │ test     │
//! │ client   │ │ doubles  │
//! └──────────┘ └──────────┘
//! ```
//!
//! # Scenarios
//! - SQL Analysis (generic analyzer pass)
//! - SQL Rewrite (schema/plan-aware pass)
//! - Rewrite Validation (semantic-equivalence verdict)

mod client;
mod models;
mod repository;
pub mod scenarios;
mod service;

// Re-exports for external use
pub use models::*;
pub use scenarios::validate::{RewriteValidationReq, ValidatorVerdict};
pub use scenarios::{
    RewriteCandidate, SEMANTIC_CHECK_PHRASE,
    analyze::{SqlAnalysisReq, SqlAnalysisResp},
    rewrite::{SqlRewriteReq, SqlRewriteResp},
};
pub use service::{LLMAnalysisRequestTrait, LLMAnalysisResponseTrait, LLMService, LLMServiceImpl};

#[allow(unused_imports)]
pub(crate) use client::LLMClient;
#[allow(unused_imports)]
pub(crate) use repository::LLMRepository;
