//! DBPowerAI Library
//!
//! This library contains all the core modules for the DBPowerAI service.

use sqlx::SqlitePool;
use std::sync::Arc;

pub mod config;
pub mod db;
pub mod handlers;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use services::llm::{LLMError, LLMProviderInfo, LLMService, LLMServiceImpl};
pub use services::sql_analyzer::{AnalysisResult, DetectedPattern, SqlStructure};
pub use services::{AnalysisService, detect, heuristic_analysis, parse};

/// Analysis service specialized to the production LLM implementation
pub type AppAnalysisService = AnalysisService<LLMServiceImpl>;

/// Application shared state
///
/// Design Philosophy: Keep it simple - Rust's type system IS our DI container.
/// All services are wrapped in Arc for cheap cloning and thread safety.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,

    pub llm_service: Arc<LLMServiceImpl>,
    pub analysis_service: Arc<AppAnalysisService>,
}

#[cfg(test)]
mod tests;
