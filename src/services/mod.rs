pub mod analysis_service;
pub mod llm;
pub mod sql_analyzer;

pub use analysis_service::AnalysisService;
pub use llm::{
    CreateProviderRequest, LLMError, LLMProvider, LLMProviderInfo, LLMService, LLMServiceImpl,
    TestConnectionResponse, UpdateProviderRequest, ValidationFailure,
};
pub use sql_analyzer::{
    AnalysisResult, DetectedPattern, SqlStructure, detect, heuristic_analysis, parse,
};
