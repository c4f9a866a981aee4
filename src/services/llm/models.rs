//! LLM Data Models
//!
//! Core data structures for the LLM service: providers, analysis sessions,
//! validation-failure records and error types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

// ============================================================================
// LLM Scenario Types
// ============================================================================

/// LLM analysis scenario type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LLMScenario {
    /// Generic analyzer pass of the validated-rewrite workflow
    SqlAnalysis,
    /// Rewrite-focused pass with schema/execution-plan context
    SqlRewrite,
    /// Semantic-equivalence verdict on a rewritten query
    RewriteValidation,
}

impl LLMScenario {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SqlAnalysis => "sql_analysis",
            Self::SqlRewrite => "sql_rewrite",
            Self::RewriteValidation => "rewrite_validation",
        }
    }
}

// ============================================================================
// LLM Provider
// ============================================================================

/// LLM Provider configuration from database
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LLMProvider {
    pub id: i64,
    pub name: String,
    pub display_name: String,
    pub api_base: String,
    pub model_name: String,
    #[serde(skip_serializing)]
    pub api_key_encrypted: Option<String>,
    pub is_active: bool,
    pub max_tokens: i32,
    pub temperature: f64,
    pub timeout_seconds: i32,
    pub enabled: bool,
    pub priority: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Provider info for external display (without sensitive data)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LLMProviderInfo {
    pub id: i64,
    pub name: String,
    pub display_name: String,
    pub api_base: String,
    pub model_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_masked: Option<String>,
    pub is_active: bool,
    pub enabled: bool,
    pub max_tokens: i32,
    pub temperature: f64,
    pub timeout_seconds: i32,
    pub priority: i32,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl From<&LLMProvider> for LLMProviderInfo {
    fn from(p: &LLMProvider) -> Self {
        let api_key_masked = p.api_key_encrypted.as_ref().map(|key| {
            if key.len() > 8 {
                format!("{}...{}", &key[..4], &key[key.len() - 4..])
            } else {
                "****".to_string()
            }
        });

        Self {
            id: p.id,
            name: p.name.clone(),
            display_name: p.display_name.clone(),
            api_base: p.api_base.clone(),
            model_name: p.model_name.clone(),
            api_key_masked,
            is_active: p.is_active,
            enabled: p.enabled,
            max_tokens: p.max_tokens,
            temperature: p.temperature,
            timeout_seconds: p.timeout_seconds,
            priority: p.priority,
            created_at: p.created_at.to_rfc3339(),
            updated_at: Some(p.updated_at.to_rfc3339()),
        }
    }
}

/// Request to create a provider
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateProviderRequest {
    pub name: String,
    pub display_name: String,
    pub api_base: String,
    pub model_name: String,
    pub api_key: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: i32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: i32,
    #[serde(default = "default_priority")]
    pub priority: i32,
}

/// Request to update a provider
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateProviderRequest {
    pub display_name: Option<String>,
    pub api_base: Option<String>,
    pub model_name: Option<String>,
    pub api_key: Option<String>,
    pub max_tokens: Option<i32>,
    pub temperature: Option<f64>,
    pub timeout_seconds: Option<i32>,
    pub priority: Option<i32>,
    pub enabled: Option<bool>,
}

/// Response for test connection
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TestConnectionResponse {
    pub success: bool,
    pub message: String,
    pub latency_ms: Option<i64>,
}

fn default_max_tokens() -> i32 {
    4096
}
fn default_temperature() -> f64 {
    0.3
}
fn default_timeout() -> i32 {
    60
}
fn default_priority() -> i32 {
    100
}

// ============================================================================
// LLM Analysis Session
// ============================================================================

/// Analysis session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse_status(s: &str) -> Self {
        match s {
            "pending" => Self::Pending,
            "processing" => Self::Processing,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            _ => Self::Failed,
        }
    }
}

/// LLM Analysis Session from database
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LLMAnalysisSession {
    pub id: String,
    pub provider_id: Option<i64>,
    pub scenario: String,
    pub sql_hash: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub input_tokens: Option<i32>,
    pub output_tokens: Option<i32>,
    pub latency_ms: Option<i32>,
    pub error_message: Option<String>,
}

impl LLMAnalysisSession {
    pub fn status_enum(&self) -> SessionStatus {
        SessionStatus::parse_status(&self.status)
    }
}

// ============================================================================
// Validation Failure Record
// ============================================================================

/// A rewrite that failed semantic validation twice, recorded for human review
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct ValidationFailure {
    pub id: i64,
    pub original_query: String,
    pub attempted_rewrite: String,
    pub validator_explanation: String,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// LLM Error Types
// ============================================================================

/// LLM service errors
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("No active LLM provider configured")]
    NoProviderConfigured,

    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    #[error("LLM API error: {0}")]
    ApiError(String),

    #[error("LLM response parsing error: {0}")]
    ParseError(String),

    #[error("LLM timeout after {0}s")]
    Timeout(u64),

    #[error("LLM rate limited, retry after {0}s")]
    RateLimited(u64),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("LLM service disabled")]
    Disabled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_info_masks_long_key() {
        let provider = LLMProvider {
            id: 1,
            name: "openai".into(),
            display_name: "OpenAI".into(),
            api_base: "https://api.openai.com/v1".into(),
            model_name: "gpt-4o-mini".into(),
            api_key_encrypted: Some("sk-abcdef1234567890".into()),
            is_active: true,
            max_tokens: 4096,
            temperature: 0.3,
            timeout_seconds: 60,
            enabled: true,
            priority: 100,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let info = LLMProviderInfo::from(&provider);
        assert_eq!(info.api_key_masked.as_deref(), Some("sk-a...7890"));
    }

    #[test]
    fn test_provider_info_masks_short_key() {
        let provider = LLMProvider {
            id: 1,
            name: "p".into(),
            display_name: "P".into(),
            api_base: "http://localhost".into(),
            model_name: "m".into(),
            api_key_encrypted: Some("short".into()),
            is_active: false,
            max_tokens: 1,
            temperature: 0.0,
            timeout_seconds: 1,
            enabled: true,
            priority: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let info = LLMProviderInfo::from(&provider);
        assert_eq!(info.api_key_masked.as_deref(), Some("****"));
    }

    #[test]
    fn test_session_status_round_trip() {
        for status in [
            SessionStatus::Pending,
            SessionStatus::Processing,
            SessionStatus::Completed,
            SessionStatus::Failed,
        ] {
            assert_eq!(SessionStatus::parse_status(status.as_str()), status);
        }
        assert_eq!(SessionStatus::parse_status("garbage"), SessionStatus::Failed);
    }

    #[test]
    fn test_scenario_as_str() {
        assert_eq!(LLMScenario::SqlAnalysis.as_str(), "sql_analysis");
        assert_eq!(LLMScenario::RewriteValidation.as_str(), "rewrite_validation");
    }
}
