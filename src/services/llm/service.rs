//! LLM Service Trait and Implementation
//!
//! Defines the generic LLM service interface and its implementation.

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

use super::client::LLMClient;
use super::models::*;
use super::repository::LLMRepository;

// ============================================================================
// LLM Analysis Request/Response Traits
// ============================================================================

/// Trait for LLM analysis requests.
/// Implemented by each scenario (analysis, rewrite, validation).
pub trait LLMAnalysisRequestTrait: Serialize + Send + Sync {
    /// The scenario type for this request
    fn scenario(&self) -> LLMScenario;

    /// Full instruction document for this request (dynamic, built from the
    /// request context)
    fn system_prompt(&self) -> String;

    /// User message body; defaults to the serialized request
    fn user_prompt(&self) -> String
    where
        Self: Sized,
    {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Whitespace-insensitive hash of the analyzed SQL, for session tracking
    fn sql_hash(&self) -> String;
}

/// Trait for structured (JSON) LLM analysis responses
pub trait LLMAnalysisResponseTrait: DeserializeOwned + Serialize + Send + Sync {
    /// Summary text for logging
    fn summary(&self) -> &str;

    /// Confidence score, when the scenario reports one
    fn confidence(&self) -> Option<f64> {
        None
    }
}

// ============================================================================
// LLM Service Trait
// ============================================================================

/// LLM Service - the abstraction the analysis pipeline consumes.
///
/// Only the operations the pipeline needs live here, so tests can substitute
/// a scripted implementation. Provider management is inherent on
/// [`LLMServiceImpl`].
#[async_trait]
pub trait LLMService: Send + Sync {
    /// Whether the LLM integration is enabled at all
    fn is_enabled(&self) -> bool;

    /// Whether an active, usable provider credential is configured
    async fn has_credential(&self) -> bool;

    /// Run a scenario expecting a structured JSON reply
    async fn analyze<Req, Resp>(&self, request: &Req) -> Result<Resp, LLMError>
    where
        Req: LLMAnalysisRequestTrait,
        Resp: LLMAnalysisResponseTrait;

    /// Run a scenario expecting a free-form text reply
    async fn analyze_text<Req>(&self, request: &Req) -> Result<String, LLMError>
    where
        Req: LLMAnalysisRequestTrait;
}

// ============================================================================
// LLM Service Implementation
// ============================================================================

/// LLM Service implementation backed by the provider table and the HTTP client
pub struct LLMServiceImpl {
    repository: LLMRepository,
    client: LLMClient,
    enabled: bool,
}

impl LLMServiceImpl {
    pub fn new(pool: sqlx::SqlitePool, enabled: bool) -> Self {
        Self { repository: LLMRepository::new(pool), client: LLMClient::new(), enabled }
    }

    /// Fetch the active provider or fail with `NoProviderConfigured`
    async fn active_provider(&self) -> Result<LLMProvider, LLMError> {
        self.repository
            .get_active_provider()
            .await?
            .ok_or(LLMError::NoProviderConfigured)
    }

    /// Open a session row for a call about to run
    async fn open_session(
        &self,
        provider: &LLMProvider,
        request: &impl LLMAnalysisRequestTrait,
    ) -> Result<String, LLMError> {
        let session_id = self
            .repository
            .create_session(provider.id, request.scenario(), &request.sql_hash())
            .await?;
        self.repository
            .update_session_status(&session_id, SessionStatus::Processing)
            .await?;
        Ok(session_id)
    }

    /// Close a session row with the call outcome
    async fn close_session(
        &self,
        session_id: &str,
        latency_ms: i32,
        outcome: Result<(i32, i32), &LLMError>,
    ) -> Result<(), LLMError> {
        match outcome {
            Ok((input_tokens, output_tokens)) => {
                self.repository
                    .complete_session(
                        session_id,
                        SessionStatus::Completed,
                        input_tokens,
                        output_tokens,
                        latency_ms,
                        None,
                    )
                    .await
            },
            Err(e) => {
                let err_msg = e.to_string();
                self.repository
                    .complete_session(
                        session_id,
                        SessionStatus::Failed,
                        0,
                        0,
                        latency_ms,
                        Some(err_msg.as_str()),
                    )
                    .await
            },
        }
    }

    // ------------------------------------------------------------------
    // Provider management (used by the settings handlers)
    // ------------------------------------------------------------------

    pub async fn list_providers(&self) -> Result<Vec<LLMProviderInfo>, LLMError> {
        let providers = self.repository.list_providers().await?;
        Ok(providers.iter().map(LLMProviderInfo::from).collect())
    }

    pub async fn get_provider(&self, id: i64) -> Result<Option<LLMProviderInfo>, LLMError> {
        let provider = self.repository.get_provider(id).await?;
        Ok(provider.map(|p| LLMProviderInfo::from(&p)))
    }

    pub async fn get_active_provider_info(&self) -> Result<Option<LLMProviderInfo>, LLMError> {
        let provider = self.repository.get_active_provider().await?;
        Ok(provider.map(|p| LLMProviderInfo::from(&p)))
    }

    pub async fn create_provider(&self, req: CreateProviderRequest) -> Result<LLMProvider, LLMError> {
        self.repository.create_provider(req).await
    }

    pub async fn update_provider(
        &self,
        id: i64,
        req: UpdateProviderRequest,
    ) -> Result<LLMProvider, LLMError> {
        self.repository.update_provider(id, req).await
    }

    pub async fn delete_provider(&self, id: i64) -> Result<(), LLMError> {
        self.repository.delete_provider(id).await
    }

    pub async fn activate_provider(&self, provider_id: i64) -> Result<(), LLMError> {
        self.repository.activate_provider(provider_id).await
    }

    pub async fn deactivate_provider(&self, provider_id: i64) -> Result<(), LLMError> {
        self.repository.deactivate_provider(provider_id).await
    }

    pub async fn test_connection(&self, provider_id: i64) -> Result<TestConnectionResponse, LLMError> {
        let provider = self
            .repository
            .get_provider(provider_id)
            .await?
            .ok_or_else(|| LLMError::ProviderNotFound(provider_id.to_string()))?;

        let start = std::time::Instant::now();
        let test_result = self.client.test_connection(&provider).await;
        let latency_ms = start.elapsed().as_millis() as i64;

        match test_result {
            Ok(_) => Ok(TestConnectionResponse {
                success: true,
                message: "Connection successful".to_string(),
                latency_ms: Some(latency_ms),
            }),
            Err(e) => Ok(TestConnectionResponse {
                success: false,
                message: format!("Connection failed: {}", e),
                latency_ms: Some(latency_ms),
            }),
        }
    }
}

#[async_trait]
impl LLMService for LLMServiceImpl {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn has_credential(&self) -> bool {
        if !self.enabled {
            return false;
        }
        matches!(
            self.repository.get_active_provider().await,
            Ok(Some(p)) if p.api_key_encrypted.is_some()
        )
    }

    async fn analyze<Req, Resp>(&self, request: &Req) -> Result<Resp, LLMError>
    where
        Req: LLMAnalysisRequestTrait,
        Resp: LLMAnalysisResponseTrait,
    {
        if !self.enabled {
            return Err(LLMError::Disabled);
        }
        let provider = self.active_provider().await?;
        let session_id = self.open_session(&provider, request).await?;

        let start = std::time::Instant::now();
        let result = self
            .client
            .chat_completion::<Req, Resp>(&provider, request)
            .await;
        let latency_ms = start.elapsed().as_millis() as i32;

        match result {
            Ok((response, input_tokens, output_tokens)) => {
                self.close_session(&session_id, latency_ms, Ok((input_tokens, output_tokens)))
                    .await?;
                tracing::info!(
                    "LLM {} completed: {}",
                    request.scenario().as_str(),
                    response.summary().chars().take(120).collect::<String>()
                );
                Ok(response)
            },
            Err(e) => {
                self.close_session(&session_id, latency_ms, Err(&e)).await?;
                Err(e)
            },
        }
    }

    async fn analyze_text<Req>(&self, request: &Req) -> Result<String, LLMError>
    where
        Req: LLMAnalysisRequestTrait,
    {
        if !self.enabled {
            return Err(LLMError::Disabled);
        }
        let provider = self.active_provider().await?;
        let session_id = self.open_session(&provider, request).await?;

        let start = std::time::Instant::now();
        let result = self.client.chat_completion_text(&provider, request).await;
        let latency_ms = start.elapsed().as_millis() as i32;

        match result {
            Ok((text, input_tokens, output_tokens)) => {
                self.close_session(&session_id, latency_ms, Ok((input_tokens, output_tokens)))
                    .await?;
                Ok(text)
            },
            Err(e) => {
                self.close_session(&session_id, latency_ms, Err(&e)).await?;
                Err(e)
            },
        }
    }
}
