//! LLM Repository - Database operations for LLM service

use sqlx::SqlitePool;
use uuid::Uuid;

use super::models::*;

/// Repository for LLM database operations
pub struct LLMRepository {
    pool: SqlitePool,
}

impl LLMRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ------------------------------------------------------------------
    // Providers
    // ------------------------------------------------------------------

    /// Get the currently active provider
    pub async fn get_active_provider(&self) -> Result<Option<LLMProvider>, LLMError> {
        sqlx::query_as::<_, LLMProvider>(
            r#"SELECT * FROM llm_providers
               WHERE is_active = TRUE AND enabled = TRUE
               LIMIT 1"#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(LLMError::from)
    }

    /// List all providers
    pub async fn list_providers(&self) -> Result<Vec<LLMProvider>, LLMError> {
        sqlx::query_as::<_, LLMProvider>(
            "SELECT * FROM llm_providers ORDER BY priority ASC, name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(LLMError::from)
    }

    /// Get provider by ID
    pub async fn get_provider(&self, id: i64) -> Result<Option<LLMProvider>, LLMError> {
        sqlx::query_as::<_, LLMProvider>("SELECT * FROM llm_providers WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(LLMError::from)
    }

    /// Create a new provider
    pub async fn create_provider(
        &self,
        req: CreateProviderRequest,
    ) -> Result<LLMProvider, LLMError> {
        let result = sqlx::query(
            r#"INSERT INTO llm_providers
               (name, display_name, api_base, model_name, api_key_encrypted,
                max_tokens, temperature, timeout_seconds, enabled, is_active, priority)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, TRUE, FALSE, ?)"#,
        )
        .bind(&req.name)
        .bind(&req.display_name)
        .bind(&req.api_base)
        .bind(&req.model_name)
        .bind(Some(req.api_key))
        .bind(req.max_tokens)
        .bind(req.temperature)
        .bind(req.timeout_seconds)
        .bind(req.priority)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_provider(id)
            .await?
            .ok_or_else(|| LLMError::ProviderNotFound(id.to_string()))
    }

    /// Update a provider; absent fields keep their current value
    pub async fn update_provider(
        &self,
        id: i64,
        req: UpdateProviderRequest,
    ) -> Result<LLMProvider, LLMError> {
        let existing = self
            .get_provider(id)
            .await?
            .ok_or_else(|| LLMError::ProviderNotFound(id.to_string()))?;

        sqlx::query(
            r#"UPDATE llm_providers
               SET display_name = ?, api_base = ?, model_name = ?, api_key_encrypted = ?,
                   max_tokens = ?, temperature = ?, timeout_seconds = ?, priority = ?,
                   enabled = ?, updated_at = CURRENT_TIMESTAMP
               WHERE id = ?"#,
        )
        .bind(req.display_name.unwrap_or(existing.display_name))
        .bind(req.api_base.unwrap_or(existing.api_base))
        .bind(req.model_name.unwrap_or(existing.model_name))
        .bind(req.api_key.or(existing.api_key_encrypted))
        .bind(req.max_tokens.unwrap_or(existing.max_tokens))
        .bind(req.temperature.unwrap_or(existing.temperature))
        .bind(req.timeout_seconds.unwrap_or(existing.timeout_seconds))
        .bind(req.priority.unwrap_or(existing.priority))
        .bind(req.enabled.unwrap_or(existing.enabled))
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.get_provider(id)
            .await?
            .ok_or_else(|| LLMError::ProviderNotFound(id.to_string()))
    }

    /// Delete a provider
    pub async fn delete_provider(&self, id: i64) -> Result<(), LLMError> {
        let result = sqlx::query("DELETE FROM llm_providers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(LLMError::ProviderNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Activate a provider (deactivates all others)
    pub async fn activate_provider(&self, provider_id: i64) -> Result<(), LLMError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE llm_providers SET is_active = FALSE")
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query(
            "UPDATE llm_providers SET is_active = TRUE WHERE id = ? AND enabled = TRUE",
        )
        .bind(provider_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(LLMError::ProviderNotFound(provider_id.to_string()));
        }

        tx.commit().await?;
        Ok(())
    }

    /// Deactivate a provider
    pub async fn deactivate_provider(&self, provider_id: i64) -> Result<(), LLMError> {
        let result = sqlx::query("UPDATE llm_providers SET is_active = FALSE WHERE id = ?")
            .bind(provider_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(LLMError::ProviderNotFound(provider_id.to_string()));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Analysis sessions
    // ------------------------------------------------------------------

    /// Create a new analysis session, returns the session id
    pub async fn create_session(
        &self,
        provider_id: i64,
        scenario: LLMScenario,
        sql_hash: &str,
    ) -> Result<String, LLMError> {
        let session_id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"INSERT INTO analysis_sessions (id, provider_id, scenario, sql_hash, status)
               VALUES (?, ?, ?, ?, 'pending')"#,
        )
        .bind(&session_id)
        .bind(provider_id)
        .bind(scenario.as_str())
        .bind(sql_hash)
        .execute(&self.pool)
        .await?;

        Ok(session_id)
    }

    /// Update session status
    pub async fn update_session_status(
        &self,
        session_id: &str,
        status: SessionStatus,
    ) -> Result<(), LLMError> {
        sqlx::query("UPDATE analysis_sessions SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Complete a session with outcome and token usage
    pub async fn complete_session(
        &self,
        session_id: &str,
        status: SessionStatus,
        input_tokens: i32,
        output_tokens: i32,
        latency_ms: i32,
        error_message: Option<&str>,
    ) -> Result<(), LLMError> {
        sqlx::query(
            r#"UPDATE analysis_sessions
               SET status = ?, input_tokens = ?, output_tokens = ?, latency_ms = ?,
                   error_message = ?, completed_at = CURRENT_TIMESTAMP
               WHERE id = ?"#,
        )
        .bind(status.as_str())
        .bind(input_tokens)
        .bind(output_tokens)
        .bind(latency_ms)
        .bind(error_message)
        .bind(session_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Get a session by id
    pub async fn get_session(
        &self,
        session_id: &str,
    ) -> Result<Option<LLMAnalysisSession>, LLMError> {
        sqlx::query_as::<_, LLMAnalysisSession>("SELECT * FROM analysis_sessions WHERE id = ?")
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(LLMError::from)
    }
}
