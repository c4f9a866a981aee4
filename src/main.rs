use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use dbpower_ai::config::Config;
use dbpower_ai::services::{AnalysisService, LLMServiceImpl};
use dbpower_ai::{AppState, db, handlers, services};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::analyze::analyze,
        handlers::analyze::rewrite,
        handlers::analyze::analyze_quick,
        handlers::review::list_validation_failures,
        handlers::system::health,
    ),
    components(
        schemas(
            handlers::analyze::AnalyzeReq,
            handlers::analyze::RewriteReq,
            handlers::analyze::AnalyzeResp,
            handlers::system::HealthResponse,
            services::AnalysisResult,
            services::DetectedPattern,
            services::SqlStructure,
            services::sql_analyzer::JoinClause,
            services::sql_analyzer::JoinType,
            services::sql_analyzer::PatternSeverity,
            services::sql_analyzer::Severity,
            services::sql_analyzer::ValidatorStatus,
            services::LLMProviderInfo,
            services::CreateProviderRequest,
            services::UpdateProviderRequest,
            services::TestConnectionResponse,
            services::ValidationFailure,
        )
    ),
    tags(
        (name = "SQL Analysis", description = "SQL performance analysis and validated rewrites"),
        (name = "Review", description = "Human review of failed validations"),
        (name = "System", description = "Service health"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Load configuration first
    let config = Config::load()?;

    // Initialize logging
    let log_filter = tracing_subscriber::EnvFilter::new(&config.logging.level);
    let registry = tracing_subscriber::registry().with(log_filter);

    // Add file logging if configured
    if let Some(log_file) = &config.logging.file {
        let log_path = std::path::Path::new(log_file);
        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        let log_dir = log_path.parent().and_then(|p| p.to_str()).unwrap_or("logs");
        let file_name = log_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("dbpowerai.log");
        // Remove .log extension if present (rolling appender adds date suffix)
        let file_prefix = file_name.strip_suffix(".log").unwrap_or(file_name);

        let file_appender = tracing_appender::rolling::daily(log_dir, file_prefix);
        let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(non_blocking))
            .with(tracing_subscriber::fmt::layer())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
    tracing::info!("DBPowerAI starting up");

    // Ensure the sqlite directory exists for file-backed databases
    if let Some(path) = config.database.url.strip_prefix("sqlite://")
        && let Some(parent) = std::path::Path::new(path).parent()
    {
        let _ = std::fs::create_dir_all(parent);
    }

    let pool = db::create_pool(&config.database.url).await?;
    tracing::info!("Database pool created successfully");

    // Initialize services
    let llm_service = Arc::new(LLMServiceImpl::new(pool.clone(), config.llm.enabled));
    let analysis_service =
        Arc::new(AnalysisService::new(Arc::clone(&llm_service), pool.clone()));
    tracing::info!("Analysis services initialized (llm enabled: {})", config.llm.enabled);

    let app_state = Arc::new(AppState {
        db: pool.clone(),
        llm_service: Arc::clone(&llm_service),
        analysis_service: Arc::clone(&analysis_service),
    });

    let app = Router::new()
        // SQL analysis
        .route("/api/sql/analyze", post(handlers::analyze::analyze))
        .route("/api/sql/analyze/quick", post(handlers::analyze::analyze_quick))
        .route("/api/sql/rewrite", post(handlers::analyze::rewrite))
        // LLM provider management
        .route(
            "/api/llm/providers",
            get(handlers::llm::list_providers).post(handlers::llm::create_provider),
        )
        .route("/api/llm/providers/active", get(handlers::llm::get_active_provider))
        .route(
            "/api/llm/providers/:id",
            get(handlers::llm::get_provider)
                .put(handlers::llm::update_provider)
                .delete(handlers::llm::delete_provider),
        )
        .route("/api/llm/providers/:id/activate", post(handlers::llm::activate_provider))
        .route("/api/llm/providers/:id/deactivate", post(handlers::llm::deactivate_provider))
        .route("/api/llm/providers/:id/test", post(handlers::llm::test_provider_connection))
        .route("/api/llm/status", get(handlers::llm::get_status))
        // Review
        .route(
            "/api/review/validation-failures",
            get(handlers::review::list_validation_failures),
        )
        // System
        .route("/api/health", get(handlers::system::health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("DBPowerAI listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
