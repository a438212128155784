// Aegis API server
// Decision: one binary hosts the API and the in-process workflow engine;
// triggered instances run on background tasks inside this process.

mod common;
mod workflows;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use aegis_core::llm::AiClient;
use aegis_core::registry::DefinitionRegistry;
use aegis_core::traits::KeyValueStore;
use aegis_core::workflow::{
    ErrorRecord, StepDefinition, StepKind, StepRecord, WorkflowInstance, WorkflowStatus,
};
use aegis_engine::{ExecutorContext, StepExecutors, WorkflowEngine};
use aegis_storage::{MemoryStore, NotificationStore, ThreatStore, WorkflowStore};

use common::ListResponse;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    workflow_types: Vec<String>,
}

/// State for the health endpoint
#[derive(Clone)]
struct HealthState {
    workflow_types: Vec<String>,
}

async fn health(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        workflow_types: state.workflow_types.clone(),
    })
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        workflows::trigger_workflow,
        workflows::get_workflow,
        workflows::list_workflows,
        workflows::cancel_workflow,
    ),
    components(
        schemas(
            WorkflowInstance, WorkflowStatus,
            StepDefinition, StepKind, StepRecord, ErrorRecord,
            workflows::TriggerWorkflowRequest,
            workflows::WorkflowStatusResponse,
            ListResponse<WorkflowInstance>,
        )
    ),
    tags(
        (name = "workflows", description = "Workflow trigger and status endpoints")
    ),
    info(
        title = "Aegis API",
        version = "0.2.0",
        description = "API for triggering and monitoring threat-intelligence workflows",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aegis_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("aegis-api starting...");

    // LLM client for the analysis/response steps
    let llm = AiClient::from_env().context("Failed to configure LLM client")?;

    // In-memory storage backend shared by all stores
    let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let threats = ThreatStore::new(kv.clone());
    let notifications = NotificationStore::new(kv.clone());
    let workflows_store = WorkflowStore::new(kv);

    let registry = DefinitionRegistry::with_builtins();
    let workflow_types: Vec<String> = registry.types().iter().map(|t| t.to_string()).collect();
    tracing::info!(types = ?workflow_types, "Workflow definitions registered");

    let executors = StepExecutors::new(ExecutorContext {
        llm: Arc::new(llm),
        threats,
        notifications,
        http: reqwest::Client::new(),
    });
    let engine = WorkflowEngine::new(registry, workflows_store, executors);

    let workflows_state = workflows::AppState {
        engine: engine.clone(),
    };
    let health_state = HealthState { workflow_types };

    // Load CORS allowed origins from environment (optional)
    // Example: CORS_ALLOWED_ORIGINS="https://app.example.com,https://admin.example.com"
    let cors_origins: Vec<HeaderValue> = std::env::var("CORS_ALLOWED_ORIGINS")
        .ok()
        .filter(|s| !s.is_empty())
        .map(|s| s.split(',').filter_map(|s| s.trim().parse().ok()).collect())
        .unwrap_or_default();

    if cors_origins.is_empty() {
        tracing::info!("CORS not configured (same-origin requests only)");
    } else {
        tracing::info!(origins = ?cors_origins, "CORS origins configured");
    }

    let app = Router::new()
        .route("/health", get(health).with_state(health_state))
        .merge(workflows::routes(workflows_state))
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()));

    let app = if !cors_origins.is_empty() {
        app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(cors_origins))
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN]),
        )
    } else {
        app
    };

    let app = app.layer(TraceLayer::new_for_http());

    let port = std::env::var("PORT").unwrap_or_else(|_| "8787".to_string());
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    engine.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
