// Workflow HTTP routes
//
// Triggering returns immediately with the new instance's id; execution
// happens on the engine's background task. Cancellation is a status write
// the running step loop observes at its next step boundary.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use aegis_core::workflow::{WorkflowInstance, WorkflowStatus};
use aegis_engine::{TriggerRequest, WorkflowEngine};
use aegis_storage::WorkflowFilter;

use crate::common::{ApiError, ListResponse};

/// App state for workflow routes
#[derive(Clone)]
pub struct AppState {
    pub engine: WorkflowEngine,
}

/// Create workflow routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/workflows/trigger", post(trigger_workflow))
        .route("/v1/workflows", get(list_workflows))
        .route("/v1/workflows/:id", get(get_workflow))
        .route("/v1/workflows/:id/cancel", post(cancel_workflow))
        .with_state(state)
}

fn default_parameters() -> Value {
    Value::Object(Default::default())
}

/// Request to trigger a workflow
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TriggerWorkflowRequest {
    /// Registered workflow type, e.g. "threat-analysis"
    #[serde(rename = "workflowType")]
    #[schema(example = "threat-analysis")]
    pub workflow_type: String,
    /// Parameters made available to every step of the instance
    #[serde(default = "default_parameters")]
    pub parameters: Value,
    /// Priority label recorded on the instance (default "normal")
    pub priority: Option<String>,
}

/// Id and status of a workflow instance
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStatusResponse {
    pub workflow_id: Uuid,
    pub status: WorkflowStatus,
}

/// Query parameters for listing workflows
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ListWorkflowsQuery {
    /// Filter by lifecycle status
    pub status: Option<String>,
    /// Filter by workflow type
    #[serde(rename = "type")]
    pub workflow_type: Option<String>,
    /// Maximum number of instances to return (default 50)
    pub limit: Option<usize>,
}

/// POST /v1/workflows/trigger - Start a new workflow instance
#[utoipa::path(
    post,
    path = "/v1/workflows/trigger",
    request_body = TriggerWorkflowRequest,
    responses(
        (status = 202, description = "Workflow started", body = WorkflowStatusResponse),
        (status = 404, description = "Unknown workflow type"),
    ),
    tag = "workflows"
)]
pub async fn trigger_workflow(
    State(state): State<AppState>,
    Json(req): Json<TriggerWorkflowRequest>,
) -> Result<(StatusCode, Json<WorkflowStatusResponse>), ApiError> {
    let instance = state
        .engine
        .trigger(TriggerRequest {
            workflow_type: req.workflow_type,
            parameters: req.parameters,
            priority: req.priority,
        })
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(WorkflowStatusResponse {
            workflow_id: instance.id,
            status: instance.status,
        }),
    ))
}

/// GET /v1/workflows/{id} - Get a workflow instance
#[utoipa::path(
    get,
    path = "/v1/workflows/{id}",
    params(
        ("id" = Uuid, Path, description = "Workflow instance ID")
    ),
    responses(
        (status = 200, description = "Workflow instance", body = WorkflowInstance),
        (status = 404, description = "Workflow not found"),
    ),
    tag = "workflows"
)]
pub async fn get_workflow(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WorkflowInstance>, ApiError> {
    let instance = state.engine.get(id).await?;
    Ok(Json(instance))
}

/// GET /v1/workflows - List workflow instances, newest first
#[utoipa::path(
    get,
    path = "/v1/workflows",
    params(ListWorkflowsQuery),
    responses(
        (status = 200, description = "Workflow instances", body = ListResponse<WorkflowInstance>),
        (status = 400, description = "Invalid status filter"),
    ),
    tag = "workflows"
)]
pub async fn list_workflows(
    State(state): State<AppState>,
    Query(query): Query<ListWorkflowsQuery>,
) -> Result<Json<ListResponse<WorkflowInstance>>, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<WorkflowStatus>)
        .transpose()
        .map_err(ApiError::bad_request)?;

    let instances = state
        .engine
        .list(&WorkflowFilter {
            status,
            workflow_type: query.workflow_type,
            limit: query.limit,
        })
        .await?;
    Ok(Json(ListResponse::new(instances)))
}

/// POST /v1/workflows/{id}/cancel - Cancel a running workflow
#[utoipa::path(
    post,
    path = "/v1/workflows/{id}/cancel",
    params(
        ("id" = Uuid, Path, description = "Workflow instance ID")
    ),
    responses(
        (status = 200, description = "Workflow cancelled", body = WorkflowStatusResponse),
        (status = 404, description = "Workflow not found"),
        (status = 409, description = "Workflow already finished"),
    ),
    tag = "workflows"
)]
pub async fn cancel_workflow(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WorkflowStatusResponse>, ApiError> {
    let instance = state.engine.cancel(id).await?;
    Ok(Json(WorkflowStatusResponse {
        workflow_id: instance.id,
        status: instance.status,
    }))
}
