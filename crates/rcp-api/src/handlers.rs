use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use rcp_domain::{Application, ComponentProperties, ComponentRevision, Scope};
use rcp_operations::{GetOperationOutcome, MutationAck, MutationMode};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;

// ── Health ────────────────────────────────────────────────────────────────────

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn ready(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.store.list_applications().await?;
    Ok(StatusCode::OK)
}

// ── Poll location ─────────────────────────────────────────────────────────────

/// Build the absolute poll-location URL for a deployment operation.
///
/// Scheme respects `X-Forwarded-Proto` when present, else defaults to
/// `http`. Host comes from the request's `Host` header when present,
/// falling back to `AppState.api_base` for callers (e.g. background
/// tests) that send none.
fn poll_location(headers: &HeaderMap, state: &AppState, application: &str, deployment: &str, operation_id: &str) -> String {
    let proto = headers.get("x-forwarded-proto").and_then(|v| v.to_str().ok()).unwrap_or("http");
    let base = match headers.get(axum::http::header::HOST).and_then(|v| v.to_str().ok()) {
        Some(host) => format!("{proto}://{host}"),
        None => (*state.api_base).clone(),
    };
    format!("{base}/applications/{application}/deployments/{deployment}/operationresults/{operation_id}")
}

// ── Applications ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct ApplicationBody {
    #[serde(default)]
    pub properties: serde_json::Map<String, Value>,
}

pub async fn list_applications(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let apps = state.store.list_applications().await?;
    Ok(Json(json!(apps)))
}

pub async fn get_application(State(state): State<AppState>, Path(name): Path<String>) -> Result<Json<Value>, ApiError> {
    let app = state
        .store
        .get_application(&name)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("application '{name}' not found")))?;
    Ok(Json(json!(app)))
}

pub async fn put_application(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<ApplicationBody>,
) -> Result<Response, ApiError> {
    if let Some(existing) = state.store.get_application(&name).await? {
        return Ok((StatusCode::OK, Json(json!(existing))).into_response());
    }
    let mut app = Application::new(name);
    app.properties = body.properties;
    state.store.create_application(&app).await?;
    Ok((StatusCode::CREATED, Json(json!(app))).into_response())
}

pub async fn delete_application(State(state): State<AppState>, Path(name): Path<String>) -> Result<StatusCode, ApiError> {
    let app = state
        .store
        .get_application(&name)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("application '{name}' not found")))?;
    if !app.can_delete() {
        return Err(ApiError::conflict(format!("application '{name}' still has deployments")));
    }
    state.store.delete_application(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Components ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ComponentBody {
    pub kind: String,
    pub properties: ComponentProperties,
    #[serde(default)]
    pub expected_revision: Option<String>,
}

pub async fn get_component(
    State(state): State<AppState>,
    Path((application, name)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let app = state
        .store
        .get_application(&application)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("application '{application}' not found")))?;
    let history = app
        .components
        .get(&name)
        .ok_or_else(|| ApiError::not_found(format!("component '{name}' not found")))?;
    Ok(Json(json!(history)))
}

pub async fn put_component(
    State(state): State<AppState>,
    Path((application, name)): Path<(String, String)>,
    Json(body): Json<ComponentBody>,
) -> Result<Response, ApiError> {
    let app = state
        .store
        .get_application(&application)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("application '{application}' not found")))?;

    let revision = ComponentRevision::new(body.kind.clone(), body.properties)?;
    let is_new = app.components.get(&name).map(|h| h.current_revision != revision.revision).unwrap_or(true);
    let existed = app.components.contains_key(&name);

    state
        .store
        .append_component_revision(&application, &name, body.kind, revision, body.expected_revision.as_deref())
        .await?;

    let status = if !existed {
        StatusCode::CREATED
    } else if is_new {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    let app = state.store.get_application(&application).await?.unwrap();
    let history = app.components.get(&name).cloned();
    Ok((status, Json(json!(history))).into_response())
}

pub async fn delete_component(
    State(state): State<AppState>,
    Path((application, name)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_component(&application, &name).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Scopes ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct ScopeBody {
    #[serde(default)]
    pub properties: serde_json::Map<String, Value>,
}

pub async fn get_scope(
    State(state): State<AppState>,
    Path((application, name)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let scope = state
        .store
        .get_scope(&application, &name)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("scope '{name}' not found")))?;
    Ok(Json(json!(scope)))
}

pub async fn put_scope(
    State(state): State<AppState>,
    Path((application, name)): Path<(String, String)>,
    Json(body): Json<ScopeBody>,
) -> Result<Response, ApiError> {
    let existed = state.store.get_scope(&application, &name).await?.is_some();
    let scope = Scope { name: name.clone(), properties: body.properties };
    state.store.upsert_scope(&application, &scope).await?;
    let status = if existed { StatusCode::OK } else { StatusCode::CREATED };
    Ok((status, Json(json!(scope))).into_response())
}

pub async fn delete_scope(
    State(state): State<AppState>,
    Path((application, name)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_scope(&application, &name).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Deployments ───────────────────────────────────────────────────────────────

pub async fn get_deployment(
    State(state): State<AppState>,
    Path((application, name)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let deployment = state
        .store
        .get_deployment(&application, &name)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("deployment '{name}' not found")))?;
    Ok(Json(json!(deployment)))
}

pub async fn put_deployment(
    State(state): State<AppState>,
    Path((application, name)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<rcp_domain::DeploymentProperties>,
) -> Result<Response, ApiError> {
    let existed = state.store.get_deployment(&application, &name).await?.is_some();
    let ack = state.operations.process_mutation(&application, &name, MutationMode::Deploy(body)).await?;
    match ack {
        MutationAck::NoOp(deployment) => Ok((StatusCode::OK, Json(json!(deployment))).into_response()),
        MutationAck::Accepted(op) => {
            let location = poll_location(&headers, &state, &application, &name, &op.id);
            let status = if existed { StatusCode::ACCEPTED } else { StatusCode::CREATED };
            Ok((status, [("Location", location)], Json(json!(op))).into_response())
        }
    }
}

pub async fn delete_deployment(
    State(state): State<AppState>,
    Path((application, name)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let ack = state.operations.process_mutation(&application, &name, MutationMode::Delete).await?;
    match ack {
        MutationAck::Accepted(op) => {
            let location = poll_location(&headers, &state, &application, &name, &op.id);
            Ok((StatusCode::ACCEPTED, [("Location", location)], Json(json!(op))).into_response())
        }
        MutationAck::NoOp(deployment) => Ok((StatusCode::OK, Json(json!(deployment))).into_response()),
    }
}

// ── Operation results ─────────────────────────────────────────────────────────

pub async fn list_operations(
    State(state): State<AppState>,
    Path((application, deployment)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let operations = state.store.list_operations(&application, &deployment).await?;
    Ok(Json(json!(operations)))
}

pub async fn get_operation_result(
    State(state): State<AppState>,
    Path((application, deployment, operation_id)): Path<(String, String, String)>,
) -> Result<Response, ApiError> {
    let outcome = state.operations.get_operation(&application, &deployment, &operation_id).await?;
    let response = match outcome {
        GetOperationOutcome::InProgress(op) => (StatusCode::ACCEPTED, Json(json!(op))).into_response(),
        GetOperationOutcome::Ready(deployment) => (StatusCode::OK, Json(json!(deployment))).into_response(),
        GetOperationOutcome::Gone => StatusCode::NO_CONTENT.into_response(),
        GetOperationOutcome::Invalid(op) => {
            let message = op.error.map(|e| e.message).unwrap_or_else(|| "operation failed".into());
            ApiError::bad_request(message).into_response()
        }
        GetOperationOutcome::InternalError(op) => {
            let message = op.error.map(|e| e.message).unwrap_or_else(|| "operation failed".into());
            ApiError::internal(message).into_response()
        }
    };
    Ok(response)
}

// ── Events ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub application: Option<String>,
    pub limit: Option<u32>,
}

pub async fn list_events(State(state): State<AppState>, Query(q): Query<EventsQuery>) -> Result<Json<Value>, ApiError> {
    let events = state.store.list_events(q.application.as_deref(), q.limit.unwrap_or(100)).await?;
    Ok(Json(json!(events)))
}
