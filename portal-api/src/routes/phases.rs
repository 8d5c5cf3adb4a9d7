use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;

use crate::{
    adapters::inbound::http::{BoardResponse, MutationResponse},
    app_state::AppState,
    domain::models::{NewPhaseRequest, PhaseId, PhaseUpdate, ProjectId},
    routes::ApiError,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:project_id/phases", get(get_phases).post(create_phase))
        .route("/:project_id/phases/defaults", post(generate_default_phases))
        .route(
            "/:project_id/phases/:phase_id",
            put(update_phase).delete(delete_phase),
        )
        .route("/:project_id/phases/:phase_id/toggle", post(toggle_phase))
        .route(
            "/:project_id/phases/:phase_id/duplicate",
            post(duplicate_phase),
        )
}

// ============================================================================
// Board
// ============================================================================

#[instrument(name = "get_phases", skip(app_state))]
async fn get_phases(
    State(app_state): State<AppState>,
    Path(project_id): Path<ProjectId>,
) -> Result<Json<BoardResponse>, ApiError> {
    let snapshot = app_state.phase_service.load_board(&project_id).await?;

    Ok(Json(snapshot.into()))
}

#[instrument(name = "generate_default_phases", skip(app_state))]
async fn generate_default_phases(
    State(app_state): State<AppState>,
    Path(project_id): Path<ProjectId>,
) -> Result<(StatusCode, Json<BoardResponse>), ApiError> {
    let snapshot = app_state
        .phase_service
        .generate_default_phases(&project_id)
        .await?;

    Ok((StatusCode::CREATED, Json(snapshot.into())))
}

// ============================================================================
// Toggle
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TogglePhasePayload {
    /// The completion flag the caller currently displays.
    completed: bool,
}

#[instrument(name = "toggle_phase", skip(app_state))]
async fn toggle_phase(
    State(app_state): State<AppState>,
    Path((project_id, phase_id)): Path<(ProjectId, PhaseId)>,
    Json(body): Json<TogglePhasePayload>,
) -> Result<Json<BoardResponse>, ApiError> {
    let snapshot = app_state
        .phase_service
        .toggle_phase(&project_id, &phase_id, body.completed)
        .await?;

    Ok(Json(snapshot.into()))
}

// ============================================================================
// Create / Update
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePhasePayload {
    parent_phase_id: Option<PhaseId>,
    phase_name: String,
    phase_description: Option<String>,
    estimated_duration: Option<String>,
    phase_order: Option<i32>,
    #[serde(default)]
    phase_weight: f64,
}

#[instrument(name = "create_phase", skip(app_state))]
async fn create_phase(
    State(app_state): State<AppState>,
    Path(project_id): Path<ProjectId>,
    Json(body): Json<CreatePhasePayload>,
) -> Result<(StatusCode, Json<BoardResponse>), ApiError> {
    let request = NewPhaseRequest {
        parent_phase_id: body.parent_phase_id,
        phase_name: body.phase_name,
        phase_description: body.phase_description,
        estimated_duration: body.estimated_duration,
        phase_order: body.phase_order,
        phase_weight: body.phase_weight,
    };

    let snapshot = app_state
        .phase_service
        .create_phase(&project_id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(snapshot.into())))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePhasePayload {
    phase_name: Option<String>,
    phase_description: Option<String>,
    estimated_duration: Option<String>,
    phase_order: Option<i32>,
    phase_weight: Option<f64>,
}

#[instrument(name = "update_phase", skip(app_state))]
async fn update_phase(
    State(app_state): State<AppState>,
    Path((project_id, phase_id)): Path<(ProjectId, PhaseId)>,
    Json(body): Json<UpdatePhasePayload>,
) -> Result<Json<BoardResponse>, ApiError> {
    let update = PhaseUpdate {
        phase_name: body.phase_name,
        phase_description: body.phase_description,
        estimated_duration: body.estimated_duration,
        phase_order: body.phase_order,
        phase_weight: body.phase_weight,
    };
    if update.is_empty() {
        return Err(ApiError::bad_request("no phase fields to update"));
    }

    let snapshot = app_state
        .phase_service
        .update_phase(&project_id, &phase_id, update)
        .await?;

    Ok(Json(snapshot.into()))
}

// ============================================================================
// Duplicate / Delete
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPayload {
    #[serde(default)]
    confirm: bool,
}

#[instrument(name = "duplicate_phase", skip(app_state))]
async fn duplicate_phase(
    State(app_state): State<AppState>,
    Path((project_id, phase_id)): Path<(ProjectId, PhaseId)>,
    body: Option<Json<ConfirmPayload>>,
) -> Result<Json<MutationResponse>, ApiError> {
    // No body means not confirmed.
    let Json(body) = body.unwrap_or_default();
    let outcome = app_state
        .phase_service
        .duplicate_phase(&project_id, &phase_id, body.confirm)
        .await?;

    Ok(Json(outcome.into()))
}

#[instrument(name = "delete_phase", skip(app_state))]
async fn delete_phase(
    State(app_state): State<AppState>,
    Path((project_id, phase_id)): Path<(ProjectId, PhaseId)>,
    Query(query): Query<ConfirmPayload>,
) -> Result<Json<MutationResponse>, ApiError> {
    let outcome = app_state
        .phase_service
        .delete_phase(&project_id, &phase_id, query.confirm)
        .await?;

    Ok(Json(outcome.into()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Method, Request},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::{
        adapters::outbound::memory::InMemoryPhaseStore, domain::services::PhaseProgressServiceImpl,
        router,
    };

    use super::*;

    fn app() -> Router {
        let service = PhaseProgressServiceImpl::new(Arc::new(InMemoryPhaseStore::new()));
        router::build(AppState::new(Arc::new(service)))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn empty_project_has_no_progress() {
        let app = app();

        let (status, body) = send(&app, Method::GET, "/projects/1/phases", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["phases"], json!([]));
        assert_eq!(body["progress"]["percentage"], 0);
        assert_eq!(body["progress"]["total"], 0);
        assert_eq!(body["progress"]["scoreDenominator"], 70.0);
    }

    #[tokio::test]
    async fn defaults_then_toggle() {
        let app = app();

        let (status, body) = send(&app, Method::POST, "/projects/1/phases/defaults", None).await;
        assert_eq!(status, StatusCode::CREATED);
        let phases = body["phases"].as_array().unwrap();
        assert_eq!(phases.len(), 7);
        assert_eq!(phases[0]["status"], "Not Started");
        assert_eq!(phases[0]["subTasks"].as_array().unwrap().len(), 3);

        let sub_task = phases[0]["subTasks"][0]["id"].as_i64().unwrap();
        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/projects/1/phases/{sub_task}/toggle"),
            Some(json!({ "completed": false })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["phases"][0]["status"], "In Progress");
        assert_eq!(body["phases"][0]["subTasks"][0]["status"], "Completed");
        assert_eq!(body["phases"][0]["subTasks"][1]["status"], "Pending");
        assert_eq!(body["progress"]["completed"], 1);
        assert_eq!(body["progress"]["weightedScore"], 3.0);

        let (status, body) = send(&app, Method::POST, "/projects/1/phases/defaults", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "PHASES_ALREADY_INITIALIZED");
    }

    #[tokio::test]
    async fn toggle_unknown_phase_is_404() {
        let app = app();

        let (status, body) = send(
            &app,
            Method::POST,
            "/projects/1/phases/42/toggle",
            Some(json!({ "completed": false })),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("42"));
    }

    #[tokio::test]
    async fn delete_needs_confirmation() {
        let app = app();
        let (_, body) = send(&app, Method::POST, "/projects/1/phases/defaults", None).await;
        let first = body["phases"][0]["id"].as_i64().unwrap();
        let uri = format!("/projects/1/phases/{first}");

        let (status, body) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["confirmationRequired"], true);
        assert_eq!(body["action"], "delete");
        assert_eq!(body["affectedPhaseIds"].as_array().unwrap().len(), 4);

        let (status, body) = send(&app, Method::DELETE, &format!("{uri}?confirm=true"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["phases"].as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn duplicate_without_body_asks_for_confirmation() {
        let app = app();
        let (_, body) = send(&app, Method::POST, "/projects/1/phases/defaults", None).await;
        let first = body["phases"][0]["id"].as_i64().unwrap();
        let uri = format!("/projects/1/phases/{first}/duplicate");

        let (status, body) = send(&app, Method::POST, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["confirmationRequired"], true);
        assert_eq!(body["action"], "duplicate");

        let (status, body) = send(&app, Method::POST, &uri, Some(json!({ "confirm": true }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["phases"].as_array().unwrap().len(), 8);
    }

    #[tokio::test]
    async fn create_rejects_blank_name_and_empty_update() {
        let app = app();

        let (status, _) = send(
            &app,
            Method::POST,
            "/projects/1/phases",
            Some(json!({ "phaseName": "  ", "phaseWeight": 5.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            Method::POST,
            "/projects/1/phases",
            Some(json!({ "phaseName": "Site survey", "phaseWeight": 5.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["phases"][0]["id"].as_i64().unwrap();

        let (status, _) = send(
            &app,
            Method::PUT,
            &format!("/projects/1/phases/{id}"),
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
