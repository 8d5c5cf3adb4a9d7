use axum::{extract::State, Json};
use tracing::instrument;

use crate::{adapters::inbound::http::TemplateResponse, app_state::AppState};

#[instrument(name = "get_phase_template", skip(app_state))]
pub async fn get_phase_template(State(app_state): State<AppState>) -> Json<TemplateResponse> {
    Json(app_state.phase_service.template().into())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use crate::{
        adapters::outbound::memory::InMemoryPhaseStore, domain::services::PhaseProgressServiceImpl,
        router,
    };

    use super::*;

    #[tokio::test]
    async fn template_lists_seven_phases_worth_seventy() {
        let service = PhaseProgressServiceImpl::new(Arc::new(InMemoryPhaseStore::new()));
        let app = router::build(AppState::new(Arc::new(service)));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/phase-template")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["phases"].as_array().unwrap().len(), 7);
        assert_eq!(json["totalWeight"], 70.0);
        assert_eq!(json["phases"][6]["name"], "Handover & Close-out");
        assert_eq!(json["phases"][6]["subTasks"], serde_json::json!([]));
    }
}
