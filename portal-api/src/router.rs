use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, TraceLayer},
};

use crate::{app_state::AppState, routes};

/// Routes and state without the HTTP layers.
pub fn build(app_state: AppState) -> Router<()> {
    Router::new()
        .route("/", get(|| async { "portal-api: phase progress service is up" }))
        .route("/phase-template", get(routes::template::get_phase_template))
        .nest("/projects", routes::phases::router())
        .with_state(app_state)
}

pub fn create(app_state: AppState, app_url: &str) -> Router<()> {
    let allowed_origin = match HeaderValue::from_str(app_url) {
        Ok(origin) => AllowOrigin::exact(origin),
        Err(_) => {
            tracing::warn!("app_url '{}' is not a valid origin, allowing none", app_url);
            AllowOrigin::list(Vec::<HeaderValue>::new())
        }
    };
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([axum::http::header::CONTENT_TYPE])
        .allow_origin(allowed_origin);

    build(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::{
        adapters::outbound::memory::InMemoryPhaseStore, domain::services::PhaseProgressServiceImpl,
    };

    #[tokio::test]
    async fn root_names_the_service() {
        let service = PhaseProgressServiceImpl::new(Arc::new(InMemoryPhaseStore::new()));
        let app = build(AppState::new(Arc::new(service)));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"portal-api: phase progress service is up");
    }
}
