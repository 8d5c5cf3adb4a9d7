use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::outbound::{memory::InMemoryPhaseStore, postgres::PostgresPhaseStore},
    app_state::AppState,
    config::{Settings, StoreBackend},
    domain::{ports::inbound::PhaseProgressService, services::PhaseProgressServiceImpl},
    repositories::PhaseRepositoryImpl,
};

mod adapters;
mod app_state;
mod config;
mod domain;
mod repositories;
mod router;
mod routes;

#[tokio::main]
async fn main() {
    dotenvy::from_filename(".env.local").ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,portal_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::read_config().expect("Failed to read configuration");
    let phase_service = phase_service(&config).await;
    let app = router::create(AppState::new(phase_service), &config.application.app_url);

    let addr = format!("{}:{}", config.application.host, config.application.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind address");
    tracing::info!("listening on {}", addr);

    axum::serve(listener, app).await.expect("Server error");
}

async fn phase_service(config: &Settings) -> Arc<dyn PhaseProgressService> {
    match config.store.backend {
        StoreBackend::Postgres => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect_with(config.database.with_db())
                .await
                .expect("Failed to connect to database");
            sqlx::migrate!()
                .run(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("using postgres phase store");

            let repo = Arc::new(PhaseRepositoryImpl::new(pool));
            Arc::new(PhaseProgressServiceImpl::new(Arc::new(
                PostgresPhaseStore::new(repo),
            )))
        }
        StoreBackend::Memory => {
            tracing::warn!("using in-memory phase store, phases are lost on restart");
            Arc::new(PhaseProgressServiceImpl::new(Arc::new(
                InMemoryPhaseStore::new(),
            )))
        }
    }
}
