use std::sync::Arc;

use crate::domain::ports::inbound::PhaseProgressService;

#[derive(Clone)]
pub struct AppState {
    pub phase_service: Arc<dyn PhaseProgressService>,
}

impl AppState {
    pub fn new(phase_service: Arc<dyn PhaseProgressService>) -> Self {
        Self { phase_service }
    }
}
