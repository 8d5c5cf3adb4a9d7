use async_trait::async_trait;

use crate::domain::{
    models::{
        BoardSnapshot, MutationOutcome, NewPhaseRequest, PhaseId, PhaseTemplate, PhaseUpdate,
        ProjectId,
    },
    PhaseError,
};

/// Inbound port for the phase checklist of a project.
///
/// This trait defines the use cases that HTTP handlers can invoke. Every
/// successful call returns the project's current tree and progress figures.
#[async_trait]
pub trait PhaseProgressService: Send + Sync + 'static {
    /// The standard phase catalog used by `generate_default_phases`.
    fn template(&self) -> &'static [PhaseTemplate];

    /// Reload a project's phases from the store.
    async fn load_board(&self, project_id: &ProjectId) -> Result<BoardSnapshot, PhaseError>;

    /// Flip one phase's completion, given the flag the caller currently sees.
    async fn toggle_phase(
        &self,
        project_id: &ProjectId,
        phase_id: &PhaseId,
        current_completed: bool,
    ) -> Result<BoardSnapshot, PhaseError>;

    /// Create the template phases for a project that has none.
    ///
    /// Fails with `AlreadyInitialized` when the project already has phases.
    async fn generate_default_phases(
        &self,
        project_id: &ProjectId,
    ) -> Result<BoardSnapshot, PhaseError>;

    // ========================================================================
    // Admin editing
    // ========================================================================

    async fn create_phase(
        &self,
        project_id: &ProjectId,
        request: NewPhaseRequest,
    ) -> Result<BoardSnapshot, PhaseError>;

    async fn update_phase(
        &self,
        project_id: &ProjectId,
        phase_id: &PhaseId,
        update: PhaseUpdate,
    ) -> Result<BoardSnapshot, PhaseError>;

    /// Copy a phase and its sub-tasks. Needs `confirmed` to take effect.
    async fn duplicate_phase(
        &self,
        project_id: &ProjectId,
        phase_id: &PhaseId,
        confirmed: bool,
    ) -> Result<MutationOutcome<BoardSnapshot>, PhaseError>;

    /// Delete a phase and its sub-tasks. Needs `confirmed` to take effect.
    async fn delete_phase(
        &self,
        project_id: &ProjectId,
        phase_id: &PhaseId,
        confirmed: bool,
    ) -> Result<MutationOutcome<BoardSnapshot>, PhaseError>;
}
