//! Phase store port (outbound).
//!
//! The relational backend holding project phases, treated as plain CRUD.

use async_trait::async_trait;

use crate::domain::{
    models::{Phase, PhaseId, PhaseInput, PhaseUpdate, ProjectId},
    PhaseError,
};

/// Outbound port for phase persistence.
///
/// Implementations are authoritative for the records they return: ids,
/// timestamps and completion flags come back as stored.
#[async_trait]
pub trait PhaseStore: Send + Sync + 'static {
    /// Get all phases of a project, ordered by `phase_order`.
    async fn list_by_project(&self, project_id: &ProjectId) -> Result<Vec<Phase>, PhaseError>;

    /// Mark a phase as completed. Fails with `NotFound` for an unknown id.
    async fn mark_completed(&self, phase_id: &PhaseId) -> Result<Phase, PhaseError>;

    /// Mark a phase as not completed. Fails with `NotFound` for an unknown id.
    async fn mark_incomplete(&self, phase_id: &PhaseId) -> Result<Phase, PhaseError>;

    /// Insert phases in one call.
    ///
    /// Each input's `sub_tasks` are inserted under the phase created from it.
    /// Returns every created record, parents before their sub-tasks.
    async fn create_many(
        &self,
        project_id: &ProjectId,
        phases: &[PhaseInput],
    ) -> Result<Vec<Phase>, PhaseError>;

    /// Update the editable details of a phase.
    async fn update(&self, phase_id: &PhaseId, update: &PhaseUpdate)
        -> Result<Phase, PhaseError>;

    /// Delete the given phases. Unknown ids are ignored.
    async fn delete_many(&self, phase_ids: &[PhaseId]) -> Result<(), PhaseError>;
}
