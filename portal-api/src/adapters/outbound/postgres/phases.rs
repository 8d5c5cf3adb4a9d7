//! PostgreSQL implementation of the PhaseStore port.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{
    models::{Phase, PhaseId, PhaseInput, PhaseUpdate, ProjectId},
    ports::outbound::PhaseStore,
    PhaseError,
};
use crate::repositories::{
    DatabasePhase, NewDatabasePhase, PhaseRepository, PhaseRepositoryImpl, RepositoryError,
    UpdateDatabasePhase,
};

/// Adapter that implements PhaseStore using PostgreSQL.
pub struct PostgresPhaseStore<R = PhaseRepositoryImpl> {
    repo: Arc<R>,
}

impl<R> PostgresPhaseStore<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl<R: PhaseRepository + Send + Sync + 'static> PhaseStore for PostgresPhaseStore<R> {
    async fn list_by_project(&self, project_id: &ProjectId) -> Result<Vec<Phase>, PhaseError> {
        let phases = self
            .repo
            .phases_by_project(project_id.as_i32())
            .await
            .map_err(|e| to_phase_error(e, None))?;

        Ok(phases.into_iter().map(db_phase_to_phase).collect())
    }

    async fn mark_completed(&self, phase_id: &PhaseId) -> Result<Phase, PhaseError> {
        self.repo
            .set_completed(phase_id.as_i32(), true)
            .await
            .map(db_phase_to_phase)
            .map_err(|e| to_phase_error(e, Some(*phase_id)))
    }

    async fn mark_incomplete(&self, phase_id: &PhaseId) -> Result<Phase, PhaseError> {
        self.repo
            .set_completed(phase_id.as_i32(), false)
            .await
            .map(db_phase_to_phase)
            .map_err(|e| to_phase_error(e, Some(*phase_id)))
    }

    async fn create_many(
        &self,
        project_id: &ProjectId,
        phases: &[PhaseInput],
    ) -> Result<Vec<Phase>, PhaseError> {
        let new_phases: Vec<NewDatabasePhase> = phases.iter().map(input_to_db_phase).collect();
        let expected: usize = phases.iter().map(PhaseInput::record_count).sum();

        let created = self
            .repo
            .insert_phases(project_id.as_i32(), &new_phases)
            .await
            .map_err(|e| to_phase_error(e, None))?;

        if created.len() != expected {
            tracing::warn!(
                "expected {} inserted phases for project {}, got {}",
                expected,
                project_id,
                created.len()
            );
        }

        Ok(created.into_iter().map(db_phase_to_phase).collect())
    }

    async fn update(&self, phase_id: &PhaseId, update: &PhaseUpdate) -> Result<Phase, PhaseError> {
        let update = UpdateDatabasePhase {
            phase_name: update.phase_name.as_ref().map(|n| n.trim().to_string()),
            phase_description: update.phase_description.as_deref().map(blank_to_none),
            estimated_duration: update.estimated_duration.as_deref().map(blank_to_none),
            phase_order: update.phase_order,
            phase_weight: update.phase_weight,
        };

        self.repo
            .update_phase(phase_id.as_i32(), &update)
            .await
            .map(db_phase_to_phase)
            .map_err(|e| to_phase_error(e, Some(*phase_id)))
    }

    async fn delete_many(&self, phase_ids: &[PhaseId]) -> Result<(), PhaseError> {
        let ids: Vec<i32> = phase_ids.iter().map(PhaseId::as_i32).collect();
        let deleted = self
            .repo
            .delete_phases(&ids)
            .await
            .map_err(|e| to_phase_error(e, None))?;

        tracing::debug!("deleted {} phase rows", deleted);
        Ok(())
    }
}

fn to_phase_error(err: RepositoryError, phase_id: Option<PhaseId>) -> PhaseError {
    match (err, phase_id) {
        (RepositoryError::NotFound(_), Some(id)) => PhaseError::NotFound(id),
        (err, _) => {
            tracing::error!("phase repository error: {:?}", err);
            PhaseError::store(err.to_string())
        }
    }
}

fn blank_to_none(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn input_to_db_phase(input: &PhaseInput) -> NewDatabasePhase {
    NewDatabasePhase {
        parent_phase_id: input.parent_phase_id.map(|id| id.as_i32()),
        phase_name: input.phase_name.clone(),
        phase_description: input.phase_description.clone(),
        estimated_duration: input.estimated_duration.clone(),
        phase_order: input.phase_order,
        phase_weight: input.phase_weight,
        sub_tasks: input.sub_tasks.iter().map(input_to_db_phase).collect(),
    }
}

fn db_phase_to_phase(row: DatabasePhase) -> Phase {
    Phase {
        id: PhaseId::new(row.id),
        project_id: ProjectId::new(row.project_id),
        parent_phase_id: row.parent_phase_id.map(PhaseId::new),
        phase_name: row.phase_name,
        phase_description: row.phase_description,
        estimated_duration: row.estimated_duration,
        phase_order: row.phase_order,
        phase_weight: row.phase_weight,
        is_completed: row.is_completed,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;

    #[test]
    fn rows_map_to_domain_phases() {
        let now = OffsetDateTime::now_utc();
        let phase = db_phase_to_phase(DatabasePhase {
            id: 12,
            project_id: 3,
            parent_phase_id: Some(4),
            phase_name: "Tender".to_string(),
            phase_description: None,
            estimated_duration: Some("2 weeks".to_string()),
            phase_order: 2,
            phase_weight: 2.5,
            is_completed: true,
            created_at: now,
            updated_at: now,
        });

        assert_eq!(phase.id, PhaseId::new(12));
        assert_eq!(phase.parent_phase_id, Some(PhaseId::new(4)));
        assert!(!phase.is_top_level());
        assert!(phase.is_completed);
    }

    #[test]
    fn not_found_keeps_the_phase_id() {
        let err = to_phase_error(
            RepositoryError::NotFound("phase 5".to_string()),
            Some(PhaseId::new(5)),
        );
        assert!(matches!(err, PhaseError::NotFound(id) if id == PhaseId::new(5)));

        let err = to_phase_error(RepositoryError::NotFound("phase".to_string()), None);
        assert!(matches!(err, PhaseError::Store(_)));
    }

    #[test]
    fn inputs_keep_their_sub_tasks() {
        let input = PhaseInput::new("Construction Documents", 5, 10.0)
            .with_sub_task(PhaseInput::new("Drawings", 1, 5.0).with_duration("4 weeks"));
        let row = input_to_db_phase(&input);

        assert_eq!(row.parent_phase_id, None);
        assert_eq!(row.sub_tasks.len(), 1);
        assert_eq!(row.sub_tasks[0].estimated_duration.as_deref(), Some("4 weeks"));
    }
}
