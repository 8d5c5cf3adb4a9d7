//! In-memory implementation of the PhaseStore port.
//!
//! Used by the `memory` store backend and by tests. Reads and writes can be
//! made to fail on demand to exercise the error paths of the callers.

use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicBool, AtomicI32, Ordering},
};

use async_trait::async_trait;
use itertools::Itertools;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::domain::{
    models::{Phase, PhaseId, PhaseInput, PhaseUpdate, ProjectId},
    ports::outbound::PhaseStore,
    PhaseError,
};

/// Phase store backed by a map keyed on phase id.
#[derive(Debug)]
pub struct InMemoryPhaseStore {
    phases: RwLock<BTreeMap<PhaseId, Phase>>,
    next_id: AtomicI32,
    /// Make every read fail with a store error.
    pub fail_reads: AtomicBool,
    /// Make every write fail with a store error.
    pub fail_writes: AtomicBool,
}

impl Default for InMemoryPhaseStore {
    fn default() -> Self {
        Self {
            phases: RwLock::new(BTreeMap::new()),
            next_id: AtomicI32::new(1),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }
}

impl InMemoryPhaseStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_read(&self) -> Result<(), PhaseError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(PhaseError::store("phase store is unavailable for reads"));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), PhaseError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PhaseError::store("phase store is unavailable for writes"));
        }
        Ok(())
    }

    fn record(
        &self,
        project_id: ProjectId,
        parent_phase_id: Option<PhaseId>,
        input: &PhaseInput,
    ) -> Phase {
        let now = OffsetDateTime::now_utc();
        Phase {
            id: PhaseId::new(self.next_id.fetch_add(1, Ordering::SeqCst)),
            project_id,
            parent_phase_id,
            phase_name: input.phase_name.clone(),
            phase_description: input.phase_description.clone(),
            estimated_duration: input.estimated_duration.clone(),
            phase_order: input.phase_order,
            phase_weight: input.phase_weight,
            is_completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    async fn set_completed(&self, phase_id: &PhaseId, completed: bool) -> Result<Phase, PhaseError> {
        self.check_write()?;
        let mut phases = self.phases.write().await;
        let phase = phases
            .get_mut(phase_id)
            .ok_or(PhaseError::NotFound(*phase_id))?;
        phase.is_completed = completed;
        phase.updated_at = OffsetDateTime::now_utc();
        Ok(phase.clone())
    }
}

#[async_trait]
impl PhaseStore for InMemoryPhaseStore {
    async fn list_by_project(&self, project_id: &ProjectId) -> Result<Vec<Phase>, PhaseError> {
        self.check_read()?;
        let phases = self
            .phases
            .read()
            .await
            .values()
            .filter(|p| p.project_id == *project_id)
            .cloned()
            .sorted_by_key(|p| (p.phase_order, p.id))
            .collect();
        Ok(phases)
    }

    async fn mark_completed(&self, phase_id: &PhaseId) -> Result<Phase, PhaseError> {
        self.set_completed(phase_id, true).await
    }

    async fn mark_incomplete(&self, phase_id: &PhaseId) -> Result<Phase, PhaseError> {
        self.set_completed(phase_id, false).await
    }

    async fn create_many(
        &self,
        project_id: &ProjectId,
        phases: &[PhaseInput],
    ) -> Result<Vec<Phase>, PhaseError> {
        self.check_write()?;
        let mut stored = self.phases.write().await;

        for input in phases {
            if let Some(parent_id) = input.parent_phase_id {
                match stored.get(&parent_id) {
                    Some(parent) if parent.project_id == *project_id => {}
                    _ => return Err(PhaseError::NotFound(parent_id)),
                }
            }
        }

        // Nothing is inserted until every record is built, so a failed call
        // leaves the map untouched.
        let mut created = Vec::new();
        for input in phases {
            let parent = self.record(*project_id, input.parent_phase_id, input);
            let parent_id = parent.id;
            created.push(parent);
            for sub_task in &input.sub_tasks {
                created.push(self.record(*project_id, Some(parent_id), sub_task));
            }
        }

        for phase in &created {
            stored.insert(phase.id, phase.clone());
        }
        Ok(created)
    }

    async fn update(&self, phase_id: &PhaseId, update: &PhaseUpdate) -> Result<Phase, PhaseError> {
        self.check_write()?;
        let mut phases = self.phases.write().await;
        let phase = phases
            .get_mut(phase_id)
            .ok_or(PhaseError::NotFound(*phase_id))?;
        update.apply_to(phase);
        phase.updated_at = OffsetDateTime::now_utc();
        Ok(phase.clone())
    }

    async fn delete_many(&self, phase_ids: &[PhaseId]) -> Result<(), PhaseError> {
        self.check_write()?;
        let mut phases = self.phases.write().await;
        for id in phase_ids {
            phases.remove(id);
        }
        // Sub-tasks go with their parent.
        phases.retain(|_, p| {
            p.parent_phase_id
                .map_or(true, |parent| !phase_ids.contains(&parent))
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> ProjectId {
        ProjectId::new(1)
    }

    #[tokio::test]
    async fn create_many_nests_sub_tasks_under_new_parent() {
        let store = InMemoryPhaseStore::new();
        let created = store
            .create_many(
                &project(),
                &[PhaseInput::new("Permits & Approvals", 1, 10.0)
                    .with_sub_task(PhaseInput::new("Submission", 1, 4.0))
                    .with_sub_task(PhaseInput::new("Revisions", 2, 2.5))],
            )
            .await
            .unwrap();

        assert_eq!(created.len(), 3);
        let parent = &created[0];
        assert!(parent.is_top_level());
        assert!(created[1..]
            .iter()
            .all(|p| p.parent_phase_id == Some(parent.id)));
        assert!(created.iter().all(|p| !p.is_completed));
    }

    #[tokio::test]
    async fn list_is_scoped_and_ordered() {
        let store = InMemoryPhaseStore::new();
        store
            .create_many(
                &project(),
                &[
                    PhaseInput::new("Second", 2, 10.0),
                    PhaseInput::new("First", 1, 10.0),
                ],
            )
            .await
            .unwrap();
        store
            .create_many(&ProjectId::new(2), &[PhaseInput::new("Elsewhere", 1, 10.0)])
            .await
            .unwrap();

        let names: Vec<_> = store
            .list_by_project(&project())
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.phase_name)
            .collect();
        assert_eq!(names, vec!["First", "Second"]);
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let store = InMemoryPhaseStore::new();
        let missing = PhaseId::new(99);

        assert!(matches!(
            store.mark_completed(&missing).await,
            Err(PhaseError::NotFound(id)) if id == missing
        ));
        assert!(matches!(
            store
                .create_many(
                    &project(),
                    &[PhaseInput::new("Orphan", 1, 1.0).with_parent(missing)]
                )
                .await,
            Err(PhaseError::NotFound(_))
        ));
        assert!(store.list_by_project(&project()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_removes_sub_tasks() {
        let store = InMemoryPhaseStore::new();
        let created = store
            .create_many(
                &project(),
                &[
                    PhaseInput::new("Design Development", 1, 10.0)
                        .with_sub_task(PhaseInput::new("Detailing", 1, 4.0)),
                    PhaseInput::new("Handover", 2, 10.0),
                ],
            )
            .await
            .unwrap();

        store.delete_many(&[created[0].id]).await.unwrap();

        let remaining = store.list_by_project(&project()).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].phase_name, "Handover");
    }

    #[tokio::test]
    async fn failing_writes_change_nothing() {
        let store = InMemoryPhaseStore::new();
        let created = store
            .create_many(&project(), &[PhaseInput::new("Pre-Design", 1, 10.0)])
            .await
            .unwrap();

        store.fail_writes.store(true, Ordering::SeqCst);
        assert!(matches!(
            store.mark_completed(&created[0].id).await,
            Err(PhaseError::Store(_))
        ));

        let phases = store.list_by_project(&project()).await.unwrap();
        assert!(!phases[0].is_completed);
    }
}
