//! Per-project state container for the phase checklist.
//!
//! A board holds the last known phase list for one project and mediates every
//! mutation through the phase store. Aggregates are never stored; snapshots are
//! rebuilt from the phase list on every read.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use time::OffsetDateTime;
use tokio::sync::{Mutex, RwLock};

use crate::domain::{
    models::{
        default_phase_inputs, BoardSnapshot, ConfirmationRequest, MutationOutcome, Phase,
        PhaseAction, PhaseId, PhaseInput, PhaseUpdate, ProjectId,
    },
    ports::outbound::PhaseStore,
    PhaseError,
};

use super::{build_tree, summarize};

/// Load state of a board.
///
/// `Idle -> Loading -> Ready | Error`. A reload may start from any state.
/// Per-phase saves are tracked separately so that a save on one phase does
/// not block the others.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Ready,
    Error(String),
}

#[derive(Debug)]
struct BoardInner {
    state: LoadState,
    phases: Vec<Phase>,
    saving: HashSet<PhaseId>,
}

impl BoardInner {
    fn ensure_ready(&self) -> Result<(), PhaseError> {
        match self.state {
            LoadState::Ready => Ok(()),
            _ => Err(PhaseError::NotLoaded),
        }
    }

    fn find(&self, phase_id: PhaseId) -> Result<&Phase, PhaseError> {
        self.phases
            .iter()
            .find(|phase| phase.id == phase_id)
            .ok_or(PhaseError::NotFound(phase_id))
    }

    /// The phase and its direct sub-tasks, the phase first.
    fn with_sub_tasks(&self, phase_id: PhaseId) -> Result<Vec<&Phase>, PhaseError> {
        let phase = self.find(phase_id)?;
        let mut affected = vec![phase];
        if phase.is_top_level() {
            let mut sub_tasks: Vec<&Phase> = self
                .phases
                .iter()
                .filter(|p| p.parent_phase_id == Some(phase_id))
                .collect();
            sub_tasks.sort_by_key(|p| (p.phase_order, p.id));
            affected.extend(sub_tasks);
        }
        Ok(affected)
    }

    fn next_order(&self, parent_phase_id: Option<PhaseId>) -> i32 {
        self.phases
            .iter()
            .filter(|phase| phase.parent_phase_id == parent_phase_id)
            .map(|phase| phase.phase_order)
            .max()
            .unwrap_or(0)
            + 1
    }

    fn begin_save(&mut self, phase_ids: &[PhaseId]) -> Result<(), PhaseError> {
        if let Some(busy) = phase_ids.iter().find(|id| self.saving.contains(*id)) {
            return Err(PhaseError::SaveInProgress(*busy));
        }
        self.saving.extend(phase_ids.iter().copied());
        Ok(())
    }

    fn end_save(&mut self, phase_ids: &[PhaseId]) {
        for id in phase_ids {
            self.saving.remove(id);
        }
    }

    fn replace(&mut self, phase: Phase) {
        match self.phases.iter_mut().find(|p| p.id == phase.id) {
            Some(existing) => *existing = phase,
            None => self.phases.push(phase),
        }
    }

    /// Take a reloaded list while keeping local records the list predates.
    ///
    /// A listed record loses to a local one with the same or a later
    /// `updated_at`. Local records missing from the list survive only when
    /// they were created after the reload started.
    fn merge(&mut self, listed: Vec<Phase>, started: OffsetDateTime) {
        let mut local: HashMap<PhaseId, Phase> =
            self.phases.drain(..).map(|phase| (phase.id, phase)).collect();

        let mut merged: Vec<Phase> = listed
            .into_iter()
            .map(|phase| match local.remove(&phase.id) {
                Some(mine) if mine.updated_at >= phase.updated_at => mine,
                _ => phase,
            })
            .collect();
        merged.extend(
            local
                .into_values()
                .filter(|phase| phase.created_at >= started),
        );
        self.phases = merged;
    }

    fn snapshot(&self) -> Result<BoardSnapshot, PhaseError> {
        self.ensure_ready()?;
        let tree = build_tree(self.phases.clone());
        let progress = summarize(&tree);
        Ok(BoardSnapshot { tree, progress })
    }
}

/// The phase progress engine for one project.
pub struct PhaseBoard<S> {
    project_id: ProjectId,
    store: Arc<S>,
    inner: RwLock<BoardInner>,
    /// Held across the empty check and the bulk create of the defaults.
    defaults: Mutex<()>,
}

impl<S: PhaseStore> PhaseBoard<S> {
    pub fn new(project_id: ProjectId, store: Arc<S>) -> Self {
        Self {
            project_id,
            store,
            inner: RwLock::new(BoardInner {
                state: LoadState::Idle,
                phases: Vec::new(),
                saving: HashSet::new(),
            }),
            defaults: Mutex::new(()),
        }
    }

    pub async fn state(&self) -> LoadState {
        self.inner.read().await.state.clone()
    }

    #[cfg(test)]
    pub async fn is_saving(&self, phase_id: PhaseId) -> bool {
        self.inner.read().await.saving.contains(&phase_id)
    }

    /// The raw phase list as last confirmed by the store.
    #[cfg(test)]
    pub async fn phases(&self) -> Vec<Phase> {
        self.inner.read().await.phases.clone()
    }

    /// Tree and progress figures for the current phase list.
    pub async fn snapshot(&self) -> Result<BoardSnapshot, PhaseError> {
        self.inner.read().await.snapshot()
    }

    /// Fetch the project's phases from the store.
    ///
    /// A first load (from `Idle` or `Error`) moves through `Loading`; on
    /// failure the board enters `Error` and no tree is served until a later
    /// load succeeds. A reload of a `Ready` board keeps serving the current
    /// list meanwhile, merges the result with records saved during the
    /// reload, and on failure keeps the last good list.
    #[tracing::instrument(name = "board_load", skip(self), fields(project_id = %self.project_id))]
    pub async fn load(&self) -> Result<BoardSnapshot, PhaseError> {
        let started = {
            let mut inner = self.inner.write().await;
            if inner.state != LoadState::Ready {
                inner.state = LoadState::Loading;
            }
            OffsetDateTime::now_utc()
        };

        let result = self.store.list_by_project(&self.project_id).await;

        let mut inner = self.inner.write().await;
        let reloading = inner.state == LoadState::Ready;
        match result {
            Ok(phases) => {
                tracing::debug!("loaded {} phases", phases.len());
                if reloading {
                    inner.merge(phases, started);
                } else {
                    inner.phases = phases;
                    inner.state = LoadState::Ready;
                }
                inner.snapshot()
            }
            Err(e) if reloading => {
                tracing::error!("failed to reload phases, keeping last good list: {}", e);
                Err(e)
            }
            Err(e) => {
                tracing::error!("failed to load phases: {}", e);
                inner.phases.clear();
                inner.state = LoadState::Error(e.to_string());
                Err(e)
            }
        }
    }

    /// Load unless the board already holds a good phase list.
    pub async fn ensure_loaded(&self) -> Result<(), PhaseError> {
        if self.state().await == LoadState::Ready {
            return Ok(());
        }
        self.load().await.map(|_| ())
    }

    /// Flip a phase's completion.
    ///
    /// `current_completed` is the flag the caller is looking at; the inverse is
    /// sent to the store. Only phases held by this board can be toggled, and
    /// only the returned record is applied locally. On failure nothing
    /// changes.
    #[tracing::instrument(name = "board_toggle", skip(self), fields(project_id = %self.project_id))]
    pub async fn toggle(
        &self,
        phase_id: PhaseId,
        current_completed: bool,
    ) -> Result<BoardSnapshot, PhaseError> {
        {
            let mut inner = self.inner.write().await;
            inner.ensure_ready()?;
            inner.find(phase_id)?;
            inner.begin_save(&[phase_id])?;
        }

        let result = if current_completed {
            self.store.mark_incomplete(&phase_id).await
        } else {
            self.store.mark_completed(&phase_id).await
        };

        let mut inner = self.inner.write().await;
        inner.end_save(&[phase_id]);
        match result {
            Ok(phase) => {
                inner.replace(phase);
                inner.snapshot()
            }
            Err(e) => {
                tracing::error!("failed to toggle phase {}: {}", phase_id, e);
                Err(e)
            }
        }
    }

    /// Persist the standard template as this project's phases.
    ///
    /// Does not check that the project is empty; running it on a populated
    /// project adds a second set to the store. The created records replace
    /// the local phase list.
    #[tracing::instrument(name = "board_generate_defaults", skip(self), fields(project_id = %self.project_id))]
    pub async fn generate_defaults(&self) -> Result<BoardSnapshot, PhaseError> {
        self.inner.read().await.ensure_ready()?;

        let created = self
            .store
            .create_many(&self.project_id, &default_phase_inputs())
            .await
            .map_err(|e| {
                tracing::error!("failed to create default phases: {}", e);
                e
            })?;

        tracing::info!("created {} default phases", created.len());
        let mut inner = self.inner.write().await;
        inner.phases = created;
        inner.state = LoadState::Ready;
        inner.snapshot()
    }

    /// Generate the defaults unless the store already holds phases for the
    /// project.
    ///
    /// Concurrent calls are serialized, so a project never receives two sets.
    #[tracing::instrument(name = "board_initialize_defaults", skip(self), fields(project_id = %self.project_id))]
    pub async fn initialize_defaults(&self) -> Result<BoardSnapshot, PhaseError> {
        let _guard = self.defaults.lock().await;

        // Fresh read so a set created elsewhere is not duplicated.
        let current = self.load().await?;
        if !current.tree.phases.is_empty() {
            return Err(PhaseError::AlreadyInitialized);
        }
        self.generate_defaults().await
    }

    /// Next free `phase_order` among the siblings under `parent_phase_id`.
    pub async fn next_order(&self, parent_phase_id: Option<PhaseId>) -> i32 {
        self.inner.read().await.next_order(parent_phase_id)
    }

    /// Create a single phase or sub-task.
    #[tracing::instrument(name = "board_create_phase", skip(self, input), fields(project_id = %self.project_id))]
    pub async fn create_phase(&self, input: PhaseInput) -> Result<BoardSnapshot, PhaseError> {
        input.validate()?;
        {
            let inner = self.inner.read().await;
            inner.ensure_ready()?;
            if let Some(parent_id) = input.parent_phase_id {
                let parent = inner.find(parent_id)?;
                if !parent.is_top_level() {
                    return Err(PhaseError::MalformedTree(format!(
                        "phase {} is a sub-task and cannot have sub-tasks",
                        parent_id
                    )));
                }
            }
        }

        let created = self
            .store
            .create_many(&self.project_id, std::slice::from_ref(&input))
            .await?;

        let mut inner = self.inner.write().await;
        for phase in created {
            inner.replace(phase);
        }
        inner.snapshot()
    }

    /// Edit a phase's details.
    #[tracing::instrument(name = "board_update_phase", skip(self, update), fields(project_id = %self.project_id))]
    pub async fn update_phase(
        &self,
        phase_id: PhaseId,
        update: PhaseUpdate,
    ) -> Result<BoardSnapshot, PhaseError> {
        update.validate()?;
        {
            let mut inner = self.inner.write().await;
            inner.ensure_ready()?;
            inner.find(phase_id)?;
            if update.is_empty() {
                return inner.snapshot();
            }
            inner.begin_save(&[phase_id])?;
        }

        let result = self.store.update(&phase_id, &update).await;

        let mut inner = self.inner.write().await;
        inner.end_save(&[phase_id]);
        inner.replace(result?);
        inner.snapshot()
    }

    /// Copy a phase and its sub-tasks to the end of its sibling list.
    ///
    /// Without `confirmed` nothing is written and a confirmation request is
    /// returned instead.
    #[tracing::instrument(name = "board_duplicate_phase", skip(self), fields(project_id = %self.project_id))]
    pub async fn duplicate_phase(
        &self,
        phase_id: PhaseId,
        confirmed: bool,
    ) -> Result<MutationOutcome<BoardSnapshot>, PhaseError> {
        let input = {
            let inner = self.inner.read().await;
            inner.ensure_ready()?;
            let affected = inner.with_sub_tasks(phase_id)?;
            let (phase, sub_tasks) = (affected[0], &affected[1..]);

            if !confirmed {
                return Ok(MutationOutcome::ConfirmationRequired(ConfirmationRequest {
                    action: PhaseAction::Duplicate,
                    phase_id,
                    message: format!(
                        "Duplicate '{}'{}?",
                        phase.phase_name,
                        sub_task_suffix(sub_tasks.len())
                    ),
                    affected_phase_ids: affected.iter().map(|p| p.id).collect(),
                }));
            }

            let mut input = copy_input(
                phase,
                phase.parent_phase_id,
                inner.next_order(phase.parent_phase_id),
            );
            input.phase_name = format!("{} (Copy)", phase.phase_name);
            input.sub_tasks = sub_tasks
                .iter()
                .map(|sub_task| copy_input(sub_task, None, sub_task.phase_order))
                .collect();
            input
        };

        let created = self
            .store
            .create_many(&self.project_id, std::slice::from_ref(&input))
            .await?;

        let mut inner = self.inner.write().await;
        for phase in created {
            inner.replace(phase);
        }
        inner.snapshot().map(MutationOutcome::Applied)
    }

    /// Delete a phase and its sub-tasks.
    ///
    /// Without `confirmed` nothing is deleted and a confirmation request is
    /// returned instead.
    #[tracing::instrument(name = "board_delete_phase", skip(self), fields(project_id = %self.project_id))]
    pub async fn delete_phase(
        &self,
        phase_id: PhaseId,
        confirmed: bool,
    ) -> Result<MutationOutcome<BoardSnapshot>, PhaseError> {
        let affected_ids: Vec<PhaseId> = {
            let mut inner = self.inner.write().await;
            inner.ensure_ready()?;
            let affected = inner.with_sub_tasks(phase_id)?;
            let ids: Vec<PhaseId> = affected.iter().map(|p| p.id).collect();

            if !confirmed {
                return Ok(MutationOutcome::ConfirmationRequired(ConfirmationRequest {
                    action: PhaseAction::Delete,
                    phase_id,
                    message: format!(
                        "Delete '{}'{}? This cannot be undone.",
                        affected[0].phase_name,
                        sub_task_suffix(ids.len() - 1)
                    ),
                    affected_phase_ids: ids,
                }));
            }

            inner.begin_save(&ids)?;
            ids
        };

        let result = self.store.delete_many(&affected_ids).await;

        let mut inner = self.inner.write().await;
        inner.end_save(&affected_ids);
        result?;
        inner.phases.retain(|phase| !affected_ids.contains(&phase.id));
        tracing::info!("deleted {} phases", affected_ids.len());
        inner.snapshot().map(MutationOutcome::Applied)
    }
}

fn copy_input(phase: &Phase, parent_phase_id: Option<PhaseId>, phase_order: i32) -> PhaseInput {
    PhaseInput {
        parent_phase_id,
        phase_name: phase.phase_name.clone(),
        phase_description: phase.phase_description.clone(),
        estimated_duration: phase.estimated_duration.clone(),
        phase_order,
        phase_weight: phase.phase_weight,
        sub_tasks: Vec::new(),
    }
}

fn sub_task_suffix(count: usize) -> String {
    match count {
        0 => String::new(),
        1 => " and its sub-task".to_string(),
        n => format!(" and its {n} sub-tasks"),
    }
}
