use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{
    models::{
        BoardSnapshot, MutationOutcome, NewPhaseRequest, PhaseId, PhaseTemplate, PhaseUpdate,
        ProjectId, PHASE_TEMPLATE,
    },
    ports::{inbound::PhaseProgressService, outbound::PhaseStore},
    PhaseError,
};

use super::PhaseBoard;

/// Implementation of the PhaseProgressService inbound port.
///
/// Keeps one `PhaseBoard` per project so that in-flight saves are tracked
/// across requests. Boards are created lazily and loaded on first use.
pub struct PhaseProgressServiceImpl<S> {
    store: Arc<S>,
    boards: RwLock<HashMap<ProjectId, Arc<PhaseBoard<S>>>>,
}

impl<S: PhaseStore> PhaseProgressServiceImpl<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            boards: RwLock::new(HashMap::new()),
        }
    }

    async fn board(&self, project_id: &ProjectId) -> Arc<PhaseBoard<S>> {
        if let Some(board) = self.boards.read().await.get(project_id) {
            return board.clone();
        }

        let mut boards = self.boards.write().await;
        boards
            .entry(*project_id)
            .or_insert_with(|| {
                tracing::debug!("creating phase board for project {}", project_id);
                Arc::new(PhaseBoard::new(*project_id, self.store.clone()))
            })
            .clone()
    }

    async fn loaded_board(
        &self,
        project_id: &ProjectId,
    ) -> Result<Arc<PhaseBoard<S>>, PhaseError> {
        let board = self.board(project_id).await;
        board.ensure_loaded().await?;
        Ok(board)
    }
}

#[async_trait]
impl<S: PhaseStore> PhaseProgressService for PhaseProgressServiceImpl<S> {
    fn template(&self) -> &'static [PhaseTemplate] {
        &PHASE_TEMPLATE
    }

    async fn load_board(&self, project_id: &ProjectId) -> Result<BoardSnapshot, PhaseError> {
        self.board(project_id).await.load().await
    }

    async fn toggle_phase(
        &self,
        project_id: &ProjectId,
        phase_id: &PhaseId,
        current_completed: bool,
    ) -> Result<BoardSnapshot, PhaseError> {
        let board = self.loaded_board(project_id).await?;
        board.toggle(*phase_id, current_completed).await
    }

    async fn generate_default_phases(
        &self,
        project_id: &ProjectId,
    ) -> Result<BoardSnapshot, PhaseError> {
        self.board(project_id).await.initialize_defaults().await
    }

    async fn create_phase(
        &self,
        project_id: &ProjectId,
        request: NewPhaseRequest,
    ) -> Result<BoardSnapshot, PhaseError> {
        let board = self.loaded_board(project_id).await?;
        let order = match request.phase_order {
            Some(order) => order,
            None => board.next_order(request.parent_phase_id).await,
        };
        board.create_phase(request.into_input(order)).await
    }

    async fn update_phase(
        &self,
        project_id: &ProjectId,
        phase_id: &PhaseId,
        update: PhaseUpdate,
    ) -> Result<BoardSnapshot, PhaseError> {
        let board = self.loaded_board(project_id).await?;
        board.update_phase(*phase_id, update).await
    }

    async fn duplicate_phase(
        &self,
        project_id: &ProjectId,
        phase_id: &PhaseId,
        confirmed: bool,
    ) -> Result<MutationOutcome<BoardSnapshot>, PhaseError> {
        let board = self.loaded_board(project_id).await?;
        board.duplicate_phase(*phase_id, confirmed).await
    }

    async fn delete_phase(
        &self,
        project_id: &ProjectId,
        phase_id: &PhaseId,
        confirmed: bool,
    ) -> Result<MutationOutcome<BoardSnapshot>, PhaseError> {
        let board = self.loaded_board(project_id).await?;
        board.delete_phase(*phase_id, confirmed).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::outbound::memory::InMemoryPhaseStore;

    fn service() -> PhaseProgressServiceImpl<InMemoryPhaseStore> {
        PhaseProgressServiceImpl::new(Arc::new(InMemoryPhaseStore::new()))
    }

    #[tokio::test]
    async fn boards_are_cached_per_project() {
        let service = service();
        let a = service.board(&ProjectId::new(1)).await;
        let b = service.board(&ProjectId::new(1)).await;
        let c = service.board(&ProjectId::new(2)).await;

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[tokio::test]
    async fn defaults_only_for_empty_projects() {
        let service = service();
        let project = ProjectId::new(1);

        let snapshot = service.generate_default_phases(&project).await.unwrap();
        assert_eq!(snapshot.tree.phases.len(), 7);

        assert!(matches!(
            service.generate_default_phases(&project).await,
            Err(PhaseError::AlreadyInitialized)
        ));
        assert_eq!(
            service.load_board(&project).await.unwrap().tree.phases.len(),
            7
        );
    }

    #[tokio::test]
    async fn concurrent_defaults_requests_seed_once() {
        let service = service();
        let project = ProjectId::new(5);

        let (a, b) = tokio::join!(
            service.generate_default_phases(&project),
            service.generate_default_phases(&project)
        );

        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
        assert!(matches!(a.err().or(b.err()), Some(PhaseError::AlreadyInitialized)));
        let stored = service.store.list_by_project(&project).await.unwrap();
        assert_eq!(stored.iter().filter(|p| p.is_top_level()).count(), 7);
    }

    #[tokio::test]
    async fn toggle_rejects_phase_of_another_project() {
        let service = service();
        let other = service
            .generate_default_phases(&ProjectId::new(2))
            .await
            .unwrap();
        let foreign = other.tree.phases[0].id();

        let result = service
            .toggle_phase(&ProjectId::new(1), &foreign, false)
            .await;

        assert!(matches!(result, Err(PhaseError::NotFound(id)) if id == foreign));
        let reloaded = service.load_board(&ProjectId::new(2)).await.unwrap();
        assert_eq!(reloaded.progress.completed, 0);
    }

    #[tokio::test]
    async fn toggle_loads_board_on_first_use() {
        let service = service();
        let project = ProjectId::new(3);
        let snapshot = service.generate_default_phases(&project).await.unwrap();
        let handover = snapshot.tree.phases.last().unwrap().id();

        // A second service instance shares the store but has no boards yet.
        let fresh = PhaseProgressServiceImpl::new(service.store.clone());
        let snapshot = fresh.toggle_phase(&project, &handover, false).await.unwrap();

        assert_eq!(snapshot.progress.completed, 1);
        assert_eq!(snapshot.progress.weighted_score, 10.0);
    }

    #[tokio::test]
    async fn create_phase_appends_when_no_order_given() {
        let service = service();
        let project = ProjectId::new(4);
        service.generate_default_phases(&project).await.unwrap();

        let snapshot = service
            .create_phase(
                &project,
                NewPhaseRequest {
                    parent_phase_id: None,
                    phase_name: "  Post-occupancy review ".to_string(),
                    phase_description: Some(String::new()),
                    estimated_duration: None,
                    phase_order: None,
                    phase_weight: 0.0,
                },
            )
            .await
            .unwrap();

        let last = snapshot.tree.phases.last().unwrap();
        assert_eq!(last.phase.phase_name, "Post-occupancy review");
        assert_eq!(last.phase.phase_order, 8);
        assert_eq!(last.phase.phase_description, None);
    }
}
