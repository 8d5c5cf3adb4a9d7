//! HTTP response types for phase endpoints.
//!
//! These types serialize to the JSON format expected by the frontend.

use serde::Serialize;
use time::OffsetDateTime;

use crate::domain::models::{
    BoardSnapshot, ConfirmationRequest, MutationOutcome, PhaseAction, PhaseId, PhaseNode,
    PhaseStatus, PhaseTemplate, ProgressSummary, ProjectId, TreeIssue,
};

/// A project's phase tree together with its progress figures.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardResponse {
    pub phases: Vec<PhaseNodeResponse>,
    pub progress: ProgressSummary,
    /// Phases that had to be placed at the top level.
    pub issues: Vec<TreeIssue>,
}

impl From<BoardSnapshot> for BoardResponse {
    fn from(snapshot: BoardSnapshot) -> Self {
        Self {
            phases: snapshot
                .tree
                .phases
                .into_iter()
                .map(PhaseNodeResponse::from)
                .collect(),
            progress: snapshot.progress,
            issues: snapshot.tree.issues,
        }
    }
}

/// One phase or sub-task.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseNodeResponse {
    pub id: PhaseId,
    pub project_id: ProjectId,
    pub parent_phase_id: Option<PhaseId>,
    pub phase_name: String,
    pub phase_description: Option<String>,
    pub estimated_duration: Option<String>,
    pub phase_order: i32,
    pub phase_weight: f64,
    pub is_completed: bool,
    pub status: PhaseStatus,
    /// Completed units below this node, or this node itself when it is a leaf.
    pub completed_units: usize,
    pub total_units: usize,
    pub percentage: u8,
    pub orphaned: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub sub_tasks: Vec<PhaseNodeResponse>,
}

impl From<PhaseNode> for PhaseNodeResponse {
    fn from(node: PhaseNode) -> Self {
        let percentage = node.percentage();
        let phase = node.phase;
        Self {
            id: phase.id,
            project_id: phase.project_id,
            parent_phase_id: phase.parent_phase_id,
            phase_name: phase.phase_name,
            phase_description: phase.phase_description,
            estimated_duration: phase.estimated_duration,
            phase_order: phase.phase_order,
            phase_weight: phase.phase_weight,
            is_completed: phase.is_completed,
            status: node.status,
            completed_units: node.completed_units,
            total_units: node.total_units,
            percentage,
            orphaned: node.orphaned,
            created_at: phase.created_at,
            updated_at: phase.updated_at,
            sub_tasks: node
                .children
                .into_iter()
                .map(PhaseNodeResponse::from)
                .collect(),
        }
    }
}

/// Returned instead of a board when a destructive action needs confirmation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationResponse {
    pub confirmation_required: bool,
    pub action: PhaseAction,
    pub phase_id: PhaseId,
    pub message: String,
    pub affected_phase_ids: Vec<PhaseId>,
}

impl From<ConfirmationRequest> for ConfirmationResponse {
    fn from(request: ConfirmationRequest) -> Self {
        Self {
            confirmation_required: true,
            action: request.action,
            phase_id: request.phase_id,
            message: request.message,
            affected_phase_ids: request.affected_phase_ids,
        }
    }
}

/// Body of a delete or duplicate response.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum MutationResponse {
    Applied(BoardResponse),
    ConfirmationRequired(ConfirmationResponse),
}

impl From<MutationOutcome<BoardSnapshot>> for MutationResponse {
    fn from(outcome: MutationOutcome<BoardSnapshot>) -> Self {
        match outcome.map(BoardResponse::from) {
            MutationOutcome::Applied(board) => Self::Applied(board),
            MutationOutcome::ConfirmationRequired(request) => {
                Self::ConfirmationRequired(request.into())
            }
        }
    }
}

/// The standard phase catalog.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateResponse {
    pub phases: &'static [PhaseTemplate],
    pub total_weight: f64,
}

impl From<&'static [PhaseTemplate]> for TemplateResponse {
    fn from(phases: &'static [PhaseTemplate]) -> Self {
        Self {
            phases,
            total_weight: phases.iter().map(|p| p.weight).sum(),
        }
    }
}
