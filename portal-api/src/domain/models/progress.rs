use serde::Serialize;
use strum::{Display, EnumString};

use super::{Phase, PhaseId};

/// Display status of a phase, derived from completion flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString)]
pub enum PhaseStatus {
    #[strum(serialize = "Not Started")]
    #[serde(rename = "Not Started")]
    NotStarted,
    #[strum(serialize = "In Progress")]
    #[serde(rename = "In Progress")]
    InProgress,
    #[strum(serialize = "Completed")]
    Completed,
    /// A sub-task waiting on its in-progress parent.
    #[strum(serialize = "Pending")]
    Pending,
}

/// A phase placed in the project tree, with its derived status and progress.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseNode {
    pub phase: Phase,
    pub status: PhaseStatus,
    pub children: Vec<PhaseNode>,
    /// Completed units under this node (the node itself when childless).
    pub completed_units: usize,
    pub total_units: usize,
    /// Set when the phase was promoted to top level because its parent
    /// reference could not be honoured.
    pub orphaned: bool,
}

impl PhaseNode {
    pub fn id(&self) -> PhaseId {
        self.phase.id
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn percentage(&self) -> u8 {
        percentage(self.completed_units, self.total_units)
    }
}

/// Why a phase could not be nested under its declared parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "kind")]
pub enum TreeIssue {
    /// The parent id is not part of the loaded phase set.
    MissingParent { phase_id: PhaseId, parent_id: PhaseId },
    /// The phase names itself as its parent.
    SelfParent { phase_id: PhaseId },
    /// The parent is itself a sub-task.
    NestedTooDeep { phase_id: PhaseId, parent_id: PhaseId },
}

impl TreeIssue {
    pub fn phase_id(&self) -> PhaseId {
        match self {
            TreeIssue::MissingParent { phase_id, .. }
            | TreeIssue::SelfParent { phase_id }
            | TreeIssue::NestedTooDeep { phase_id, .. } => *phase_id,
        }
    }
}

/// A project's phases as a two-level tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhaseTree {
    pub phases: Vec<PhaseNode>,
    pub issues: Vec<TreeIssue>,
}

impl PhaseTree {
    /// Iterate over every node, top-level phases followed by their children.
    pub fn nodes(&self) -> impl Iterator<Item = &PhaseNode> {
        self.phases
            .iter()
            .flat_map(|node| std::iter::once(node).chain(node.children.iter()))
    }

    /// Iterate over the nodes that count towards progress.
    pub fn units(&self) -> impl Iterator<Item = &PhaseNode> {
        self.nodes().filter(|node| !node.has_children())
    }

    pub fn find(&self, phase_id: PhaseId) -> Option<&PhaseNode> {
        self.nodes().find(|node| node.id() == phase_id)
    }
}

/// Project-level completion figures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub completed: usize,
    pub total: usize,
    pub percentage: u8,
    pub weighted_score: f64,
    pub score_denominator: f64,
}

/// What the presentation layer renders for one project: the checklist and its figures.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardSnapshot {
    pub tree: PhaseTree,
    pub progress: ProgressSummary,
}

/// round(100 * completed / total), 0 for an empty set.
pub fn percentage(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((completed as f64 * 100.0) / total as f64).round() as u8
}
