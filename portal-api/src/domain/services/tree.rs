//! Regroups a project's flat phase list into the two-level checklist tree.

use std::collections::{HashMap, HashSet};

use crate::domain::models::{Phase, PhaseId, PhaseNode, PhaseStatus, PhaseTree, TreeIssue};

/// Build the phase tree for one project.
///
/// Phases may arrive in any order. Siblings are sorted by `phase_order`, ties
/// broken by id. Only phases without a parent can have children; a phase
/// whose parent is missing, is itself, or is a sub-task is promoted to top
/// level, flagged `orphaned`, and listed after the regular top-level phases.
/// Every promotion is reported in `PhaseTree::issues`.
pub fn build_tree(phases: Vec<Phase>) -> PhaseTree {
    let top_level_ids: HashSet<PhaseId> = phases
        .iter()
        .filter(|phase| phase.is_top_level())
        .map(|phase| phase.id)
        .collect();
    let known_ids: HashSet<PhaseId> = phases.iter().map(|phase| phase.id).collect();

    let mut top_level = Vec::new();
    let mut orphans = Vec::new();
    let mut children: HashMap<PhaseId, Vec<Phase>> = HashMap::new();
    let mut issues = Vec::new();

    for phase in phases {
        let Some(parent_id) = phase.parent_phase_id else {
            top_level.push(phase);
            continue;
        };

        let issue = if parent_id == phase.id {
            TreeIssue::SelfParent { phase_id: phase.id }
        } else if top_level_ids.contains(&parent_id) {
            children.entry(parent_id).or_default().push(phase);
            continue;
        } else if known_ids.contains(&parent_id) {
            TreeIssue::NestedTooDeep {
                phase_id: phase.id,
                parent_id,
            }
        } else {
            TreeIssue::MissingParent {
                phase_id: phase.id,
                parent_id,
            }
        };

        tracing::warn!(?issue, "promoting phase {} to top level", issue.phase_id());
        issues.push(issue);
        orphans.push(phase);
    }

    sort_siblings(&mut top_level);
    sort_siblings(&mut orphans);

    let mut nodes: Vec<PhaseNode> = top_level
        .into_iter()
        .map(|phase| {
            let mut sub_tasks = children.remove(&phase.id).unwrap_or_default();
            sort_siblings(&mut sub_tasks);
            parent_node(phase, sub_tasks)
        })
        .collect();
    nodes.extend(orphans.into_iter().map(|phase| {
        let mut node = leaf_node(phase);
        node.orphaned = true;
        node
    }));

    PhaseTree {
        phases: nodes,
        issues,
    }
}

fn sort_siblings(phases: &mut [Phase]) {
    phases.sort_by_key(|phase| (phase.phase_order, phase.id));
}

fn leaf_node(phase: Phase) -> PhaseNode {
    let status = if phase.is_completed {
        PhaseStatus::Completed
    } else {
        PhaseStatus::NotStarted
    };

    PhaseNode {
        completed_units: usize::from(phase.is_completed),
        total_units: 1,
        phase,
        status,
        children: Vec::new(),
        orphaned: false,
    }
}

fn parent_node(phase: Phase, sub_tasks: Vec<Phase>) -> PhaseNode {
    if sub_tasks.is_empty() {
        return leaf_node(phase);
    }

    let total = sub_tasks.len();
    let completed = sub_tasks.iter().filter(|s| s.is_completed).count();
    let status = match completed {
        0 => PhaseStatus::NotStarted,
        n if n == total => PhaseStatus::Completed,
        _ => PhaseStatus::InProgress,
    };

    let children = sub_tasks
        .into_iter()
        .map(|sub_task| {
            let mut node = leaf_node(sub_task);
            if !node.phase.is_completed && status == PhaseStatus::InProgress {
                node.status = PhaseStatus::Pending;
            }
            node
        })
        .collect();

    PhaseNode {
        phase,
        status,
        children,
        completed_units: completed,
        total_units: total,
        orphaned: false,
    }
}
