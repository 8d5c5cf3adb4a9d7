//! Completion counting and weighted score over a phase tree.

use crate::domain::models::{percentage, PhaseTree, ProgressSummary, SCORE_DENOMINATOR};

/// Summarize a built tree.
///
/// Units are childless phases (top-level or promoted orphans) and sub-tasks;
/// a phase with sub-tasks contributes only through them. The weighted score
/// sums the weights of completed units, rounded to one decimal.
pub fn summarize(tree: &PhaseTree) -> ProgressSummary {
    let (completed, total, score) = tree
        .units()
        .fold((0, 0, 0.0), |(completed, total, score), unit| {
            if unit.phase.is_completed {
                (completed + 1, total + 1, score + unit.phase.phase_weight)
            } else {
                (completed, total + 1, score)
            }
        });

    ProgressSummary {
        completed,
        total,
        percentage: percentage(completed, total),
        weighted_score: round_score(score),
        score_denominator: SCORE_DENOMINATOR,
    }
}

fn round_score(score: f64) -> f64 {
    (score * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        models::Phase,
        services::{build_tree, tree::tests::phase},
    };

    fn calculate_progress(phases: &[Phase]) -> ProgressSummary {
        summarize(&build_tree(phases.to_vec()))
    }

    #[test]
    fn nothing_completed_scores_zero() {
        let phases = vec![
            phase(1, None, 1, 10.0, false),
            phase(2, None, 2, 10.0, false),
            phase(3, Some(2), 1, 4.0, false),
            phase(4, Some(2), 2, 6.0, false),
        ];

        let progress = calculate_progress(&phases);
        assert_eq!(progress.completed, 0);
        assert_eq!(progress.percentage, 0);
        assert_eq!(progress.weighted_score, 0.0);
    }

    #[test]
    fn all_units_completed_is_one_hundred_percent() {
        // The parent's own flag is false but it is not a unit.
        let phases = vec![
            phase(1, None, 1, 10.0, true),
            phase(2, None, 2, 10.0, false),
            phase(3, Some(2), 1, 4.0, true),
            phase(4, Some(2), 2, 6.0, true),
        ];

        let progress = calculate_progress(&phases);
        assert_eq!(progress.percentage, 100);
        assert_eq!(progress.weighted_score, 20.0);
    }

    #[test]
    fn parents_with_children_are_not_counted() {
        let phases = vec![
            phase(1, None, 1, 10.0, true),
            phase(2, Some(1), 1, 5.0, false),
            phase(3, Some(1), 2, 5.0, false),
            phase(4, None, 2, 10.0, false),
        ];

        let progress = calculate_progress(&phases);
        assert_eq!(progress.total, 3);
        assert_eq!(progress.completed, 0);
    }

    #[test]
    fn mixed_project_scenario() {
        let phases = vec![
            phase(1, None, 1, 10.0, false),
            phase(2, None, 2, 10.0, false),
            phase(3, Some(2), 1, 5.0, true),
            phase(4, Some(2), 2, 5.0, false),
        ];

        let progress = calculate_progress(&phases);
        assert_eq!(progress.total, 3);
        assert_eq!(progress.completed, 1);
        assert_eq!(progress.percentage, 33);
        assert_eq!(progress.weighted_score, 5.0);
        assert_eq!(progress.score_denominator, 70.0);
    }

    #[test]
    fn orphans_still_count() {
        let phases = vec![
            phase(1, None, 1, 10.0, false),
            phase(2, Some(42), 1, 2.5, true),
        ];

        let progress = calculate_progress(&phases);
        assert_eq!(progress.total, 2);
        assert_eq!(progress.completed, 1);
        assert_eq!(progress.weighted_score, 2.5);
    }

    #[test]
    fn score_is_rounded_to_one_decimal() {
        let phases = vec![
            phase(1, None, 1, 0.1, true),
            phase(2, None, 2, 0.2, true),
        ];
        assert_eq!(calculate_progress(&phases).weighted_score, 0.3);
    }

    #[test]
    fn empty_project_has_no_progress() {
        let progress = calculate_progress(&[]);
        assert_eq!(progress.total, 0);
        assert_eq!(progress.percentage, 0);
    }
}
