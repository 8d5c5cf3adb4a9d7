//! The standard construction phase catalog used to bootstrap a project.

use serde::Serialize;

use super::PhaseInput;

/// Nominal total of all top-level weights; the weighted score is shown out of this.
pub const SCORE_DENOMINATOR: f64 = 70.0;

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseTemplate {
    pub name: &'static str,
    pub description: &'static str,
    pub estimated_duration: &'static str,
    pub weight: f64,
    pub sub_tasks: &'static [SubTaskTemplate],
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubTaskTemplate {
    pub name: &'static str,
    pub estimated_duration: &'static str,
    pub weight: f64,
}

pub const PHASE_TEMPLATE: [PhaseTemplate; 7] = [
    PhaseTemplate {
        name: "Pre-Design & Feasibility",
        description: "Site analysis, client brief and feasibility of the project.",
        estimated_duration: "2-3 weeks",
        weight: 10.0,
        sub_tasks: &[
            SubTaskTemplate {
                name: "Site analysis",
                estimated_duration: "1 week",
                weight: 3.0,
            },
            SubTaskTemplate {
                name: "Client brief & requirements",
                estimated_duration: "1 week",
                weight: 3.0,
            },
            SubTaskTemplate {
                name: "Feasibility study",
                estimated_duration: "1 week",
                weight: 4.0,
            },
        ],
    },
    PhaseTemplate {
        name: "Schematic Design",
        description: "Concept options, massing and the approved design direction.",
        estimated_duration: "3-4 weeks",
        weight: 10.0,
        sub_tasks: &[
            SubTaskTemplate {
                name: "Concept sketches",
                estimated_duration: "1-2 weeks",
                weight: 4.0,
            },
            SubTaskTemplate {
                name: "Massing model",
                estimated_duration: "1 week",
                weight: 3.0,
            },
            SubTaskTemplate {
                name: "Client design review",
                estimated_duration: "1 week",
                weight: 3.0,
            },
        ],
    },
    PhaseTemplate {
        name: "Design Development",
        description: "Plans, elevations and material choices worked out in detail.",
        estimated_duration: "4-6 weeks",
        weight: 10.0,
        sub_tasks: &[
            SubTaskTemplate {
                name: "Floor plans",
                estimated_duration: "2 weeks",
                weight: 4.0,
            },
            SubTaskTemplate {
                name: "Elevations & sections",
                estimated_duration: "2 weeks",
                weight: 3.0,
            },
            SubTaskTemplate {
                name: "Material & finish selection",
                estimated_duration: "1-2 weeks",
                weight: 3.0,
            },
        ],
    },
    PhaseTemplate {
        name: "Permits & Approvals",
        description: "Permit drawings, authority submission and approval.",
        estimated_duration: "4-8 weeks",
        weight: 10.0,
        sub_tasks: &[
            SubTaskTemplate {
                name: "Permit drawing set",
                estimated_duration: "2 weeks",
                weight: 4.0,
            },
            SubTaskTemplate {
                name: "Authority submission",
                estimated_duration: "1 week",
                weight: 2.5,
            },
            SubTaskTemplate {
                name: "Approval received",
                estimated_duration: "2-6 weeks",
                weight: 3.5,
            },
        ],
    },
    PhaseTemplate {
        name: "Construction Documents",
        description: "Working drawings, specifications and consultant coordination.",
        estimated_duration: "4-6 weeks",
        weight: 10.0,
        sub_tasks: &[
            SubTaskTemplate {
                name: "Working drawings",
                estimated_duration: "3 weeks",
                weight: 5.0,
            },
            SubTaskTemplate {
                name: "Specifications",
                estimated_duration: "1-2 weeks",
                weight: 2.5,
            },
            SubTaskTemplate {
                name: "Consultant coordination",
                estimated_duration: "1 week",
                weight: 2.5,
            },
        ],
    },
    PhaseTemplate {
        name: "Construction Administration",
        description: "Tendering, site visits and contractor queries during the build.",
        estimated_duration: "Varies with build",
        weight: 10.0,
        sub_tasks: &[
            SubTaskTemplate {
                name: "Contractor selection",
                estimated_duration: "2-4 weeks",
                weight: 3.0,
            },
            SubTaskTemplate {
                name: "Site visits",
                estimated_duration: "Ongoing",
                weight: 4.0,
            },
            SubTaskTemplate {
                name: "RFI responses",
                estimated_duration: "Ongoing",
                weight: 3.0,
            },
        ],
    },
    PhaseTemplate {
        name: "Handover & Close-out",
        description: "Final inspection, as-built documents and project handover.",
        estimated_duration: "1-2 weeks",
        weight: 10.0,
        sub_tasks: &[],
    },
];

/// Build the create inputs for a project's default phases.
///
/// Top-level phases are ordered from 1; sub-tasks are ordered from 1 within
/// their parent.
pub fn default_phase_inputs() -> Vec<PhaseInput> {
    PHASE_TEMPLATE
        .iter()
        .zip(1..)
        .map(|(template, order)| {
            let phase = PhaseInput::new(template.name, order, template.weight)
                .with_description(template.description)
                .with_duration(template.estimated_duration);

            template
                .sub_tasks
                .iter()
                .zip(1..)
                .fold(phase, |phase, (sub_task, sub_order)| {
                    phase.with_sub_task(
                        PhaseInput::new(sub_task.name, sub_order, sub_task.weight)
                            .with_duration(sub_task.estimated_duration),
                    )
                })
        })
        .collect()
}
