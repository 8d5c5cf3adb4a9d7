use serde::Serialize;
use time::OffsetDateTime;

use super::{PhaseId, ProjectId};
use crate::domain::PhaseError;

/// A unit of construction work, as stored by the phase store.
///
/// Top-level phases have no `parent_phase_id`; sub-tasks point at a top-level
/// phase. Only one level of nesting is meaningful.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Phase {
    pub id: PhaseId,
    pub project_id: ProjectId,
    pub parent_phase_id: Option<PhaseId>,
    pub phase_name: String,
    pub phase_description: Option<String>,
    pub estimated_duration: Option<String>,
    pub phase_order: i32,
    pub phase_weight: f64,
    pub is_completed: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Phase {
    pub fn is_top_level(&self) -> bool {
        self.parent_phase_id.is_none()
    }
}

/// A phase to be created.
///
/// `sub_tasks` are inserted under the phase created from this input, in the
/// same store call, so a whole template can be persisted before any id is known.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseInput {
    pub parent_phase_id: Option<PhaseId>,
    pub phase_name: String,
    pub phase_description: Option<String>,
    pub estimated_duration: Option<String>,
    pub phase_order: i32,
    pub phase_weight: f64,
    pub sub_tasks: Vec<PhaseInput>,
}

impl PhaseInput {
    pub fn new(phase_name: impl Into<String>, phase_order: i32, phase_weight: f64) -> Self {
        Self {
            parent_phase_id: None,
            phase_name: phase_name.into(),
            phase_description: None,
            estimated_duration: None,
            phase_order,
            phase_weight,
            sub_tasks: Vec::new(),
        }
    }

    pub fn with_parent(mut self, parent_phase_id: PhaseId) -> Self {
        self.parent_phase_id = Some(parent_phase_id);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.phase_description = Some(description.into());
        self
    }

    pub fn with_duration(mut self, duration: impl Into<String>) -> Self {
        self.estimated_duration = Some(duration.into());
        self
    }

    pub fn with_sub_task(mut self, sub_task: PhaseInput) -> Self {
        self.sub_tasks.push(sub_task);
        self
    }

    /// Total number of records this input creates, sub-tasks included.
    pub fn record_count(&self) -> usize {
        1 + self.sub_tasks.len()
    }

    /// Check name/weight and the single-level nesting rule.
    pub fn validate(&self) -> Result<(), PhaseError> {
        validate_name(&self.phase_name)?;
        validate_weight(self.phase_weight)?;

        if !self.sub_tasks.is_empty() && self.parent_phase_id.is_some() {
            return Err(PhaseError::MalformedTree(format!(
                "sub-task '{}' cannot have sub-tasks of its own",
                self.phase_name
            )));
        }

        for sub_task in &self.sub_tasks {
            if sub_task.parent_phase_id.is_some() {
                return Err(PhaseError::invalid_input(
                    "nested sub-tasks must not declare their own parent",
                ));
            }
            if !sub_task.sub_tasks.is_empty() {
                return Err(PhaseError::MalformedTree(format!(
                    "sub-task '{}' cannot have sub-tasks of its own",
                    sub_task.phase_name
                )));
            }
            validate_name(&sub_task.phase_name)?;
            validate_weight(sub_task.phase_weight)?;
        }

        Ok(())
    }
}

/// A single phase or sub-task requested by an admin.
///
/// Without an explicit `phase_order` the phase is appended after its siblings.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPhaseRequest {
    pub parent_phase_id: Option<PhaseId>,
    pub phase_name: String,
    pub phase_description: Option<String>,
    pub estimated_duration: Option<String>,
    pub phase_order: Option<i32>,
    pub phase_weight: f64,
}

impl NewPhaseRequest {
    pub fn into_input(self, phase_order: i32) -> PhaseInput {
        PhaseInput {
            parent_phase_id: self.parent_phase_id,
            phase_name: self.phase_name.trim().to_string(),
            phase_description: self.phase_description.as_deref().and_then(non_empty),
            estimated_duration: self.estimated_duration.as_deref().and_then(non_empty),
            phase_order,
            phase_weight: self.phase_weight,
            sub_tasks: Vec::new(),
        }
    }
}

/// Editable phase details. `None` leaves a field untouched.
///
/// An empty description or duration clears the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhaseUpdate {
    pub phase_name: Option<String>,
    pub phase_description: Option<String>,
    pub estimated_duration: Option<String>,
    pub phase_order: Option<i32>,
    pub phase_weight: Option<f64>,
}

impl PhaseUpdate {
    pub fn is_empty(&self) -> bool {
        self.phase_name.is_none()
            && self.phase_description.is_none()
            && self.estimated_duration.is_none()
            && self.phase_order.is_none()
            && self.phase_weight.is_none()
    }

    pub fn validate(&self) -> Result<(), PhaseError> {
        if let Some(name) = &self.phase_name {
            validate_name(name)?;
        }
        if let Some(weight) = self.phase_weight {
            validate_weight(weight)?;
        }
        Ok(())
    }

    /// Apply the update to a stored phase.
    pub fn apply_to(&self, phase: &mut Phase) {
        if let Some(name) = &self.phase_name {
            phase.phase_name = name.trim().to_string();
        }
        if let Some(description) = &self.phase_description {
            phase.phase_description = non_empty(description);
        }
        if let Some(duration) = &self.estimated_duration {
            phase.estimated_duration = non_empty(duration);
        }
        if let Some(order) = self.phase_order {
            phase.phase_order = order;
        }
        if let Some(weight) = self.phase_weight {
            phase.phase_weight = weight;
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn validate_name(name: &str) -> Result<(), PhaseError> {
    if name.trim().is_empty() {
        return Err(PhaseError::invalid_input("phase name must not be empty"));
    }
    Ok(())
}

fn validate_weight(weight: f64) -> Result<(), PhaseError> {
    if !weight.is_finite() || weight < 0.0 {
        return Err(PhaseError::invalid_input(format!(
            "phase weight must be a non-negative number, got {weight}"
        )));
    }
    Ok(())
}
