use serde::Serialize;
use strum::Display;

use super::PhaseId;

/// A mutation that needs an explicit go-ahead from the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "lowercase")]
pub enum PhaseAction {
    Delete,
    Duplicate,
}

/// Returned instead of applying a destructive or bulk mutation.
///
/// The caller shows `message` and repeats the request with confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationRequest {
    pub action: PhaseAction,
    pub phase_id: PhaseId,
    pub message: String,
    /// Every phase the mutation touches, the target first.
    pub affected_phase_ids: Vec<PhaseId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome<T> {
    Applied(T),
    ConfirmationRequired(ConfirmationRequest),
}

impl<T> MutationOutcome<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> MutationOutcome<U> {
        match self {
            MutationOutcome::Applied(value) => MutationOutcome::Applied(f(value)),
            MutationOutcome::ConfirmationRequired(request) => {
                MutationOutcome::ConfirmationRequired(request)
            }
        }
    }
}
