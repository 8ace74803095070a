use serde::{Deserialize, Serialize};

use crate::contact::ValidationResult;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", content = "failure", rename_all = "snake_case")]
pub enum SubmissionState {
    #[default]
    Idle,
    Sending,
    Success,
    Error(SubmissionFailure),
}

/// Why a submission ended up in the error state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionFailure {
    /// At least one field is invalid. The visitor can fix the input and retry.
    Validation,
    /// The delivery channel failed to transmit the message.
    Delivery,
}

impl SubmissionState {
    pub fn is_error(self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// Snapshot of a contact form as seen by the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormStatus {
    pub state: SubmissionState,
    pub errors: ValidationResult,
}

impl FormStatus {
    /// Whether the submit control should be enabled.
    pub fn submit_enabled(&self) -> bool {
        !matches!(
            self.state,
            SubmissionState::Sending | SubmissionState::Success
        )
    }
}
