use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldId {
    Name,
    Email,
    Message,
}

impl FieldId {
    pub const ALL: [FieldId; 3] = [FieldId::Name, FieldId::Email, FieldId::Message];

    /// Part name used in the submitted form body.
    pub fn form_name(self) -> &'static str {
        match self {
            FieldId::Name => "name",
            FieldId::Email => "email",
            FieldId::Message => "message",
        }
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.form_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    Empty,
    TooShort { min: usize },
    InvalidFormat,
}

impl InvalidReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvalidReason::Empty => "empty",
            InvalidReason::TooShort { .. } => "too short",
            InvalidReason::InvalidFormat => "invalid format",
        }
    }
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationResult {
    Valid,
    Invalid {
        reason: InvalidReason,
        message: String,
    },
}

impl ValidationResult {
    pub fn invalid(reason: InvalidReason, message: impl Into<String>) -> Self {
        Self::Invalid {
            reason,
            message: message.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn reason(&self) -> Option<InvalidReason> {
        match self {
            ValidationResult::Valid => None,
            ValidationResult::Invalid { reason, .. } => Some(*reason),
        }
    }

    /// Inline error text; empty when valid.
    pub fn message(&self) -> &str {
        match self {
            ValidationResult::Valid => "",
            ValidationResult::Invalid { message, .. } => message,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormSubmissionState {
    #[default]
    Idle,
    Validating,
    Submitting,
    Success,
    Failed,
}

impl FormSubmissionState {
    /// Success and Failed revert to Idle on their own after a delay.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            FormSubmissionState::Success | FormSubmissionState::Failed
        )
    }

    /// Whether the submit control accepts a new submission in this state.
    pub fn accepts_submit(self) -> bool {
        matches!(self, FormSubmissionState::Idle | FormSubmissionState::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionOutcome {
    Success,
    NetworkError,
    ServerError(u16),
}

impl SubmissionOutcome {
    pub fn from_status(status: u16) -> Self {
        if (200..300).contains(&status) {
            SubmissionOutcome::Success
        } else {
            SubmissionOutcome::ServerError(status)
        }
    }

    pub fn is_success(self) -> bool {
        self == SubmissionOutcome::Success
    }

    pub fn resulting_state(self) -> FormSubmissionState {
        if self.is_success() {
            FormSubmissionState::Success
        } else {
            FormSubmissionState::Failed
        }
    }
}
