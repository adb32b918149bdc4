use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{FieldId, InvalidReason, SubmissionOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Validation,
    Transport,
    Server,
}

/// A field that failed validation; recovered inline and never escalated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: FieldId,
    pub reason: InvalidReason,
}

impl ValidationError {
    pub fn new(field: FieldId, reason: InvalidReason) -> Self {
        Self { field, reason }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("endpoint rejected submission with status {status}")]
    Server {
        status: u16,
        detail: Option<String>,
    },
}

impl SubmitError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn server(status: u16) -> Self {
        Self::Server {
            status,
            detail: None,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            SubmitError::Transport(_) => ErrorCode::Transport,
            SubmitError::Server { .. } => ErrorCode::Server,
        }
    }

    pub fn outcome(&self) -> SubmissionOutcome {
        match self {
            SubmitError::Transport(_) => SubmissionOutcome::NetworkError,
            SubmitError::Server { status, .. } => SubmissionOutcome::ServerError(*status),
        }
    }
}

/// Summary returned to hosts when a submit attempt ends without a success.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("form has {} invalid field(s)", .0.len())]
    Invalid(Vec<ValidationError>),
    #[error(transparent)]
    Submit(#[from] SubmitError),
}

impl FormError {
    pub fn code(&self) -> ErrorCode {
        match self {
            FormError::Invalid(_) => ErrorCode::Validation,
            FormError::Submit(err) => err.code(),
        }
    }
}
