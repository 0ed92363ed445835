use thiserror::Error;

use crate::contract::model::TaskStatus;

/// Errors surfaced to callers of the personnel client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersonnelError {
    #[error("Not signed in")]
    Unauthenticated,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Not allowed to {action}")]
    Forbidden { action: String },

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Unexpected response body: {message}")]
    Decode { message: String },

    #[error("{message}")]
    Conflict { message: String },

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Cannot move task from {from} to {to}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },

    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("A {operation} submission is already in progress")]
    SubmissionInFlight { operation: String },
}

impl PersonnelError {
    pub fn forbidden(action: impl Into<String>) -> Self {
        Self::Forbidden {
            action: action.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn in_flight(operation: impl Into<String>) -> Self {
        Self::SubmissionInFlight {
            operation: operation.into(),
        }
    }

    /// Failures where the server never gave a verdict.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Timeout)
    }
}

impl From<reqwest::Error> for PersonnelError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::decode(e.to_string())
        } else {
            Self::transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for PersonnelError {
    fn from(e: serde_json::Error) -> Self {
        Self::decode(e.to_string())
    }
}

impl From<paging::Error> for PersonnelError {
    fn from(e: paging::Error) -> Self {
        Self::decode(e.to_string())
    }
}

pub type PersonnelResult<T> = Result<T, PersonnelError>;
