//! Execution result envelope.
//!
//! Every lifecycle operation reports its outcome through
//! [`ExecutionResult<T>`] instead of letting errors cross the service
//! boundary. The envelope carries an outcome code, an internal message, a
//! user-facing message, and an optional payload.
//!
//! Invariant: `result` is `Some` only when `code == ResponseCode::Ok`.
//! Callers must check the code before reading the payload.

use serde::{Deserialize, Serialize};

/// Enumerated outcome of an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseCode {
    /// Request was successful.
    Ok,
    /// Invalid details supplied.
    ValidationError,
    /// No record found, or the record is in an illegal state for the
    /// requested transition.
    NotFound,
    /// Request failed. Please try again.
    Failed,
    /// Unexpected internal or storage failure.
    ProcessingError,
    /// Request accepted and still in progress.
    Processing,
}

impl ResponseCode {
    /// Generic user-facing description of this outcome.
    pub fn description(self) -> &'static str {
        match self {
            ResponseCode::Ok => "Request was successful",
            ResponseCode::ValidationError => "Invalid details supplied",
            ResponseCode::NotFound => "No record found",
            ResponseCode::Failed => "Request failed. Please try again",
            ResponseCode::ProcessingError => "Processing error",
            ResponseCode::Processing => "Request is in progress",
        }
    }
}

/// Uniform success/failure envelope with an optional typed payload.
///
/// Value object: created fresh per call and owned by the caller that
/// receives it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExecutionResult<T> {
    pub code: ResponseCode,
    pub message: Option<String>,
    pub user_message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation_messages: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
}

impl<T> ExecutionResult<T> {
    /// Successful outcome carrying a payload. The message doubles as the
    /// user-facing message.
    pub fn success(result: T, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            code: ResponseCode::Ok,
            user_message: Some(message.clone()),
            message: Some(message),
            validation_messages: Vec::new(),
            result: Some(result),
        }
    }

    /// Failed outcome with an explicit code and no payload.
    pub fn failed_with(message: impl Into<String>, code: ResponseCode) -> Self {
        Self {
            code,
            message: Some(message.into()),
            user_message: Some(code.description().to_string()),
            validation_messages: Vec::new(),
            result: None,
        }
    }

    /// Generic failure (`ResponseCode::Failed`).
    pub fn failed(message: impl Into<String>) -> Self {
        Self::failed_with(message, ResponseCode::Failed)
    }

    /// Unexpected internal/storage failure (`ResponseCode::ProcessingError`).
    ///
    /// The message must stay generic; full detail belongs to the logging
    /// collaborator only.
    pub fn processing_error(message: impl Into<String>) -> Self {
        Self::failed_with(message, ResponseCode::ProcessingError)
    }

    /// Record absent, or present but in an illegal state for the requested
    /// transition (`ResponseCode::NotFound`).
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::failed_with(message, ResponseCode::NotFound)
    }

    /// Caller-supplied data rejected by mapping/validation.
    pub fn validation_error(messages: Vec<String>) -> Self {
        Self {
            code: ResponseCode::ValidationError,
            message: Some(messages.join("; ")),
            user_message: Some(ResponseCode::ValidationError.description().to_string()),
            validation_messages: messages,
            result: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == ResponseCode::Ok
    }

    /// Consumes the envelope, yielding the payload when the outcome is `Ok`.
    pub fn into_result(self) -> Option<T> {
        self.result
    }
}
