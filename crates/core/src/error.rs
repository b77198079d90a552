//! Error types shared between the patient core and its persistence collaborator.
//!
//! Absence of a record is never an error at this level: repository lookups
//! return `Option` and status-only mutations no-op on missing ids. `StoreError`
//! covers genuine storage failures only; the service boundary translates it
//! into a generic `ProcessingError` outcome without leaking detail.

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read patient store: {0}")]
    Read(std::io::Error),
    #[error("failed to write patient store: {0}")]
    Write(std::io::Error),
    #[error("failed to serialize patient records: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize patient records: {0}")]
    Deserialization(serde_json::Error),
    #[error("invalid store configuration: {0}")]
    Config(String),
    #[error("commit failed: {0}")]
    Commit(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Failure raised by the mapping collaborator when caller-supplied data is
/// rejected. Carries one message per offending field.
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    #[error("validation failed: {joined}", joined = messages.join("; "))]
    Validation { messages: Vec<String> },
}

impl MappingError {
    pub fn messages(&self) -> &[String] {
        match self {
            MappingError::Validation { messages } => messages,
        }
    }

    pub fn into_messages(self) -> Vec<String> {
        match self {
            MappingError::Validation { messages } => messages,
        }
    }
}
