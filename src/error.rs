use std::io;
use thiserror::Error;

/// Errors surfaced by the care engine. None of them are fatal: the engine
/// rejects the command or substitutes a default and keeps running.
#[derive(Error, Debug)]
pub enum PetError {
    /// Unknown action, or an action not allowed in the current state
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// A conversation choice carries no responses
    #[error("conversation choice has no responses: {0}")]
    EmptyResponseSet(String),

    /// Persisted state failed validation on load
    #[error("corrupted profile: {0}")]
    CorruptedProfile(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type PetResult<T> = std::result::Result<T, PetError>;

impl PetError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidCommand(msg.into())
    }
}
