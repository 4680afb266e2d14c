//! Unified error surface for the orchestration core.
//!
//! One enum per failure domain would scatter `Box<dyn Error>` conversions
//! throughout the coordinator; instead every component's error type feeds
//! into this single [`StpaSecError`], mirroring how `weavegraph`'s
//! `RunnerError` folds `NodeContextError`, `JoinError`, and checkpointer
//! errors into one diagnosable type.

use miette::Diagnostic;
use thiserror::Error;

use crate::draft::DraftError;
use crate::llm::LlmError;
use crate::persistence::PersistenceError;
use crate::registry::RegistryError;

#[derive(Debug, Error, Diagnostic)]
pub enum StpaSecError {
    #[error("llm call failed: {0}")]
    #[diagnostic(code(stpasec::llm), help("check provider configuration and retry policy"))]
    Llm(#[from] LlmError),

    #[error("persistence operation failed: {0}")]
    #[diagnostic(code(stpasec::persistence))]
    Persistence(#[from] PersistenceError),

    #[error("component registry violation: {0}")]
    #[diagnostic(code(stpasec::registry))]
    Registry(#[from] RegistryError),

    #[error("agent `{agent}` failed: {message}")]
    #[diagnostic(code(stpasec::agent))]
    Agent { agent: String, message: String },

    #[error("phase `{phase}` exceeded its deadline")]
    #[diagnostic(code(stpasec::deadline), help("raise the phase deadline or reduce fan-out"))]
    PhaseDeadlineExceeded { phase: String },

    #[error("analysis run exceeded its overall deadline")]
    #[diagnostic(code(stpasec::deadline))]
    RunDeadlineExceeded,

    #[error("validation failed: {0}")]
    #[diagnostic(code(stpasec::validation))]
    Validation(String),

    #[error("draft conflict: {0}")]
    #[diagnostic(code(stpasec::draft), help("reload the current committed version before retrying"))]
    DraftConflict(String),

    #[error("configuration error: {0}")]
    #[diagnostic(code(stpasec::config))]
    Config(String),

    #[error("analysis `{0}` not found")]
    #[diagnostic(code(stpasec::not_found))]
    NotFound(String),

    #[error("task join failed: {0}")]
    #[diagnostic(code(stpasec::join))]
    Join(#[from] tokio::task::JoinError),
}

impl From<DraftError> for StpaSecError {
    fn from(err: DraftError) -> Self {
        match err {
            DraftError::NotFound(id) => StpaSecError::NotFound(id),
            other => StpaSecError::DraftConflict(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, StpaSecError>;
