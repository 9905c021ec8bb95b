//! Error taxonomy for the debate engine.
//!
//! Every engine operation surfaces one of these variants. `Gateway` and
//! `Parse` propagate to the caller after any required state rollback;
//! `Validation`, `NotFound` and `IllegalState` never mutate a session.

use thiserror::Error;

use crate::models::SessionState;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Required input is missing or empty (e.g. blank decision text).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The referenced session does not exist in the store.
    #[error("session not found: {0}")]
    NotFound(String),

    /// The operation is not permitted in the session's current state.
    #[error("operation not allowed in state {state:?}: {reason}")]
    IllegalState {
        state: SessionState,
        reason: String,
    },

    /// The completion backend reported a network, auth, quota or
    /// empty-content failure.
    #[error("completion backend error: {0}")]
    Gateway(String),

    /// The model's text could not be interpreted as the expected
    /// structured payload, even after fallback extraction.
    #[error("failed to parse model response: {0}")]
    Parse(String),

    /// The session store failed to read or write.
    #[error("session store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
