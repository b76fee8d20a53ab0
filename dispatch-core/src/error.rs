//! Error taxonomy for engine operations.
//!
//! Every variant is recoverable: operations validate before they mutate, so a
//! returned error means the in-memory state is unchanged (persistence
//! failures additionally roll the in-memory mutation back, see `engine`).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed input; message names the violated constraint.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Referenced user/task/progress key does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// "Not ready" conditions: retrain with no results, scoring with no
    /// candidates. Distinct from Validation so callers can surface it as a
    /// cold-start hint rather than a user mistake.
    #[error("insufficient data: {0}")]
    InsufficientData(&'static str),

    /// Durable read/write failure. The state on disk before the failed write
    /// remains intact (writes are temp-file-then-rename).
    #[error("persistence failure: {0:#}")]
    Persistence(anyhow::Error),
}

impl From<anyhow::Error> for EngineError {
    fn from(e: anyhow::Error) -> Self {
        Self::Persistence(e)
    }
}

impl EngineError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}
