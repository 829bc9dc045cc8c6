use thiserror::Error;

use crate::form::ValidationOutcome;

#[derive(Debug, Error)]
pub enum DomainError {
    /// Per-field validation failure; recoverable, returned to the submitter
    /// with enough detail to re-render the form.
    #[error("validation failed")]
    Validation(ValidationOutcome),

    /// Attempted state change the transition table does not permit.
    #[error("cannot move from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },

    /// Duplicate team name within a tournament. Reported distinctly from
    /// validation errors so the caller can offer "resume existing
    /// registration" instead of "fix and retry".
    #[error("team name {0:?} is already taken in this tournament")]
    DuplicateTeamName(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    /// Stored data that no longer decodes into the domain (for example a
    /// status column holding an unrecognized value). Server-side integrity
    /// problem, not a client error.
    #[error("stored {0} holds an unrecognized value")]
    CorruptState(&'static str),

    #[error("database error")]
    Db(#[from] sqlx::Error),
}

impl DomainError {
    /// Maps a unique violation on the given constraint/index to `mapped`,
    /// passing every other error through as `Db`.
    pub fn from_unique_violation(
        err: sqlx::Error,
        constraint: &str,
        mapped: impl FnOnce() -> DomainError,
    ) -> DomainError {
        if let sqlx::Error::Database(ref db) = err {
            if db.is_unique_violation() && db.constraint() == Some(constraint) {
                return mapped();
            }
        }
        DomainError::Db(err)
    }
}
