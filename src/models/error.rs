//! EngineError: every failure the engine can report.

use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Kind of entity an id refers to (for not-found and conflict errors).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EntityKind {
    Tournament,
    Match,
    Player,
    LiveMatch,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Tournament => "tournament",
            EntityKind::Match => "match",
            EntityKind::Player => "player",
            EntityKind::LiveMatch => "live match",
        };
        f.write_str(name)
    }
}

/// Errors that can occur during tournament, scoring and rating operations.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum EngineError {
    /// Malformed input.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Operation not allowed in the current status.
    #[error("invalid state: {0}")]
    State(String),

    #[error("bracket already generated for tournament {0}")]
    AlreadyGenerated(Uuid),

    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: Uuid },

    /// A score violates the tennis scoring invariants.
    #[error("corrupt score: {0}")]
    CorruptState(String),

    #[error("no points to undo for match {0}")]
    EmptyHistory(Uuid),

    #[error("match {0} is already finalized")]
    AlreadyFinalized(Uuid),

    /// Someone else updated the entity since it was loaded; reload and retry.
    #[error("concurrent update on {kind} {id}")]
    Conflict { kind: EntityKind, id: Uuid },

    #[error("storage failure: {0}")]
    Storage(String),

    #[error("roster import failed: {0}")]
    Roster(String),
}

impl EngineError {
    pub fn not_found(kind: EntityKind, id: Uuid) -> Self {
        EngineError::NotFound { kind, id }
    }

    /// Whether repeating the operation against fresh state may succeed.
    pub fn is_conflict(&self) -> bool {
        matches!(self, EngineError::Conflict { .. })
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
