//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violations of the forest invariants.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("cycle detected in hierarchy at node: {0}")]
    CycleDetected(String),

    #[error("duplicate node id: {0}")]
    DuplicateId(String),

    #[error("unknown node: {0}")]
    UnknownNode(String),

    #[error("parent '{parent_id}' of node '{id}' not found")]
    UnresolvedParent { id: String, parent_id: String },
}

/// Result type for forest operations.
pub type DomainResult<T> = Result<T, DomainError>;
