//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::identity::ObjectId;

/// Domain errors represent violations of the object-graph invariants.
/// Cloning itself is total and never produces one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("node {node} is already owned by container {owner}")]
    NodeAlreadyOwned { node: ObjectId, owner: ObjectId },

    #[error("node {node} is already attached to container {holder}")]
    NodeAlreadyAttached { node: ObjectId, holder: ObjectId },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
