//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::id::{ContainerId, NodeId, ReferenceId};
use crate::domain::ContainerKind;

/// Domain errors represent ownership-contract violations.
///
/// Every mutating arena operation validates its inputs first and returns one of
/// these before touching any link, so a failed call leaves the tree unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("node {node} is contained in an immutable list and cannot be released")]
    ImmutableMembership { node: NodeId, container: ContainerId },

    #[error("node {0} does not exist in this arena")]
    StaleNode(NodeId),

    #[error("container {0} does not exist in this arena")]
    StaleContainer(ContainerId),

    #[error("cross-reference {0} does not exist in this arena")]
    StaleReference(ReferenceId),

    #[error("container {container} is a {found} container, expected {expected}")]
    ContainerKind {
        container: ContainerId,
        expected: ContainerKind,
        found: ContainerKind,
    },

    #[error("index {index} out of bounds for list of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("attaching node {node} below container {container} would create a cycle")]
    CycleDetected { node: NodeId, container: ContainerId },

    #[error("config error: {message}")]
    Config { message: String },
}

/// Result type for arena operations.
pub type ModelResult<T> = Result<T, ModelError>;
