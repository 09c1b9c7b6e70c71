use std::fmt;

use crate::domain::id::{ContainerId, NodeId, ReferenceId};

/// Where a node currently sits in the tree.
///
/// Only the container is stored; the parent is always the container's owner,
/// so a location is either fully attached or fully detached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Location {
    container: Option<ContainerId>,
}

impl Location {
    pub const DETACHED: Location = Location { container: None };

    pub fn new(container: Option<ContainerId>) -> Self {
        Self { container }
    }

    pub fn attached(container: impl Into<ContainerId>) -> Self {
        Self {
            container: Some(container.into()),
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.container.map(|c| c.owner)
    }

    pub fn container(&self) -> Option<ContainerId> {
        self.container
    }

    pub fn is_detached(&self) -> bool {
        self.container.is_none()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.container {
            Some(container) => write!(f, "{}", container),
            None => write!(f, "detached"),
        }
    }
}

/// Delivered to a cross-reference handler whenever its target changes location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveEvent {
    pub reference: ReferenceId,
    pub target: NodeId,
    pub from: Location,
    pub to: Location,
}

/// What a move handler wants done with its own cross-reference.
///
/// Applied once every inbound reference has seen the event. Handlers returning
/// `()` keep their target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MoveAction {
    #[default]
    Keep,
    /// Point the reference at another node, or at nothing
    Retarget(Option<NodeId>),
}

impl From<()> for MoveAction {
    fn from(_: ()) -> Self {
        MoveAction::Keep
    }
}
