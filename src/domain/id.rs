//! Handles into a [`ModelArena`](crate::domain::ModelArena).
//!
//! All handles compare by identity: two `NodeId`s are equal only if they name
//! the same arena slot in the same generation.

use std::fmt;

use generational_arena::Index;

/// Handle of a node stored in a `ModelArena`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) Index);

impl NodeId {
    pub(crate) fn index(self) -> Index {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (slot, generation) = self.0.into_raw_parts();
        write!(f, "#{}v{}", slot, generation)
    }
}

/// Address of a container: the owner node plus the position in which the owner
/// declared it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContainerId {
    pub(crate) owner: NodeId,
    pub(crate) slot: usize,
}

impl ContainerId {
    /// The node that declares this container.
    pub fn owner(&self) -> NodeId {
        self.owner
    }

    /// Declaration position on the owner.
    pub fn slot(&self) -> usize {
        self.slot
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.owner, self.slot)
    }
}

/// Handle of a cross-reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReferenceId(pub(crate) Index);

impl fmt::Display for ReferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (slot, generation) = self.0.into_raw_parts();
        write!(f, "&{}v{}", slot, generation)
    }
}

/// Container handle that holds zero or one child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SingleSlot(pub(crate) ContainerId);

/// Container handle whose membership is fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixedList(pub(crate) ContainerId);

/// Container handle for an ordered, mutable list of children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MutableList(pub(crate) ContainerId);

macro_rules! container_handle {
    ($($handle:ty),*) => {
        $(
            impl $handle {
                pub fn id(&self) -> ContainerId {
                    self.0
                }

                pub fn owner(&self) -> NodeId {
                    self.0.owner
                }
            }

            impl From<$handle> for ContainerId {
                fn from(handle: $handle) -> Self {
                    handle.0
                }
            }

            impl PartialEq<ContainerId> for $handle {
                fn eq(&self, other: &ContainerId) -> bool {
                    self.0 == *other
                }
            }

            impl PartialEq<$handle> for ContainerId {
                fn eq(&self, other: &$handle) -> bool {
                    *self == other.0
                }
            }
        )*
    };
}

container_handle!(SingleSlot, FixedList, MutableList);
