//! Owning containers declared on a node.
//!
//! Three variants share the attach/detach primitives of the arena:
//! - single slot: zero or one child
//! - fixed list: membership fixed at construction, releasing a member fails
//! - mutable list: ordered children with insert, remove and replace
//!
//! Membership is always compared by handle identity.

use std::collections::HashSet;
use std::fmt;

use itertools::Itertools;
use tracing::{debug, instrument};

use crate::domain::arena::ModelArena;
use crate::domain::error::{ModelError, ModelResult};
use crate::domain::id::{ContainerId, FixedList, MutableList, NodeId, SingleSlot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Single,
    Fixed,
    Mutable,
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContainerKind::Single => "single",
            ContainerKind::Fixed => "fixed list",
            ContainerKind::Mutable => "mutable list",
        };
        f.write_str(name)
    }
}

/// Downlinks stored on the owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ContainerState {
    Single(Option<NodeId>),
    Fixed(Vec<NodeId>),
    Mutable(Vec<NodeId>),
}

impl ContainerState {
    pub(crate) fn kind(&self) -> ContainerKind {
        match self {
            ContainerState::Single(_) => ContainerKind::Single,
            ContainerState::Fixed(_) => ContainerKind::Fixed,
            ContainerState::Mutable(_) => ContainerKind::Mutable,
        }
    }

    pub(crate) fn members(&self) -> &[NodeId] {
        match self {
            ContainerState::Single(value) => value.as_slice(),
            ContainerState::Fixed(nodes) | ContainerState::Mutable(nodes) => nodes.as_slice(),
        }
    }
}

impl<T> ModelArena<T> {
    // ============================================================
    // Declaration
    // ============================================================

    /// Declares a single-child container on `owner`, optionally holding `initial`.
    #[instrument(level = "debug", skip(self))]
    pub fn add_single(&mut self, owner: NodeId, initial: Option<NodeId>) -> ModelResult<SingleSlot> {
        let id = self.next_container_id(owner)?;
        if let Some(node) = initial {
            self.check_attachable(node, id)?;
        }
        self.node_mut(owner)?
            .containers
            .push(ContainerState::Single(None));

        let slot = SingleSlot(id);
        self.set_single(slot, initial)?;
        Ok(slot)
    }

    /// Declares a fixed list on `owner`.
    ///
    /// Each node is released from its previous owner and attached in input
    /// order. Repeated nodes are kept once.
    #[instrument(level = "debug", skip(self, nodes))]
    pub fn add_fixed_list(
        &mut self,
        owner: NodeId,
        nodes: impl IntoIterator<Item = NodeId>,
    ) -> ModelResult<FixedList> {
        let id = self.next_container_id(owner)?;
        let nodes: Vec<NodeId> = nodes.into_iter().unique().collect();
        for &node in &nodes {
            self.check_attachable(node, id)?;
        }
        self.node_mut(owner)?
            .containers
            .push(ContainerState::Fixed(Vec::new()));

        for &node in &nodes {
            self.attach(id, node)?;
        }
        *self.fixed_nodes_mut(id)? = nodes;
        Ok(FixedList(id))
    }

    /// Declares a mutable list on `owner`, filled like [`ModelArena::extend`].
    #[instrument(level = "debug", skip(self, nodes))]
    pub fn add_mutable_list(
        &mut self,
        owner: NodeId,
        nodes: impl IntoIterator<Item = NodeId>,
    ) -> ModelResult<MutableList> {
        let id = self.next_container_id(owner)?;
        let nodes: Vec<NodeId> = nodes.into_iter().unique().collect();
        for &node in &nodes {
            self.check_attachable(node, id)?;
        }
        self.node_mut(owner)?
            .containers
            .push(ContainerState::Mutable(Vec::new()));

        let list = MutableList(id);
        self.splice_in(list, None, nodes)?;
        Ok(list)
    }

    fn next_container_id(&self, owner: NodeId) -> ModelResult<ContainerId> {
        let slot = self.node(owner)?.containers.len();
        Ok(ContainerId { owner, slot })
    }

    // ============================================================
    // Generic container operations
    // ============================================================

    /// Containers declared by `owner`, in declaration order.
    pub fn containers(&self, owner: NodeId) -> Vec<ContainerId> {
        self.nodes
            .get(owner.index())
            .map(|n| {
                (0..n.containers.len())
                    .map(|slot| ContainerId { owner, slot })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn container_kind(&self, container: ContainerId) -> ModelResult<ContainerKind> {
        Ok(self.state(container)?.kind())
    }

    /// Children owned by `container`, in order.
    pub fn container_children(&self, container: ContainerId) -> ModelResult<Vec<NodeId>> {
        Ok(self.state(container)?.members().to_vec())
    }

    /// Releases `node` if `container` owns it; otherwise does nothing.
    ///
    /// Fails with [`ModelError::ImmutableMembership`] for members of a fixed
    /// list.
    #[instrument(level = "debug", skip(self))]
    pub fn release_node(&mut self, container: ContainerId, node: NodeId) -> ModelResult<()> {
        let state = self.state(container)?;
        if !state.members().contains(&node) {
            return Ok(());
        }
        match state.kind() {
            ContainerKind::Single => {
                self.set_single(SingleSlot(container), None)?;
                Ok(())
            }
            ContainerKind::Fixed => Err(ModelError::ImmutableMembership { node, container }),
            ContainerKind::Mutable => {
                self.remove(MutableList(container), node)?;
                Ok(())
            }
        }
    }

    pub(crate) fn state(&self, container: ContainerId) -> ModelResult<&ContainerState> {
        self.nodes
            .get(container.owner.index())
            .and_then(|n| n.containers.get(container.slot))
            .ok_or(ModelError::StaleContainer(container))
    }

    fn state_mut(&mut self, container: ContainerId) -> ModelResult<&mut ContainerState> {
        self.nodes
            .get_mut(container.owner.index())
            .and_then(|n| n.containers.get_mut(container.slot))
            .ok_or(ModelError::StaleContainer(container))
    }

    fn kind_mismatch(container: ContainerId, expected: ContainerKind, found: &ContainerState) -> ModelError {
        ModelError::ContainerKind {
            container,
            expected,
            found: found.kind(),
        }
    }

    // ============================================================
    // Single slot
    // ============================================================

    pub fn get_single(&self, slot: SingleSlot) -> ModelResult<Option<NodeId>> {
        match self.state(slot.0)? {
            ContainerState::Single(value) => Ok(*value),
            other => Err(Self::kind_mismatch(slot.0, ContainerKind::Single, other)),
        }
    }

    fn single_mut(&mut self, slot: SingleSlot) -> ModelResult<&mut Option<NodeId>> {
        match self.state_mut(slot.0)? {
            ContainerState::Single(value) => Ok(value),
            other => Err(Self::kind_mismatch(
                slot.0,
                ContainerKind::Single,
                other,
            )),
        }
    }

    /// Stores `value` in the slot and returns the previous value.
    ///
    /// Assigning the value already held returns immediately without touching
    /// any link. Otherwise the old value is detached and `value` is released
    /// from its previous owner before being attached here.
    #[instrument(level = "debug", skip(self))]
    pub fn set_single(&mut self, slot: SingleSlot, value: Option<NodeId>) -> ModelResult<Option<NodeId>> {
        let current = self.get_single(slot)?;
        if current == value {
            return Ok(current);
        }
        if let Some(node) = value {
            self.check_attachable(node, slot.0)?;
        }

        if let Some(old) = current {
            self.detach(old);
        }
        *self.single_mut(slot)? = None;

        if let Some(node) = value {
            self.attach(slot.0, node)?;
        }
        *self.single_mut(slot)? = value;
        Ok(current)
    }

    // ============================================================
    // Fixed list
    // ============================================================

    pub fn fixed_nodes(&self, list: FixedList) -> ModelResult<&[NodeId]> {
        match self.state(list.0)? {
            ContainerState::Fixed(nodes) => Ok(nodes.as_slice()),
            other => Err(Self::kind_mismatch(list.0, ContainerKind::Fixed, other)),
        }
    }

    pub fn fixed_len(&self, list: FixedList) -> ModelResult<usize> {
        Ok(self.fixed_nodes(list)?.len())
    }

    fn fixed_nodes_mut(&mut self, container: ContainerId) -> ModelResult<&mut Vec<NodeId>> {
        match self.state_mut(container)? {
            ContainerState::Fixed(nodes) => Ok(nodes),
            other => Err(Self::kind_mismatch(
                container,
                ContainerKind::Fixed,
                other,
            )),
        }
    }

    // ============================================================
    // Mutable list
    // ============================================================

    pub fn list_nodes(&self, list: MutableList) -> ModelResult<&[NodeId]> {
        match self.state(list.0)? {
            ContainerState::Mutable(nodes) => Ok(nodes.as_slice()),
            other => Err(Self::kind_mismatch(list.0, ContainerKind::Mutable, other)),
        }
    }

    pub fn list_len(&self, list: MutableList) -> ModelResult<usize> {
        Ok(self.list_nodes(list)?.len())
    }

    pub fn list_contains(&self, list: MutableList, node: NodeId) -> ModelResult<bool> {
        Ok(self.list_nodes(list)?.contains(&node))
    }

    fn list_mut(&mut self, list: MutableList) -> ModelResult<&mut Vec<NodeId>> {
        match self.state_mut(list.0)? {
            ContainerState::Mutable(nodes) => Ok(nodes),
            other => Err(Self::kind_mismatch(
                list.0,
                ContainerKind::Mutable,
                other,
            )),
        }
    }

    /// Appends `node`, moving it here from wherever it was.
    #[instrument(level = "debug", skip(self))]
    pub fn push(&mut self, list: MutableList, node: NodeId) -> ModelResult<()> {
        self.splice_in(list, None, vec![node])
    }

    /// Inserts `node` at `index`.
    ///
    /// The index refers to the list after `node` has been released from it, so
    /// re-inserting a member moves it.
    #[instrument(level = "debug", skip(self))]
    pub fn insert_at(&mut self, list: MutableList, index: usize, node: NodeId) -> ModelResult<()> {
        self.splice_in(list, Some(index), vec![node])
    }

    /// Appends `nodes` in order.
    #[instrument(level = "debug", skip(self, nodes))]
    pub fn extend(&mut self, list: MutableList, nodes: impl IntoIterator<Item = NodeId>) -> ModelResult<()> {
        self.splice_in(list, None, nodes.into_iter().collect())
    }

    /// Inserts `nodes` in order starting at `index`.
    #[instrument(level = "debug", skip(self, nodes))]
    pub fn insert_all(
        &mut self,
        list: MutableList,
        index: usize,
        nodes: impl IntoIterator<Item = NodeId>,
    ) -> ModelResult<()> {
        self.splice_in(list, Some(index), nodes.into_iter().collect())
    }

    fn splice_in(&mut self, list: MutableList, index: Option<usize>, nodes: Vec<NodeId>) -> ModelResult<()> {
        let nodes: Vec<NodeId> = nodes.into_iter().unique().collect();
        let members = self.list_nodes(list)?;
        let moving_within = nodes.iter().filter(|n| members.contains(n)).count();
        let len = members.len() - moving_within;
        let index = index.unwrap_or(len);
        if index > len {
            return Err(ModelError::IndexOutOfBounds { index, len });
        }
        for &node in &nodes {
            self.check_attachable(node, list.0)?;
        }

        for &node in &nodes {
            self.attach(list.0, node)?;
        }
        self.list_mut(list)?.splice(index..index, nodes);
        Ok(())
    }

    /// Removes `node` if it is a member. Returns whether a removal happened.
    #[instrument(level = "debug", skip(self))]
    pub fn remove(&mut self, list: MutableList, node: NodeId) -> ModelResult<bool> {
        let members = self.list_mut(list)?;
        match members.iter().position(|&n| n == node) {
            Some(pos) => {
                members.remove(pos);
                self.detach(node);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Removes and returns the member at `index`.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_at(&mut self, list: MutableList, index: usize) -> ModelResult<NodeId> {
        let members = self.list_mut(list)?;
        if index >= members.len() {
            return Err(ModelError::IndexOutOfBounds {
                index,
                len: members.len(),
            });
        }
        let node = members.remove(index);
        self.detach(node);
        Ok(node)
    }

    /// Removes every member listed in `nodes`. Returns whether anything was
    /// removed.
    #[instrument(level = "debug", skip(self, nodes))]
    pub fn remove_all(&mut self, list: MutableList, nodes: impl IntoIterator<Item = NodeId>) -> ModelResult<bool> {
        self.list_nodes(list)?;
        let mut removed = false;
        for node in nodes {
            removed |= self.remove(list, node)?;
        }
        Ok(removed)
    }

    /// Removes every member not listed in `keep`. Returns whether anything was
    /// removed.
    #[instrument(level = "debug", skip(self, keep))]
    pub fn retain_all(&mut self, list: MutableList, keep: impl IntoIterator<Item = NodeId>) -> ModelResult<bool> {
        let keep: HashSet<NodeId> = keep.into_iter().collect();
        let dropped: Vec<NodeId> = self
            .list_nodes(list)?
            .iter()
            .copied()
            .filter(|n| !keep.contains(n))
            .collect();
        self.remove_all(list, dropped)
    }

    /// Detaches every member and empties the list.
    #[instrument(level = "debug", skip(self))]
    pub fn clear(&mut self, list: MutableList) -> ModelResult<()> {
        let members = std::mem::take(self.list_mut(list)?);
        debug!(count = members.len(), "clearing list");
        for node in members {
            self.detach(node);
        }
        Ok(())
    }

    /// Writes `node` at `index` and returns the member it replaced.
    ///
    /// Writing the member already at `index` is a no-op. A node that is a
    /// member elsewhere in this list is moved into the slot.
    #[instrument(level = "debug", skip(self))]
    pub fn replace(&mut self, list: MutableList, index: usize, node: NodeId) -> ModelResult<NodeId> {
        let members = self.list_nodes(list)?;
        let replaced = *members.get(index).ok_or(ModelError::IndexOutOfBounds {
            index,
            len: members.len(),
        })?;
        if replaced == node {
            return Ok(node);
        }
        let previous_position = members.iter().position(|&n| n == node);
        self.check_attachable(node, list.0)?;

        self.detach(replaced);
        let index = match previous_position {
            Some(pos) if pos < index => index - 1,
            _ => index,
        };
        self.attach(list.0, node)?;
        self.list_mut(list)?[index] = node;
        Ok(replaced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_members_of_empty_single_is_empty() {
        assert!(ContainerState::Single(None).members().is_empty());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ContainerKind::Fixed.to_string(), "fixed list");
        assert_eq!(ContainerKind::Mutable.to_string(), "mutable list");
    }
}
