use std::fmt;

use generational_arena::Arena;
use tracing::{debug, instrument, trace, warn};

use crate::config::Settings;
use crate::domain::container::ContainerState;
use crate::domain::error::{ModelError, ModelResult};
use crate::domain::id::{ContainerId, NodeId, ReferenceId};
use crate::domain::location::{Location, MoveAction, MoveEvent};
use crate::traversal::{Order, Traversable};

/// Callback invoked when the target of a cross-reference moves.
///
/// The returned action is applied to the handler's own reference after the
/// event has been delivered to every inbound reference.
pub type MoveHandler = Box<dyn FnMut(&MoveEvent) -> MoveAction>;

/// Tree node in the arena-based model.
pub(crate) struct TreeNode<T> {
    /// Host payload, usually an enum of node kinds
    pub(crate) data: T,
    /// Container currently owning this node, None for roots
    pub(crate) container: Option<ContainerId>,
    /// Containers declared by this node, in traversal order
    pub(crate) containers: Vec<ContainerState>,
    /// Cross-references pointing at this node
    pub(crate) inbound: Vec<ReferenceId>,
    /// Cross-references declared by this node
    pub(crate) held: Vec<ReferenceId>,
}

impl<T: fmt::Debug> fmt::Debug for TreeNode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeNode")
            .field("data", &self.data)
            .field("container", &self.container)
            .field("containers", &self.containers)
            .field("inbound", &self.inbound)
            .finish()
    }
}

/// Non-owning pointer from a holder node to a target node.
pub(crate) struct CrossReference {
    pub(crate) holder: NodeId,
    pub(crate) target: Option<NodeId>,
    pub(crate) handler: Option<MoveHandler>,
}

impl fmt::Debug for CrossReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrossReference")
            .field("holder", &self.holder)
            .field("target", &self.target)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

/// Arena owning every node of one or more trees.
///
/// Nodes are created detached and become part of a tree by being placed into a
/// container declared by another node. A node has at most one owning container
/// at any time; placing it somewhere new releases it from the old place first.
/// Cross-references are registered on their target and receive a [`MoveEvent`]
/// whenever the target's location changes.
///
/// The arena is single-threaded. Callers sharing it across threads must
/// serialize access themselves.
#[derive(Debug)]
pub struct ModelArena<T> {
    pub(crate) nodes: Arena<TreeNode<T>>,
    pub(crate) references: Arena<CrossReference>,
    pub(crate) detect_cycles: bool,
}

impl<T> Default for ModelArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ModelArena<T> {
    pub fn new() -> Self {
        Self::with_settings(&Settings::default())
    }

    pub fn with_settings(settings: &Settings) -> Self {
        Self {
            nodes: Arena::with_capacity(settings.node_capacity),
            references: Arena::with_capacity(settings.reference_capacity),
            detect_cycles: settings.detect_cycles,
        }
    }

    /// Creates a detached node.
    #[instrument(level = "trace", skip(self, data))]
    pub fn insert(&mut self, data: T) -> NodeId {
        let idx = self.nodes.insert(TreeNode {
            data,
            container: None,
            containers: Vec::new(),
            inbound: Vec::new(),
            held: Vec::new(),
        });
        NodeId(idx)
    }

    pub fn get(&self, node: NodeId) -> Option<&T> {
        self.nodes.get(node.index()).map(|n| &n.data)
    }

    pub fn get_mut(&mut self, node: NodeId) -> Option<&mut T> {
        self.nodes.get_mut(node.index()).map(|n| &mut n.data)
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        self.nodes.contains(node.index())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All live nodes in arena order (not tree order).
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &T)> {
        self.nodes.iter().map(|(idx, node)| (NodeId(idx), &node.data))
    }

    /// Container currently owning `node`, None for roots and stale handles.
    pub fn container(&self, node: NodeId) -> Option<ContainerId> {
        self.nodes.get(node.index()).and_then(|n| n.container)
    }

    /// Current location of `node`, None if the handle is stale.
    pub fn location(&self, node: NodeId) -> Option<Location> {
        self.nodes
            .get(node.index())
            .map(|n| Location::new(n.container))
    }

    /// Snapshot of the cross-references currently targeting `node`.
    pub fn inbound_references(&self, node: NodeId) -> Vec<ReferenceId> {
        self.nodes
            .get(node.index())
            .map(|n| n.inbound.clone())
            .unwrap_or_default()
    }

    /// Cross-references declared by `node`.
    pub fn held_references(&self, node: NodeId) -> Vec<ReferenceId> {
        self.nodes
            .get(node.index())
            .map(|n| n.held.clone())
            .unwrap_or_default()
    }

    /// Detaches `node` from its container.
    ///
    /// Roots are left alone. Fails with [`ModelError::ImmutableMembership`] if
    /// the node belongs to a fixed list.
    #[instrument(level = "debug", skip(self))]
    pub fn release(&mut self, node: NodeId) -> ModelResult<()> {
        match self.node(node)?.container {
            Some(container) => self.release_node(container, node),
            None => Ok(()),
        }
    }

    /// Releases `node` and deletes it together with all its descendants.
    ///
    /// Payloads are returned in postorder. Cross-references held by removed
    /// nodes are deleted; cross-references elsewhere that targeted a removed
    /// node are kept with an empty target.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_subtree(&mut self, node: NodeId) -> ModelResult<Vec<T>> {
        self.release(node)?;

        let doomed: Vec<NodeId> = self
            .descendants_or_self(node, Order::Postorder, |_| false)
            .collect();

        for &n in &doomed {
            for reference in self.held_references(n) {
                self.remove_cross_reference(reference)?;
            }
        }

        // Only references held outside the subtree are left at this point
        for &n in &doomed {
            for reference in self.inbound_references(n) {
                if let Some(entry) = self.references.get_mut(reference.0) {
                    entry.target = None;
                }
            }
        }

        let payloads: Vec<T> = doomed
            .into_iter()
            .filter_map(|n| self.nodes.remove(n.index()))
            .map(|entry| entry.data)
            .collect();
        debug!(removed = payloads.len(), "removed subtree");
        Ok(payloads)
    }

    /// Nearest node in `ancestors_or_self(node)` whose payload `project` maps to
    /// `Some`, together with the projected value.
    ///
    /// With an enum payload this is the typed variant lookup:
    /// `arena.closest_map(leaf, |k| match k { Kind::Block(b) => Some(b), _ => None })`.
    pub fn closest_map<'a, U: ?Sized>(
        &'a self,
        node: NodeId,
        project: impl Fn(&'a T) -> Option<&'a U>,
    ) -> Option<(NodeId, &'a U)> {
        self.ancestors_or_self(node)
            .find_map(|id| self.get(id).and_then(&project).map(|found| (id, found)))
    }

    pub(crate) fn node(&self, node: NodeId) -> ModelResult<&TreeNode<T>> {
        self.nodes
            .get(node.index())
            .ok_or(ModelError::StaleNode(node))
    }

    pub(crate) fn node_mut(&mut self, node: NodeId) -> ModelResult<&mut TreeNode<T>> {
        self.nodes
            .get_mut(node.index())
            .ok_or(ModelError::StaleNode(node))
    }

    /// The single mutation point for node locations.
    ///
    /// Writes the new uplink directly, never calling back into a container, and
    /// then notifies every inbound cross-reference once. Retargets requested by
    /// handlers are applied after the whole snapshot has been notified.
    pub(crate) fn move_to(&mut self, node: NodeId, to: Option<ContainerId>) {
        let Some(entry) = self.nodes.get_mut(node.index()) else {
            return;
        };
        let from = Location::new(entry.container);
        let to = Location::new(to);
        entry.container = to.container();
        trace!(%node, %from, %to, "move");

        let inbound = entry.inbound.clone();
        let mut retargets = Vec::new();
        for reference in inbound {
            let Some(handler) = self
                .references
                .get_mut(reference.0)
                .and_then(|r| r.handler.as_mut())
            else {
                continue;
            };
            let event = MoveEvent {
                reference,
                target: node,
                from,
                to,
            };
            if let MoveAction::Retarget(target) = handler(&event) {
                retargets.push((reference, target));
            }
        }

        for (reference, target) in retargets {
            if let Err(err) = self.set_target(reference, target) {
                warn!(%reference, %err, "retarget requested by move handler dropped");
            }
        }
    }

    /// Sets the uplinks of `node` to none without going through its container.
    pub(crate) fn detach(&mut self, node: NodeId) {
        self.move_to(node, None);
    }

    /// Releases `node` from wherever it is and points its uplinks at `container`.
    ///
    /// The caller stores `node` in the container's state.
    pub(crate) fn attach(&mut self, container: ContainerId, node: NodeId) -> ModelResult<()> {
        self.release(node)?;
        self.move_to(node, Some(container));
        Ok(())
    }

    /// Rejects attachments that could not complete, before any link changes.
    pub(crate) fn check_attachable(&self, node: NodeId, target: ContainerId) -> ModelResult<()> {
        let entry = self.node(node)?;
        if let Some(current) = entry.container {
            if let ContainerState::Fixed(_) = self.state(current)? {
                return Err(ModelError::ImmutableMembership {
                    node,
                    container: current,
                });
            }
        }
        if self.detect_cycles && self.ancestors_or_self(target.owner).any(|a| a == node) {
            return Err(ModelError::CycleDetected {
                node,
                container: target,
            });
        }
        Ok(())
    }
}

impl<T> Traversable for ModelArena<T> {
    type Node = NodeId;

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.container(node).map(|c| c.owner)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(node.index())
            .map(|n| n.containers.iter().flat_map(|c| c.members()).copied().collect())
            .unwrap_or_default()
    }
}
