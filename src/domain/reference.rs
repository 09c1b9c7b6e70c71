//! Non-owning cross-references between nodes.

use tracing::instrument;

use crate::domain::arena::{CrossReference, ModelArena, MoveHandler};
use crate::domain::error::{ModelError, ModelResult};
use crate::domain::id::{NodeId, ReferenceId};
use crate::domain::location::{MoveAction, MoveEvent};

fn boxed<A: Into<MoveAction>>(mut handler: impl FnMut(&MoveEvent) -> A + 'static) -> MoveHandler {
    Box::new(move |event: &MoveEvent| -> MoveAction { handler(event).into() })
}

impl<T> ModelArena<T> {
    /// Declares a cross-reference held by `holder`, pointing at `target`.
    #[instrument(level = "debug", skip(self))]
    pub fn add_cross_reference(&mut self, holder: NodeId, target: Option<NodeId>) -> ModelResult<ReferenceId> {
        self.insert_reference(holder, target, None)
    }

    /// Like [`ModelArena::add_cross_reference`], with a handler that receives
    /// every move of the target.
    ///
    /// The handler may return a [`MoveAction`] to retarget or clear its own
    /// reference, e.g. dropping the target once it is detached.
    #[instrument(level = "debug", skip(self, handler))]
    pub fn add_cross_reference_with<A: Into<MoveAction>>(
        &mut self,
        holder: NodeId,
        target: Option<NodeId>,
        handler: impl FnMut(&MoveEvent) -> A + 'static,
    ) -> ModelResult<ReferenceId> {
        self.insert_reference(holder, target, Some(boxed(handler)))
    }

    fn insert_reference(
        &mut self,
        holder: NodeId,
        target: Option<NodeId>,
        handler: Option<MoveHandler>,
    ) -> ModelResult<ReferenceId> {
        self.node(holder)?;
        if let Some(node) = target {
            self.node(node)?;
        }

        let reference = ReferenceId(self.references.insert(CrossReference {
            holder,
            target: None,
            handler,
        }));
        self.node_mut(holder)?.held.push(reference);
        self.set_target(reference, target)?;
        Ok(reference)
    }

    fn reference(&self, reference: ReferenceId) -> ModelResult<&CrossReference> {
        self.references
            .get(reference.0)
            .ok_or(ModelError::StaleReference(reference))
    }

    fn reference_mut(&mut self, reference: ReferenceId) -> ModelResult<&mut CrossReference> {
        self.references
            .get_mut(reference.0)
            .ok_or(ModelError::StaleReference(reference))
    }

    pub fn target(&self, reference: ReferenceId) -> ModelResult<Option<NodeId>> {
        Ok(self.reference(reference)?.target)
    }

    pub fn holder(&self, reference: ReferenceId) -> ModelResult<NodeId> {
        Ok(self.reference(reference)?.holder)
    }

    /// Points `reference` at `target` and returns the previous target.
    ///
    /// Assigning the current target is a no-op. Otherwise the reference is
    /// deregistered from the old target and registered on the new one.
    #[instrument(level = "debug", skip(self))]
    pub fn set_target(&mut self, reference: ReferenceId, target: Option<NodeId>) -> ModelResult<Option<NodeId>> {
        let current = self.reference(reference)?.target;
        if current == target {
            return Ok(current);
        }
        if let Some(node) = target {
            self.node(node)?;
        }

        if let Some(old) = current {
            if let Some(entry) = self.nodes.get_mut(old.index()) {
                entry.inbound.retain(|&r| r != reference);
            }
        }
        self.reference_mut(reference)?.target = target;
        if let Some(node) = target {
            self.node_mut(node)?.inbound.push(reference);
        }
        Ok(current)
    }

    pub fn set_move_handler<A: Into<MoveAction>>(
        &mut self,
        reference: ReferenceId,
        handler: impl FnMut(&MoveEvent) -> A + 'static,
    ) -> ModelResult<()> {
        self.reference_mut(reference)?.handler = Some(boxed(handler));
        Ok(())
    }

    pub fn clear_move_handler(&mut self, reference: ReferenceId) -> ModelResult<()> {
        self.reference_mut(reference)?.handler = None;
        Ok(())
    }

    /// Deregisters and deletes `reference`.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_cross_reference(&mut self, reference: ReferenceId) -> ModelResult<()> {
        self.set_target(reference, None)?;
        let holder = self.reference(reference)?.holder;
        if let Some(entry) = self.nodes.get_mut(holder.index()) {
            entry.held.retain(|&r| r != reference);
        }
        self.references.remove(reference.0);
        Ok(())
    }
}
