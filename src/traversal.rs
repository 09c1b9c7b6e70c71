//! Read-only traversal over anything with a parent/children contract.
//!
//! Nothing here knows about containers; a tree only has to answer `parent`
//! and `children`. Iterators are lazy and can be dropped at any point.

use tracing::instrument;

/// Order in which [`Traversable::descendants`] lists nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    /// A parent is listed before any of its children.
    #[default]
    Preorder,
    /// A parent is listed after all its children.
    Postorder,
}

/// An object with references to its parent and children.
pub trait Traversable {
    type Node: Copy + Eq;

    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// Direct children in traversal order.
    fn children(&self, node: Self::Node) -> Vec<Self::Node>;

    fn is_root(&self, node: Self::Node) -> bool {
        self.parent(node).is_none()
    }

    /// Root of the tree containing `node`, possibly `node` itself.
    fn root(&self, node: Self::Node) -> Self::Node {
        self.ancestors(node).last().unwrap_or(node)
    }

    /// Parent, grandparent, ... up to the root. Excludes `node`.
    fn ancestors(&self, node: Self::Node) -> Ancestors<'_, Self> {
        Ancestors {
            tree: self,
            next: self.parent(node),
        }
    }

    fn ancestors_or_self(&self, node: Self::Node) -> Ancestors<'_, Self> {
        Ancestors {
            tree: self,
            next: Some(node),
        }
    }

    /// Children of the parent except `node`, in the parent's order. Empty for roots.
    fn siblings(&self, node: Self::Node) -> Vec<Self::Node> {
        let mut siblings = self.siblings_or_self(node);
        siblings.retain(|&n| n != node);
        siblings
    }

    /// Children of the parent including `node`. Empty for roots.
    fn siblings_or_self(&self, node: Self::Node) -> Vec<Self::Node> {
        self.parent(node)
            .map(|parent| self.children(parent))
            .unwrap_or_default()
    }

    /// Depth-first walk below `node`.
    ///
    /// If `should_prune` returns true for a node, neither it nor any of its
    /// descendants are listed. `node` itself is tested first; pruning it yields
    /// nothing.
    fn descendants<F>(&self, node: Self::Node, order: Order, should_prune: F) -> Descendants<'_, Self, F>
    where
        F: FnMut(Self::Node) -> bool,
    {
        Descendants::new(self, node, order, should_prune, false)
    }

    /// Like [`Traversable::descendants`], with `node` listed first (preorder)
    /// or last (postorder).
    fn descendants_or_self<F>(&self, node: Self::Node, order: Order, should_prune: F) -> Descendants<'_, Self, F>
    where
        F: FnMut(Self::Node) -> bool,
    {
        Descendants::new(self, node, order, should_prune, true)
    }

    /// First node of `ancestors_or_self(node)` matching `predicate`.
    fn closest<P>(&self, node: Self::Node, mut predicate: P) -> Option<Self::Node>
    where
        P: FnMut(Self::Node) -> bool,
    {
        self.ancestors_or_self(node).find(|&n| predicate(n))
    }
}

/// Iterator over ancestors, recomputed from the tree on every call.
pub struct Ancestors<'a, T: Traversable + ?Sized> {
    tree: &'a T,
    next: Option<T::Node>,
}

impl<'a, T: Traversable + ?Sized> Iterator for Ancestors<'a, T> {
    type Item = T::Node;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

enum Frame<N> {
    /// Not yet tested against the prune predicate
    Visit(N),
    /// Already accepted, waiting to be yielded
    Emit(N),
}

/// Lazy depth-first iterator built on an explicit stack.
///
/// The prune predicate is called exactly once per reached node.
pub struct Descendants<'a, T: Traversable + ?Sized, F> {
    tree: &'a T,
    order: Order,
    should_prune: F,
    stack: Vec<Frame<T::Node>>,
}

impl<'a, T, F> Descendants<'a, T, F>
where
    T: Traversable + ?Sized,
    F: FnMut(T::Node) -> bool,
{
    #[instrument(level = "trace", skip_all)]
    fn new(tree: &'a T, node: T::Node, order: Order, mut should_prune: F, include_self: bool) -> Self {
        let mut stack = Vec::new();
        if !should_prune(node) {
            if include_self && order == Order::Postorder {
                stack.push(Frame::Emit(node));
            }
            // Push children in reverse order for left-to-right traversal
            for child in tree.children(node).into_iter().rev() {
                stack.push(Frame::Visit(child));
            }
            if include_self && order == Order::Preorder {
                stack.push(Frame::Emit(node));
            }
        }
        Self {
            tree,
            order,
            should_prune,
            stack,
        }
    }

    fn push_children(&mut self, node: T::Node) {
        for child in self.tree.children(node).into_iter().rev() {
            self.stack.push(Frame::Visit(child));
        }
    }
}

impl<'a, T, F> Iterator for Descendants<'a, T, F>
where
    T: Traversable + ?Sized,
    F: FnMut(T::Node) -> bool,
{
    type Item = T::Node;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(frame) = self.stack.pop() {
            match frame {
                Frame::Emit(node) => return Some(node),
                Frame::Visit(node) => {
                    if (self.should_prune)(node) {
                        continue;
                    }
                    match self.order {
                        Order::Preorder => {
                            self.push_children(node);
                            return Some(node);
                        }
                        Order::Postorder => {
                            self.stack.push(Frame::Emit(node));
                            self.push_children(node);
                        }
                    }
                }
            }
        }
        None
    }
}
