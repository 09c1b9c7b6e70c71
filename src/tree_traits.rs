use std::fmt::Display;

use termtree::Tree;
use tracing::instrument;

use crate::domain::{ModelArena, NodeId};
use crate::traversal::Traversable;

pub trait TreeNodeConvert {
    /// Renders the subtree rooted at `root` for display.
    fn to_tree_string(&self, root: NodeId) -> Tree<String>;
}

impl<T: Display> TreeNodeConvert for ModelArena<T> {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self, root: NodeId) -> Tree<String> {
        fn build_tree<T: Display>(arena: &ModelArena<T>, node: NodeId) -> Tree<String> {
            let label = arena
                .get(node)
                .map(|data| data.to_string())
                .unwrap_or_default();
            let leaves: Vec<_> = arena
                .children(node)
                .into_iter()
                .map(|child| build_tree(arena, child))
                .collect();
            Tree::new(label).with_leaves(leaves)
        }

        if self.contains_node(root) {
            build_tree(self, root)
        } else {
            Tree::new("Empty tree".to_string())
        }
    }
}
