//! Tree-shaped in-memory models with owning containers and cross-references.
//!
//! Nodes live in a [`ModelArena`]. A node is owned by at most one container at
//! a time; containers are declared on their owner node and come in three
//! variants (single slot, fixed list, mutable list). Cross-references point at
//! a node without owning it and are told whenever it moves. Traversal works
//! through the [`Traversable`] parent/children contract only.
//!
//! ```
//! use rsmodel::{ModelArena, Order, Traversable};
//!
//! let mut arena = ModelArena::new();
//! let lhs = arena.insert("lhs");
//! let rhs = arena.insert("rhs");
//! let add = arena.insert("add");
//! let operands = arena.add_fixed_list(add, [lhs, rhs]).unwrap();
//!
//! assert_eq!(arena.parent(lhs), Some(add));
//! assert_eq!(arena.fixed_nodes(operands).unwrap(), &[lhs, rhs]);
//! assert!(arena.release(lhs).is_err());
//!
//! let all: Vec<_> = arena.descendants_or_self(add, Order::Preorder, |_| false).collect();
//! assert_eq!(all, vec![add, lhs, rhs]);
//! ```

pub mod config;
pub mod domain;
pub mod traversal;
pub mod tree_traits;
pub mod util;

pub use config::Settings;
pub use domain::{
    ContainerId, ContainerKind, FixedList, Location, ModelArena, ModelError, ModelResult,
    MoveAction, MoveEvent, MutableList, NodeId, ReferenceId, SingleSlot,
};
pub use traversal::{Ancestors, Descendants, Order, Traversable};
pub use tree_traits::TreeNodeConvert;
