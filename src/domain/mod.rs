//! Domain layer: the node ownership engine
//!
//! This layer is independent of external concerns (no I/O, no config loading).

pub mod arena;
pub mod container;
pub mod error;
pub mod id;
pub mod location;
pub mod reference;

pub use arena::{ModelArena, MoveHandler};
pub use container::ContainerKind;
pub use error::{ModelError, ModelResult};
pub use id::{ContainerId, FixedList, MutableList, NodeId, ReferenceId, SingleSlot};
pub use location::{Location, MoveAction, MoveEvent};
