//! Component tree model: the arena, runtime types, and the capability trait
//! the scope engine walks.

pub mod errors;
pub mod node;
pub mod tree;
pub mod types;

pub use errors::TreeError;
pub use node::{ModelTree, RootId};
pub use tree::{NodeId, NodeSpec, Tree};
pub use types::{TypeDescriptor, TypeRegistry};
