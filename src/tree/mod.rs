//! Self-referential record trees
//!
//! A record type is recursive when its schema carries a `TreeSpec`: an id
//! field, a parent-id field and a children field holding records of the
//! same type. Trees are validated node by node into arena storage.

mod arena;
mod resolver;

pub use arena::{NodeId, RecordTree, TreeNode};
pub use resolver::TreeResolver;
