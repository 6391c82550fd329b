//! The capability contract the scope engine needs from a component tree.

use crate::model::types::TypeDescriptor;
use std::fmt;
use std::hash::Hash;

/// Identity of a root instance (simulation session).
///
/// Derived from the session identifier carried by the boundary root, usually
/// the simulation file name. Two lookups can only share cache entries when
/// they resolve to the same `RootId`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RootId(String);

impl RootId {
    pub fn new(session: impl Into<String>) -> Self {
        Self(session.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RootId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Read-only view of a tree of named, typed components.
///
/// Nodes are addressed through a cheap copyable handle. Parent links are
/// non-owning; children are ordered and only containers have any.
pub trait ModelTree {
    type NodeRef: Copy + Eq + Hash + fmt::Debug;

    /// True if `node` is a live handle into this tree.
    fn contains(&self, node: Self::NodeRef) -> bool;

    fn name(&self, node: Self::NodeRef) -> &str;

    fn runtime_type(&self, node: Self::NodeRef) -> TypeDescriptor;

    fn parent(&self, node: Self::NodeRef) -> Option<Self::NodeRef>;

    fn is_container(&self, node: Self::NodeRef) -> bool;

    /// Ordered children. Always empty for non-containers.
    fn children(&self, node: Self::NodeRef) -> &[Self::NodeRef];

    fn is_boundary_root(&self, node: Self::NodeRef) -> bool;

    fn is_zone(&self, node: Self::NodeRef) -> bool;

    /// Path unique within the owning root instance.
    fn path(&self, node: Self::NodeRef) -> String;

    /// Identity of the session root above `node`, or `None` for free-floating trees.
    fn owning_root_identity(&self, node: Self::NodeRef) -> Option<RootId>;

    /// True if `derived` is `base` or one of its subtypes.
    fn is_assignable(&self, base: TypeDescriptor, derived: TypeDescriptor) -> bool;
}
