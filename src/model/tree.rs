//! Arena-backed component tree.
//!
//! Nodes live in a flat arena and refer to each other by [`NodeId`]. The
//! parent link is a plain index, so the arena is the only owner. Detached
//! nodes stay in the arena as free-floating subtrees; their handles remain
//! valid but no longer belong to the session.

use crate::model::errors::TreeError;
use crate::model::node::{ModelTree, RootId};
use crate::model::types::{TypeDescriptor, TypeRegistry};
use std::fmt;

/// Handle to a node in a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Description of a node to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSpec {
    pub name: String,
    pub ty: TypeDescriptor,
    pub container: bool,
    pub zone: bool,
}

impl NodeSpec {
    /// A leaf node.
    pub fn leaf(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            ty,
            container: false,
            zone: false,
        }
    }

    /// A node that may hold children.
    pub fn container(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            container: true,
            ..Self::leaf(name, ty)
        }
    }

    /// A container that is also a zone.
    pub fn zone(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            container: true,
            zone: true,
            ..Self::leaf(name, ty)
        }
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    name: String,
    ty: TypeDescriptor,
    container: bool,
    zone: bool,
    session: Option<RootId>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A tree of simulation components with at most one boundary root.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    types: TypeRegistry,
    nodes: Vec<NodeData>,
    boundary_root: Option<NodeId>,
}

impl Tree {
    pub fn new(types: TypeRegistry) -> Self {
        Self {
            types,
            nodes: Vec::new(),
            boundary_root: None,
        }
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Mutable access for registering types after construction.
    pub fn types_mut(&mut self) -> &mut TypeRegistry {
        &mut self.types
    }

    /// Add a free-floating root. Lookups below it are never cached.
    pub fn add_root(&mut self, spec: NodeSpec) -> NodeId {
        self.push(spec, None, None)
    }

    /// Add the boundary root of a session identified by `session`.
    ///
    /// The boundary root is always a container.
    pub fn add_session_root(
        &mut self,
        spec: NodeSpec,
        session: impl Into<String>,
    ) -> Result<NodeId, TreeError> {
        if let Some(existing) = self.boundary_root {
            return Err(TreeError::DuplicateBoundaryRoot {
                existing: self.full_path(existing),
            });
        }
        let spec = NodeSpec {
            container: true,
            ..spec
        };
        let id = self.push(spec, None, Some(RootId::new(session)));
        self.boundary_root = Some(id);
        tracing::debug!(root = %self.full_path(id), "added session root");
        Ok(id)
    }

    /// Append a child to `parent`.
    pub fn add_child(&mut self, parent: NodeId, spec: NodeSpec) -> Result<NodeId, TreeError> {
        self.check(parent)?;
        if !self.nodes[parent.0].container {
            return Err(TreeError::NotAContainer {
                path: self.full_path(parent),
            });
        }
        let id = self.push(spec, Some(parent), None);
        self.nodes[parent.0].children.push(id);
        tracing::debug!(node = %self.full_path(id), "added node");
        Ok(id)
    }

    fn push(&mut self, spec: NodeSpec, parent: Option<NodeId>, session: Option<RootId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            name: spec.name,
            ty: spec.ty,
            container: spec.container,
            zone: spec.zone,
            session,
            parent,
            children: Vec::new(),
        });
        id
    }

    /// Remove `node` (and its subtree) from its parent.
    ///
    /// The subtree stays addressable as a free-floating tree. Detaching a node
    /// that has no parent is a no-op.
    pub fn detach(&mut self, node: NodeId) -> Result<(), TreeError> {
        self.check(node)?;
        if self.boundary_root == Some(node) {
            return Err(TreeError::BoundaryRootFixed {
                path: self.full_path(node),
            });
        }
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|&child| child != node);
            tracing::debug!(node = %self.nodes[node.0].name, from = %self.full_path(parent), "detached node");
        }
        Ok(())
    }

    /// Move `node` to the end of `new_parent`'s children.
    pub fn move_node(&mut self, node: NodeId, new_parent: NodeId) -> Result<(), TreeError> {
        self.check(node)?;
        self.check(new_parent)?;
        if self.boundary_root == Some(node) {
            return Err(TreeError::BoundaryRootFixed {
                path: self.full_path(node),
            });
        }
        if !self.nodes[new_parent.0].container {
            return Err(TreeError::NotAContainer {
                path: self.full_path(new_parent),
            });
        }
        if self.ancestors_inclusive(new_parent).any(|a| a == node) {
            return Err(TreeError::Cycle {
                path: self.full_path(node),
            });
        }

        self.detach(node)?;
        self.nodes[node.0].parent = Some(new_parent);
        self.nodes[new_parent.0].children.push(node);
        tracing::debug!(node = %self.full_path(node), "moved node");
        Ok(())
    }

    pub fn rename(&mut self, node: NodeId, name: impl Into<String>) -> Result<(), TreeError> {
        self.check(node)?;
        let name = name.into();
        tracing::debug!(node = %self.full_path(node), to = %name, "renamed node");
        self.nodes[node.0].name = name;
        Ok(())
    }

    pub fn boundary_root(&self) -> Option<NodeId> {
        self.boundary_root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Name of the node's runtime type, or `<unknown>` for a foreign handle.
    pub fn type_name(&self, node: NodeId) -> &str {
        match self.nodes.get(node.0) {
            Some(data) => self.types.name(data.ty),
            None => "<unknown>",
        }
    }

    /// Path of names from the top of the tree, e.g. `.Simulation.Field.Soil`.
    pub fn full_path(&self, node: NodeId) -> String {
        let mut names: Vec<&str> = self
            .ancestors_inclusive(node)
            .map(|id| self.nodes[id.0].name.as_str())
            .collect();
        names.reverse();

        let mut path = String::new();
        for name in names {
            path.push('.');
            path.push_str(name);
        }
        path
    }

    /// Like [`full_path`](Self::full_path) but distinct for every node of a
    /// tree, even when siblings share a name or names contain dots.
    ///
    /// `.`, `#` and `\` inside names are escaped with a backslash, and the
    /// k-th repeat of a name among its siblings gets a `#k` suffix. With
    /// distinct, plain sibling names this is the full path.
    pub fn unique_path(&self, node: NodeId) -> String {
        let mut chain: Vec<NodeId> = self.ancestors_inclusive(node).collect();
        chain.reverse();

        let mut path = String::new();
        for id in chain {
            let data = &self.nodes[id.0];
            path.push('.');
            for ch in data.name.chars() {
                if matches!(ch, '.' | '#' | '\\') {
                    path.push('\\');
                }
                path.push(ch);
            }

            let repeats = data.parent.map_or(0, |parent| {
                self.nodes[parent.0]
                    .children
                    .iter()
                    .take_while(|&&sibling| sibling != id)
                    .filter(|&&sibling| self.nodes[sibling.0].name == data.name)
                    .count()
            });
            if repeats > 0 {
                path.push_str(&format!("#{repeats}"));
            }
        }
        path
    }

    /// Resolve a full path such as `.Simulation.Field` against the tree's roots.
    ///
    /// The session root is searched first, then free-floating roots in
    /// insertion order.
    pub fn find_by_path(&self, path: &str) -> Option<NodeId> {
        let mut parts = path.strip_prefix('.').unwrap_or(path).split('.');
        let first = parts.next()?;

        let mut current = self
            .boundary_root
            .into_iter()
            .chain(self.roots())
            .find(|&id| self.nodes[id.0].name == first)?;

        for part in parts {
            current = self.nodes[current.0]
                .children
                .iter()
                .copied()
                .find(|&child| self.nodes[child.0].name == part)?;
        }
        Some(current)
    }

    /// All nodes without a parent, in insertion order.
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, data)| data.parent.is_none())
            .map(|(index, _)| NodeId(index))
    }

    /// Ancestors of `node`, nearest first, excluding `node` itself.
    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.ancestors_inclusive(node).skip(1)
    }

    fn ancestors_inclusive(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(node), move |id| self.nodes[id.0].parent)
    }

    /// `node` and all of its descendants in pre-order.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        out
    }

    fn check(&self, node: NodeId) -> Result<(), TreeError> {
        if node.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(TreeError::UnknownNode { index: node.0 })
        }
    }
}

impl ModelTree for Tree {
    type NodeRef = NodeId;

    fn contains(&self, node: NodeId) -> bool {
        node.0 < self.nodes.len()
    }

    fn name(&self, node: NodeId) -> &str {
        &self.nodes[node.0].name
    }

    fn runtime_type(&self, node: NodeId) -> TypeDescriptor {
        self.nodes[node.0].ty
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    fn is_container(&self, node: NodeId) -> bool {
        self.nodes[node.0].container
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    fn is_boundary_root(&self, node: NodeId) -> bool {
        self.boundary_root == Some(node)
    }

    fn is_zone(&self, node: NodeId) -> bool {
        self.nodes[node.0].zone
    }

    fn path(&self, node: NodeId) -> String {
        self.unique_path(node)
    }

    fn owning_root_identity(&self, node: NodeId) -> Option<RootId> {
        let top = self.ancestors_inclusive(node).last()?;
        self.nodes[top.0].session.clone()
    }

    fn is_assignable(&self, base: TypeDescriptor, derived: TypeDescriptor) -> bool {
        self.types.is_assignable(base, derived)
    }
}
