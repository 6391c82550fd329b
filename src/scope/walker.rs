//! Scope walking: which nodes are visible from a starting point.
//!
//! A walk first checks the start node, then its whole subtree (pre-order,
//! left to right), then climbs toward the root. Climbing from an ordinary
//! node repeats the full walk at the parent with the branch just visited
//! excluded. Climbing from a zone only looks at each ancestor and that
//! ancestor's direct children, never deeper, so the interior of a sibling
//! zone stays invisible. Nothing above the boundary root is ever inspected.

use crate::model::ModelTree;
use crate::scope::query::Query;

/// One traversal for one query.
pub struct Walker<'a, T: ModelTree> {
    tree: &'a T,
    query: &'a Query,
    first_only: bool,
    matches: Vec<T::NodeRef>,
}

impl<'a, T: ModelTree> Walker<'a, T> {
    pub fn new(tree: &'a T, query: &'a Query, first_only: bool) -> Self {
        Self {
            tree,
            query,
            first_only,
            matches: Vec::new(),
        }
    }

    /// Walk from `start`, skipping the child branch `exclude` if given.
    ///
    /// Returns matches nearest-first. With `first_only` at most one match is
    /// returned.
    pub fn walk(mut self, start: T::NodeRef, exclude: Option<T::NodeRef>) -> Vec<T::NodeRef> {
        let tree = self.tree;
        let mut current = start;
        let mut exclude = exclude;

        loop {
            self.check(current);
            if self.finished() {
                break;
            }

            if tree.is_container(current) {
                self.descend(current, exclude);
                if self.finished() {
                    break;
                }
            }

            let Some(parent) = tree.parent(current) else {
                break;
            };
            if tree.is_boundary_root(current) {
                break;
            }
            if tree.is_zone(current) {
                self.scan_ancestors(current, parent);
                break;
            }

            exclude = Some(current);
            current = parent;
        }

        tracing::trace!(
            start = ?start,
            query = ?self.query,
            first_only = self.first_only,
            matches = self.matches.len(),
            "scope walk finished"
        );
        self.matches
    }

    /// Pre-order over every descendant of `node` except the `exclude` branch.
    fn descend(&mut self, node: T::NodeRef, exclude: Option<T::NodeRef>) {
        let tree = self.tree;
        let mut stack: Vec<T::NodeRef> = tree
            .children(node)
            .iter()
            .rev()
            .copied()
            .filter(|&child| Some(child) != exclude)
            .collect();

        while let Some(next) = stack.pop() {
            if self.check(next) && self.first_only {
                return;
            }
            if tree.is_container(next) {
                stack.extend(tree.children(next).iter().rev().copied());
            }
        }
    }

    /// Climb out of a zone: direct children of each ancestor, then the
    /// ancestor itself, stopping after the boundary root.
    fn scan_ancestors(&mut self, zone: T::NodeRef, parent: T::NodeRef) {
        let tree = self.tree;
        let mut visited = zone;
        let mut next = Some(parent);

        while let Some(ancestor) = next {
            for &sibling in tree.children(ancestor) {
                if sibling == visited {
                    continue;
                }
                if self.check(sibling) && self.first_only {
                    return;
                }
            }
            if self.check(ancestor) && self.first_only {
                return;
            }
            if tree.is_boundary_root(ancestor) {
                return;
            }
            visited = ancestor;
            next = tree.parent(ancestor);
        }
    }

    fn check(&mut self, node: T::NodeRef) -> bool {
        let hit = self.query.matches(self.tree, node);
        if hit {
            self.matches.push(node);
        }
        hit
    }

    fn finished(&self) -> bool {
        self.first_only && !self.matches.is_empty()
    }
}
