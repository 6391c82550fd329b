//! Scope resolution: find the nodes visible from a point in the tree.
//!
//! [`Scope`] is the entry point. It owns the lookup cache for one session and
//! must be kept alongside that session's tree. Call [`Scope::clear_cache`]
//! after every structural change to the tree; the scope does not notice
//! mutations by itself.
//!
//! # Example
//!
//! ```
//! use simscope::model::{NodeSpec, Tree};
//! use simscope::scope::Scope;
//!
//! let mut tree = Tree::default();
//! let sim = tree.types().simulation();
//! let zone = tree.types().zone();
//! let model = tree.types().model();
//!
//! let root = tree
//!     .add_session_root(NodeSpec::container("Simulation", sim), "demo.apsimx")
//!     .unwrap();
//! let field = tree.add_child(root, NodeSpec::zone("Field", zone)).unwrap();
//! let clock = tree.add_child(root, NodeSpec::leaf("Clock", model)).unwrap();
//!
//! let mut scope = Scope::new();
//! assert_eq!(scope.find_by_name(&tree, field, "Clock"), Some(clock));
//! ```

pub mod cache;
pub mod errors;
pub mod query;
pub mod walker;

pub use cache::{CacheKey, MatchMode, ScopeCache, ScopeSettings};
pub use errors::ScopeError;
pub use query::{Query, QueryKey};
pub use walker::Walker;

use crate::model::{ModelTree, TypeDescriptor};

/// Counters for monitoring cache effectiveness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScopeStats {
    /// Number of tree walks performed.
    pub walks: u64,
    pub hits: u64,
    pub misses: u64,
}

/// Cached scope lookups for one session tree.
#[derive(Debug, Clone)]
pub struct Scope<T: ModelTree> {
    cache: ScopeCache<T::NodeRef>,
    stats: ScopeStats,
}

impl<T: ModelTree> Default for Scope<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ModelTree> Scope<T> {
    pub fn new() -> Self {
        Self::with_settings(ScopeSettings::default())
    }

    pub fn with_settings(settings: ScopeSettings) -> Self {
        Self {
            cache: ScopeCache::new(settings),
            stats: ScopeStats::default(),
        }
    }

    /// Nearest node named `name` visible from `relative_to`.
    pub fn find_by_name(
        &mut self,
        tree: &T,
        relative_to: T::NodeRef,
        name: &str,
    ) -> Option<T::NodeRef> {
        self.lookup(tree, relative_to, Query::name(name), MatchMode::Single)
            .into_iter()
            .next()
    }

    /// Nearest node of type `ty` (or a subtype) visible from `relative_to`.
    pub fn find_by_type(
        &mut self,
        tree: &T,
        relative_to: T::NodeRef,
        ty: TypeDescriptor,
    ) -> Option<T::NodeRef> {
        self.lookup(tree, relative_to, Query::Type(ty), MatchMode::Single)
            .into_iter()
            .next()
    }

    /// Every node visible from `relative_to`, nearest first, optionally
    /// restricted to a type. Never fails; may be empty.
    pub fn find_all(
        &mut self,
        tree: &T,
        relative_to: T::NodeRef,
        ty: Option<TypeDescriptor>,
    ) -> Vec<T::NodeRef> {
        self.lookup(tree, relative_to, Query::of_type(ty), MatchMode::Many)
    }

    fn lookup(
        &mut self,
        tree: &T,
        relative_to: T::NodeRef,
        query: Query,
        mode: MatchMode,
    ) -> Vec<T::NodeRef> {
        if !tree.contains(relative_to) {
            return Vec::new();
        }

        let key = self.cache.key_for(tree, relative_to, &query, mode);
        if let Some(key) = &key {
            if let Some(hit) = self.cache.get(key) {
                self.stats.hits += 1;
                tracing::debug!(query = ?query, matches = hit.len(), "scope cache hit");
                return hit;
            }
            self.stats.misses += 1;
        }

        self.stats.walks += 1;
        let matches = Walker::new(tree, &query, mode.first_only()).walk(relative_to, None);

        if let Some(key) = key {
            tracing::debug!(query = ?query, matches = matches.len(), "scope cache store");
            self.cache.put(key, matches.clone());
        }
        matches
    }

    /// Drop every cached result. Required after adding, removing, moving or
    /// renaming nodes.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn stats(&self) -> ScopeStats {
        self.stats
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn settings(&self) -> ScopeSettings {
        self.cache.settings()
    }
}

/// Nearest ancestor of `node` that is a zone.
///
/// A model that needs a zone but has none above it sits in a malformed tree,
/// so this fails with the model's path rather than returning `None`.
pub fn parent_zone<T: ModelTree>(tree: &T, node: T::NodeRef) -> Result<T::NodeRef, ScopeError> {
    if !tree.contains(node) {
        return Err(ScopeError::ForeignNode {
            node: format!("{node:?}"),
        });
    }

    let mut current = tree.parent(node);
    while let Some(candidate) = current {
        if tree.is_zone(candidate) {
            return Ok(candidate);
        }
        current = tree.parent(candidate);
    }

    Err(ScopeError::MissingZone {
        path: tree.path(node),
    })
}

/// The boundary root `node` belongs to, if it is part of a session.
pub fn boundary_root<T: ModelTree>(tree: &T, node: T::NodeRef) -> Option<T::NodeRef> {
    if !tree.contains(node) {
        return None;
    }
    let mut current = node;
    loop {
        if tree.is_boundary_root(current) {
            return Some(current);
        }
        current = tree.parent(current)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeId, NodeSpec, Tree};

    fn farm() -> (Tree, NodeId, NodeId, NodeId) {
        let mut tree = Tree::default();
        let sim = tree.types().simulation();
        let zone = tree.types().zone();
        let model = tree.types().model();
        let root = tree
            .add_session_root(NodeSpec::container("Simulation", sim), "farm.apsimx")
            .unwrap();
        let field = tree.add_child(root, NodeSpec::zone("Field", zone)).unwrap();
        let crop = tree.add_child(field, NodeSpec::leaf("Wheat", model)).unwrap();
        (tree, root, field, crop)
    }

    #[test]
    fn second_lookup_is_served_from_cache() {
        let (tree, root, _, crop) = farm();
        let mut scope = Scope::new();

        assert_eq!(scope.find_by_name(&tree, crop, "Simulation"), Some(root));
        assert_eq!(scope.find_by_name(&tree, crop, "Simulation"), Some(root));

        let stats = scope.stats();
        assert_eq!(stats.walks, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(scope.cache_len(), 1);
    }

    #[test]
    fn misses_are_cached_too() {
        let (tree, _, _, crop) = farm();
        let mut scope = Scope::new();

        assert_eq!(scope.find_by_name(&tree, crop, "Nothing"), None);
        assert_eq!(scope.find_by_name(&tree, crop, "Nothing"), None);
        assert_eq!(scope.stats().walks, 1);
    }

    #[test]
    fn disabled_cache_always_walks() {
        let (tree, _, field, _) = farm();
        let mut scope = Scope::with_settings(ScopeSettings {
            cache: false,
            ..ScopeSettings::default()
        });

        scope.find_all(&tree, field, None);
        scope.find_all(&tree, field, None);
        assert_eq!(scope.stats().walks, 2);
        assert_eq!(scope.stats().hits, 0);
        assert_eq!(scope.cache_len(), 0);
    }

    #[test]
    fn foreign_handles_find_nothing() {
        let (tree, _, _, _) = farm();
        let mut other = Tree::default();
        let model = other.types().model();
        for i in 0..10 {
            other.add_root(NodeSpec::leaf(format!("N{i}"), model));
        }
        let foreign = other.roots().last().unwrap();
        let mut scope = Scope::new();

        assert_eq!(scope.find_by_name(&tree, foreign, "N9"), None);
        assert!(scope.find_all(&tree, foreign, None).is_empty());
        assert!(matches!(
            parent_zone(&tree, foreign),
            Err(ScopeError::ForeignNode { .. })
        ));
    }

    #[test]
    fn parent_zone_found_or_reported() {
        let (tree, root, field, crop) = farm();

        assert_eq!(parent_zone(&tree, crop), Ok(field));
        assert_eq!(
            parent_zone(&tree, field),
            Err(ScopeError::MissingZone {
                path: ".Simulation.Field".to_string()
            })
        );
        assert!(parent_zone(&tree, root).is_err());
    }

    #[test]
    fn boundary_root_of_session_and_loose_nodes() {
        let (mut tree, root, _, crop) = farm();
        let model = tree.types().model();
        let loose = tree.add_root(NodeSpec::leaf("Loose", model));

        assert_eq!(boundary_root(&tree, crop), Some(root));
        assert_eq!(boundary_root(&tree, root), Some(root));
        assert_eq!(boundary_root(&tree, loose), None);
    }
}
