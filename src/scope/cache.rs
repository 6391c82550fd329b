//! Memoized scope lookups.
//!
//! Results are keyed by the session they belong to, the requesting node's
//! path, the lookup mode and the query. Entries never go stale on their own:
//! whoever adds, removes, moves or renames nodes must call
//! [`ScopeCache::clear`] before trusting further lookups. When the cache
//! reaches its capacity it is cleared and refilled on demand.

use crate::model::{ModelTree, RootId};
use crate::scope::query::{Query, QueryKey};
use serde::Deserialize;
use std::collections::HashMap;

pub const DEFAULT_MAX_CACHE_ENTRIES: usize = 4096;

/// Whether a lookup wants the nearest match or every match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchMode {
    Single,
    Many,
}

impl MatchMode {
    pub fn first_only(self) -> bool {
        matches!(self, MatchMode::Single)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    root: RootId,
    path: String,
    mode: MatchMode,
    query: Option<QueryKey>,
}

/// Cache behaviour, usually read from the `[scope]` table of a model file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScopeSettings {
    /// Set to false to recompute every lookup.
    pub cache: bool,
    pub max_cache_entries: usize,
}

impl Default for ScopeSettings {
    fn default() -> Self {
        Self {
            cache: true,
            max_cache_entries: DEFAULT_MAX_CACHE_ENTRIES,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScopeCache<N> {
    entries: HashMap<CacheKey, Vec<N>>,
    settings: ScopeSettings,
}

impl<N: Copy> Default for ScopeCache<N> {
    fn default() -> Self {
        Self::new(ScopeSettings::default())
    }
}

impl<N: Copy> ScopeCache<N> {
    pub fn new(settings: ScopeSettings) -> Self {
        Self {
            entries: HashMap::new(),
            settings,
        }
    }

    pub fn settings(&self) -> ScopeSettings {
        self.settings
    }

    /// Key for a lookup, or `None` if the result must not be cached.
    ///
    /// Nodes outside any session are never cached.
    pub fn key_for<T>(
        &self,
        tree: &T,
        node: N,
        query: &Query,
        mode: MatchMode,
    ) -> Option<CacheKey>
    where
        T: ModelTree<NodeRef = N>,
    {
        if !self.settings.cache || self.settings.max_cache_entries == 0 {
            return None;
        }
        let root = tree.owning_root_identity(node)?;
        Some(CacheKey {
            root,
            path: tree.path(node),
            mode,
            query: query.cache_key(),
        })
    }

    pub fn get(&self, key: &CacheKey) -> Option<Vec<N>> {
        self.entries.get(key).cloned()
    }

    /// Store `matches` under `key`, replacing any previous entry.
    pub fn put(&mut self, key: CacheKey, matches: Vec<N>) {
        // Full: drop everything and refill on demand.
        if self.entries.len() >= self.settings.max_cache_entries && !self.entries.contains_key(&key)
        {
            tracing::debug!(entries = self.entries.len(), "scope cache full, evicting all");
            self.entries.clear();
        }
        self.entries.insert(key, matches);
    }

    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            tracing::debug!(entries = self.entries.len(), "scope cache cleared");
        }
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeId, NodeSpec, Tree};

    fn session_tree() -> (Tree, NodeId, NodeId) {
        let mut tree = Tree::default();
        let sim = tree.types().simulation();
        let model = tree.types().model();
        let root = tree
            .add_session_root(NodeSpec::container("Simulation", sim), "a.apsimx")
            .unwrap();
        let leaf = tree.add_child(root, NodeSpec::leaf("Clock", model)).unwrap();
        (tree, root, leaf)
    }

    #[test]
    fn keys_distinguish_mode_path_and_query() {
        let (tree, root, leaf) = session_tree();
        let cache: ScopeCache<NodeId> = ScopeCache::default();
        let query = Query::name("Clock");

        let single = cache.key_for(&tree, leaf, &query, MatchMode::Single);
        let many = cache.key_for(&tree, leaf, &query, MatchMode::Many);
        let other_path = cache.key_for(&tree, root, &query, MatchMode::Single);
        let wildcard = cache.key_for(&tree, leaf, &Query::Any, MatchMode::Single);

        assert!(single.is_some());
        assert_ne!(single, many);
        assert_ne!(single, other_path);
        assert_ne!(single, wildcard);
        assert_eq!(single, cache.key_for(&tree, leaf, &query, MatchMode::Single));
    }

    #[test]
    fn free_floating_nodes_are_not_cached() {
        let mut tree = Tree::default();
        let model = tree.types().model();
        let loose = tree.add_root(NodeSpec::leaf("Loose", model));
        let cache: ScopeCache<NodeId> = ScopeCache::default();

        assert_eq!(cache.key_for(&tree, loose, &Query::Any, MatchMode::Many), None);
    }

    #[test]
    fn disabled_cache_yields_no_keys() {
        let (tree, _, leaf) = session_tree();
        let cache: ScopeCache<NodeId> = ScopeCache::new(ScopeSettings {
            cache: false,
            ..ScopeSettings::default()
        });

        assert_eq!(cache.key_for(&tree, leaf, &Query::Any, MatchMode::Many), None);
    }

    #[test]
    fn put_overwrites_and_clear_drops() {
        let (tree, root, leaf) = session_tree();
        let mut cache: ScopeCache<NodeId> = ScopeCache::default();
        let key = cache
            .key_for(&tree, leaf, &Query::Any, MatchMode::Many)
            .unwrap();

        cache.put(key.clone(), vec![leaf]);
        cache.put(key.clone(), vec![leaf, root]);
        assert_eq!(cache.get(&key), Some(vec![leaf, root]));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get(&key), None);
    }

    #[test]
    fn capacity_evicts_everything() {
        let (tree, root, leaf) = session_tree();
        let mut cache: ScopeCache<NodeId> = ScopeCache::new(ScopeSettings {
            cache: true,
            max_cache_entries: 2,
        });
        let a = cache.key_for(&tree, leaf, &Query::Any, MatchMode::Many).unwrap();
        let b = cache.key_for(&tree, root, &Query::Any, MatchMode::Many).unwrap();
        let c = cache
            .key_for(&tree, root, &Query::Any, MatchMode::Single)
            .unwrap();

        cache.put(a.clone(), vec![leaf]);
        cache.put(b.clone(), vec![root]);
        cache.put(b.clone(), vec![root, leaf]);
        assert_eq!(cache.len(), 2);

        cache.put(c.clone(), vec![root]);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&a), None);
        assert_eq!(cache.get(&c), Some(vec![root]));
    }
}
