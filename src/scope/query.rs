use crate::model::{ModelTree, TypeDescriptor};

/// What a lookup is looking for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Query {
    /// Exact, case-sensitive name.
    Name(String),

    /// Any node whose runtime type is this type or a subtype of it.
    Type(TypeDescriptor),

    /// Every node.
    Any,
}

/// Part of a cache key identifying the query. Wildcards have none.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Name(String),
    Type(TypeDescriptor),
}

impl Query {
    pub fn name(name: impl Into<String>) -> Self {
        Query::Name(name.into())
    }

    /// Type query, or the wildcard when `ty` is `None`.
    pub fn of_type(ty: Option<TypeDescriptor>) -> Self {
        match ty {
            Some(ty) => Query::Type(ty),
            None => Query::Any,
        }
    }

    pub fn matches<T: ModelTree>(&self, tree: &T, node: T::NodeRef) -> bool {
        match self {
            Query::Name(name) => tree.name(node) == name.as_str(),
            Query::Type(ty) => tree.is_assignable(*ty, tree.runtime_type(node)),
            Query::Any => true,
        }
    }

    pub fn cache_key(&self) -> Option<QueryKey> {
        match self {
            Query::Name(name) => Some(QueryKey::Name(name.clone())),
            Query::Type(ty) => Some(QueryKey::Type(*ty)),
            Query::Any => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeSpec, Tree};

    #[test]
    fn name_match_is_exact() {
        let mut tree = Tree::default();
        let model = tree.types().model();
        let node = tree.add_root(NodeSpec::leaf("Clock", model));

        assert!(Query::name("Clock").matches(&tree, node));
        assert!(!Query::name("clock").matches(&tree, node));
        assert!(!Query::name("Clock ").matches(&tree, node));
    }

    #[test]
    fn type_match_is_covariant() {
        let mut tree = Tree::default();
        let zone = tree.types().zone();
        let collection = tree.types().model_collection();
        let node = tree.add_root(NodeSpec::zone("Field", zone));

        assert!(Query::Type(zone).matches(&tree, node));
        assert!(Query::Type(collection).matches(&tree, node));
        assert!(!Query::Type(tree.types().simulation()).matches(&tree, node));
    }

    #[test]
    fn wildcard_matches_everything() {
        let mut tree = Tree::default();
        let model = tree.types().model();
        let node = tree.add_root(NodeSpec::leaf("", model));

        assert!(Query::of_type(None).matches(&tree, node));
        assert_eq!(Query::Any.cache_key(), None);
    }

    #[test]
    fn name_and_type_keys_differ() {
        let registry = crate::model::TypeRegistry::new();
        let by_name = Query::name("Zone").cache_key();
        let by_type = Query::Type(registry.zone()).cache_key();
        assert_ne!(by_name, by_type);
    }
}
