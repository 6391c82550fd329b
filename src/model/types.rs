//! Runtime type descriptors with declared supertypes.
//!
//! Type queries match covariantly: a query for `ModelCollection` matches a
//! `Zone` because `Zone` declares `ModelCollection` as a supertype. Supertypes
//! must be registered before the types that extend them, so the graph is
//! acyclic by construction.

use crate::model::errors::TreeError;
use std::collections::HashMap;
use std::fmt;

/// Handle to a type registered in a [`TypeRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeDescriptor(u32);

impl TypeDescriptor {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type#{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct TypeEntry {
    name: String,
    supertypes: Vec<TypeDescriptor>,
}

/// Built-in types every registry starts with.
pub mod builtin {
    pub const MODEL: &str = "Model";
    pub const MODEL_COLLECTION: &str = "ModelCollection";
    pub const ZONE: &str = "Zone";
    pub const SIMULATION: &str = "Simulation";
    pub const SIMULATIONS: &str = "Simulations";
}

/// Open registry of runtime types.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    entries: Vec<TypeEntry>,
    by_name: HashMap<String, TypeDescriptor>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Create a registry holding the built-in component types.
    pub fn new() -> Self {
        let mut registry = Self {
            entries: Vec::new(),
            by_name: HashMap::new(),
        };
        let model = registry.push(builtin::MODEL, Vec::new());
        let collection = registry.push(builtin::MODEL_COLLECTION, vec![model]);
        registry.push(builtin::ZONE, vec![collection]);
        registry.push(builtin::SIMULATION, vec![collection]);
        registry.push(builtin::SIMULATIONS, vec![collection]);
        registry
    }

    /// Register a new type extending the named supertypes.
    ///
    /// A type with no supertypes still derives from `Model`.
    pub fn register(&mut self, name: &str, extends: &[&str]) -> Result<TypeDescriptor, TreeError> {
        if self.by_name.contains_key(name) {
            return Err(TreeError::DuplicateType {
                name: name.to_string(),
            });
        }

        let mut supertypes = Vec::with_capacity(extends.len().max(1));
        for parent in extends {
            supertypes.push(self.require(parent)?);
        }
        if supertypes.is_empty() {
            supertypes.push(self.model());
        }

        Ok(self.push(name, supertypes))
    }

    fn push(&mut self, name: &str, supertypes: Vec<TypeDescriptor>) -> TypeDescriptor {
        let descriptor = TypeDescriptor(self.entries.len() as u32);
        self.entries.push(TypeEntry {
            name: name.to_string(),
            supertypes,
        });
        self.by_name.insert(name.to_string(), descriptor);
        descriptor
    }

    pub fn lookup(&self, name: &str) -> Option<TypeDescriptor> {
        self.by_name.get(name).copied()
    }

    /// Like [`lookup`](Self::lookup) but reports unknown names as an error.
    pub fn require(&self, name: &str) -> Result<TypeDescriptor, TreeError> {
        self.lookup(name).ok_or_else(|| TreeError::UnknownType {
            name: name.to_string(),
        })
    }

    pub fn name(&self, ty: TypeDescriptor) -> &str {
        self.entries
            .get(ty.index())
            .map(|entry| entry.name.as_str())
            .unwrap_or("<unknown>")
    }

    pub fn model(&self) -> TypeDescriptor {
        TypeDescriptor(0)
    }

    pub fn model_collection(&self) -> TypeDescriptor {
        TypeDescriptor(1)
    }

    pub fn zone(&self) -> TypeDescriptor {
        TypeDescriptor(2)
    }

    pub fn simulation(&self) -> TypeDescriptor {
        TypeDescriptor(3)
    }

    /// True if a value of type `derived` can be used where `base` is expected.
    pub fn is_assignable(&self, base: TypeDescriptor, derived: TypeDescriptor) -> bool {
        let mut pending = vec![derived];
        while let Some(ty) = pending.pop() {
            if ty == base {
                return true;
            }
            if let Some(entry) = self.entries.get(ty.index()) {
                pending.extend(entry.supertypes.iter().copied());
            }
        }
        false
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

    #[test]
    fn builtins_are_registered() {
        let registry = TypeRegistry::new();
        assert_eq!(registry.lookup("Zone"), Some(registry.zone()));
        assert_eq!(registry.name(registry.simulation()), "Simulation");
        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn assignability_is_covariant() {
        let mut registry = TypeRegistry::new();
        let soil = registry.register("Soil", &["ModelCollection"]).unwrap();
        let clock = registry.register("Clock", &[]).unwrap();

        assert!(registry.is_assignable(soil, soil));
        assert!(registry.is_assignable(registry.model_collection(), soil));
        assert!(registry.is_assignable(registry.model(), soil));
        assert!(registry.is_assignable(registry.model(), clock));
        assert!(!registry.is_assignable(soil, registry.model_collection()));
        assert!(!registry.is_assignable(registry.model_collection(), clock));
    }

    #[test]
    fn multiple_supertypes() {
        let mut registry = TypeRegistry::new();
        let uptake = registry.register("IUptake", &[]).unwrap();
        let crop = registry.register("Crop", &["ModelCollection", "IUptake"]).unwrap();

        assert!(registry.is_assignable(uptake, crop));
        assert!(registry.is_assignable(registry.model_collection(), crop));
        assert!(!registry.is_assignable(registry.zone(), crop));
    }

    #[test]
    fn duplicate_and_unknown_names_rejected() {
        let mut registry = TypeRegistry::new();
        assert!(matches!(
            registry.register("Zone", &[]),
            Err(TreeError::DuplicateType { .. })
        ));
        assert!(matches!(
            registry.register("Leaf", &["Missing"]),
            Err(TreeError::UnknownType { .. })
        ));
    }
}
