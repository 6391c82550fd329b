//! Simscope: scope resolution for component-tree simulations
//!
//! A simulation is a tree of named, typed components. Components find their
//! collaborators by name or by type, and the answer depends on where in the
//! tree the question is asked: the nearest match in scope wins.
//!
//! # Scoping rules
//!
//! - A lookup checks the requesting node, then its whole subtree, then climbs.
//! - Climbing from an ordinary node repeats the search one level up.
//! - Climbing from a zone only sees each ancestor and its direct children, so
//!   the interior of a neighbouring zone is invisible.
//! - Nothing above the session's boundary root is ever visible.
//!
//! # Caching
//!
//! [`Scope`] memoizes lookups per session. It does not observe the tree:
//! after adding, removing, moving or renaming nodes, call
//! [`Scope::clear_cache`] before the next lookup.
//!
//! # Example
//!
//! ```no_run
//! use simscope::config::load_model;
//! use simscope::scope::Scope;
//!
//! let model = load_model("models/farm.toml").unwrap();
//! let mut scope = Scope::with_settings(model.settings());
//! let paddock = model.tree.find_by_path(".Simulation.Paddock1").unwrap();
//! let soil = model.tree.types().lookup("Soil").unwrap();
//!
//! match scope.find_by_type(&model.tree, paddock, soil) {
//!     Some(node) => println!("soil at {}", model.tree.full_path(node)),
//!     None => eprintln!("no soil in scope"),
//! }
//! ```

pub mod config;
pub mod model;
pub mod scope;

// Re-exports
pub use config::{load_from_path, load_from_str, load_model, ConfigError, LoadedModel, ModelConfig};
pub use model::{ModelTree, NodeId, NodeSpec, RootId, Tree, TreeError, TypeDescriptor, TypeRegistry};
pub use scope::{
    boundary_root, parent_zone, MatchMode, Query, Scope, ScopeError, ScopeSettings, ScopeStats,
};
