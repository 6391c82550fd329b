pub mod builder;
pub mod loader;
pub mod schema;

pub use builder::build_tree;
pub use loader::{load_from_path, load_from_str, load_model, ConfigError, LoadedModel};
pub use schema::{
    Metadata, ModelConfig, NodeDefinition, TypeDefinition, ValidationError, ValidationIssue,
};
