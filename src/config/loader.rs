use crate::config::builder::build_tree;
use crate::config::schema::{ModelConfig, ValidationError};
use crate::model::{NodeId, Tree, TreeError};
use crate::scope::ScopeSettings;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
    Tree {
        path: Option<PathBuf>,
        source: TreeError,
    },
}

impl ConfigError {
    fn with_path(self, path: &Path) -> Self {
        let path = path.to_path_buf();
        match self {
            ConfigError::Io { .. } => self,
            ConfigError::Toml { path: None, source } => ConfigError::Toml {
                path: Some(path),
                source,
            },
            ConfigError::Validation { path: None, source } => ConfigError::Validation {
                path: Some(path),
                source,
            },
            ConfigError::Tree { path: None, source } => ConfigError::Tree {
                path: Some(path),
                source,
            },
            other => other,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(
                    f,
                    "failed to read model file {}: {}",
                    path.display(),
                    source
                )
            }
            ConfigError::Toml { path, source } => match path {
                Some(path) => write!(
                    f,
                    "failed to parse model TOML ({}): {}",
                    path.display(),
                    source
                ),
                None => write!(f, "failed to parse model TOML: {}", source),
            },
            ConfigError::Validation { path, source } => match path {
                Some(path) => write!(f, "invalid model ({}): {}", path.display(), source),
                None => write!(f, "invalid model: {}", source),
            },
            ConfigError::Tree { path, source } => match path {
                Some(path) => write!(f, "cannot build model tree ({}): {}", path.display(), source),
                None => write!(f, "cannot build model tree: {}", source),
            },
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
            ConfigError::Tree { source, .. } => Some(source),
        }
    }
}

/// A loaded model: its tree, root node and scope settings.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub config: ModelConfig,
    pub tree: Tree,
    pub root: NodeId,
}

impl LoadedModel {
    pub fn settings(&self) -> ScopeSettings {
        self.config.scope
    }
}

pub fn load_from_str(input: &str) -> Result<ModelConfig, ConfigError> {
    let config: ModelConfig = toml_edit::de::from_str(input)
        .map_err(|source| ConfigError::Toml { path: None, source })?;
    config
        .validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(config)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<ModelConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents).map_err(|error| error.with_path(path))
}

/// Load, validate and build the tree in one step.
pub fn load_model(path: impl AsRef<Path>) -> Result<LoadedModel, ConfigError> {
    let path = path.as_ref();
    let config = load_from_path(path)?;
    let (tree, root) = build_tree(&config)
        .map_err(|source| ConfigError::Tree { path: None, source }.with_path(path))?;
    Ok(LoadedModel { config, tree, root })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ValidationIssue;

    #[test]
    fn scope_settings_default_when_absent() {
        let config = load_from_str("[root]\nname = \"Simulation\"\n").unwrap();
        assert_eq!(config.scope, ScopeSettings::default());
        assert_eq!(config.root.ty, "Model");
    }

    #[test]
    fn scope_settings_are_read() {
        let config = load_from_str(
            r#"
[scope]
cache = false
max_cache_entries = 16

[root]
name = "Simulation"
"#,
        )
        .unwrap();
        assert!(!config.scope.cache);
        assert_eq!(config.scope.max_cache_entries, 16);
    }

    #[test]
    fn validation_collects_all_issues() {
        let err = load_from_str(
            r#"
[[types]]
name = "Soil"

[[types]]
name = "Soil"

[root]
name = "Simulation"
session = "a.apsimx"

[[root.children]]
name = ""
container = false
session = "nested"

[[root.children.children]]
name = "Inner"
"#,
        )
        .unwrap_err();

        let ConfigError::Validation { source, .. } = err else {
            panic!("expected validation error, got {err}");
        };
        assert_eq!(source.issues.len(), 4);
        assert!(source.issues.contains(&ValidationIssue::DuplicateType {
            name: "Soil".to_string()
        }));
    }

    #[test]
    fn malformed_toml_is_a_toml_error() {
        let err = load_from_str("[root\nname = ").unwrap_err();
        assert!(matches!(err, ConfigError::Toml { path: None, .. }));
    }
}
