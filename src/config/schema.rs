use crate::scope::ScopeSettings;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

/// A model file: engine settings, extra runtime types and the component tree.
#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub scope: ScopeSettings,
    #[serde(default)]
    pub types: Vec<TypeDefinition>,
    pub root: NodeDefinition,
}

impl ModelConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        let mut declared = HashSet::new();
        for ty in &self.types {
            if ty.name.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    node: None,
                    field: "types.name",
                });
            } else if !declared.insert(ty.name.as_str()) {
                issues.push(ValidationIssue::DuplicateType {
                    name: ty.name.clone(),
                });
            }
        }

        validate_node(&self.root, "", true, &mut issues);

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

fn validate_node(
    node: &NodeDefinition,
    parent_path: &str,
    is_root: bool,
    issues: &mut Vec<ValidationIssue>,
) {
    let path = format!("{parent_path}.{}", node.name);

    if node.name.trim().is_empty() {
        issues.push(ValidationIssue::MissingField {
            node: Some(path.clone()),
            field: "name",
        });
    }
    if node.ty.trim().is_empty() {
        issues.push(ValidationIssue::MissingField {
            node: Some(path.clone()),
            field: "type",
        });
    }
    if node.container == Some(false) && !node.children.is_empty() {
        issues.push(ValidationIssue::InvalidCombo {
            node: path.clone(),
            message: "container = false but children are declared".to_string(),
        });
    }
    if !is_root && node.session.is_some() {
        issues.push(ValidationIssue::InvalidCombo {
            node: path.clone(),
            message: "only the root node may declare a session".to_string(),
        });
    }

    for child in &node.children {
        validate_node(child, &path, false, issues);
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TypeDefinition {
    pub name: String,
    /// Supertypes; types extending nothing derive from `Model`.
    #[serde(default)]
    pub extends: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NodeDefinition {
    pub name: String,
    #[serde(rename = "type", default = "default_type")]
    pub ty: String,
    /// Defaults to true for `Zone` types.
    #[serde(default)]
    pub zone: Option<bool>,
    /// Defaults to true for zones, `ModelCollection` types and nodes with children.
    #[serde(default)]
    pub container: Option<bool>,
    /// Session identifier; marks the root as the boundary root.
    #[serde(default)]
    pub session: Option<String>,
    #[serde(default)]
    pub children: Vec<NodeDefinition>,
}

fn default_type() -> String {
    crate::model::types::builtin::MODEL.to_string()
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    MissingField {
        node: Option<String>,
        field: &'static str,
    },
    InvalidCombo {
        node: String,
        message: String,
    },
    DuplicateType {
        name: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::MissingField { node, field } => match node {
                Some(path) => write!(f, "node '{path}' missing required field '{field}'"),
                None => write!(f, "missing required field '{field}'"),
            },
            ValidationIssue::InvalidCombo { node, message } => {
                write!(f, "node '{node}' has invalid configuration: {message}")
            }
            ValidationIssue::DuplicateType { name } => {
                write!(f, "type '{name}' is declared more than once")
            }
        }
    }
}
