//! Turn a validated [`ModelConfig`] into a [`Tree`].

use crate::config::schema::{ModelConfig, NodeDefinition, TypeDefinition};
use crate::model::{NodeId, NodeSpec, Tree, TreeError, TypeRegistry};
use std::collections::VecDeque;

/// Build the tree described by `config`. Returns the tree and its root.
pub fn build_tree(config: &ModelConfig) -> Result<(Tree, NodeId), TreeError> {
    let types = register_types(&config.types)?;
    let mut tree = Tree::new(types);

    let root_spec = node_spec(&tree, &config.root)?;
    let root = match &config.root.session {
        Some(session) => tree.add_session_root(root_spec, session.as_str())?,
        None => tree.add_root(root_spec),
    };

    let mut pending: VecDeque<(NodeId, &NodeDefinition)> = config
        .root
        .children
        .iter()
        .map(|child| (root, child))
        .collect();

    while let Some((parent, definition)) = pending.pop_front() {
        let spec = node_spec(&tree, definition)?;
        let id = tree.add_child(parent, spec)?;
        pending.extend(definition.children.iter().map(|child| (id, child)));
    }

    tracing::debug!(nodes = tree.len(), types = tree.types().len(), "built model tree");
    Ok((tree, root))
}

/// Register declared types, allowing them to appear before their supertypes.
fn register_types(definitions: &[TypeDefinition]) -> Result<TypeRegistry, TreeError> {
    let mut registry = TypeRegistry::new();
    let mut remaining: Vec<&TypeDefinition> = definitions.iter().collect();

    while !remaining.is_empty() {
        let before = remaining.len();
        let mut deferred = Vec::new();

        for definition in remaining {
            let ready = definition
                .extends
                .iter()
                .all(|parent| registry.lookup(parent).is_some());
            if ready {
                let extends: Vec<&str> = definition.extends.iter().map(String::as_str).collect();
                registry.register(&definition.name, &extends)?;
            } else {
                deferred.push(definition);
            }
        }

        if deferred.len() == before {
            // No progress: report the first supertype nobody declares.
            let missing = deferred
                .iter()
                .flat_map(|definition| definition.extends.iter())
                .find(|parent| registry.lookup(parent).is_none())
                .cloned()
                .unwrap_or_default();
            return Err(TreeError::UnknownType { name: missing });
        }
        remaining = deferred;
    }

    Ok(registry)
}

fn node_spec(tree: &Tree, definition: &NodeDefinition) -> Result<NodeSpec, TreeError> {
    let types = tree.types();
    let ty = types.require(&definition.ty)?;

    let zone = definition
        .zone
        .unwrap_or_else(|| types.is_assignable(types.zone(), ty));
    let container = definition.container.unwrap_or_else(|| {
        zone || !definition.children.is_empty()
            || types.is_assignable(types.model_collection(), ty)
    });

    Ok(NodeSpec {
        name: definition.name.clone(),
        ty,
        container,
        zone,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_from_str;
    use crate::model::ModelTree;

    #[test]
    fn builds_flags_from_types() {
        let config = load_from_str(
            r#"
[root]
name = "Simulation"
type = "Simulation"
session = "demo.apsimx"

[[root.children]]
name = "Field"
type = "Zone"

[[root.children.children]]
name = "Soil"
type = "Soil"

[[root.children]]
name = "Clock"

[[types]]
name = "Soil"
extends = ["Water"]

[[types]]
name = "Water"
extends = ["ModelCollection"]
"#,
        )
        .unwrap();

        let (tree, root) = build_tree(&config).unwrap();
        let field = tree.find_by_path(".Simulation.Field").unwrap();
        let soil = tree.find_by_path(".Simulation.Field.Soil").unwrap();
        let clock = tree.find_by_path(".Simulation.Clock").unwrap();

        assert!(tree.is_boundary_root(root));
        assert!(tree.is_zone(field) && tree.is_container(field));
        assert!(tree.is_container(soil) && !tree.is_zone(soil));
        assert!(!tree.is_container(clock));
        assert_eq!(tree.type_name(clock), "Model");
        assert_eq!(tree.children(root), &[field, clock]);
    }

    #[test]
    fn explicit_flags_win() {
        let config = load_from_str(
            r#"
[root]
name = "Loose"
type = "Zone"
zone = false
container = true
"#,
        )
        .unwrap();

        let (tree, root) = build_tree(&config).unwrap();
        assert!(!tree.is_zone(root));
        assert!(!tree.is_boundary_root(root));
        assert_eq!(tree.owning_root_identity(root), None);
    }

    #[test]
    fn unknown_types_are_reported() {
        let config = load_from_str(
            r#"
[root]
name = "Simulation"
type = "Missing"
"#,
        )
        .unwrap();
        assert_eq!(
            build_tree(&config).unwrap_err(),
            TreeError::UnknownType {
                name: "Missing".to_string()
            }
        );

        let config = load_from_str(
            r#"
[[types]]
name = "A"
extends = ["B"]

[[types]]
name = "B"
extends = ["A"]

[root]
name = "Simulation"
"#,
        )
        .unwrap();
        assert!(matches!(
            build_tree(&config),
            Err(TreeError::UnknownType { .. })
        ));
    }
}
