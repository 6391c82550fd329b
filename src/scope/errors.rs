use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    #[error("cannot find a parent zone for model '{path}'")]
    MissingZone { path: String },

    #[error("node {node} does not belong to this tree")]
    ForeignNode { node: String },
}
