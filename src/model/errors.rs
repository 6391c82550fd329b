use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("node {index} does not belong to this tree")]
    UnknownNode { index: usize },

    #[error("cannot add children to '{path}': not a container")]
    NotAContainer { path: String },

    #[error("tree already has a boundary root at '{existing}'")]
    DuplicateBoundaryRoot { existing: String },

    #[error("boundary root '{path}' cannot be moved or detached")]
    BoundaryRootFixed { path: String },

    #[error("cannot move '{path}' underneath itself or one of its descendants")]
    Cycle { path: String },

    #[error("unknown type '{name}'")]
    UnknownType { name: String },

    #[error("type '{name}' is already registered")]
    DuplicateType { name: String },
}
