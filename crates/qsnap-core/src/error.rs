use thiserror::Error;

use crate::node::Property;

/// Failure reported by the host document when a node cannot be mutated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    #[error("Node detached from document: {0}")]
    Detached(String),

    #[error("Property {property:?} rejected value on node '{node}': {reason}")]
    Rejected {
        node: String,
        property: Property,
        reason: String,
    },

    #[error("Type mismatch for property {0:?}")]
    TypeMismatch(Property),

    #[error("Insertion failed: {0}")]
    Insertion(String),
}

pub type Result<T> = std::result::Result<T, NodeError>;
