//! Domain-level errors (no external dependencies)

use std::fmt;

use thiserror::Error;

use crate::domain::entities::{CollectionId, ItemId, NodeId};

/// Kind of entity a lookup failed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Node,
    Item,
    Collection,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Node => write!(f, "node"),
            EntityKind::Item => write!(f, "item"),
            EntityKind::Collection => write!(f, "collection"),
        }
    }
}

/// Domain errors represent ordering rule violations.
/// None of them leave partial effects behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: u64 },

    #[error("circular reference: node {node} cannot be placed under {parent}")]
    CircularReference { node: NodeId, parent: NodeId },

    #[error("scope mismatch for {scope}: expected ids {expected:?}, got {actual:?}")]
    ScopeMismatch {
        scope: String,
        expected: Vec<u64>,
        actual: Vec<u64>,
    },

    #[error("constraint conflict: number {number} is already taken in collection {collection}")]
    ConstraintConflict {
        collection: CollectionId,
        number: i64,
    },

    #[error("node {0} has children")]
    HasChildren(NodeId),
}

impl DomainError {
    pub fn node_not_found(id: NodeId) -> Self {
        Self::NotFound {
            kind: EntityKind::Node,
            id: id.0,
        }
    }

    pub fn item_not_found(id: ItemId) -> Self {
        Self::NotFound {
            kind: EntityKind::Item,
            id: id.0,
        }
    }

    pub fn collection_not_found(id: CollectionId) -> Self {
        Self::NotFound {
            kind: EntityKind::Collection,
            id: id.0,
        }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
