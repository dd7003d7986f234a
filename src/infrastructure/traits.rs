//! Persistence boundary traits
//!
//! Services only talk to storage through these traits, so the ordering rules
//! can be exercised against an in-memory store in tests.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::domain::{
    Collection, CollectionId, ItemId, Node, NodeId, Payload, SequenceItem,
};

/// Table a row lookup failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Nodes,
    Items,
    Collections,
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Table::Nodes => write!(f, "nodes"),
            Table::Items => write!(f, "items"),
            Table::Collections => write!(f, "collections"),
        }
    }
}

/// Errors reported by a store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("unique constraint violated: number {number} in collection {collection}")]
    UniqueViolation {
        collection: CollectionId,
        number: i64,
    },

    #[error("no row {id} in {table}")]
    MissingRow { table: Table, id: u64 },

    #[error("store I/O failed: {context}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("store data is corrupt: {}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("store lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Row to insert into the node table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNode {
    pub parent_id: Option<NodeId>,
    pub sibling_order: u32,
    pub payload: Payload,
}

/// Row to insert into the item table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub collection_id: CollectionId,
    pub position: u32,
    pub number: i64,
    pub payload: Payload,
}

/// Transactional backing store.
///
/// Concurrent transactions are serialized by the store: `begin` blocks until
/// no other transaction is open.
pub trait Store: Send + Sync {
    /// Open a transaction.
    fn begin(&self) -> StoreResult<Box<dyn StoreTx + '_>>;
}

/// An open transaction.
///
/// Writes are visible only through this handle until `commit`. Dropping the
/// handle without committing discards every write.
///
/// `insert_item` and `set_number` check `(collection_id, number)` uniqueness
/// eagerly, on each single write.
pub trait StoreTx {
    fn node(&self, id: NodeId) -> Option<Node>;

    /// All nodes, ordered by id.
    fn nodes(&self) -> Vec<Node>;

    /// Children of `parent` (None = roots), ordered by sibling order then id.
    fn children(&self, parent: Option<NodeId>) -> Vec<Node>;

    fn insert_node(&mut self, new: NewNode) -> Node;

    /// Overwrite an existing node row.
    fn update_node(&mut self, node: &Node) -> StoreResult<()>;

    fn delete_node(&mut self, id: NodeId) -> StoreResult<()>;

    fn collection(&self, id: CollectionId) -> Option<Collection>;

    fn collections(&self) -> Vec<Collection>;

    fn insert_collection(&mut self, title: String) -> Collection;

    fn item(&self, id: ItemId) -> Option<SequenceItem>;

    /// Items of a collection, ordered by position then id.
    fn items(&self, collection: CollectionId) -> Vec<SequenceItem>;

    fn insert_item(&mut self, new: NewItem) -> StoreResult<SequenceItem>;

    fn set_position(&mut self, id: ItemId, position: u32) -> StoreResult<()>;

    fn set_number(&mut self, id: ItemId, number: i64) -> StoreResult<()>;

    fn delete_item(&mut self, id: ItemId) -> StoreResult<()>;

    /// Publish all writes atomically.
    fn commit(self: Box<Self>) -> StoreResult<()>;
}
