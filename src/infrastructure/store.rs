//! Store implementations: in-memory and JSON-file backed.
//!
//! Both share the same transaction: a private working copy of the state,
//! taken while holding the store lock, swapped in on commit.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use fs4::fs_std::FileExt;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, instrument};

use crate::domain::{Collection, CollectionId, ItemId, Node, NodeId, SequenceItem};
use crate::infrastructure::traits::{
    NewItem, NewNode, Store, StoreError, StoreResult, StoreTx, Table,
};

/// Complete persisted state: the three tables plus id counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreState {
    next_node_id: u64,
    next_collection_id: u64,
    next_item_id: u64,
    nodes: BTreeMap<NodeId, Node>,
    collections: BTreeMap<CollectionId, Collection>,
    items: BTreeMap<ItemId, SequenceItem>,
}

impl StoreState {
    fn allocate(counter: &mut u64) -> u64 {
        *counter += 1;
        *counter
    }

    /// Item in `collection` holding `number`, other than `except`.
    fn number_holder(
        &self,
        collection: CollectionId,
        number: i64,
        except: Option<ItemId>,
    ) -> Option<ItemId> {
        self.items
            .values()
            .find(|i| i.collection_id == collection && i.number == number && Some(i.id) != except)
            .map(|i| i.id)
    }

    fn item_mut(&mut self, id: ItemId) -> StoreResult<&mut SequenceItem> {
        self.items.get_mut(&id).ok_or(StoreError::MissingRow {
            table: Table::Items,
            id: id.0,
        })
    }
}

struct StateTx<'a> {
    guard: MutexGuard<'a, StoreState>,
    work: StoreState,
    /// Data file to persist to before publishing, if any
    sink: Option<&'a Path>,
    /// Advisory lock on the data file, released when the handle closes
    file_lock: Option<File>,
}

impl<'a> StateTx<'a> {
    fn open(lock: &'a Mutex<StoreState>) -> StoreResult<Self> {
        let guard = lock.lock().map_err(|_| StoreError::Poisoned)?;
        let work = guard.clone();
        Ok(Self {
            guard,
            work,
            sink: None,
            file_lock: None,
        })
    }

    /// Take the cross-process lock, then reload the state from disk so that
    /// commits made by other processes since the last transaction are seen.
    fn open_file(lock: &'a Mutex<StoreState>, path: &'a Path) -> StoreResult<Self> {
        let mut guard = lock.lock().map_err(|_| StoreError::Poisoned)?;
        let file_lock = lock_data_file(path)?;
        *guard = read_state(path)?;
        let work = guard.clone();
        Ok(Self {
            guard,
            work,
            sink: Some(path),
            file_lock: Some(file_lock),
        })
    }
}

impl StoreTx for StateTx<'_> {
    fn node(&self, id: NodeId) -> Option<Node> {
        self.work.nodes.get(&id).cloned()
    }

    fn nodes(&self) -> Vec<Node> {
        self.work.nodes.values().cloned().collect()
    }

    fn children(&self, parent: Option<NodeId>) -> Vec<Node> {
        let mut children: Vec<Node> = self
            .work
            .nodes
            .values()
            .filter(|n| n.parent_id == parent)
            .cloned()
            .collect();
        children.sort_by_key(|n| (n.sibling_order, n.id));
        children
    }

    fn insert_node(&mut self, new: NewNode) -> Node {
        let id = NodeId(StoreState::allocate(&mut self.work.next_node_id));
        let node = Node {
            id,
            parent_id: new.parent_id,
            sibling_order: new.sibling_order,
            payload: new.payload,
        };
        self.work.nodes.insert(id, node.clone());
        node
    }

    fn update_node(&mut self, node: &Node) -> StoreResult<()> {
        let row = self.work.nodes.get_mut(&node.id).ok_or(StoreError::MissingRow {
            table: Table::Nodes,
            id: node.id.0,
        })?;
        *row = node.clone();
        Ok(())
    }

    fn delete_node(&mut self, id: NodeId) -> StoreResult<()> {
        self.work
            .nodes
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::MissingRow {
                table: Table::Nodes,
                id: id.0,
            })
    }

    fn collection(&self, id: CollectionId) -> Option<Collection> {
        self.work.collections.get(&id).cloned()
    }

    fn collections(&self) -> Vec<Collection> {
        self.work.collections.values().cloned().collect()
    }

    fn insert_collection(&mut self, title: String) -> Collection {
        let id = CollectionId(StoreState::allocate(&mut self.work.next_collection_id));
        let collection = Collection { id, title };
        self.work.collections.insert(id, collection.clone());
        collection
    }

    fn item(&self, id: ItemId) -> Option<SequenceItem> {
        self.work.items.get(&id).cloned()
    }

    fn items(&self, collection: CollectionId) -> Vec<SequenceItem> {
        let mut items: Vec<SequenceItem> = self
            .work
            .items
            .values()
            .filter(|i| i.collection_id == collection)
            .cloned()
            .collect();
        items.sort_by_key(|i| (i.position, i.id));
        items
    }

    fn insert_item(&mut self, new: NewItem) -> StoreResult<SequenceItem> {
        if !self.work.collections.contains_key(&new.collection_id) {
            return Err(StoreError::MissingRow {
                table: Table::Collections,
                id: new.collection_id.0,
            });
        }
        if self
            .work
            .number_holder(new.collection_id, new.number, None)
            .is_some()
        {
            return Err(StoreError::UniqueViolation {
                collection: new.collection_id,
                number: new.number,
            });
        }

        let id = ItemId(StoreState::allocate(&mut self.work.next_item_id));
        let item = SequenceItem {
            id,
            collection_id: new.collection_id,
            position: new.position,
            number: new.number,
            payload: new.payload,
        };
        self.work.items.insert(id, item.clone());
        Ok(item)
    }

    fn set_position(&mut self, id: ItemId, position: u32) -> StoreResult<()> {
        self.work.item_mut(id)?.position = position;
        Ok(())
    }

    fn set_number(&mut self, id: ItemId, number: i64) -> StoreResult<()> {
        let collection = self.work.item_mut(id)?.collection_id;
        if self.work.number_holder(collection, number, Some(id)).is_some() {
            return Err(StoreError::UniqueViolation { collection, number });
        }
        self.work.item_mut(id)?.number = number;
        Ok(())
    }

    fn delete_item(&mut self, id: ItemId) -> StoreResult<()> {
        self.work
            .items
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::MissingRow {
                table: Table::Items,
                id: id.0,
            })
    }

    fn commit(self: Box<Self>) -> StoreResult<()> {
        let StateTx {
            mut guard,
            work,
            sink,
            file_lock,
        } = *self;
        if let Some(path) = sink {
            write_state(path, &work)?;
        }
        *guard = work;
        drop(file_lock);
        Ok(())
    }
}

// ============================================================
// IMPLEMENTATIONS
// ============================================================

/// Store living in process memory only.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn begin(&self) -> StoreResult<Box<dyn StoreTx + '_>> {
        Ok(Box::new(StateTx::open(&self.state)?))
    }
}

/// Store persisted as a JSON document.
///
/// Each commit rewrites the file through a temp file in the same directory
/// followed by an atomic rename; a failed write leaves both the file and the
/// in-memory state untouched.
///
/// Transactions hold an exclusive advisory lock on `<data file>.lock` and
/// start from the file's current contents, so stores in separate processes
/// serialize against each other.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    state: Mutex<StoreState>,
}

impl FileStore {
    /// Open the data file, starting empty if it does not exist yet.
    #[instrument(level = "debug")]
    pub fn open(path: &Path) -> StoreResult<Self> {
        let state = read_state(path)?;
        debug!(
            "opened store {}: {} nodes, {} collections, {} items",
            path.display(),
            state.nodes.len(),
            state.collections.len(),
            state.items.len()
        );
        Ok(Self {
            path: path.to_path_buf(),
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Store for FileStore {
    fn begin(&self) -> StoreResult<Box<dyn StoreTx + '_>> {
        Ok(Box::new(StateTx::open_file(&self.state, &self.path)?))
    }
}

/// Sidecar lock file; the data file itself is replaced on every commit.
fn lock_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

fn lock_data_file(path: &Path) -> StoreResult<File> {
    let lock_path = lock_path(path);
    if let Some(dir) = lock_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| {
            StoreError::io(format!("create directory for {}", lock_path.display()), e)
        })?;
    }
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)
        .map_err(|e| StoreError::io(format!("open {}", lock_path.display()), e))?;
    file.lock_exclusive()
        .map_err(|e| StoreError::io(format!("lock {}", lock_path.display()), e))?;
    debug!("locked {}", lock_path.display());
    Ok(file)
}

fn read_state(path: &Path) -> StoreResult<StoreState> {
    if !path.exists() {
        return Ok(StoreState::default());
    }
    let content = fs::read_to_string(path)
        .map_err(|e| StoreError::io(format!("read {}", path.display()), e))?;
    serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

fn write_state(path: &Path, state: &StoreState) -> StoreResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let context = |action: &str| format!("{action} {}", path.display());

    fs::create_dir_all(dir).map_err(|e| StoreError::io(context("create directory for"), e))?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StoreError::io(context("stage"), e))?;
    serde_json::to_writer_pretty(&mut tmp, state)
        .map_err(|e| StoreError::io(context("serialize"), io::Error::from(e)))?;
    tmp.write_all(b"\n")
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| StoreError::io(context("flush"), e))?;
    tmp.persist(path)
        .map_err(|e| StoreError::io(context("replace"), e.error))?;

    debug!("persisted store to {}", path.display());
    Ok(())
}
