//! Sequence manager service
//!
//! Maintains, per collection, a dense zero-based `position` order and a set
//! of pairwise distinct `number` labels. The store checks number uniqueness
//! on every single write, so any bulk relabeling first parks the affected
//! rows on negative placeholders that cannot collide with a real number.

use std::sync::Arc;

use tracing::{debug, instrument};

use super::{read, write};
use crate::application::{ApplicationResult, StoreResultExt};
use crate::domain::{
    ensure_exact_membership, flatten_items, Collection, CollectionId, DomainError, FlatEntry,
    ItemId, Payload, SequenceItem,
};
use crate::infrastructure::traits::{NewItem, Store, StoreTx};

/// Service for ordered, uniquely numbered collections.
pub struct SequenceService {
    store: Arc<dyn Store>,
    renumber_on_reorder: bool,
}

impl SequenceService {
    /// Create a new sequence service.
    ///
    /// With `renumber_on_reorder` set, `reorder` relabels numbers 1..=n to
    /// follow the new order.
    pub fn new(store: Arc<dyn Store>, renumber_on_reorder: bool) -> Self {
        Self {
            store,
            renumber_on_reorder,
        }
    }

    pub fn create_collection(&self, title: &str) -> ApplicationResult<Collection> {
        write(self.store.as_ref(), "create collection", |tx| {
            Ok(tx.insert_collection(title.to_string()))
        })
    }

    pub fn collection(&self, id: CollectionId) -> ApplicationResult<Collection> {
        read(self.store.as_ref(), |tx| {
            tx.collection(id)
                .ok_or_else(|| DomainError::collection_not_found(id).into())
        })
    }

    pub fn collections(&self) -> ApplicationResult<Vec<Collection>> {
        read(self.store.as_ref(), |tx| Ok(tx.collections()))
    }

    pub fn item(&self, id: ItemId) -> ApplicationResult<SequenceItem> {
        read(self.store.as_ref(), |tx| {
            tx.item(id)
                .ok_or_else(|| DomainError::item_not_found(id).into())
        })
    }

    /// Items of a collection in position order.
    pub fn items(&self, collection: CollectionId) -> ApplicationResult<Vec<SequenceItem>> {
        read(self.store.as_ref(), |tx| {
            require_collection(tx, collection)?;
            Ok(tx.items(collection))
        })
    }

    /// Position-ordered listing at depth 0.
    pub fn flatten(&self, collection: CollectionId) -> ApplicationResult<Vec<FlatEntry<SequenceItem>>> {
        Ok(flatten_items(self.items(collection)?))
    }

    /// Insert a new item at `position`, shifting later items back by one.
    ///
    /// A position past the end appends. Without an explicit `number` the
    /// item gets one more than the highest number in the collection.
    #[instrument(level = "debug", skip(self, payload))]
    pub fn insert_at_position(
        &self,
        collection: CollectionId,
        payload: Payload,
        position: u32,
        number: Option<u32>,
    ) -> ApplicationResult<SequenceItem> {
        let item = write(self.store.as_ref(), "insert item", |tx| {
            require_collection(tx, collection)?;
            let existing = tx.items(collection);
            let slot = (position as usize).min(existing.len());

            // Items before the slot keep their index, the rest move back one.
            // Rewriting every index also closes any gap left in the stored order.
            for (index, item) in existing.iter().enumerate() {
                let target = (if index < slot { index } else { index + 1 }) as u32;
                if item.position != target {
                    tx.set_position(item.id, target)
                        .with_store_context("shift item")?;
                }
            }

            let number = match number {
                Some(n) => i64::from(n),
                None => next_number(&existing),
            };
            tx.insert_item(NewItem {
                collection_id: collection,
                position: slot as u32,
                number,
                payload,
            })
            .with_store_context("insert item")
        })?;
        debug!(
            "inserted item {} into collection {} at position {} as number {}",
            item.id, collection, item.position, item.number
        );
        Ok(item)
    }

    /// Put the collection in the order of `ordered_ids`.
    ///
    /// Positions become 0..n. With renumbering enabled, numbers become
    /// 1..=n in two passes: first every row is parked on a distinct negative
    /// placeholder, then the final numbers are written.
    #[instrument(level = "debug", skip(self))]
    pub fn reorder(
        &self,
        collection: CollectionId,
        ordered_ids: &[ItemId],
    ) -> ApplicationResult<Vec<SequenceItem>> {
        let renumber = self.renumber_on_reorder;
        write(self.store.as_ref(), "reorder collection", |tx| {
            require_collection(tx, collection)?;
            let current_items = tx.items(collection);
            let current: Vec<u64> = current_items.iter().map(|i| i.id.0).collect();
            let requested: Vec<u64> = ordered_ids.iter().map(|id| id.0).collect();
            ensure_exact_membership(format!("collection {collection}"), &current, &requested)?;

            for (index, &id) in ordered_ids.iter().enumerate() {
                tx.set_position(id, index as u32)
                    .with_store_context("reposition item")?;
            }

            if renumber {
                let floor = placeholder_floor(&current_items);
                for (index, &id) in ordered_ids.iter().enumerate() {
                    tx.set_number(id, floor - 1 - index as i64)
                        .with_store_context("park item number")?;
                }
                for (index, &id) in ordered_ids.iter().enumerate() {
                    tx.set_number(id, index as i64 + 1)
                        .with_store_context("renumber item")?;
                }
            }

            Ok(tx.items(collection))
        })
    }

    /// Give `item_id` the number `new_number`, swapping with the current
    /// holder of that number if there is one.
    #[instrument(level = "debug", skip(self))]
    pub fn safely_update_number(
        &self,
        item_id: ItemId,
        new_number: u32,
    ) -> ApplicationResult<SequenceItem> {
        let new_number = i64::from(new_number);
        write(self.store.as_ref(), "update item number", |tx| {
            let target = tx
                .item(item_id)
                .ok_or_else(|| DomainError::item_not_found(item_id))?;
            if target.number == new_number {
                return Ok(target);
            }

            let siblings = tx.items(target.collection_id);
            let holder = siblings
                .iter()
                .find(|i| i.id != target.id && i.number == new_number);

            match holder {
                None => {
                    tx.set_number(target.id, new_number)
                        .with_store_context("renumber item")?;
                }
                Some(holder) => {
                    debug!(
                        "number {} held by item {}, swapping with item {}",
                        new_number, holder.id, target.id
                    );
                    tx.set_number(holder.id, placeholder_floor(&siblings) - 1)
                        .with_store_context("park holder number")?;
                    tx.set_number(target.id, new_number)
                        .with_store_context("renumber item")?;
                    tx.set_number(holder.id, target.number)
                        .with_store_context("renumber holder")?;
                }
            }

            tx.item(item_id)
                .ok_or_else(|| DomainError::item_not_found(item_id).into())
        })
    }

    /// Delete an item and close the gap it leaves in the positions.
    /// Numbers of the remaining items are left alone.
    #[instrument(level = "debug", skip(self))]
    pub fn remove(&self, item_id: ItemId) -> ApplicationResult<SequenceItem> {
        write(self.store.as_ref(), "remove item", |tx| {
            let item = tx
                .item(item_id)
                .ok_or_else(|| DomainError::item_not_found(item_id))?;
            tx.delete_item(item_id).with_store_context("remove item")?;

            for (index, rest) in tx.items(item.collection_id).iter().enumerate() {
                if rest.position != index as u32 {
                    tx.set_position(rest.id, index as u32)
                        .with_store_context("shift item")?;
                }
            }
            Ok(item)
        })
    }
}

fn require_collection(tx: &dyn StoreTx, collection: CollectionId) -> ApplicationResult<()> {
    match tx.collection(collection) {
        Some(_) => Ok(()),
        None => Err(DomainError::collection_not_found(collection).into()),
    }
}

/// One more than the highest number present; 1 for an empty collection.
fn next_number(items: &[SequenceItem]) -> i64 {
    items.iter().map(|i| i.number).max().unwrap_or(0).max(0) + 1
}

/// Placeholders are allocated strictly below this value, so they never meet
/// a number already in the collection.
fn placeholder_floor(items: &[SequenceItem]) -> i64 {
    items.iter().map(|i| i.number).min().unwrap_or(0).min(0)
}
