//! Flattener: turns a forest or an ordered list into depth-annotated rows.

use crate::domain::entities::{FlatEntry, Node, SequenceItem};
use crate::domain::forest::Forest;

/// Pre-order, depth-first listing of the forest.
///
/// Roots have depth 0; children follow their parent in sibling order.
/// Every node in the forest is emitted exactly once.
pub fn flatten(forest: &Forest) -> Vec<FlatEntry<Node>> {
    forest
        .iter()
        .map(|(depth, node)| FlatEntry {
            depth,
            item: node.clone(),
        })
        .collect()
}

/// Listing of a collection in position order, all at depth 0.
pub fn flatten_items(items: impl IntoIterator<Item = SequenceItem>) -> Vec<FlatEntry<SequenceItem>> {
    let mut items: Vec<SequenceItem> = items.into_iter().collect();
    items.sort_by_key(|i| (i.position, i.id));
    items
        .into_iter()
        .map(|item| FlatEntry { depth: 0, item })
        .collect()
}
