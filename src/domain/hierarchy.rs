//! Parent/child index over a flat set of nodes.
//!
//! Nodes reference their parent by id only; traversal is map lookup, never
//! pointer chasing. All walks use explicit work lists.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::instrument;

use crate::domain::entities::{Node, NodeId};
use crate::domain::error::{DomainError, DomainResult};

/// Read-only index of the node table.
#[derive(Debug, Default, Clone)]
pub struct Hierarchy {
    parents: HashMap<NodeId, Option<NodeId>>,
    /// Children per parent, sorted by (sibling_order, id)
    children: HashMap<Option<NodeId>, Vec<NodeId>>,
}

impl Hierarchy {
    pub fn from_nodes<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> Self {
        let mut parents = HashMap::new();
        let mut grouped: HashMap<Option<NodeId>, Vec<(u32, NodeId)>> = HashMap::new();

        for node in nodes {
            parents.insert(node.id, node.parent_id);
            grouped
                .entry(node.parent_id)
                .or_default()
                .push((node.sibling_order, node.id));
        }

        let children = grouped
            .into_iter()
            .map(|(parent, mut kids)| {
                kids.sort_unstable();
                (parent, kids.into_iter().map(|(_, id)| id).collect())
            })
            .collect();

        Self { parents, children }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.parents.contains_key(&id)
    }

    /// Ordered children of `parent` (None = roots).
    pub fn children_of(&self, parent: Option<NodeId>) -> &[NodeId] {
        self.children
            .get(&parent)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Chain from the immediate parent up to the root. Empty for roots.
    ///
    /// The walk is bounded by the node count, so a corrupted table reports
    /// `CircularReference` instead of spinning.
    #[instrument(level = "trace", skip(self))]
    pub fn ancestors(&self, id: NodeId) -> DomainResult<Vec<NodeId>> {
        let mut current = *self
            .parents
            .get(&id)
            .ok_or_else(|| DomainError::node_not_found(id))?;
        let mut chain = Vec::new();

        while let Some(parent) = current {
            if chain.len() >= self.parents.len() {
                return Err(DomainError::CircularReference { node: id, parent });
            }
            chain.push(parent);
            current = self.parents.get(&parent).copied().flatten();
        }

        Ok(chain)
    }

    /// Every node reachable below `id`, breadth first. `id` itself is excluded.
    #[instrument(level = "trace", skip(self))]
    pub fn descendants(&self, id: NodeId) -> DomainResult<Vec<NodeId>> {
        if !self.contains(id) {
            return Err(DomainError::node_not_found(id));
        }

        let mut seen = HashSet::from([id]);
        let mut queue = VecDeque::from([id]);
        let mut found = Vec::new();

        while let Some(current) = queue.pop_front() {
            for &child in self.children_of(Some(current)) {
                if seen.insert(child) {
                    found.push(child);
                    queue.push_back(child);
                }
            }
        }

        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Payload;

    fn node(id: u64, parent: Option<u64>, order: u32) -> Node {
        Node {
            id: NodeId(id),
            parent_id: parent.map(NodeId),
            sibling_order: order,
            payload: Payload::titled(format!("n{id}")),
        }
    }

    // 1
    // ├── 2
    // │   └── 4
    // └── 3
    fn sample() -> Hierarchy {
        let nodes = [
            node(1, None, 1),
            node(3, Some(1), 2),
            node(2, Some(1), 1),
            node(4, Some(2), 1),
        ];
        Hierarchy::from_nodes(&nodes)
    }

    #[test]
    fn given_unsorted_rows_when_indexing_then_children_follow_sibling_order() {
        let h = sample();
        assert_eq!(h.children_of(Some(NodeId(1))), &[NodeId(2), NodeId(3)]);
        assert_eq!(h.children_of(None), &[NodeId(1)]);
        assert!(h.children_of(Some(NodeId(4))).is_empty());
    }

    #[test]
    fn given_leaf_when_listing_ancestors_then_returns_chain_to_root() {
        let h = sample();
        assert_eq!(h.ancestors(NodeId(4)).unwrap(), vec![NodeId(2), NodeId(1)]);
        assert!(h.ancestors(NodeId(1)).unwrap().is_empty());
    }

    #[test]
    fn given_root_when_listing_descendants_then_returns_whole_subtree() {
        let h = sample();
        assert_eq!(
            h.descendants(NodeId(1)).unwrap(),
            vec![NodeId(2), NodeId(3), NodeId(4)]
        );
        assert!(h.descendants(NodeId(3)).unwrap().is_empty());
    }

    #[test]
    fn given_unknown_id_when_walking_then_not_found() {
        let h = sample();
        assert_eq!(
            h.ancestors(NodeId(99)),
            Err(DomainError::node_not_found(NodeId(99)))
        );
        assert!(h.descendants(NodeId(99)).is_err());
    }

    #[test]
    fn given_corrupted_cycle_when_listing_ancestors_then_stops_with_error() {
        let nodes = [node(1, Some(2), 1), node(2, Some(1), 1)];
        let h = Hierarchy::from_nodes(&nodes);
        assert!(matches!(
            h.ancestors(NodeId(1)),
            Err(DomainError::CircularReference { .. })
        ));
        // descendants still terminates thanks to the visited set
        assert_eq!(h.descendants(NodeId(1)).unwrap(), vec![NodeId(2)]);
    }
}
