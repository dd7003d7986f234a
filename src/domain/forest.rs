//! Arena-backed forest of nodes with children in sibling order.

use std::collections::{HashMap, HashSet, VecDeque};

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::entities::{Node, NodeId};
use crate::domain::error::{DomainError, DomainResult};

/// Tree node in the arena-based forest.
#[derive(Debug)]
pub struct ForestNode {
    pub node: Node,
    /// Index of parent node in the arena, None for roots
    pub parent: Option<Index>,
    /// Child indices, ordered by `sibling_order`
    pub children: Vec<Index>,
}

/// Arena-based forest: each root carries its ordered children.
///
/// Built from the flat node table; the arena indices are only valid for
/// this snapshot.
#[derive(Debug, Default)]
pub struct Forest {
    arena: Arena<ForestNode>,
    roots: Vec<Index>,
}

impl Forest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the whole forest. Nodes whose parent is absent from `nodes`
    /// become roots.
    #[instrument(level = "debug", skip(nodes))]
    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        let present: HashSet<NodeId> = nodes.iter().map(|n| n.id).collect();
        let (roots, by_parent) = split_roots(nodes, |n| match n.parent_id {
            Some(parent) => !present.contains(&parent),
            None => true,
        });
        let mut forest = Self::new();
        forest.grow(roots, by_parent);
        forest
    }

    /// Build the forest rooted at a single node.
    #[instrument(level = "debug", skip(nodes))]
    pub fn subtree(nodes: Vec<Node>, root: NodeId) -> DomainResult<Self> {
        if !nodes.iter().any(|n| n.id == root) {
            return Err(DomainError::node_not_found(root));
        }
        let (roots, by_parent) = split_roots(nodes, |n| n.id == root);
        let mut forest = Self::new();
        forest.grow(roots, by_parent);
        Ok(forest)
    }

    /// Breadth-first insertion so that each parent's child list ends up in
    /// sibling order. A node is inserted at most once.
    fn grow(&mut self, roots: Vec<Node>, mut by_parent: HashMap<NodeId, Vec<Node>>) {
        let mut inserted = HashSet::new();
        let mut queue: VecDeque<(Node, Option<Index>)> =
            roots.into_iter().map(|n| (n, None)).collect();

        while let Some((node, parent)) = queue.pop_front() {
            if !inserted.insert(node.id) {
                continue;
            }
            let id = node.id;
            let idx = self.insert_node(node, parent);
            if let Some(children) = by_parent.remove(&id) {
                queue.extend(children.into_iter().map(|c| (c, Some(idx))));
            }
        }
    }

    fn insert_node(&mut self, node: Node, parent: Option<Index>) -> Index {
        let idx = self.arena.insert(ForestNode {
            node,
            parent,
            children: Vec::new(),
        });
        match parent.and_then(|p| self.arena.get_mut(p)) {
            Some(parent_node) => parent_node.children.push(idx),
            None => self.roots.push(idx),
        }
        idx
    }

    pub fn get(&self, idx: Index) -> Option<&ForestNode> {
        self.arena.get(idx)
    }

    pub fn roots(&self) -> &[Index] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Pre-order walk yielding `(depth, node)`.
    pub fn iter(&self) -> PreOrderIter<'_> {
        PreOrderIter::new(self)
    }

    /// Number of levels in the deepest tree; 0 for an empty forest.
    pub fn depth(&self) -> usize {
        self.iter().map(|(depth, _)| depth + 1).max().unwrap_or(0)
    }

    /// Nodes without children, in pre-order.
    pub fn leaves(&self) -> Vec<&Node> {
        let mut leaves = Vec::new();
        let mut stack: Vec<Index> = self.roots.iter().rev().copied().collect();
        while let Some(idx) = stack.pop() {
            if let Some(entry) = self.arena.get(idx) {
                if entry.children.is_empty() {
                    leaves.push(&entry.node);
                } else {
                    stack.extend(entry.children.iter().rev());
                }
            }
        }
        leaves
    }
}

/// Group nodes into roots (sorted) and per-parent child lists (sorted).
fn split_roots(
    nodes: Vec<Node>,
    is_root: impl Fn(&Node) -> bool,
) -> (Vec<Node>, HashMap<NodeId, Vec<Node>>) {
    let mut roots = Vec::new();
    let mut by_parent: HashMap<NodeId, Vec<Node>> = HashMap::new();

    for node in nodes {
        if is_root(&node) {
            roots.push(node);
        } else if let Some(parent) = node.parent_id {
            by_parent.entry(parent).or_default().push(node);
        }
    }

    roots.sort_by_key(|n| (n.sibling_order, n.id));
    for children in by_parent.values_mut() {
        children.sort_by_key(|n| (n.sibling_order, n.id));
    }
    (roots, by_parent)
}

pub struct PreOrderIter<'a> {
    forest: &'a Forest,
    stack: Vec<(Index, usize)>,
}

impl<'a> PreOrderIter<'a> {
    fn new(forest: &'a Forest) -> Self {
        let stack = forest.roots.iter().rev().map(|&idx| (idx, 0)).collect();
        Self { forest, stack }
    }
}

impl<'a> Iterator for PreOrderIter<'a> {
    type Item = (usize, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((idx, depth)) = self.stack.pop() {
            if let Some(entry) = self.forest.arena.get(idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in entry.children.iter().rev() {
                    self.stack.push((child, depth + 1));
                }
                return Some((depth, &entry.node));
            }
        }
        None
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

    #[test]
    fn given_rows_when_building_then_children_are_ordered() {
        let forest = Forest::from_nodes(vec![
            node(1, None, 1),
            node(2, Some(1), 2),
            node(3, Some(1), 1),
        ]);
        let root = forest.get(forest.roots()[0]).unwrap();
        let ids: Vec<NodeId> = root
            .children
            .iter()
            .map(|&c| forest.get(c).unwrap().node.id)
            .collect();
        assert_eq!(ids, vec![NodeId(3), NodeId(2)]);
        assert_eq!(forest.depth(), 2);
    }

    #[test]
    fn given_subtree_root_when_building_then_only_its_descendants_are_included() {
        let nodes = vec![
            node(1, None, 1),
            node(2, Some(1), 1),
            node(3, Some(2), 1),
            node(4, None, 2),
        ];
        let forest = Forest::subtree(nodes, NodeId(2)).unwrap();
        assert_eq!(forest.len(), 2);
        let leaves: Vec<NodeId> = forest.leaves().iter().map(|n| n.id).collect();
        assert_eq!(leaves, vec![NodeId(3)]);
    }

    #[test]
    fn given_orphaned_parent_reference_when_building_then_node_is_a_root() {
        let forest = Forest::from_nodes(vec![node(5, Some(77), 1)]);
        assert_eq!(forest.roots().len(), 1);
    }

    #[test]
    fn given_unknown_subtree_root_when_building_then_not_found() {
        assert!(Forest::subtree(vec![node(1, None, 1)], NodeId(9)).is_err());
    }
}
