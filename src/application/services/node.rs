//! Node store service
//!
//! Creation, moves, sibling reorders, traversal and deletion of tree nodes.
//! Every parent change passes the cycle guard before anything is written.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, instrument};

use super::{read, write};
use crate::application::{ApplicationResult, StoreResultExt};
use crate::domain::{
    ensure_acyclic_move, ensure_exact_membership, flatten, is_ancestor_of, DeletePolicy,
    DomainError, FlatEntry, Forest, Hierarchy, Node, NodeId, Payload,
};
use crate::infrastructure::traits::{NewNode, Store};

/// Service for the self-referential node tree.
pub struct NodeService {
    store: Arc<dyn Store>,
    delete_policy: DeletePolicy,
}

impl NodeService {
    /// Create a new node service.
    pub fn new(store: Arc<dyn Store>, delete_policy: DeletePolicy) -> Self {
        Self {
            store,
            delete_policy,
        }
    }

    /// Create a node under `parent_id` (None = root).
    ///
    /// Without an explicit order the node goes after its last sibling.
    #[instrument(level = "debug", skip(self, payload))]
    pub fn create(
        &self,
        parent_id: Option<NodeId>,
        payload: Payload,
        sibling_order: Option<u32>,
    ) -> ApplicationResult<Node> {
        let node = write(self.store.as_ref(), "create node", |tx| {
            if let Some(parent) = parent_id {
                if tx.node(parent).is_none() {
                    return Err(DomainError::node_not_found(parent).into());
                }
            }
            let sibling_order = sibling_order
                .unwrap_or_else(|| next_sibling_order(&tx.children(parent_id), None));
            Ok(tx.insert_node(NewNode {
                parent_id,
                sibling_order,
                payload,
            }))
        })?;
        debug!(
            "created node {} under {:?} at order {}",
            node.id, node.parent_id, node.sibling_order
        );
        Ok(node)
    }

    pub fn get(&self, id: NodeId) -> ApplicationResult<Node> {
        read(self.store.as_ref(), |tx| {
            tx.node(id)
                .ok_or_else(|| DomainError::node_not_found(id).into())
        })
    }

    /// Ordered children of `parent` (None = roots).
    pub fn children(&self, parent: Option<NodeId>) -> ApplicationResult<Vec<Node>> {
        read(self.store.as_ref(), |tx| {
            if let Some(parent) = parent {
                if tx.node(parent).is_none() {
                    return Err(DomainError::node_not_found(parent).into());
                }
            }
            Ok(tx.children(parent))
        })
    }

    /// Re-parent a node. Only the moved row changes; its subtree follows
    /// through the parent pointers.
    ///
    /// Fails with `CircularReference` if `new_parent` is the node itself or
    /// one of its descendants.
    #[instrument(level = "debug", skip(self))]
    pub fn move_to(
        &self,
        node_id: NodeId,
        new_parent: Option<NodeId>,
        sibling_order: Option<u32>,
    ) -> ApplicationResult<Node> {
        let node = write(self.store.as_ref(), "move node", |tx| {
            let mut node = tx
                .node(node_id)
                .ok_or_else(|| DomainError::node_not_found(node_id))?;
            let hierarchy = Hierarchy::from_nodes(&tx.nodes());
            ensure_acyclic_move(&hierarchy, node_id, new_parent)?;

            node.sibling_order = match sibling_order {
                Some(order) => order,
                None => next_sibling_order(&tx.children(new_parent), Some(node_id)),
            };
            node.parent_id = new_parent;
            tx.update_node(&node).with_store_context("move node")?;
            Ok(node)
        })?;
        debug!(
            "moved node {} under {:?} at order {}",
            node.id, node.parent_id, node.sibling_order
        );
        Ok(node)
    }

    /// Assign `sibling_order` 1..=n following `ordered_ids`.
    ///
    /// `ordered_ids` must be exactly the current children of `parent`.
    #[instrument(level = "debug", skip(self))]
    pub fn reorder_siblings(
        &self,
        parent: Option<NodeId>,
        ordered_ids: &[NodeId],
    ) -> ApplicationResult<Vec<Node>> {
        write(self.store.as_ref(), "reorder siblings", |tx| {
            if let Some(parent) = parent {
                if tx.node(parent).is_none() {
                    return Err(DomainError::node_not_found(parent).into());
                }
            }
            let children = tx.children(parent);
            let current: Vec<u64> = children.iter().map(|n| n.id.0).collect();
            let requested: Vec<u64> = ordered_ids.iter().map(|id| id.0).collect();
            ensure_exact_membership(sibling_scope(parent), &current, &requested)?;

            let mut by_id: HashMap<NodeId, Node> =
                children.into_iter().map(|n| (n.id, n)).collect();
            let mut reordered = Vec::with_capacity(ordered_ids.len());
            for (index, id) in ordered_ids.iter().enumerate() {
                let mut node = by_id
                    .remove(id)
                    .ok_or_else(|| DomainError::node_not_found(*id))?;
                node.sibling_order = index as u32 + 1;
                tx.update_node(&node).with_store_context("reorder siblings")?;
                reordered.push(node);
            }
            Ok(reordered)
        })
    }

    /// Chain from the immediate parent up to the root.
    pub fn ancestors(&self, id: NodeId) -> ApplicationResult<Vec<Node>> {
        read(self.store.as_ref(), |tx| {
            let nodes = tx.nodes();
            let chain = Hierarchy::from_nodes(&nodes).ancestors(id)?;
            let mut by_id: HashMap<NodeId, Node> = nodes.into_iter().map(|n| (n.id, n)).collect();
            Ok(chain.iter().filter_map(|a| by_id.remove(a)).collect())
        })
    }

    /// Ids of every node below `id`.
    pub fn descendants(&self, id: NodeId) -> ApplicationResult<Vec<NodeId>> {
        read(self.store.as_ref(), |tx| {
            Ok(Hierarchy::from_nodes(&tx.nodes()).descendants(id)?)
        })
    }

    /// True if `candidate` is `node` or one of its descendants.
    pub fn is_ancestor_of(&self, node: NodeId, candidate: NodeId) -> ApplicationResult<bool> {
        read(self.store.as_ref(), |tx| {
            let hierarchy = Hierarchy::from_nodes(&tx.nodes());
            if !hierarchy.contains(candidate) {
                return Err(DomainError::node_not_found(candidate).into());
            }
            Ok(is_ancestor_of(&hierarchy, node, candidate)?)
        })
    }

    /// Delete a node according to the configured policy.
    ///
    /// Returns the removed ids, the node itself first.
    #[instrument(level = "debug", skip(self))]
    pub fn delete(&self, id: NodeId) -> ApplicationResult<Vec<NodeId>> {
        let removed = write(self.store.as_ref(), "delete node", |tx| {
            let below = Hierarchy::from_nodes(&tx.nodes()).descendants(id)?;
            if !below.is_empty() && self.delete_policy == DeletePolicy::Reject {
                return Err(DomainError::HasChildren(id).into());
            }
            for &descendant in below.iter().rev() {
                tx.delete_node(descendant).with_store_context("delete node")?;
            }
            tx.delete_node(id).with_store_context("delete node")?;

            let mut removed = Vec::with_capacity(below.len() + 1);
            removed.push(id);
            removed.extend(below);
            Ok(removed)
        })?;
        debug!("deleted {} node(s) starting at {}", removed.len(), id);
        Ok(removed)
    }

    /// Every node, arranged under its roots.
    pub fn forest(&self) -> ApplicationResult<Forest> {
        read(self.store.as_ref(), |tx| Ok(Forest::from_nodes(tx.nodes())))
    }

    /// The tree rooted at `root`.
    pub fn subtree(&self, root: NodeId) -> ApplicationResult<Forest> {
        read(self.store.as_ref(), |tx| Ok(Forest::subtree(tx.nodes(), root)?))
    }

    /// Depth-annotated pre-order listing of the whole forest or one subtree.
    pub fn flatten(&self, root: Option<NodeId>) -> ApplicationResult<Vec<FlatEntry<Node>>> {
        let forest = match root {
            Some(root) => self.subtree(root)?,
            None => self.forest()?,
        };
        Ok(flatten(&forest))
    }
}

/// One past the highest sibling order, ignoring `moving` itself; 1 if none.
fn next_sibling_order(siblings: &[Node], moving: Option<NodeId>) -> u32 {
    siblings
        .iter()
        .filter(|n| Some(n.id) != moving)
        .map(|n| n.sibling_order)
        .max()
        .unwrap_or(0)
        .saturating_add(1)
}

fn sibling_scope(parent: Option<NodeId>) -> String {
    match parent {
        Some(parent) => format!("children of node {parent}"),
        None => "root nodes".to_string(),
    }
}
