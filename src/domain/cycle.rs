//! Cycle guard: keeps every node from becoming its own ancestor.

use tracing::debug;

use crate::domain::entities::NodeId;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::hierarchy::Hierarchy;

/// True if `candidate` is `node` itself or lies anywhere below it.
///
/// Placing `node` under such a candidate would close a cycle.
pub fn is_ancestor_of(hierarchy: &Hierarchy, node: NodeId, candidate: NodeId) -> DomainResult<bool> {
    if node == candidate {
        return Ok(true);
    }
    Ok(hierarchy.descendants(node)?.contains(&candidate))
}

/// Checks a parent change before anything is written.
///
/// Moving to the root level (`None`) can never create a cycle.
pub fn ensure_acyclic_move(
    hierarchy: &Hierarchy,
    node: NodeId,
    new_parent: Option<NodeId>,
) -> DomainResult<()> {
    let Some(parent) = new_parent else {
        return Ok(());
    };
    if !hierarchy.contains(parent) {
        return Err(DomainError::node_not_found(parent));
    }
    if is_ancestor_of(hierarchy, node, parent)? {
        debug!("rejecting move of {} under its descendant {}", node, parent);
        return Err(DomainError::CircularReference { node, parent });
    }
    Ok(())
}
