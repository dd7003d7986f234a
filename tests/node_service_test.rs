//! Tests for NodeService
//!
//! Moves, sibling reorders, traversal and deletion over an in-memory store.
//! Every rejected operation must leave the tree exactly as it was.

use rstest::rstest;

use ordtree::application::ApplicationError;
use ordtree::domain::{DeletePolicy, DomainError, EntityKind, Node, NodeId, Payload};
use ordtree::infrastructure::di::ServiceContainer;
use ordtree::util::testing::{init_test_setup, memory_container};

/// Tree used by most tests:
///
/// ```text
/// T
/// ├── X
/// │   └── Z
/// └── Y
/// ```
struct Fixture {
    container: ServiceContainer,
    t: NodeId,
    x: NodeId,
    y: NodeId,
    z: NodeId,
}

fn fixture(policy: DeletePolicy) -> Fixture {
    init_test_setup();
    let container = memory_container(policy, true);
    let nodes = &container.nodes;
    let t = nodes.create(None, Payload::titled("T"), None).unwrap().id;
    let x = nodes.create(Some(t), Payload::titled("X"), None).unwrap().id;
    let y = nodes.create(Some(t), Payload::titled("Y"), None).unwrap().id;
    let z = nodes.create(Some(x), Payload::titled("Z"), None).unwrap().id;
    Fixture {
        container,
        t,
        x,
        y,
        z,
    }
}

fn snapshot(container: &ServiceContainer) -> Vec<Node> {
    container
        .nodes
        .flatten(None)
        .unwrap()
        .into_iter()
        .map(|e| e.item)
        .collect()
}

fn domain_err(err: ApplicationError) -> DomainError {
    err.domain().cloned().expect("domain error")
}

// ============================================================
// create()
// ============================================================

#[test]
fn given_siblings_when_creating_without_order_then_appends_after_last() {
    let f = fixture(DeletePolicy::Reject);

    let w = f
        .container
        .nodes
        .create(Some(f.t), Payload::titled("W"), None)
        .unwrap();

    assert_eq!(w.sibling_order, 3);
    let children: Vec<NodeId> = f
        .container
        .nodes
        .children(Some(f.t))
        .unwrap()
        .iter()
        .map(|n| n.id)
        .collect();
    assert_eq!(children, vec![f.x, f.y, w.id]);
}

#[test]
fn given_missing_parent_when_creating_then_not_found() {
    let f = fixture(DeletePolicy::Reject);

    let err = f
        .container
        .nodes
        .create(Some(NodeId(999)), Payload::titled("orphan"), None)
        .unwrap_err();

    assert_eq!(
        domain_err(err),
        DomainError::NotFound {
            kind: EntityKind::Node,
            id: 999
        }
    );
}

// ============================================================
// move_to()
// ============================================================

#[test]
fn given_node_when_moving_under_own_descendant_then_circular_reference() {
    let f = fixture(DeletePolicy::Reject);
    let before = snapshot(&f.container);

    let err = f.container.nodes.move_to(f.t, Some(f.z), None).unwrap_err();

    assert_eq!(
        domain_err(err),
        DomainError::CircularReference {
            node: f.t,
            parent: f.z
        }
    );
    assert_eq!(snapshot(&f.container), before);
}

#[test]
fn given_node_when_moving_under_itself_then_circular_reference() {
    let f = fixture(DeletePolicy::Reject);

    let err = f.container.nodes.move_to(f.x, Some(f.x), None).unwrap_err();

    assert!(matches!(
        domain_err(err),
        DomainError::CircularReference { .. }
    ));
}

#[test]
fn given_child_when_moving_to_root_then_ordered_after_existing_roots() {
    let f = fixture(DeletePolicy::Reject);
    let other = f
        .container
        .nodes
        .create(None, Payload::titled("R"), Some(5))
        .unwrap();

    let moved = f.container.nodes.move_to(f.x, None, None).unwrap();

    assert!(moved.is_root());
    assert_eq!(moved.sibling_order, other.sibling_order + 1);
    // the subtree follows the moved node
    assert_eq!(
        f.container.nodes.get(f.z).unwrap().parent_id,
        Some(f.x)
    );
    assert!(f.container.nodes.descendants(f.t).unwrap() == vec![f.y]);
}

#[test]
fn given_leaf_when_moving_to_other_branch_then_reparented() {
    let f = fixture(DeletePolicy::Reject);

    let moved = f.container.nodes.move_to(f.z, Some(f.y), None).unwrap();

    assert_eq!(moved.parent_id, Some(f.y));
    assert_eq!(moved.sibling_order, 1);
    assert!(f.container.nodes.children(Some(f.x)).unwrap().is_empty());
}

#[test]
fn given_missing_new_parent_when_moving_then_not_found() {
    let f = fixture(DeletePolicy::Reject);

    let err = f
        .container
        .nodes
        .move_to(f.z, Some(NodeId(404)), None)
        .unwrap_err();

    assert!(matches!(domain_err(err), DomainError::NotFound { id: 404, .. }));
}

// ============================================================
// is_ancestor_of()
// ============================================================

#[rstest]
#[case("T", "Z", true)]
#[case("T", "T", true)]
#[case("X", "Z", true)]
#[case("Z", "T", false)]
#[case("Y", "Z", false)]
#[case("X", "Y", false)]
fn given_pair_when_checking_ancestry_then_matches_tree(
    #[case] node: &str,
    #[case] candidate: &str,
    #[case] expected: bool,
) {
    let f = fixture(DeletePolicy::Reject);
    let id = |name: &str| match name {
        "T" => f.t,
        "X" => f.x,
        "Y" => f.y,
        _ => f.z,
    };

    let result = f
        .container
        .nodes
        .is_ancestor_of(id(node), id(candidate))
        .unwrap();

    assert_eq!(result, expected);
    // moving `node` under `candidate` is rejected exactly when ancestry holds
    let moved = f.container.nodes.move_to(id(node), Some(id(candidate)), None);
    assert_eq!(moved.is_err(), expected);
}

// ============================================================
// reorder_siblings()
// ============================================================

#[test]
fn given_children_when_reordering_then_orders_follow_list() {
    let f = fixture(DeletePolicy::Reject);

    let reordered = f
        .container
        .nodes
        .reorder_siblings(Some(f.t), &[f.y, f.x])
        .unwrap();

    let orders: Vec<(NodeId, u32)> = reordered.iter().map(|n| (n.id, n.sibling_order)).collect();
    assert_eq!(orders, vec![(f.y, 1), (f.x, 2)]);
    let children: Vec<NodeId> = f
        .container
        .nodes
        .children(Some(f.t))
        .unwrap()
        .iter()
        .map(|n| n.id)
        .collect();
    assert_eq!(children, vec![f.y, f.x]);
}

#[test]
fn given_same_list_twice_when_reordering_then_idempotent() {
    let f = fixture(DeletePolicy::Reject);

    let first = f
        .container
        .nodes
        .reorder_siblings(Some(f.t), &[f.y, f.x])
        .unwrap();
    let second = f
        .container
        .nodes
        .reorder_siblings(Some(f.t), &[f.y, f.x])
        .unwrap();

    assert_eq!(first, second);
}

#[rstest]
#[case::missing_child(vec!["X"])]
#[case::foreign_node(vec!["X", "Y", "Z"])]
#[case::duplicate(vec!["X", "X"])]
fn given_wrong_id_set_when_reordering_then_scope_mismatch(#[case] names: Vec<&str>) {
    let f = fixture(DeletePolicy::Reject);
    let before = snapshot(&f.container);
    let ids: Vec<NodeId> = names
        .iter()
        .map(|n| match *n {
            "X" => f.x,
            "Y" => f.y,
            _ => f.z,
        })
        .collect();

    let err = f
        .container
        .nodes
        .reorder_siblings(Some(f.t), &ids)
        .unwrap_err();

    assert!(matches!(domain_err(err), DomainError::ScopeMismatch { .. }));
    assert_eq!(snapshot(&f.container), before);
}

#[test]
fn given_roots_when_reordering_without_parent_then_roots_reordered() {
    let f = fixture(DeletePolicy::Reject);
    let r = f
        .container
        .nodes
        .create(None, Payload::titled("R"), None)
        .unwrap();

    f.container
        .nodes
        .reorder_siblings(None, &[r.id, f.t])
        .unwrap();

    let roots: Vec<NodeId> = f
        .container
        .nodes
        .children(None)
        .unwrap()
        .iter()
        .map(|n| n.id)
        .collect();
    assert_eq!(roots, vec![r.id, f.t]);
}

// ============================================================
// ancestors() / descendants()
// ============================================================

#[test]
fn given_deep_node_when_listing_ancestors_then_parent_first() {
    let f = fixture(DeletePolicy::Reject);

    let ancestors: Vec<NodeId> = f
        .container
        .nodes
        .ancestors(f.z)
        .unwrap()
        .iter()
        .map(|n| n.id)
        .collect();

    assert_eq!(ancestors, vec![f.x, f.t]);
    assert!(f.container.nodes.ancestors(f.t).unwrap().is_empty());
}

#[test]
fn given_root_when_listing_descendants_then_all_below_without_root() {
    let f = fixture(DeletePolicy::Reject);

    let mut below = f.container.nodes.descendants(f.t).unwrap();
    below.sort();

    let mut expected = vec![f.x, f.y, f.z];
    expected.sort();
    assert_eq!(below, expected);
    assert!(f.container.nodes.descendants(f.z).unwrap().is_empty());
}

#[test]
fn given_missing_node_when_listing_ancestors_then_not_found() {
    let f = fixture(DeletePolicy::Reject);

    let err = f.container.nodes.ancestors(NodeId(77)).unwrap_err();

    assert!(matches!(domain_err(err), DomainError::NotFound { id: 77, .. }));
}

// ============================================================
// delete()
// ============================================================

#[test]
fn given_reject_policy_when_deleting_parent_then_has_children() {
    let f = fixture(DeletePolicy::Reject);
    let before = snapshot(&f.container);

    let err = f.container.nodes.delete(f.x).unwrap_err();

    assert_eq!(domain_err(err), DomainError::HasChildren(f.x));
    assert_eq!(snapshot(&f.container), before);
}

#[test]
fn given_reject_policy_when_deleting_leaf_then_removed() {
    let f = fixture(DeletePolicy::Reject);

    let removed = f.container.nodes.delete(f.z).unwrap();

    assert_eq!(removed, vec![f.z]);
    assert!(f.container.nodes.get(f.z).is_err());
}

#[test]
fn given_cascade_policy_when_deleting_root_then_subtree_removed() {
    let f = fixture(DeletePolicy::Cascade);

    let removed = f.container.nodes.delete(f.t).unwrap();

    assert_eq!(removed.len(), 4);
    assert_eq!(removed[0], f.t);
    assert!(f.container.nodes.forest().unwrap().is_empty());
}
