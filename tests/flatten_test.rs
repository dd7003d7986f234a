//! Tests for flattening trees through NodeService
//!
//! The listing is pre-order: a node comes before its subtree, siblings in
//! sibling order, each node exactly once with its distance from the root.

use std::collections::HashSet;

use ordtree::domain::{DeletePolicy, NodeId, Payload};
use ordtree::infrastructure::di::ServiceContainer;
use ordtree::util::testing::{init_test_setup, memory_container};

fn add(c: &ServiceContainer, parent: Option<NodeId>, title: &str) -> NodeId {
    c.nodes
        .create(parent, Payload::titled(title), None)
        .unwrap()
        .id
}

fn titles_with_depth(c: &ServiceContainer, root: Option<NodeId>) -> Vec<(usize, String)> {
    c.nodes
        .flatten(root)
        .unwrap()
        .into_iter()
        .map(|e| (e.depth, e.item.payload.title))
        .collect()
}

#[test]
fn given_forest_when_flattening_then_preorder_with_depths() {
    init_test_setup();
    let c = memory_container(DeletePolicy::Reject, true);
    let a = add(&c, None, "a");
    let a1 = add(&c, Some(a), "a1");
    add(&c, Some(a1), "a1x");
    add(&c, Some(a), "a2");
    let b = add(&c, None, "b");
    add(&c, Some(b), "b1");

    let rows = titles_with_depth(&c, None);

    let expected: Vec<(usize, String)> = [
        (0, "a"),
        (1, "a1"),
        (2, "a1x"),
        (1, "a2"),
        (0, "b"),
        (1, "b1"),
    ]
    .iter()
    .map(|(d, t)| (*d, t.to_string()))
    .collect();
    assert_eq!(rows, expected);
}

#[test]
fn given_reordered_siblings_when_flattening_then_follows_new_order() {
    let c = memory_container(DeletePolicy::Reject, true);
    let root = add(&c, None, "root");
    let first = add(&c, Some(root), "first");
    let second = add(&c, Some(root), "second");

    c.nodes.reorder_siblings(Some(root), &[second, first]).unwrap();

    let rows = titles_with_depth(&c, Some(root));
    let titles: Vec<&str> = rows.iter().map(|(_, t)| t.as_str()).collect();
    assert_eq!(titles, vec!["root", "second", "first"]);
}

#[test]
fn given_subtree_root_when_flattening_then_depths_relative_to_it() {
    let c = memory_container(DeletePolicy::Reject, true);
    let top = add(&c, None, "top");
    let mid = add(&c, Some(top), "mid");
    add(&c, Some(mid), "leaf");

    let rows = titles_with_depth(&c, Some(mid));

    assert_eq!(rows, vec![(0, "mid".to_string()), (1, "leaf".to_string())]);
}

#[test]
fn given_moved_subtree_when_flattening_then_every_node_once() {
    let c = memory_container(DeletePolicy::Reject, true);
    let mut ids = Vec::new();
    let mut parent = None;
    for depth in 0..50 {
        let id = add(&c, parent, &format!("n{depth}"));
        ids.push(id);
        parent = Some(id);
    }
    c.nodes.move_to(ids[25], None, None).unwrap();

    let flat = c.nodes.flatten(None).unwrap();

    let seen: HashSet<NodeId> = flat.iter().map(|e| e.item.id).collect();
    assert_eq!(flat.len(), 50);
    assert_eq!(seen.len(), 50);
    assert_eq!(flat.iter().map(|e| e.depth).max(), Some(24));
}

#[test]
fn given_missing_root_when_flattening_then_not_found() {
    let c = memory_container(DeletePolicy::Reject, true);

    assert!(c.nodes.flatten(Some(NodeId(3))).is_err());
}
