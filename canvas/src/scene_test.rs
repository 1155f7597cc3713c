#![allow(clippy::float_cmp)]

use super::*;
use crate::grid::{Header, MapMetaData, OccupancyGridMsg, Pose, Time};

fn sample_grid() -> OccupancyGrid {
    let msg = OccupancyGridMsg {
        header: Header::default(),
        info: MapMetaData { map_load_time: Time::default(), resolution: 1.0, width: 1, height: 1, origin: Pose::default() },
        data: vec![0],
    };
    OccupancyGrid::from_message(&msg).unwrap()
}

// =============================================================
// Nodes
// =============================================================

#[test]
fn nodes_get_distinct_ids() {
    assert_ne!(Node::empty().id, Node::empty().id);
}

#[test]
fn as_grid_only_matches_grid_nodes() {
    assert!(Node::empty().as_grid().is_none());
    let grid = sample_grid();
    assert_eq!(Node::grid(grid.clone()).as_grid(), Some(&grid));
}

// =============================================================
// Child list
// =============================================================

#[test]
fn new_container_is_empty() {
    let root = Container::new();
    assert!(root.is_empty());
    assert_eq!(root.len(), 0);
}

#[test]
fn add_child_appends_on_top() {
    let root = Container::new();
    let a = root.add_child(Node::empty());
    let b = root.add_child(Node::empty());
    assert_eq!(root.children(), vec![a, b]);
    assert_eq!(root.child_index(&b), Some(1));
}

#[test]
fn add_child_at_inserts_and_shifts() {
    let root = Container::new();
    let a = root.add_child(Node::empty());
    let b = root.add_child(Node::empty());
    let c = root.add_child_at(Node::empty(), 1).unwrap();
    assert_eq!(root.children(), vec![a, c, b]);
}

#[test]
fn add_child_at_end_is_allowed() {
    let root = Container::new();
    let a = root.add_child(Node::empty());
    let b = root.add_child_at(Node::empty(), 1).unwrap();
    assert_eq!(root.children(), vec![a, b]);
}

#[test]
fn add_child_at_past_end_is_rejected() {
    let root = Container::new();
    root.add_child(Node::empty());
    let err = root.add_child_at(Node::empty(), 3).unwrap_err();
    assert_eq!(err, SceneError::IndexOutOfBounds { index: 3, len: 1 });
    assert_eq!(root.len(), 1);
}

#[test]
fn remove_child_returns_node_and_detaches_it() {
    let root = Container::new();
    let a = root.add_child(Node::empty());
    let b = root.add_child(Node::empty());
    let removed = root.remove_child(&a).unwrap();
    assert_eq!(removed.id, a);
    assert_eq!(root.children(), vec![b]);
    assert_eq!(root.child_index(&a), None);
}

#[test]
fn remove_unknown_child_is_none() {
    let root = Container::new();
    root.add_child(Node::empty());
    assert!(root.remove_child(&Uuid::new_v4()).is_none());
    assert_eq!(root.len(), 1);
}

#[test]
fn child_borrows_node_by_id() {
    let root = Container::new();
    let id = root.add_child(Node::grid(sample_grid()));
    let node = root.child(&id).unwrap();
    assert!(node.as_grid().is_some());
}

#[test]
fn child_unknown_id_is_none() {
    let root = Container::new();
    assert!(root.child(&Uuid::new_v4()).is_none());
}

#[test]
fn with_children_visits_in_draw_order() {
    let root = Container::new();
    let a = root.add_child(Node::empty());
    let b = root.add_child(Node::grid(sample_grid()));
    let ids = root.with_children(|nodes| nodes.iter().map(|n| n.id).collect::<Vec<_>>());
    assert_eq!(ids, vec![a, b]);
}

// =============================================================
// Shared handles
// =============================================================

#[test]
fn clones_share_state() {
    let root = Container::new();
    let other = root.clone();
    other.add_child(Node::empty());
    assert_eq!(root.len(), 1);
    assert!(root.ptr_eq(&other));
}

#[test]
fn separate_containers_are_not_ptr_eq() {
    assert!(!Container::new().ptr_eq(&Container::new()));
}

// =============================================================
// Transform
// =============================================================

#[test]
fn default_camera_is_identity() {
    assert_eq!(Container::new().camera(), Camera::default());
}

#[test]
fn set_position_and_scale_update_camera() {
    let root = Container::new();
    root.set_position(30.0, -10.0);
    root.set_scale(2.0, 3.0);
    let cam = root.camera();
    assert_eq!(cam, Camera { x: 30.0, y: -10.0, scale_x: 2.0, scale_y: 3.0 });
}

#[test]
fn set_camera_replaces_transform() {
    let root = Container::new();
    let cam = Camera { x: 1.0, y: 2.0, scale_x: 0.5, scale_y: 0.5 };
    root.set_camera(cam);
    assert_eq!(root.camera(), cam);
}
