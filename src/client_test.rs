#![allow(clippy::float_cmp)]

use std::cell::Cell;

use canvas::scene::NodeKind;
use frames::{Compression, Frame, Op};
use futures::channel::mpsc::UnboundedReceiver;
use serde_json::json;

use super::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn drain(rx: &mut UnboundedReceiver<Frame>) -> Vec<Frame> {
    let mut out = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        out.push(frame);
    }
    out
}

fn grid_msg(width: u32, height: u32, cells: &[i8]) -> Value {
    json!({
        "header": { "seq": 1, "frame_id": "map" },
        "info": {
            "resolution": 0.05,
            "width": width,
            "height": height,
            "origin": {
                "position": { "x": -1.0, "y": -2.0, "z": 0.0 },
                "orientation": { "x": 0.0, "y": 0.0, "z": 0.0, "w": 1.0 }
            }
        },
        "data": cells,
    })
}

fn publish(ros: &Ros, msg: Value) -> usize {
    ros.handle_frame(&Frame::publish("/map", msg))
}

fn change_counter(client: &OccupancyGridClient) -> Rc<Cell<usize>> {
    let count = Rc::new(Cell::new(0));
    let c = Rc::clone(&count);
    client.on(ClientEvent::Change, move |_| c.set(c.get() + 1));
    count
}

fn grid_nodes(root: &Container) -> usize {
    root.with_children(|children| children.iter().filter(|n| n.as_grid().is_some()).count())
}

// =============================================================
// Construction
// =============================================================

#[test]
fn construction_attaches_placeholder_and_subscribes() {
    init_tracing();
    let (ros, mut rx) = Ros::new();
    let client = OccupancyGridClient::new(&ros, ClientOptions::default()).unwrap();

    assert_eq!(client.root().len(), 1);
    let id = client.current_grid().unwrap();
    assert_eq!(client.root().child(&id).unwrap().kind, NodeKind::Empty);
    assert!(client.is_subscribed());

    let sent = drain(&mut rx);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].op, Op::Subscribe);
    assert_eq!(sent[0].topic.as_deref(), Some("/map"));
    assert_eq!(sent[0].msg_type.as_deref(), Some(OCCUPANCY_GRID_TYPE));
    assert_eq!(sent[0].compression, Some(Compression::None));
}

#[test]
fn options_pick_topic_and_compression() {
    let (ros, mut rx) = Ros::new();
    let options = ClientOptions::default().with_topic("/slam_map").with_compression(Compression::Png);
    let client = OccupancyGridClient::new(&ros, options).unwrap();

    assert_eq!(client.topic().name(), "/slam_map");
    let sent = drain(&mut rx);
    assert_eq!(sent[0].topic.as_deref(), Some("/slam_map"));
    assert_eq!(sent[0].compression, Some(Compression::Png));
}

#[test]
fn png_compressed_map_is_applied() {
    init_tracing();
    let (ros, _rx) = Ros::new();
    let client = OccupancyGridClient::new(&ros, ClientOptions::default().with_compression(Compression::Png)).unwrap();
    let changes = change_counter(&client);

    let packed = frames::pack_png(&Frame::publish("/map", grid_msg(2, 1, &[0, 100]))).unwrap();
    let text = frames::encode_json(&Frame { id: Some("png:1".to_owned()), ..packed }).unwrap();
    assert_eq!(ros.handle_text(&text).unwrap(), 1);

    assert_eq!(changes.get(), 1);
    let id = client.current_grid().unwrap();
    let node = client.root().child(&id).unwrap();
    assert_eq!(node.as_grid().unwrap().width(), 2);
}

#[test]
fn detach_tolerates_node_removed_by_host() {
    let root = Container::new();
    let mut display = MapDisplay::new(root.clone());
    root.remove_child(&display.current().unwrap());
    display.detach();
    assert_eq!(display.current(), None);
    assert!(root.is_empty());
}

#[test]
fn closed_connection_fails_and_removes_placeholder() {
    let (ros, rx) = Ros::new();
    drop(rx);
    let root = Container::new();
    let err = OccupancyGridClient::with_root(&ros, ClientOptions::default(), root.clone()).unwrap_err();
    assert!(matches!(err, ClientError::Ros(RosError::Disconnected)));
    assert!(root.is_empty());
}

#[test]
fn no_change_before_first_message() {
    let (ros, _rx) = Ros::new();
    let client = OccupancyGridClient::new(&ros, ClientOptions::default()).unwrap();
    let changes = change_counter(&client);
    assert_eq!(changes.get(), 0);
    assert_eq!(grid_nodes(client.root()), 0);
}

// =============================================================
// Swapping
// =============================================================

#[test]
fn first_message_replaces_placeholder_with_grid() {
    init_tracing();
    let (ros, _rx) = Ros::new();
    let client = OccupancyGridClient::new(&ros, ClientOptions::default()).unwrap();
    let placeholder = client.current_grid().unwrap();

    assert_eq!(publish(&ros, grid_msg(2, 2, &[0, 100, -1, 0])), 1);

    let id = client.current_grid().unwrap();
    assert_ne!(id, placeholder);
    assert_eq!(client.root().len(), 1);
    let node = client.root().child(&id).unwrap();
    let grid = node.as_grid().unwrap();
    assert_eq!((grid.width(), grid.height()), (2, 2));
    assert_eq!(grid.frame_id(), "map");
    assert!((grid.x() - -1.0).abs() < 1e-9);
    // -(origin.y + height * resolution) = -(-2.0 + 0.1)
    assert!((grid.y() - 1.9).abs() < 1e-9);
}

#[test]
fn swap_keeps_stacking_index() {
    let (ros, _rx) = Ros::new();
    let root = Container::new();
    let below = root.add_child(Node::empty());
    let client = OccupancyGridClient::with_root(&ros, ClientOptions::default().with_continuous(true), root.clone())
        .unwrap();
    let above = root.add_child(Node::empty());

    publish(&ros, grid_msg(1, 1, &[0]));
    assert_eq!(root.children(), vec![below, client.current_grid().unwrap(), above]);

    publish(&ros, grid_msg(1, 1, &[100]));
    assert_eq!(root.children(), vec![below, client.current_grid().unwrap(), above]);
    assert_eq!(grid_nodes(&root), 1);
}

#[test]
fn swap_appends_when_host_removed_the_node() {
    let (ros, _rx) = Ros::new();
    let root = Container::new();
    let client = OccupancyGridClient::with_root(&ros, ClientOptions::default(), root.clone()).unwrap();
    root.remove_child(&client.current_grid().unwrap());
    let other = root.add_child(Node::empty());

    publish(&ros, grid_msg(1, 1, &[0]));
    assert_eq!(root.children(), vec![other, client.current_grid().unwrap()]);
}

#[test]
fn map_display_swap_without_current_appends() {
    let root = Container::new();
    let existing = root.add_child(Node::empty());
    let mut display = MapDisplay::new(root.clone());
    display.detach();
    assert_eq!(display.current(), None);

    let msg: OccupancyGridMsg = serde_json::from_value(grid_msg(1, 1, &[0])).unwrap();
    let id = display.swap(OccupancyGrid::from_message(&msg).unwrap()).unwrap();
    assert_eq!(root.children(), vec![existing, id]);
}

// =============================================================
// Change events and continuous mode
// =============================================================

#[test]
fn one_message_emits_one_change() {
    let (ros, _rx) = Ros::new();
    let client = OccupancyGridClient::new(&ros, ClientOptions::default()).unwrap();
    let changes = change_counter(&client);
    publish(&ros, grid_msg(1, 1, &[0]));
    assert_eq!(changes.get(), 1);
}

#[test]
fn non_continuous_unsubscribes_after_first_map() {
    let (ros, mut rx) = Ros::new();
    let client = OccupancyGridClient::new(&ros, ClientOptions::default()).unwrap();
    let changes = change_counter(&client);
    let subscribe_id = drain(&mut rx)[0].id.clone().unwrap();

    publish(&ros, grid_msg(1, 1, &[0]));
    let first = client.current_grid();
    assert!(!client.is_subscribed());
    assert_eq!(drain(&mut rx), vec![Frame::unsubscribe(subscribe_id, "/map")]);

    assert_eq!(publish(&ros, grid_msg(1, 1, &[100])), 0);
    assert_eq!(changes.get(), 1);
    assert_eq!(client.current_grid(), first);
}

#[test]
fn continuous_applies_every_map() {
    let (ros, mut rx) = Ros::new();
    let client = OccupancyGridClient::new(&ros, ClientOptions::default().with_continuous(true)).unwrap();
    assert!(client.continuous());
    let changes = change_counter(&client);
    drain(&mut rx);

    let mut seen = Vec::new();
    for cell in [0, 100, -1] {
        publish(&ros, grid_msg(1, 1, &[cell]));
        seen.push(client.current_grid().unwrap());
    }
    assert_eq!(changes.get(), 3);
    seen.dedup();
    assert_eq!(seen.len(), 3);
    assert_eq!(client.root().len(), 1);
    assert!(client.is_subscribed());
    assert!(drain(&mut rx).is_empty());
}

#[test]
fn listener_observes_new_grid() {
    let (ros, _rx) = Ros::new();
    let client = OccupancyGridClient::new(&ros, ClientOptions::default()).unwrap();
    let root = client.root().clone();
    let seen = Rc::new(Cell::new(0));
    let s = Rc::clone(&seen);
    client.on(ClientEvent::Change, move |event| {
        assert_eq!(event, ClientEvent::Change);
        s.set(grid_nodes(&root));
    });

    publish(&ros, grid_msg(1, 1, &[0]));
    assert_eq!(seen.get(), 1);
}

#[test]
fn off_stops_notifications() {
    let (ros, _rx) = Ros::new();
    let client = OccupancyGridClient::new(&ros, ClientOptions::default().with_continuous(true)).unwrap();
    let count = Rc::new(Cell::new(0));
    let c = Rc::clone(&count);
    let id = client.on(ClientEvent::Change, move |_| c.set(c.get() + 1));
    publish(&ros, grid_msg(1, 1, &[0]));
    assert!(client.off(id));
    publish(&ros, grid_msg(1, 1, &[0]));
    assert_eq!(count.get(), 1);
    assert_eq!(client.events().listener_count(ClientEvent::Change), 0);
}

// =============================================================
// Malformed messages
// =============================================================

#[test]
fn size_mismatch_is_dropped_and_subscription_kept() {
    init_tracing();
    let (ros, _rx) = Ros::new();
    let client = OccupancyGridClient::new(&ros, ClientOptions::default()).unwrap();
    let changes = change_counter(&client);
    let placeholder = client.current_grid();

    publish(&ros, grid_msg(2, 2, &[0, 0, 0]));
    assert_eq!(changes.get(), 0);
    assert_eq!(client.current_grid(), placeholder);
    assert!(client.is_subscribed());

    publish(&ros, grid_msg(2, 2, &[0, 0, 0, 0]));
    assert_eq!(changes.get(), 1);
    assert!(!client.is_subscribed());
}

#[test]
fn non_grid_payload_is_dropped() {
    let (ros, _rx) = Ros::new();
    let client = OccupancyGridClient::new(&ros, ClientOptions::default()).unwrap();
    let changes = change_counter(&client);
    publish(&ros, json!("not a grid"));
    publish(&ros, json!({ "info": { "width": 1 } }));
    assert_eq!(changes.get(), 0);
    assert_eq!(grid_nodes(client.root()), 0);
    assert!(client.is_subscribed());
}

#[test]
fn zero_resolution_is_dropped() {
    let (ros, _rx) = Ros::new();
    let client = OccupancyGridClient::new(&ros, ClientOptions::default()).unwrap();
    let mut msg = grid_msg(1, 1, &[0]);
    msg["info"]["resolution"] = json!(0.0);
    publish(&ros, msg);
    assert_eq!(grid_nodes(client.root()), 0);
}

// =============================================================
// Teardown
// =============================================================

#[test]
fn drop_unsubscribes() {
    let (ros, mut rx) = Ros::new();
    let client = OccupancyGridClient::new(&ros, ClientOptions::default().with_continuous(true)).unwrap();
    let subscribe_id = drain(&mut rx)[0].id.clone().unwrap();

    drop(client);
    assert_eq!(ros.subscriber_count("/map"), 0);
    assert_eq!(drain(&mut rx), vec![Frame::unsubscribe(subscribe_id, "/map")]);
}

#[test]
fn drop_after_cancellation_sends_nothing_more() {
    let (ros, mut rx) = Ros::new();
    let client = OccupancyGridClient::new(&ros, ClientOptions::default()).unwrap();
    publish(&ros, grid_msg(1, 1, &[0]));
    drain(&mut rx);

    drop(client);
    assert!(drain(&mut rx).is_empty());
}

#[test]
fn grid_stays_in_host_root_after_drop() {
    let (ros, _rx) = Ros::new();
    let root = Container::new();
    let client = OccupancyGridClient::with_root(&ros, ClientOptions::default(), root.clone()).unwrap();
    publish(&ros, grid_msg(1, 1, &[0]));
    drop(client);
    assert_eq!(grid_nodes(&root), 1);
}

// =============================================================
// Gestures
// =============================================================

#[test]
fn pointer_drag_pans_root() {
    let (ros, _rx) = Ros::new();
    let mut client = OccupancyGridClient::new(&ros, ClientOptions::default()).unwrap();
    client.on_pointer_down(Point::new(10.0, 10.0));
    assert_eq!(client.on_pointer_move(Point::new(25.0, 5.0)), ViewChange::Panned { dx: 15.0, dy: -5.0 });
    client.on_pointer_up(Point::new(25.0, 5.0));
    assert_eq!(client.root().camera().position(), Point::new(15.0, -5.0));
    assert!(!client.gesture_state().active);
}

#[test]
fn wheel_zoom_honors_min_scale_option() {
    let (ros, _rx) = Ros::new();
    let options = ClientOptions { min_scale: 0.95, ..ClientOptions::default() };
    let mut client = OccupancyGridClient::new(&ros, options).unwrap();
    client.handle_input(InputEvent::Wheel(WheelDelta::new(0.0, -1.0)));
    assert_eq!(client.root().camera().scale_x, 0.95);
    client.on_wheel(WheelDelta::new(0.0, 1.0));
    assert!((client.root().camera().scale_x - 1.045).abs() < 1e-9);
}
