//! Occupancy grid map client.
//!
//! DESIGN
//! ======
//! [`OccupancyGridClient`] subscribes to one grid topic and keeps exactly one
//! grid node attached to a scene [`Container`]. Each decoded message replaces
//! the node at the same stacking index, then listeners are told through a
//! [`ClientEvent::Change`]. A non-continuous client cancels its subscription
//! after the first applied map.
//!
//! The subscription callback only holds a weak reference to the display, so
//! dropping the client frees the scene bookkeeping even if the connection
//! outlives it. Drop also unsubscribes.

#[cfg(test)]
#[path = "client_test.rs"]
mod client_test;

use std::cell::RefCell;
use std::ops::ControlFlow;
use std::rc::{Rc, Weak};

use canvas::camera::Point;
use canvas::grid::{GridError, OccupancyGrid, OccupancyGridMsg};
use canvas::input::{InputEvent, WheelDelta};
use canvas::scene::{Container, Node, NodeId, SceneError};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{ClientOptions, ConfigError};
use crate::events::{ClientEvent, EventEmitter, ListenerId};
use crate::gesture::{GestureController, GestureState, ViewChange};
use crate::ros::{OCCUPANCY_GRID_TYPE, Ros, RosError, Topic};

/// Error returned when constructing a client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Ros(#[from] RosError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Reasons an inbound message is dropped without touching the scene.
#[derive(Debug, thiserror::Error)]
enum MessageError {
    #[error("malformed occupancy grid: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Tracks the one node the client owns in the scene root.
#[derive(Debug)]
pub struct MapDisplay {
    root: Container,
    current: Option<NodeId>,
}

impl MapDisplay {
    /// Attach an empty placeholder to `root`.
    #[must_use]
    pub fn new(root: Container) -> Self {
        let placeholder = root.add_child(Node::empty());
        Self { root, current: Some(placeholder) }
    }

    /// Id of the attached node: the placeholder until the first map arrives.
    #[must_use]
    pub fn current(&self) -> Option<NodeId> {
        self.current
    }

    /// Replace the attached node with one drawing `grid`.
    ///
    /// The new node takes the old node's stacking index. If the old node was
    /// removed from the root by someone else, the new one is appended.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::IndexOutOfBounds`] if the captured index is no
    /// longer valid.
    pub fn swap(&mut self, grid: OccupancyGrid) -> Result<NodeId, SceneError> {
        let index = self.current.take().and_then(|id| {
            let index = self.root.child_index(&id)?;
            self.root.remove_child(&id)?;
            Some(index)
        });
        let node = Node::grid(grid);
        let id = match index {
            Some(index) => self.root.add_child_at(node, index)?,
            None => self.root.add_child(node),
        };
        self.current = Some(id);
        Ok(id)
    }

    fn detach(&mut self) {
        if let Some(id) = self.current.take() {
            if self.root.remove_child(&id).is_none() {
                debug!(node = %id, "display node already removed from root");
            }
        }
    }
}

/// Subscribes to an occupancy grid topic and renders it into a container.
#[derive(Debug)]
pub struct OccupancyGridClient {
    root: Container,
    display: Rc<RefCell<MapDisplay>>,
    events: EventEmitter,
    topic: Topic,
    gestures: GestureController,
    continuous: bool,
}

impl OccupancyGridClient {
    /// Client drawing into a fresh root container.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Ros`] if the subscribe frame cannot be sent.
    pub fn new(ros: &Ros, options: ClientOptions) -> Result<Self, ClientError> {
        Self::with_root(ros, options, Container::new())
    }

    /// Client configured from `MAP_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] for invalid variables, or
    /// [`ClientError::Ros`] if the subscribe frame cannot be sent.
    pub fn from_env(ros: &Ros) -> Result<Self, ClientError> {
        Self::new(ros, ClientOptions::from_env()?)
    }

    /// Client drawing into the host's `root` container.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Ros`] if the subscribe frame cannot be sent.
    /// The placeholder node is removed from `root` in that case.
    pub fn with_root(ros: &Ros, options: ClientOptions, root: Container) -> Result<Self, ClientError> {
        let display = Rc::new(RefCell::new(MapDisplay::new(root.clone())));
        let events = EventEmitter::new();
        let topic = Topic::new(ros, options.topic.as_str(), OCCUPANCY_GRID_TYPE).with_compression(options.compression);

        let callback = grid_callback(Rc::downgrade(&display), events.clone(), options.continuous);
        if let Err(e) = topic.subscribe(callback) {
            display.borrow_mut().detach();
            return Err(e.into());
        }

        let gestures = GestureController::new(&root, options.min_scale);
        Ok(Self { root, display, events, topic, gestures, continuous: options.continuous })
    }

    /// The scene root the map is drawn into.
    #[must_use]
    pub fn root(&self) -> &Container {
        &self.root
    }

    /// Id of the currently attached node.
    #[must_use]
    pub fn current_grid(&self) -> Option<NodeId> {
        self.display.borrow().current()
    }

    #[must_use]
    pub fn continuous(&self) -> bool {
        self.continuous
    }

    #[must_use]
    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    /// Whether new maps are still being received.
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.topic.is_subscribed()
    }

    // --- Events ---

    /// Register a listener for `event`.
    pub fn on(&self, event: ClientEvent, listener: impl FnMut(ClientEvent) + 'static) -> ListenerId {
        self.events.on(event, listener)
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn off(&self, id: ListenerId) -> bool {
        self.events.off(id)
    }

    #[must_use]
    pub fn events(&self) -> &EventEmitter {
        &self.events
    }

    // --- Input ---

    pub fn handle_input(&mut self, event: InputEvent) -> ViewChange {
        self.gestures.handle(event)
    }

    pub fn on_pointer_down(&mut self, screen_pt: Point) -> ViewChange {
        self.gestures.pointer_down(screen_pt)
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point) -> ViewChange {
        self.gestures.pointer_move(screen_pt)
    }

    pub fn on_pointer_up(&mut self, screen_pt: Point) -> ViewChange {
        self.gestures.pointer_up(screen_pt)
    }

    pub fn on_wheel(&mut self, delta: WheelDelta) -> ViewChange {
        self.gestures.wheel(delta)
    }

    #[must_use]
    pub fn gesture_state(&self) -> GestureState {
        self.gestures.state()
    }
}

impl Drop for OccupancyGridClient {
    fn drop(&mut self) {
        if let Err(e) = self.topic.unsubscribe() {
            warn!(error = %e, topic = %self.topic.name(), "could not unsubscribe map topic");
        }
    }
}

fn grid_callback(
    display: Weak<RefCell<MapDisplay>>,
    events: EventEmitter,
    continuous: bool,
) -> impl FnMut(&Value) -> ControlFlow<()> + 'static {
    move |msg| {
        let Some(display) = display.upgrade() else {
            return ControlFlow::Break(());
        };
        if let Err(e) = apply_message(&display, msg) {
            warn!(error = %e, "dropping occupancy grid message");
            return ControlFlow::Continue(());
        }
        events.emit(ClientEvent::Change);
        if continuous { ControlFlow::Continue(()) } else { ControlFlow::Break(()) }
    }
}

fn apply_message(display: &RefCell<MapDisplay>, msg: &Value) -> Result<(), MessageError> {
    let parsed = OccupancyGridMsg::deserialize(msg)?;
    let grid = OccupancyGrid::from_message(&parsed)?;
    let (width, height, resolution) = (grid.width(), grid.height(), grid.scale());
    display.borrow_mut().swap(grid)?;
    info!(width, height, resolution, frame_id = %parsed.header.frame_id, "occupancy grid updated");
    Ok(())
}
