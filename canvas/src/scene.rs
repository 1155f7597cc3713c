//! Scene graph: a root container holding an ordered list of child nodes.
//!
//! A [`Container`] is a cheap, clonable handle to shared scene state. The
//! host that renders the scene, the pan/zoom views that move it, and the map
//! client that swaps its grid node all hold handles to the same container.
//! Child order is draw order: index 0 is drawn first (bottom).
//!
//! Everything here is single-threaded (`Rc` / `RefCell`); handles are not
//! `Send`.

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use uuid::Uuid;

use crate::camera::Camera;
use crate::grid::OccupancyGrid;

/// Unique identifier for a scene node.
pub type NodeId = Uuid;

/// Error returned by container child-list operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SceneError {
    /// Insertion index is past the end of the child list.
    #[error("child index {index} out of bounds for {len} children")]
    IndexOutOfBounds { index: usize, len: usize },
}

/// What a node draws.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Draws nothing. Holds a stacking slot.
    Empty,
    /// An occupancy grid raster.
    Grid(OccupancyGrid),
}

/// A child of a container.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
}

impl Node {
    /// A node that draws nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self { id: Uuid::new_v4(), kind: NodeKind::Empty }
    }

    /// A node drawing the given grid.
    #[must_use]
    pub fn grid(grid: OccupancyGrid) -> Self {
        Self { id: Uuid::new_v4(), kind: NodeKind::Grid(grid) }
    }

    /// The grid drawn by this node, if any.
    #[must_use]
    pub fn as_grid(&self) -> Option<&OccupancyGrid> {
        match &self.kind {
            NodeKind::Grid(grid) => Some(grid),
            NodeKind::Empty => None,
        }
    }
}

#[derive(Debug, Default)]
struct ContainerInner {
    children: Vec<Node>,
    camera: Camera,
}

/// Shared handle to a scene root.
#[derive(Debug, Clone, Default)]
pub struct Container {
    inner: Rc<RefCell<ContainerInner>>,
}

impl Container {
    /// Create an empty container with an identity camera.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether two handles refer to the same container.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // --- Child list ---

    /// Append a node on top of all existing children.
    pub fn add_child(&self, node: Node) -> NodeId {
        let id = node.id;
        self.inner.borrow_mut().children.push(node);
        id
    }

    /// Insert a node at `index`, shifting later children up.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::IndexOutOfBounds`] if `index` is greater than
    /// the number of children.
    pub fn add_child_at(&self, node: Node, index: usize) -> Result<NodeId, SceneError> {
        let mut inner = self.inner.borrow_mut();
        let len = inner.children.len();
        if index > len {
            return Err(SceneError::IndexOutOfBounds { index, len });
        }
        let id = node.id;
        inner.children.insert(index, node);
        Ok(id)
    }

    /// Remove a node by id, returning it if it was a child.
    pub fn remove_child(&self, id: &NodeId) -> Option<Node> {
        let mut inner = self.inner.borrow_mut();
        let index = inner.children.iter().position(|n| n.id == *id)?;
        Some(inner.children.remove(index))
    }

    /// Stacking index of a child, if present.
    #[must_use]
    pub fn child_index(&self, id: &NodeId) -> Option<usize> {
        self.inner.borrow().children.iter().position(|n| n.id == *id)
    }

    /// Borrow a child by id.
    ///
    /// The returned guard must be dropped before the container is mutated.
    #[must_use]
    pub fn child(&self, id: &NodeId) -> Option<Ref<'_, Node>> {
        let inner = self.inner.borrow();
        let index = inner.children.iter().position(|n| n.id == *id)?;
        Some(Ref::map(inner, |inner| &inner.children[index]))
    }

    /// Child ids in draw order.
    #[must_use]
    pub fn children(&self) -> Vec<NodeId> {
        self.inner.borrow().children.iter().map(|n| n.id).collect()
    }

    /// Visit children in draw order without cloning them.
    pub fn with_children<R>(&self, f: impl FnOnce(&[Node]) -> R) -> R {
        f(&self.inner.borrow().children)
    }

    /// Number of children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().children.len()
    }

    /// Returns `true` if the container has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().children.is_empty()
    }

    // --- Transform ---

    /// Current translation and scale.
    #[must_use]
    pub fn camera(&self) -> Camera {
        self.inner.borrow().camera
    }

    /// Replace translation and scale.
    pub fn set_camera(&self, camera: Camera) {
        self.inner.borrow_mut().camera = camera;
    }

    /// Move the container to `(x, y)` in screen pixels.
    pub fn set_position(&self, x: f64, y: f64) {
        let mut inner = self.inner.borrow_mut();
        inner.camera.x = x;
        inner.camera.y = y;
    }

    /// Set the per-axis scale factors.
    pub fn set_scale(&self, scale_x: f64, scale_y: f64) {
        let mut inner = self.inner.borrow_mut();
        inner.camera.scale_x = scale_x;
        inner.camera.scale_y = scale_y;
    }
}
