//! Occupancy grid map client for a 2D canvas scene.
//!
//! The client subscribes to a `nav_msgs/OccupancyGrid` topic through a
//! bridge connection, turns each map into a grey-scale raster node in a
//! scene [`canvas::scene::Container`], and lets the user pan and zoom the
//! scene with pointer and wheel input.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`client`] | `OccupancyGridClient` and the display node bookkeeping |
//! | [`ros`] | Bridge connection handle and topic subscriptions |
//! | [`events`] | `change` listeners |
//! | [`gesture`] | Pointer and wheel handling on top of the pan/zoom views |
//! | [`config`] | Client options and `MAP_*` environment variables |
//!
//! The crate is single-threaded. Hosts pump frames between the connection
//! and their socket and forward input events; nothing here spawns tasks.

pub mod client;
pub mod config;
pub mod events;
pub mod gesture;
pub mod ros;

pub use client::{ClientError, MapDisplay, OccupancyGridClient};
pub use config::{ClientOptions, ConfigError};
pub use events::{ClientEvent, EventEmitter, ListenerId};
pub use gesture::{GestureController, GestureState, ViewChange};
pub use ros::{OCCUPANCY_GRID_TYPE, Ros, RosError, SubscriberId, Topic};
