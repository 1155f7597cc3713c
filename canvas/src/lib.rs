//! Scene graph, occupancy grid raster, and pan/zoom views for the map client.
//!
//! This crate is compiled to WebAssembly and runs in the browser, but only
//! [`engine`] and [`render`] touch the DOM; everything else is plain Rust
//! and is tested natively. The host JavaScript layer forwards pointer and
//! wheel events to the map client and asks the engine to redraw.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Canvas-bound renderer entry point |
//! | [`scene`] | Root container, child nodes, and stacking order |
//! | [`grid`] | Occupancy grid message types and raster construction |
//! | [`view`] | `PanView` / `ZoomView` acting on a container's transform |
//! | [`camera`] | Points and the container transform |
//! | [`input`] | Pointer and wheel event types |
//! | [`render`] | Draws a container to a 2D context |
//! | [`consts`] | Shared numeric constants (zoom limits, gray levels) |

pub mod camera;
pub mod consts;
pub mod engine;
pub mod grid;
pub mod input;
pub mod render;
pub mod scene;
pub mod view;
