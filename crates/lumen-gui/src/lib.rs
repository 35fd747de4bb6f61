//! # lumen-gui
//!
//! Graphics backend agnostic, retained-mode UI renderer core.
//!
//! The element tree is rebuilt every tick, laid out bottom-up, positioned
//! top-down and turned into flat geometry. A small ring of virtual frames
//! keeps CPU writes from racing the GPU without ever blocking the caller.
//! Concrete graphics APIs live in backend crates like `lumen-gui-wgpu`.
//!
//! ## Core Types
//!
//! - [`ElementTree`] - Structure-of-arrays element storage with layout and transform passes
//! - [`Element`] - Per-element inputs: position, alignment, extent, padding, flags
//! - [`RenderContext`] - Drives one tick from input to GPU submission
//! - [`Scene`] - Trait describing what to build and paint each tick
//!
//! ## Input & Drawing
//!
//! - [`EventQueue`] - Bounded queue of raw mouse events
//! - [`PointerState`] - Cursor and button state folded from drained events
//! - [`DrawCommandQueue`] - Ordered fills of element rectangles
//! - [`GeometryBatch`] - Vertices written to the staging region
//!
//! ## GPU Synchronization
//!
//! - [`GraphicsBackend`] - Command interface a backend implements
//! - [`FramePipeline`] - Ring of staging regions guarded by fences

mod color;
mod context;
mod draw;
mod element;
mod error;
mod event;
mod frame;
mod geometry;
mod gpu;
mod input;
mod layout;
mod primitives;
mod tree;

// Core types
pub use color::*;
pub use context::*;
pub use element::*;
pub use error::*;
pub use layout::*;
pub use primitives::*;
pub use tree::*;

// Input & Drawing
pub use draw::*;
pub use event::*;
pub use geometry::*;
pub use input::*;

// GPU Synchronization
pub use frame::*;
pub use gpu::*;
