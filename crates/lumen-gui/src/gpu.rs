//! Graphics command interface
//!
//! The core never talks to a graphics API directly. Backends (for example
//! `lumen-gui-wgpu`) implement [`GraphicsBackend`] with these guarantees:
//! - staging writes are visible to every GPU command recorded after them
//! - a fence becomes signaled only once all GPU work submitted before it
//!   has completed
//! - [`GraphicsBackend::poll_fence`] never blocks

use glam::Mat4;

use crate::color::Color;
use crate::error::PipelineError;

/// Result of a non-blocking fence poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceStatus {
    /// All GPU work before the fence has finished
    Signaled,
    /// The GPU is still busy; try again next tick
    Pending,
    /// The wait itself failed (device lost or similar)
    Failed,
}

/// Opaque GPU command interface used by the frame pipeline.
pub trait GraphicsBackend {
    /// Handle to a CPU-writable staging region
    type Buffer;
    /// Handle to a completion fence
    type Fence;

    fn create_staging_buffer(&mut self, size: u64) -> Result<Self::Buffer, PipelineError>;

    fn delete_buffer(&mut self, buffer: Self::Buffer);

    /// Upload `data` into `staging` at byte `offset`.
    fn write_staging(&mut self, staging: &Self::Buffer, offset: u64, data: &[u8]);

    /// Update the projection used by subsequent draws.
    fn write_projection(&mut self, projection: Mat4);

    fn clear(&mut self, color: Color);

    /// Copy the first `size` bytes of `staging` into the persistent geometry buffer.
    fn copy_to_geometry(&mut self, staging: &Self::Buffer, size: u64);

    /// Draw `vertex_count` vertices of the geometry buffer as a triangle list.
    fn draw_triangles(&mut self, vertex_count: u32);

    /// Submit everything recorded so far and return a fence that signals
    /// once that work is complete.
    fn insert_fence(&mut self) -> Self::Fence;

    fn poll_fence(&mut self, fence: &Self::Fence) -> FenceStatus;

    fn delete_fence(&mut self, fence: Self::Fence);
}
