//! Ring of virtual frames pipelining CPU geometry writes against GPU execution
//!
//! Each virtual frame owns a staging region and, while the GPU may still read
//! that region, a completion fence. A tick only touches the frame under the
//! cursor, and only after its fence has been observed signaled. A fence that
//! is still pending makes [`FramePipeline::begin_frame`] return `Ok(false)`
//! so the caller skips the tick instead of blocking.
//!
//! Per tick: `begin_frame` -> `write`* -> `submit` -> `end_frame`.

use crate::color::Color;
use crate::error::PipelineError;
use crate::geometry::{Vertex, VERTEX_STRIDE};
use crate::gpu::{FenceStatus, GraphicsBackend};

/// Ownership state of a virtual frame's staging region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// No GPU work outstanding; the CPU may write the staging region
    Idle,
    /// A submission reads the staging region until its fence signals
    Submitted,
}

struct VirtualFrame<B: GraphicsBackend> {
    staging: B::Buffer,
    fence: Option<B::Fence>,
    submissions: u64,
}

pub struct FramePipeline<B: GraphicsBackend> {
    frames: Vec<VirtualFrame<B>>,
    cursor: usize,
    staging_size: u64,
    write_offset: u64,
    recording: bool,
    failed: bool,
}

impl<B: GraphicsBackend> FramePipeline<B> {
    /// Allocate `frame_count` virtual frames with `staging_size` bytes each.
    ///
    /// The staging regions live as long as the pipeline and are reused every
    /// time the cursor comes back around.
    pub fn new(gpu: &mut B, frame_count: usize, staging_size: u64) -> Result<Self, PipelineError> {
        if frame_count == 0 {
            return Err(PipelineError::InvalidFrameCount);
        }

        let mut frames = Vec::with_capacity(frame_count);
        for _ in 0..frame_count {
            frames.push(VirtualFrame {
                staging: gpu.create_staging_buffer(staging_size)?,
                fence: None,
                submissions: 0,
            });
        }

        log::debug!("frame pipeline ready: {frame_count} frames x {staging_size} bytes");

        Ok(Self {
            frames,
            cursor: 0,
            staging_size,
            write_offset: 0,
            recording: false,
            failed: false,
        })
    }

    /// Try to claim the frame under the cursor for this tick.
    ///
    /// Returns `Ok(true)` when the staging region may be written, `Ok(false)`
    /// when the GPU still holds it (skip the tick, nothing was touched), and
    /// `Err(SyncFailed)` when the fence wait failed. After a failure every
    /// call fails until [`reinitialize`](Self::reinitialize).
    pub fn begin_frame(&mut self, gpu: &mut B) -> Result<bool, PipelineError> {
        if self.failed {
            return Err(PipelineError::SyncFailed { frame: self.cursor });
        }
        if self.recording {
            log::warn!(
                "begin_frame on frame {} without end_frame, discarding its writes",
                self.cursor
            );
        }

        let frame = &mut self.frames[self.cursor];
        let status = frame.fence.as_ref().map(|fence| gpu.poll_fence(fence));
        if let Some(status) = status {
            match status {
                FenceStatus::Signaled => {
                    if let Some(fence) = frame.fence.take() {
                        gpu.delete_fence(fence);
                    }
                }
                FenceStatus::Pending => {
                    log::debug!("frame {} still in flight, skipping tick", self.cursor);
                    self.recording = false;
                    return Ok(false);
                }
                FenceStatus::Failed => {
                    log::error!("fence wait failed on frame {}", self.cursor);
                    self.failed = true;
                    self.recording = false;
                    return Err(PipelineError::SyncFailed { frame: self.cursor });
                }
            }
        }

        self.recording = true;
        self.write_offset = 0;
        Ok(true)
    }

    /// Append `data` to the current staging region and return its byte offset.
    pub fn write(&mut self, gpu: &mut B, data: &[u8]) -> Result<u64, PipelineError> {
        if !self.recording {
            return Err(PipelineError::FrameNotBegun);
        }

        let offset = self.write_offset;
        let requested = data.len() as u64;
        if offset + requested > self.staging_size {
            return Err(PipelineError::StagingOverflow {
                offset,
                requested,
                size: self.staging_size,
            });
        }

        if requested > 0 {
            gpu.write_staging(&self.frames[self.cursor].staging, offset, data);
        }
        self.write_offset += requested;
        Ok(offset)
    }

    pub fn write_vertices(&mut self, gpu: &mut B, vertices: &[Vertex]) -> Result<u64, PipelineError> {
        self.write(gpu, bytemuck::cast_slice(vertices))
    }

    /// Clear the target, copy the staged geometry into the geometry buffer and
    /// draw it.
    pub fn submit(&mut self, gpu: &mut B, clear_color: Color) -> Result<(), PipelineError> {
        if !self.recording {
            return Err(PipelineError::FrameNotBegun);
        }

        gpu.clear(clear_color);
        if self.write_offset > 0 {
            gpu.copy_to_geometry(&self.frames[self.cursor].staging, self.write_offset);
            gpu.draw_triangles((self.write_offset / VERTEX_STRIDE) as u32);
        }
        Ok(())
    }

    /// Arm the current frame's fence and advance the cursor.
    pub fn end_frame(&mut self, gpu: &mut B) -> Result<(), PipelineError> {
        if !self.recording {
            return Err(PipelineError::FrameNotBegun);
        }

        let frame = &mut self.frames[self.cursor];
        frame.fence = Some(gpu.insert_fence());
        frame.submissions += 1;

        self.recording = false;
        self.cursor = (self.cursor + 1) % self.frames.len();
        Ok(())
    }

    /// Give back a claimed frame without submitting it.
    ///
    /// The cursor stays put and the staging writes of this tick are discarded.
    pub fn abort_frame(&mut self) {
        if self.recording {
            log::debug!("frame {} released without submission", self.cursor);
        }
        self.recording = false;
        self.write_offset = 0;
    }

    /// Drop all outstanding fences and clear the failed state.
    ///
    /// Staging regions are kept. Any GPU work still referencing them is no
    /// longer tracked, so only call this once the device is known to be idle
    /// or has been recreated.
    pub fn reinitialize(&mut self, gpu: &mut B) {
        for frame in &mut self.frames {
            if let Some(fence) = frame.fence.take() {
                gpu.delete_fence(fence);
            }
        }
        self.cursor = 0;
        self.write_offset = 0;
        self.recording = false;
        self.failed = false;
        log::debug!("frame pipeline reinitialized");
    }

    /// Release every fence and staging region.
    pub fn destroy(self, gpu: &mut B) {
        for frame in self.frames {
            if let Some(fence) = frame.fence {
                gpu.delete_fence(fence);
            }
            gpu.delete_buffer(frame.staging);
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn staging_size(&self) -> u64 {
        self.staging_size
    }

    /// Bytes written into the current staging region this tick
    pub fn written(&self) -> u64 {
        self.write_offset
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// # Panics
    /// Panics if `frame >= frame_count()`.
    pub fn state(&self, frame: usize) -> FrameState {
        if self.frames[frame].fence.is_some() {
            FrameState::Submitted
        } else {
            FrameState::Idle
        }
    }

    /// Number of times `frame` has been submitted
    pub fn submissions(&self, frame: usize) -> u64 {
        self.frames[frame].submissions
    }
}
