//! Error types for tree construction, queues and the frame pipeline.

use crate::element::ElementIndex;

/// Errors raised while building the element tree.
///
/// Both variants are construction-time checks: the offending call is rejected
/// and no array of the tree is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("element tree is full ({capacity} slots)")]
    CapacityExceeded { capacity: usize },

    #[error("element index {index} is out of range (tree holds {len} elements)")]
    IndexOutOfRange { index: ElementIndex, len: usize },
}

/// Errors raised by the bounded per-tick queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// The event queue overflowed and one event was dropped per its policy.
    #[error("event queue is full ({capacity} events), one event was dropped")]
    Full { capacity: usize },

    /// The draw command queue is full; the command was not recorded.
    #[error("draw command queue is full ({capacity} commands)")]
    CapacityExceeded { capacity: usize },
}

/// Errors raised by the frame pipeline.
///
/// A fence that is merely not signaled yet is not an error: `begin_frame`
/// reports it as `Ok(false)` and the tick is skipped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    /// Waiting on a frame fence failed. The pipeline stays unusable until
    /// [`FramePipeline::reinitialize`](crate::FramePipeline::reinitialize) is called.
    #[error("fence wait failed on virtual frame {frame}")]
    SyncFailed { frame: usize },

    #[error("staging region overflow: {requested} bytes at offset {offset} (region holds {size})")]
    StagingOverflow {
        offset: u64,
        requested: u64,
        size: u64,
    },

    #[error("geometry written outside of begin_frame/end_frame")]
    FrameNotBegun,

    #[error("a frame pipeline needs at least one virtual frame")]
    InvalidFrameCount,

    #[error("graphics backend error: {0}")]
    Backend(String),
}

/// Any error surfaced by the render driver.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl Error {
    /// Whether the frame pipeline is poisoned and must be reinitialized
    /// before the next tick can submit. Every other error only aborts the
    /// tick that raised it.
    pub fn needs_reinitialize(&self) -> bool {
        matches!(self, Error::Pipeline(PipelineError::SyncFailed { .. }))
    }
}
