//! Render context driving one tick of the UI pipeline
//!
//! The `RenderContext` owns every per-tick structure (event queue, element
//! tree, draw commands, geometry scratch) plus the frame pipeline. Hosts feed
//! input through [`RenderContext::mouse_move`] and friends at any time, then
//! call [`RenderContext::tick`] once per display refresh with a [`Scene`]
//! describing what to show.
//!
//! # Example
//!
//! ```ignore
//! struct Hud;
//!
//! impl Scene for Hud {
//!     fn build(&mut self, ui: &mut BuildContext<'_>) -> Result<(), Error> {
//!         ui.append(None, Element::from_key("panel").with_extent(128.0, 32.0))?;
//!         Ok(())
//!     }
//!
//!     fn paint(&mut self, ui: &mut PaintContext<'_>) -> Result<(), Error> {
//!         for index in ui.tree().indices() {
//!             ui.fill(index, Color::gray(0.8))?;
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let outcome = ctx.tick(&mut gpu, timestamp, &mut Hud)?;
//! ```

use glam::{Mat4, Vec2};

use crate::color::Color;
use crate::draw::DrawCommandQueue;
use crate::element::{Element, ElementIndex};
use crate::error::{Error, QueueError, TreeError};
use crate::event::{Event, EventQueue, MouseButton, OverflowPolicy};
use crate::frame::FramePipeline;
use crate::geometry::{GeometryBatch, VERTEX_STRIDE};
use crate::gpu::GraphicsBackend;
use crate::input::PointerState;
use crate::layout::LayoutConfig;
use crate::tree::ElementTree;

/// Sizes and policies fixed when a [`RenderContext`] is created
#[derive(Debug, Clone, PartialEq)]
pub struct ContextConfig {
    pub tree_capacity: usize,
    pub constraint_capacity: usize,
    pub command_capacity: usize,
    pub event_capacity: usize,
    pub overflow_policy: OverflowPolicy,
    /// Number of virtual frames in the ring
    pub frame_count: usize,
    /// Bytes of staging memory per virtual frame
    pub staging_size: u64,
    pub layout: LayoutConfig,
    pub clear_color: Color,
    /// Scene size in pixels; drives the projection and the pointer y flip
    pub viewport: Vec2,
    /// Map window y (top-left origin) into scene y (bottom-left origin)
    pub flip_y: bool,
    /// Return [`TickOutcome::Idle`] without rendering when no input arrived
    pub skip_idle_ticks: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            tree_capacity: 1024,
            constraint_capacity: 256,
            command_capacity: 512,
            event_capacity: 64,
            overflow_policy: OverflowPolicy::DropNewest,
            frame_count: 3,
            staging_size: 1024 * 1024,
            layout: LayoutConfig::default(),
            clear_color: Color::gray(0.2),
            viewport: Vec2::new(800.0, 600.0),
            flip_y: true,
            skip_idle_ticks: false,
        }
    }
}

impl ContextConfig {
    pub fn with_tree_capacity(mut self, capacity: usize) -> Self {
        self.tree_capacity = capacity;
        self
    }

    pub fn with_constraint_capacity(mut self, capacity: usize) -> Self {
        self.constraint_capacity = capacity;
        self
    }

    pub fn with_command_capacity(mut self, capacity: usize) -> Self {
        self.command_capacity = capacity;
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    pub fn with_overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.overflow_policy = policy;
        self
    }

    pub fn with_frame_count(mut self, count: usize) -> Self {
        self.frame_count = count;
        self
    }

    pub fn with_staging_size(mut self, bytes: u64) -> Self {
        self.staging_size = bytes;
        self
    }

    pub fn with_spacing(mut self, spacing: f32) -> Self {
        self.layout.spacing = spacing;
        self
    }

    pub fn with_clear_color(mut self, color: Color) -> Self {
        self.clear_color = color;
        self
    }

    pub fn with_viewport(mut self, width: f32, height: f32) -> Self {
        self.viewport = Vec2::new(width, height);
        self
    }

    pub fn with_flip_y(mut self, flip: bool) -> Self {
        self.flip_y = flip;
        self
    }

    pub fn with_skip_idle_ticks(mut self, skip: bool) -> Self {
        self.skip_idle_ticks = skip;
        self
    }
}

/// What a call to [`RenderContext::tick`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// One frame was submitted to the GPU
    Submitted,
    /// The current virtual frame was still in flight; nothing was submitted
    Skipped,
    /// No input arrived and idle ticks are skipped
    Idle,
}

/// Timing of the tick in progress
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameTime {
    pub timestamp: f64,
    /// Time since the previous tick, zero on the first one
    pub dt: f64,
}

/// Describes the UI shown each tick.
pub trait Scene {
    /// Populate the freshly reset tree.
    fn build(&mut self, ui: &mut BuildContext<'_>) -> Result<(), Error>;

    /// Record draw commands against the resolved tree.
    fn paint(&mut self, ui: &mut PaintContext<'_>) -> Result<(), Error>;
}

/// Handed to [`Scene::build`]
pub struct BuildContext<'a> {
    tree: &'a mut ElementTree,
    pointer: &'a PointerState,
    events: &'a [Event],
    time: FrameTime,
}

impl BuildContext<'_> {
    pub fn append(
        &mut self,
        parent: Option<ElementIndex>,
        element: Element,
    ) -> Result<ElementIndex, TreeError> {
        self.tree.append(parent, element)
    }

    pub fn constrain(&mut self, index: ElementIndex, min: Vec2, max: Vec2) -> Result<(), TreeError> {
        self.tree.constrain(index, min, max)
    }

    pub fn tree(&self) -> &ElementTree {
        self.tree
    }

    pub fn tree_mut(&mut self) -> &mut ElementTree {
        self.tree
    }

    pub fn pointer(&self) -> &PointerState {
        self.pointer
    }

    /// Events drained at the start of this tick, in arrival order
    pub fn events(&self) -> &[Event] {
        self.events
    }

    pub fn time(&self) -> FrameTime {
        self.time
    }
}

/// Handed to [`Scene::paint`]
pub struct PaintContext<'a> {
    tree: &'a ElementTree,
    commands: &'a mut DrawCommandQueue,
    overlay: &'a mut GeometryBatch,
    pointer: &'a PointerState,
    events: &'a [Event],
    time: FrameTime,
}

impl PaintContext<'_> {
    /// Fill `index`'s rectangle. Later fills paint over earlier ones.
    ///
    /// `index` must belong to this tick's tree; a stale index is rejected here,
    /// before any frame is claimed.
    pub fn fill(&mut self, index: ElementIndex, color: Color) -> Result<(), Error> {
        self.tree.rect(index)?;
        self.commands.push(index, color)?;
        Ok(())
    }

    /// Draw a raw triangle after every element fill.
    pub fn triangle(&mut self, corners: [Vec2; 3], colors: [Color; 3]) {
        self.overlay.push_triangle(corners, colors);
    }

    /// Topmost element under the cursor
    pub fn hovered(&self) -> Option<ElementIndex> {
        self.pointer
            .cursor_position
            .and_then(|cursor| self.tree.hit_test(cursor))
    }

    /// Whether the cursor is inside `index`'s rectangle, regardless of what
    /// lies on top of it
    pub fn is_hovered(&self, index: ElementIndex) -> bool {
        match (self.pointer.cursor_position, self.tree.rect(index)) {
            (Some(cursor), Ok(rect)) => rect.contains(cursor),
            _ => false,
        }
    }

    pub fn tree(&self) -> &ElementTree {
        self.tree
    }

    pub fn pointer(&self) -> &PointerState {
        self.pointer
    }

    pub fn events(&self) -> &[Event] {
        self.events
    }

    pub fn time(&self) -> FrameTime {
        self.time
    }
}

/// Owns the per-tick state and drives the frame pipeline.
pub struct RenderContext<B: GraphicsBackend> {
    config: ContextConfig,
    events: EventQueue,
    tick_events: Vec<Event>,
    pointer: PointerState,
    tree: ElementTree,
    commands: DrawCommandQueue,
    batch: GeometryBatch,
    overlay: GeometryBatch,
    pipeline: FramePipeline<B>,
    last_timestamp: Option<f64>,
}

impl<B: GraphicsBackend> RenderContext<B> {
    pub fn new(gpu: &mut B, config: ContextConfig) -> Result<Self, Error> {
        let pipeline = FramePipeline::new(gpu, config.frame_count, config.staging_size)?;

        let mut pointer = PointerState::new();
        if config.flip_y {
            pointer.set_flip_height(Some(config.viewport.y));
        }

        Ok(Self {
            events: EventQueue::with_policy(config.event_capacity, config.overflow_policy),
            tick_events: Vec::with_capacity(config.event_capacity),
            pointer,
            tree: ElementTree::with_config(
                config.tree_capacity,
                config.constraint_capacity,
                config.layout,
            ),
            commands: DrawCommandQueue::new(config.command_capacity),
            batch: GeometryBatch::with_capacity(config.command_capacity * 6),
            overlay: GeometryBatch::new(),
            pipeline,
            last_timestamp: None,
            config,
        })
    }

    // ========== Input ==========

    pub fn mouse_move(&mut self, x: f32, y: f32) -> Result<(), QueueError> {
        self.events.mouse_move(x, y)
    }

    pub fn mouse_down(&mut self, button: MouseButton) -> Result<(), QueueError> {
        self.events.mouse_down(button)
    }

    pub fn mouse_up(&mut self, button: MouseButton) -> Result<(), QueueError> {
        self.events.mouse_up(button)
    }

    pub fn push_event(&mut self, event: Event) -> Result<(), QueueError> {
        self.events.push(event)
    }

    // ========== Tick ==========

    /// Run one tick: drain input, rebuild and resolve the tree, record draw
    /// commands, then hand the geometry to the frame pipeline.
    ///
    /// Events and commands of a tick are consumed whatever the outcome; a
    /// skipped tick does not carry them over.
    pub fn tick(
        &mut self,
        gpu: &mut B,
        timestamp: f64,
        scene: &mut impl Scene,
    ) -> Result<TickOutcome, Error> {
        let time = FrameTime {
            timestamp,
            dt: self.last_timestamp.map_or(0.0, |last| timestamp - last),
        };
        self.last_timestamp = Some(timestamp);

        self.tick_events.clear();
        self.tick_events.extend(self.events.drain());
        if self.config.skip_idle_ticks && self.tick_events.is_empty() {
            return Ok(TickOutcome::Idle);
        }

        self.pointer.begin_frame();
        for event in &self.tick_events {
            self.pointer.apply(event);
        }

        let result = self.run(gpu, time, scene);
        if result.is_err() {
            self.pipeline.abort_frame();
        }
        self.commands.reset();
        result
    }

    fn run(&mut self, gpu: &mut B, time: FrameTime, scene: &mut impl Scene) -> Result<TickOutcome, Error> {
        self.tree.reset();
        scene.build(&mut BuildContext {
            tree: &mut self.tree,
            pointer: &self.pointer,
            events: &self.tick_events,
            time,
        })?;
        self.tree.resolve();

        self.commands.reset();
        self.overlay.clear();
        scene.paint(&mut PaintContext {
            tree: &self.tree,
            commands: &mut self.commands,
            overlay: &mut self.overlay,
            pointer: &self.pointer,
            events: &self.tick_events,
            time,
        })?;

        if !self.pipeline.begin_frame(gpu)? {
            return Ok(TickOutcome::Skipped);
        }

        self.batch.clear();
        self.commands.emit(&self.tree, &mut self.batch)?;
        self.batch.extend_from(&self.overlay);

        // Whole triangles only
        let max_vertices = (self.pipeline.staging_size() / VERTEX_STRIDE) as usize / 3 * 3;
        let vertices = self.batch.vertices();
        let vertices = if vertices.len() > max_vertices {
            log::warn!(
                "frame geometry of {} vertices exceeds staging region, clamping to {max_vertices}",
                vertices.len()
            );
            &vertices[..max_vertices]
        } else {
            vertices
        };

        gpu.write_projection(self.projection());
        self.pipeline.write_vertices(gpu, vertices)?;
        self.pipeline.submit(gpu, self.config.clear_color)?;
        self.pipeline.end_frame(gpu)?;

        Ok(TickOutcome::Submitted)
    }

    /// Orthographic projection with the origin at the bottom-left corner
    pub fn projection(&self) -> Mat4 {
        let viewport = self.config.viewport;
        Mat4::orthographic_rh(0.0, viewport.x, 0.0, viewport.y, -1.0, 1.0)
    }

    /// Change the scene size, for example after a window resize.
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.config.viewport = Vec2::new(width, height);
        if self.config.flip_y {
            self.pointer.set_flip_height(Some(height));
        }
    }

    /// Recover after `SyncFailed`. Call once the device is idle or recreated.
    pub fn reinitialize(&mut self, gpu: &mut B) {
        self.events.clear();
        self.commands.reset();
        self.pipeline.reinitialize(gpu);
    }

    /// Release all GPU resources owned by the pipeline.
    pub fn destroy(self, gpu: &mut B) {
        self.pipeline.destroy(gpu);
    }

    // ========== Access ==========

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn tree(&self) -> &ElementTree {
        &self.tree
    }

    pub fn commands(&self) -> &DrawCommandQueue {
        &self.commands
    }

    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    pub fn pipeline(&self) -> &FramePipeline<B> {
        &self.pipeline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::gpu::fake::{Call, FakeBackend};

    /// 32x128 box at (16, 16) that turns blue while hovered
    struct HoverBox {
        hovered: bool,
        dt: f64,
    }

    impl HoverBox {
        fn new() -> Self {
            Self { hovered: false, dt: 0.0 }
        }
    }

    impl Scene for HoverBox {
        fn build(&mut self, ui: &mut BuildContext<'_>) -> Result<(), Error> {
            ui.append(
                None,
                Element::from_key("box").with_pos(16.0, 16.0).with_extent(32.0, 128.0),
            )?;
            self.dt = ui.time().dt;
            Ok(())
        }

        fn paint(&mut self, ui: &mut PaintContext<'_>) -> Result<(), Error> {
            let index = ElementIndex::new(0);
            self.hovered = ui.is_hovered(index);
            let color = if self.hovered {
                Color::rgba(0.1, 0.2, 0.9, 1.0)
            } else {
                Color::default()
            };
            ui.fill(index, color)?;
            ui.triangle(
                [Vec2::new(400.0, 300.0), Vec2::new(450.0, 300.0), Vec2::new(425.0, 350.0)],
                [Color::rgb(1.0, 0.0, 0.0), Color::rgb(0.0, 1.0, 0.0), Color::rgb(0.0, 0.0, 1.0)],
            );
            Ok(())
        }
    }

    fn context(gpu: &mut FakeBackend, config: ContextConfig) -> RenderContext<FakeBackend> {
        RenderContext::new(gpu, config).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = ContextConfig::default();
        assert_eq!(config.tree_capacity, 1024);
        assert_eq!(config.command_capacity, 512);
        assert_eq!(config.event_capacity, 64);
        assert_eq!(config.frame_count, 3);
        assert_eq!(config.staging_size, 1 << 20);
        assert_eq!(config.clear_color, Color::gray(0.2));
    }

    #[test]
    fn test_tick_submits_quads_then_triangle() {
        let mut gpu = FakeBackend::new();
        let mut ctx = context(&mut gpu, ContextConfig::default());
        let mut scene = HoverBox::new();

        assert_eq!(ctx.tick(&mut gpu, 0.0, &mut scene), Ok(TickOutcome::Submitted));

        assert!(gpu.calls.contains(&Call::WriteProjection));
        assert!(gpu.calls.contains(&Call::Clear(Color::gray(0.2))));
        assert!(gpu.calls.contains(&Call::CopyToGeometry { buffer: 0, size: 9 * 24 }));
        assert!(gpu.calls.contains(&Call::Draw(9)));
        assert_eq!(gpu.count(|c| matches!(c, Call::InsertFence(_))), 1);
        assert_eq!(ctx.pipeline().cursor(), 1);
    }

    #[test]
    fn test_hover_uses_flipped_cursor() {
        let mut gpu = FakeBackend::new();
        let mut ctx = context(&mut gpu, ContextConfig::default());
        let mut scene = HoverBox::new();

        // Window y 500 is scene y 100, inside the box.
        ctx.mouse_move(20.0, 500.0).unwrap();
        ctx.tick(&mut gpu, 0.0, &mut scene).unwrap();
        assert!(scene.hovered);

        let expected: [f32; 6] = [16.0, 16.0, 0.1, 0.2, 0.9, 1.0];
        assert_eq!(&gpu.staging[&0][..24], bytemuck::cast_slice::<f32, u8>(&expected));

        ctx.mouse_move(20.0, 100.0).unwrap();
        ctx.tick(&mut gpu, 16.0, &mut scene).unwrap();
        assert!(!scene.hovered);
    }

    #[test]
    fn test_backpressure_skips_and_consumes() {
        let mut gpu = FakeBackend::new();
        let mut ctx = context(&mut gpu, ContextConfig::default().with_frame_count(1));
        let mut scene = HoverBox::new();

        assert_eq!(ctx.tick(&mut gpu, 0.0, &mut scene), Ok(TickOutcome::Submitted));
        let calls_before = gpu.calls.len();

        ctx.mouse_move(1.0, 1.0).unwrap();
        ctx.mouse_down(MouseButton::Left).unwrap();
        assert_eq!(ctx.tick(&mut gpu, 16.0, &mut scene), Ok(TickOutcome::Skipped));

        assert_eq!(gpu.calls.len(), calls_before);
        assert!(ctx.events().is_empty());
        assert!(ctx.commands().is_empty());
        assert!(ctx.pointer().is_button_down(MouseButton::Left));

        gpu.signal_all();
        assert_eq!(ctx.tick(&mut gpu, 32.0, &mut scene), Ok(TickOutcome::Submitted));
        assert!(ctx.commands().is_empty());
    }

    #[test]
    fn test_sync_failure_surfaces_and_recovers() {
        let mut gpu = FakeBackend::new();
        let mut ctx = context(&mut gpu, ContextConfig::default().with_frame_count(1));
        let mut scene = HoverBox::new();

        ctx.tick(&mut gpu, 0.0, &mut scene).unwrap();
        gpu.fail_all();
        assert_eq!(
            ctx.tick(&mut gpu, 16.0, &mut scene),
            Err(Error::Pipeline(PipelineError::SyncFailed { frame: 0 }))
        );
        assert!(ctx.commands().is_empty());

        ctx.reinitialize(&mut gpu);
        assert_eq!(ctx.tick(&mut gpu, 32.0, &mut scene), Ok(TickOutcome::Submitted));
    }

    #[test]
    fn test_idle_ticks_skipped_when_enabled() {
        let mut gpu = FakeBackend::new();
        let mut ctx = context(&mut gpu, ContextConfig::default().with_skip_idle_ticks(true));
        let mut scene = HoverBox::new();

        assert_eq!(ctx.tick(&mut gpu, 0.0, &mut scene), Ok(TickOutcome::Idle));
        assert!(gpu.calls.iter().all(|c| matches!(c, Call::CreateStaging { .. })));

        ctx.mouse_move(0.0, 0.0).unwrap();
        assert_eq!(ctx.tick(&mut gpu, 16.0, &mut scene), Ok(TickOutcome::Submitted));
    }

    #[test]
    fn test_dt_tracks_previous_timestamp() {
        let mut gpu = FakeBackend::new();
        let mut ctx = context(&mut gpu, ContextConfig::default());
        let mut scene = HoverBox::new();

        ctx.tick(&mut gpu, 100.0, &mut scene).unwrap();
        assert_eq!(scene.dt, 0.0);

        ctx.tick(&mut gpu, 116.0, &mut scene).unwrap();
        assert_eq!(scene.dt, 16.0);
    }

    #[test]
    fn test_capacity_error_aborts_tick() {
        struct TooMany;
        impl Scene for TooMany {
            fn build(&mut self, ui: &mut BuildContext<'_>) -> Result<(), Error> {
                for _ in 0..3 {
                    ui.append(None, Element::from_key("x"))?;
                }
                Ok(())
            }
            fn paint(&mut self, _ui: &mut PaintContext<'_>) -> Result<(), Error> {
                Ok(())
            }
        }

        let mut gpu = FakeBackend::new();
        let mut ctx = context(&mut gpu, ContextConfig::default().with_tree_capacity(2));
        assert_eq!(
            ctx.tick(&mut gpu, 0.0, &mut TooMany),
            Err(Error::Tree(TreeError::CapacityExceeded { capacity: 2 }))
        );
        assert_eq!(ctx.tree().len(), 2);
        assert_eq!(gpu.count(|c| matches!(c, Call::InsertFence(_))), 0);
    }

    #[test]
    fn test_oversized_geometry_is_clamped() {
        let mut gpu = FakeBackend::new();
        // Room for one quad only.
        let config = ContextConfig::default().with_staging_size(6 * 24);
        let mut ctx = context(&mut gpu, config);
        let mut scene = HoverBox::new();

        assert_eq!(ctx.tick(&mut gpu, 0.0, &mut scene), Ok(TickOutcome::Submitted));
        assert!(gpu.calls.contains(&Call::Draw(6)));
    }

    #[test]
    fn test_clamp_keeps_whole_triangles() {
        let mut gpu = FakeBackend::new();
        // 8 vertices fit; the quad plus triangle needs 9.
        let config = ContextConfig::default().with_staging_size(8 * 24);
        let mut ctx = context(&mut gpu, config);
        let mut scene = HoverBox::new();

        assert_eq!(ctx.tick(&mut gpu, 0.0, &mut scene), Ok(TickOutcome::Submitted));
        let draws: Vec<&Call> = gpu.calls.iter().filter(|c| matches!(c, Call::Draw(_))).collect();
        assert_eq!(draws, vec![&Call::Draw(6)]);
    }

    #[test]
    fn test_stale_fill_fails_before_claiming_frame() {
        struct StaleFill;
        impl Scene for StaleFill {
            fn build(&mut self, ui: &mut BuildContext<'_>) -> Result<(), Error> {
                ui.append(None, Element::from_key("only").with_extent(10.0, 10.0))?;
                Ok(())
            }
            fn paint(&mut self, ui: &mut PaintContext<'_>) -> Result<(), Error> {
                ui.fill(ElementIndex::new(5), Color::default())
            }
        }

        let mut gpu = FakeBackend::new();
        let mut ctx = context(&mut gpu, ContextConfig::default());
        let expected = Err(Error::Tree(TreeError::IndexOutOfRange {
            index: ElementIndex::new(5),
            len: 1,
        }));

        assert_eq!(ctx.tick(&mut gpu, 0.0, &mut StaleFill), expected);
        assert!(!ctx.pipeline().is_recording());
        assert!(ctx.commands().is_empty());
        assert_eq!(gpu.count(|c| matches!(c, Call::WriteStaging { .. })), 0);

        // A busy frame reports the same error instead of a skip.
        assert_eq!(ctx.tick(&mut gpu, 16.0, &mut HoverBox::new()), Ok(TickOutcome::Submitted));
        assert_eq!(ctx.tick(&mut gpu, 32.0, &mut HoverBox::new()), Ok(TickOutcome::Submitted));
        assert_eq!(ctx.tick(&mut gpu, 48.0, &mut HoverBox::new()), Ok(TickOutcome::Submitted));
        assert_eq!(ctx.tick(&mut gpu, 64.0, &mut StaleFill), expected);
    }
}
