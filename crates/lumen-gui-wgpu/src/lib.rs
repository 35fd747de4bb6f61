//! # lumen-gui-wgpu
//!
//! WGPU graphics backend and winit input adapter for lumen-gui.
//!
//! [`WgpuBackend`] implements [`lumen_gui::GraphicsBackend`]: staging
//! regions are `COPY_SRC` buffers filled with `Queue::write_buffer`, the
//! geometry buffer is a long-lived vertex buffer fed by buffer-to-buffer
//! copies, and fences are flags raised from `Queue::on_submitted_work_done`
//! and advanced with a non-blocking `Device::poll`.

mod input;
mod vertex;

pub use input::*;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use glam::Mat4;
use lumen_gui::{Color, FenceStatus, GraphicsBackend, PipelineError};
use vertex::vertex_layout;

/// Size of the persistent geometry buffer every frame is copied into
pub const GEOMETRY_BUFFER_SIZE: u64 = 20 * 1024 * 1024;

/// Signals once the submission it was created for has finished on the GPU
#[derive(Debug)]
pub struct WgpuFence {
    done: Arc<AtomicBool>,
}

impl WgpuFence {
    pub fn is_signaled(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }
}

/// WGPU implementation of the lumen-gui graphics command interface.
///
/// Commands are recorded into one encoder per frame and submitted by
/// [`GraphicsBackend::insert_fence`]. Set the render target with
/// [`set_target`](Self::set_target) before each tick.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::RenderPipeline,
    geometry_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,

    target: Option<wgpu::TextureView>,
    encoder: Option<wgpu::CommandEncoder>,
    pending_clear: Option<Color>,
    geometry_len: u64,
}

impl WgpuBackend {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Lumen UI Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/ui.wgsl").into()),
        });

        // Projection matrix
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Lumen UI Uniform Buffer"),
            size: std::mem::size_of::<[f32; 16]>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let globals_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Lumen UI Globals Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Lumen UI Globals Bind Group"),
            layout: &globals_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Lumen UI Pipeline Layout"),
            bind_group_layouts: &[&globals_bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Lumen UI Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[vertex_layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let geometry_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Lumen UI Geometry Buffer"),
            size: GEOMETRY_BUFFER_SIZE,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        queue.write_buffer(
            &uniform_buffer,
            0,
            bytemuck::cast_slice(&Mat4::IDENTITY.to_cols_array()),
        );

        Self {
            device: device.clone(),
            queue: queue.clone(),
            pipeline,
            geometry_buffer,
            uniform_buffer,
            uniform_bind_group,
            target: None,
            encoder: None,
            pending_clear: None,
            geometry_len: 0,
        }
    }

    /// Texture view the next frame renders into
    pub fn set_target(&mut self, view: wgpu::TextureView) {
        self.target = Some(view);
    }

    pub fn clear_target(&mut self) {
        self.target = None;
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    fn encoder(&mut self) -> &mut wgpu::CommandEncoder {
        let device = &self.device;
        self.encoder.get_or_insert_with(|| {
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Lumen UI Encoder"),
            })
        })
    }

    /// Record a render pass on the target, clearing first if a clear is pending.
    fn render_pass(&mut self, vertex_count: u32) {
        // The clear belongs to this frame even when there is nothing to draw on.
        let load = take_load_op(&mut self.pending_clear);
        let Some(view) = self.target.clone() else {
            log::warn!("no render target set, dropping draw of {vertex_count} vertices");
            return;
        };

        let pipeline = self.pipeline.clone();
        let bind_group = self.uniform_bind_group.clone();
        let geometry = self.geometry_buffer.clone();
        let geometry_len = self.geometry_len;

        let encoder = self.encoder();
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Lumen UI Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        if vertex_count > 0 && geometry_len > 0 {
            render_pass.set_pipeline(&pipeline);
            render_pass.set_bind_group(0, &bind_group, &[]);
            render_pass.set_vertex_buffer(0, geometry.slice(..geometry_len));
            render_pass.draw(0..vertex_count, 0..1);
        }
    }
}

/// Load op for the next render pass, consuming any pending clear
fn take_load_op(pending_clear: &mut Option<Color>) -> wgpu::LoadOp<wgpu::Color> {
    match pending_clear.take() {
        Some(color) => wgpu::LoadOp::Clear(wgpu::Color {
            r: color.r as f64,
            g: color.g as f64,
            b: color.b as f64,
            a: color.a as f64,
        }),
        None => wgpu::LoadOp::Load,
    }
}

impl GraphicsBackend for WgpuBackend {
    type Buffer = wgpu::Buffer;
    type Fence = WgpuFence;

    fn create_staging_buffer(&mut self, size: u64) -> Result<wgpu::Buffer, PipelineError> {
        let max = self.device.limits().max_buffer_size;
        if size > max || size % wgpu::COPY_BUFFER_ALIGNMENT != 0 {
            return Err(PipelineError::Backend(format!(
                "staging buffer of {size} bytes is not supported (max {max}, align {})",
                wgpu::COPY_BUFFER_ALIGNMENT
            )));
        }

        Ok(self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Lumen UI Staging Buffer"),
            size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        }))
    }

    fn delete_buffer(&mut self, buffer: wgpu::Buffer) {
        buffer.destroy();
    }

    fn write_staging(&mut self, staging: &wgpu::Buffer, offset: u64, data: &[u8]) {
        self.queue.write_buffer(staging, offset, data);
    }

    fn write_projection(&mut self, projection: Mat4) {
        self.queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::cast_slice(&projection.to_cols_array()),
        );
    }

    fn clear(&mut self, color: Color) {
        self.pending_clear = Some(color);
    }

    fn copy_to_geometry(&mut self, staging: &wgpu::Buffer, size: u64) {
        let size = size.min(GEOMETRY_BUFFER_SIZE).min(staging.size());
        let geometry = self.geometry_buffer.clone();
        self.encoder()
            .copy_buffer_to_buffer(staging, 0, &geometry, 0, size);
        self.geometry_len = size;
    }

    fn draw_triangles(&mut self, vertex_count: u32) {
        self.render_pass(vertex_count);
    }

    fn insert_fence(&mut self) -> WgpuFence {
        // A frame with nothing drawn still owes its clear.
        if self.pending_clear.is_some() {
            self.render_pass(0);
        }

        let encoder = self.encoder.take().unwrap_or_else(|| {
            self.device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Lumen UI Encoder"),
                })
        });
        self.queue.submit(std::iter::once(encoder.finish()));

        let done = Arc::new(AtomicBool::new(false));
        let signal = done.clone();
        self.queue.on_submitted_work_done(move || {
            signal.store(true, Ordering::Release);
        });

        self.geometry_len = 0;
        WgpuFence { done }
    }

    fn poll_fence(&mut self, fence: &WgpuFence) -> FenceStatus {
        if fence.is_signaled() {
            return FenceStatus::Signaled;
        }

        match self.device.poll(wgpu::PollType::Poll) {
            Ok(_) if fence.is_signaled() => FenceStatus::Signaled,
            Ok(_) => FenceStatus::Pending,
            Err(err) => {
                log::error!("device poll failed: {err}");
                FenceStatus::Failed
            }
        }
    }

    fn delete_fence(&mut self, fence: WgpuFence) {
        drop(fence);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_clear_is_consumed_once() {
        let mut pending = Some(Color::gray(0.2));

        match take_load_op(&mut pending) {
            wgpu::LoadOp::Clear(color) => assert!((color.r - 0.2).abs() < 1e-6),
            _ => panic!("expected a clear"),
        }
        assert!(pending.is_none());
        assert!(matches!(take_load_op(&mut pending), wgpu::LoadOp::Load));
    }
}
