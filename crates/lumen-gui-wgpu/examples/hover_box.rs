//! A tall box that turns blue under the cursor, with a spinning triangle on top.
//!
//! Run with `RUST_LOG=debug` to see ticks skipped under GPU backpressure.

use std::sync::Arc;
use std::time::Instant;

use glam::Vec2;
use lumen_gui::{
    BuildContext, Color, ContextConfig, Element, ElementIndex, Error, PaintContext,
    RenderContext, Scene, TickOutcome,
};
use lumen_gui_wgpu::{WgpuBackend, WinitInputExt};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

const HOVER_COLOR: Color = Color::rgba(0.1, 0.2, 0.9, 1.0);

struct HoverBox {
    panel: Option<ElementIndex>,
}

impl Scene for HoverBox {
    fn build(&mut self, ui: &mut BuildContext<'_>) -> Result<(), Error> {
        let root = ui.append(None, Element::from_key("root").with_extent(800.0, 600.0))?;
        self.panel = Some(ui.append(
            Some(root),
            Element::from_key("panel")
                .with_pos(64.0, 64.0)
                .with_extent(32.0, 128.0),
        )?);
        Ok(())
    }

    fn paint(&mut self, ui: &mut PaintContext<'_>) -> Result<(), Error> {
        if let Some(panel) = self.panel {
            let color = if ui.hovered() == Some(panel) {
                HOVER_COLOR
            } else {
                Color::default()
            };
            ui.fill(panel, color)?;
        }

        let angle = ui.time().timestamp as f32;
        let center = Vec2::new(400.0, 300.0);
        let corners = [
            Vec2::new(0.0, 100.0),
            Vec2::new(-87.0, -50.0),
            Vec2::new(87.0, -50.0),
        ]
        .map(|v| center + Vec2::from_angle(angle).rotate(v));
        ui.triangle(
            corners,
            [
                Color::rgb(1.0, 0.0, 0.0),
                Color::rgb(0.0, 1.0, 0.0),
                Color::rgb(0.0, 0.0, 1.0),
            ],
        );
        Ok(())
    }
}

struct GpuState {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    backend: WgpuBackend,
    ctx: RenderContext<WgpuBackend>,
}

impl GpuState {
    async fn new(window: Arc<Window>) -> Self {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone()).unwrap();

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .unwrap();

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .unwrap();

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let mut backend = WgpuBackend::new(&device, &queue, surface_format);
        let ctx = RenderContext::new(
            &mut backend,
            ContextConfig::default().with_viewport(size.width as f32, size.height as f32),
        )
        .unwrap();

        Self {
            surface,
            config,
            backend,
            ctx,
        }
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(self.backend.device(), &self.config);
            self.ctx
                .set_viewport(new_size.width as f32, new_size.height as f32);
        }
    }

    fn render(&mut self, timestamp: f64, scene: &mut HoverBox) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.backend.set_target(view);

        match self.ctx.tick(&mut self.backend, timestamp, scene) {
            Ok(TickOutcome::Submitted) => output.present(),
            Ok(outcome) => log::trace!("tick {outcome:?}"),
            Err(err) if err.needs_reinitialize() => {
                log::error!("frame pipeline failed: {err}, reinitializing");
                // Frames still in flight own their staging buffers
                if let Err(err) = self.backend.device().poll(wgpu::PollType::wait_indefinitely()) {
                    log::error!("device wait failed: {err}");
                }
                self.ctx.reinitialize(&mut self.backend);
            }
            Err(err) => log::warn!("tick aborted: {err}"),
        }

        self.backend.clear_target();
        Ok(())
    }
}

struct App {
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
    scene: HoverBox,
    start: Instant,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attributes = Window::default_attributes()
            .with_title("lumen-gui hover box")
            .with_inner_size(winit::dpi::PhysicalSize::new(800, 600));

        let window = Arc::new(event_loop.create_window(window_attributes).unwrap());
        self.window = Some(window.clone());
        self.gpu_state = Some(pollster::block_on(GpuState::new(window)));
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(gpu_state) = &mut self.gpu_state else {
            return;
        };

        if let Err(err) = gpu_state.ctx.handle_winit_event(&event) {
            log::debug!("input dropped: {err}");
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                gpu_state.resize(physical_size);
            }

            WindowEvent::RedrawRequested => {
                let timestamp = self.start.elapsed().as_secs_f64();
                match gpu_state.render(timestamp, &mut self.scene) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        if let Some(window) = &self.window {
                            gpu_state.resize(window.inner_size());
                        }
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("out of memory");
                        event_loop.exit();
                    }
                    Err(e) => log::warn!("render error: {e:?}"),
                }
            }

            _ => {}
        }

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() {
    env_logger::init();

    let event_loop = EventLoop::new().unwrap();
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App {
        window: None,
        gpu_state: None,
        scene: HoverBox { panel: None },
        start: Instant::now(),
    };
    event_loop.run_app(&mut app).unwrap();
}
