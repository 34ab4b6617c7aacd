//! Windowing and GPU host for the deep-zoom Mandelbrot viewer.
//!
//! The crate glues the winit window, the `wgpu` rendering pipeline, and the
//! viewer core together. The overall flow is:
//!
//! ```text
//!   CLI / mandelzoom
//!          │ RendererConfig + ViewerSession
//!          ▼
//!   Renderer::run ──▶ WindowState ──▶ winit event loop ──▶ render_frame()
//!          ▲                │                     │
//!          │                └─ input events ──▶ ViewerSession handlers
//!          │                                      │
//!          │                        advance_frame() ─▶ RenderSnapshot ─▶ GPU UBO
//! ```
//!
//! `WindowState` owns all GPU resources (surface, device, pipeline, uniform
//! buffer) together with the session, while `Renderer` is the thin entry
//! point that spins up the event loop. The fragment shader is loaded from
//! disk at startup and compiled as Vulkan GLSL; each frame the session's
//! narrowed [`RenderSnapshot`] is mirrored into the std140 uniform block the
//! shader reads.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use bytemuck::{Pod, Zeroable};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use wgpu::naga::ShaderStage;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::event::{
    DeviceEvent, ElementState, Event, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent,
};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowBuilder};

use viewer::{KeyCommand, PointerButton, RenderSnapshot, ViewerSession};

/// Pixel-based scroll deltas are normalised against the classic wheel step
/// so trackpads and wheels produce comparable zoom rates.
const PIXELS_PER_SCROLL_NOTCH: f64 = 120.0;

/// Immutable configuration passed to the renderer at start-up.
#[derive(Clone)]
pub struct RendererConfig {
    /// Initial window size in physical pixels.
    pub surface_size: (u32, u32),
    /// Path to the fragment shader implementing the fractal coloring.
    pub fragment_shader: PathBuf,
    /// Window title.
    pub title: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            surface_size: (800, 600),
            fragment_shader: PathBuf::new(),
            title: "Mandelbrot".to_string(),
        }
    }
}

/// High-level entry point that owns the configuration and the session.
///
/// The heavy lifting lives inside [`WindowState`]; `Renderer` simply builds
/// the window and drives the `winit` event loop around it.
pub struct Renderer {
    config: RendererConfig,
    session: ViewerSession,
}

impl Renderer {
    pub fn new(config: RendererConfig, session: ViewerSession) -> Self {
        Self { config, session }
    }

    /// Opens the viewer window and runs until the session requests exit or
    /// the window is closed.
    ///
    /// `winit` delivers events one by one; window events feed the session's
    /// input handlers, and every redraw advances the session by one frame
    /// before submitting the draw.
    pub fn run(self) -> Result<()> {
        let event_loop = EventLoop::new().context("failed to initialize event loop")?;
        let window_size = PhysicalSize::new(self.config.surface_size.0, self.config.surface_size.1);
        let window = WindowBuilder::new()
            .with_title(&self.config.title)
            .with_inner_size(window_size)
            .build(&event_loop)
            .context("failed to create viewer window")?;
        let window = Arc::new(window);

        let mut state = WindowState::new(window.clone(), &self.config, self.session)?;
        state.window().request_redraw();

        event_loop
            .run(move |event, elwt| {
                // Drive redraws via vblank by waiting between events.
                elwt.set_control_flow(ControlFlow::Wait);

                match event {
                    Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
                        match event {
                            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                                elwt.exit();
                            }
                            WindowEvent::KeyboardInput {
                                event:
                                    KeyEvent {
                                        physical_key: PhysicalKey::Code(code),
                                        state: ElementState::Pressed,
                                        repeat: false,
                                        ..
                                    },
                                ..
                            } => {
                                if let Some(command) = map_key(code) {
                                    state.session.key_command(command);
                                }
                                if state.session.should_exit() {
                                    elwt.exit();
                                }
                            }
                            WindowEvent::MouseInput {
                                state: button_state,
                                button,
                                ..
                            } => {
                                if let Some(mapped) = map_button(button) {
                                    state.session.pointer_button(
                                        mapped,
                                        button_state == ElementState::Pressed,
                                    );
                                    state.apply_pointer_mode();
                                }
                            }
                            WindowEvent::MouseWheel { delta, .. } => {
                                state.session.scroll(scroll_notches(delta));
                            }
                            WindowEvent::Resized(new_size) => {
                                state.resize(new_size);
                            }
                            WindowEvent::ScaleFactorChanged {
                                mut inner_size_writer,
                                ..
                            } => {
                                // Keep the current logical size when the scale factor changes.
                                let _ = inner_size_writer.request_inner_size(state.size());
                            }
                            WindowEvent::RedrawRequested => {
                                let render_result = state.render_frame();
                                match render_result {
                                    Ok(()) => {}
                                    Err(
                                        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated,
                                    ) => {
                                        state.resize(state.size());
                                    }
                                    Err(wgpu::SurfaceError::OutOfMemory) => {
                                        tracing::error!("surface out of memory; exiting");
                                        elwt.exit();
                                    }
                                    Err(other) => {
                                        tracing::warn!(
                                            "surface error: {other:?}; retrying next frame"
                                        );
                                    }
                                }
                            }
                            _ => {}
                        }
                    }
                    Event::DeviceEvent {
                        event: DeviceEvent::MouseMotion { delta: (dx, dy) },
                        ..
                    } => {
                        state.session.pointer_motion(dx, dy);
                    }
                    Event::AboutToWait => {
                        // Schedule the next frame once winit is about to wait for events again.
                        state.window().request_redraw();
                    }
                    _ => {}
                }
            })
            .map_err(|err| anyhow!("event loop error: {err}"))
    }
}

/// Maps host key codes onto the session's command vocabulary.
fn map_key(code: KeyCode) -> Option<KeyCommand> {
    match code {
        KeyCode::Escape => Some(KeyCommand::Exit),
        KeyCode::KeyG => Some(KeyCommand::ToggleAutoZoom),
        KeyCode::KeyR => Some(KeyCommand::ResetZoom),
        _ => None,
    }
}

/// Maps host mouse buttons onto the session's vocabulary.
fn map_button(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Left => Some(PointerButton::Left),
        MouseButton::Middle => Some(PointerButton::Middle),
        MouseButton::Right => Some(PointerButton::Right),
        _ => None,
    }
}

/// Converts a scroll delta to wheel notches, the unit the session expects.
fn scroll_notches(delta: MouseScrollDelta) -> f64 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => f64::from(y),
        MouseScrollDelta::PixelDelta(position) => position.y / PIXELS_PER_SCROLL_NOTCH,
    }
}

/// Aggregates the window, GPU resources, and the viewer session.
struct WindowState {
    /// Shared handle to the window (`wgpu` requires it to create the surface).
    window: Arc<Window>,
    /// GPU resources backing the swapchain and fractal pipeline.
    gpu: GpuState,
    /// Viewer core driven by the events above.
    session: ViewerSession,
    /// Instant captured when the event loop starts; feeds the frame clock.
    started: Instant,
    /// Used to throttle the overlay status log.
    last_readout: Instant,
}

impl WindowState {
    fn new(window: Arc<Window>, config: &RendererConfig, session: ViewerSession) -> Result<Self> {
        let size = window.inner_size();
        let gpu = GpuState::new(window.as_ref(), size, &config.fragment_shader)?;

        Ok(Self {
            window,
            gpu,
            session,
            started: Instant::now(),
            last_readout: Instant::now(),
        })
    }

    fn window(&self) -> &Window {
        self.window.as_ref()
    }

    /// Cached physical size of the swapchain surface.
    fn size(&self) -> PhysicalSize<u32> {
        self.gpu.size()
    }

    /// Reacts to platform resize events by reconfiguring the swapchain.
    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.gpu.resize(new_size);
    }

    /// Grabs and hides the cursor while the session holds it for camera
    /// control, releasing it again for overlay interaction.
    fn apply_pointer_mode(&self) {
        let exclusive = self.session.pointer_exclusive();
        self.window.set_cursor_visible(!exclusive);
        let grab = if exclusive {
            self.window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined))
        } else {
            self.window.set_cursor_grab(CursorGrabMode::None)
        };
        if let Err(err) = grab {
            tracing::warn!(exclusive, "cursor grab change failed: {err}");
        }
    }

    /// Advances the session one frame, records the draw, and submits it.
    fn render_frame(&mut self) -> Result<(), wgpu::SurfaceError> {
        let size = self.size();
        let now = self.started.elapsed().as_secs_f64();
        let snapshot = self
            .session
            .advance_frame(now, [size.width.max(1), size.height.max(1)]);
        self.gpu.render_frame(snapshot)?;

        if self.last_readout.elapsed() >= Duration::from_secs(1) {
            let readout = self.session.overlay_readout();
            tracing::info!(
                x = %readout.center_x,
                y = %readout.center_y,
                fps = format_args!("{:.1}", readout.fps),
                auto_zoom = readout.auto_zoom,
                speed = readout.zoom_speed,
                "viewer status"
            );
            self.last_readout = Instant::now();
        }
        Ok(())
    }
}

/// Owns the GPU resources required to render the fractal pipeline.
struct GpuState {
    /// `wgpu` instance that produced the surface; kept alive for the surface lifetime.
    _instance: wgpu::Instance,
    /// Limits advertised by the adapter; used to validate resize requests.
    limits: wgpu::Limits,
    /// Swapchain surface we render into each frame.
    surface: wgpu::Surface<'static>,
    /// Logical device used for resource creation.
    device: wgpu::Device,
    /// Submission queue accepting command buffers.
    queue: wgpu::Queue,
    /// Swapchain configuration (format, present mode, dimensions).
    config: wgpu::SurfaceConfiguration,
    /// Current swapchain size in physical pixels.
    size: PhysicalSize<u32>,
    /// Full-screen pipeline driving the fragment shader.
    pipeline: wgpu::RenderPipeline,
    /// GPU buffer containing the fractal uniform block.
    uniform_buffer: wgpu::Buffer,
    /// Bind group that exposes the uniform buffer to the shader.
    uniform_bind_group: wgpu::BindGroup,
}

impl GpuState {
    /// Creates a GPU pipeline targeting the supplied surface and size.
    fn new<T>(target: &T, initial_size: PhysicalSize<u32>, fragment_shader: &Path) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let instance = wgpu::Instance::default();
        let window_handle = target
            .window_handle()
            .map_err(|err| anyhow!("failed to acquire window handle: {err}"))?;
        let display_handle = target
            .display_handle()
            .map_err(|err| anyhow!("failed to acquire display handle: {err}"))?;
        let surface = unsafe {
            instance.create_surface_unsafe(wgpu::SurfaceTargetUnsafe::RawHandle {
                raw_display_handle: display_handle.as_raw(),
                raw_window_handle: window_handle.as_raw(),
            })
        }
        .context("failed to create rendering surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("failed to find a suitable GPU adapter")?;

        let limits = adapter.limits();
        let max_dimension = limits.max_texture_dimension_2d;
        let requested_width = initial_size.width.max(1);
        let requested_height = initial_size.height.max(1);
        if requested_width > max_dimension || requested_height > max_dimension {
            anyhow::bail!(
                "GPU max texture dimension is {max_dimension}, requested surface is {requested_width}x{requested_height}"
            );
        }

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|format| format.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let device_descriptor = wgpu::DeviceDescriptor {
            label: Some("mandelzoom device"),
            required_features: wgpu::Features::empty(),
            required_limits: limits.clone(),
            memory_hints: wgpu::MemoryHints::default(),
            trace: wgpu::Trace::default(),
        };

        let (device, queue) = pollster::block_on(adapter.request_device(&device_descriptor))
            .context("failed to create GPU device")?;

        let size = PhysicalSize::new(requested_width, requested_height);
        tracing::info!(
            "initial surface size {}x{}, max_texture_dimension_2d={max_dimension}",
            requested_width,
            requested_height
        );

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 1,
        };
        surface.configure(&device, &config);

        let shader_code = fs::read_to_string(fragment_shader).with_context(|| {
            format!(
                "failed to read fragment shader at {}",
                fragment_shader.display()
            )
        })?;
        let fragment_module = compile_fragment_shader(&device, &shader_code);
        let vertex_module = compile_vertex_shader(&device);

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("fractal uniform layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("fractal pipeline layout"),
            bind_group_layouts: &[&uniform_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("fractal pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex_module,
                entry_point: Some("main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &fragment_module,
                entry_point: Some("main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview: None,
            cache: None,
        });

        let uniforms = FractalUniforms::zeroed();
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("fractal uniform buffer"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("fractal uniform bind group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Ok(Self {
            _instance: instance,
            limits,
            surface,
            device,
            queue,
            config,
            size,
            pipeline,
            uniform_buffer,
            uniform_bind_group,
        })
    }

    /// Returns the current surface size.
    fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    /// Reconfigures the swapchain to match the new size.
    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        let max_dimension = self.limits.max_texture_dimension_2d;
        if new_size.width > max_dimension || new_size.height > max_dimension {
            tracing::warn!(
                "requested resize to {}x{} exceeds GPU max texture dimension {max_dimension}; keeping {}x{}",
                new_size.width,
                new_size.height,
                self.size.width,
                self.size.height
            );
            return;
        }

        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
    }

    /// Uploads the frame's uniform values and submits one draw.
    fn render_frame(&mut self, snapshot: RenderSnapshot) -> Result<(), wgpu::SurfaceError> {
        let uniforms = FractalUniforms::from_snapshot(&snapshot);
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let frame = self.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("render encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("render pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.draw(0..3, 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        tracing::trace!(
            "presented frame size={}x{} scale={}",
            self.size.width,
            self.size.height,
            uniforms.scale
        );
        Ok(())
    }
}

/// CPU-side mirror of the fractal uniform block.
///
/// The layout matches the `FractalParams` block in the fragment shader and
/// therefore must observe std140 alignment rules: `center` at offset 0,
/// `scale` at 8, `max_iter` at 12, `screen` at 16, padded to a 32-byte
/// struct.
#[repr(C, align(16))]
#[derive(Clone, Copy)]
struct FractalUniforms {
    center: [f32; 2],
    scale: f32,
    max_iter: i32,
    screen: [i32; 2],
    _padding: [u32; 2],
}

unsafe impl Zeroable for FractalUniforms {}
unsafe impl Pod for FractalUniforms {}

impl FractalUniforms {
    /// Mirrors one frame's narrowed camera state into the uniform layout.
    fn from_snapshot(snapshot: &RenderSnapshot) -> Self {
        Self {
            center: snapshot.center,
            scale: snapshot.scale,
            max_iter: snapshot.max_iter as i32,
            screen: [snapshot.screen[0] as i32, snapshot.screen[1] as i32],
            _padding: [0; 2],
        }
    }
}

/// Compiles the fractal fragment shader through the naga GLSL frontend.
fn compile_fragment_shader(device: &wgpu::Device, source: &str) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("fractal fragment"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(source.to_owned()),
            stage: ShaderStage::Fragment,
            defines: &[],
        },
    })
}

/// Compiles the static full-screen triangle vertex shader.
fn compile_vertex_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("fullscreen triangle vertex"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(VERTEX_SHADER_GLSL),
            stage: ShaderStage::Vertex,
            defines: &[],
        },
    })
}

/// Minimal full-screen triangle vertex shader.
const VERTEX_SHADER_GLSL: &str = r"#version 450

const vec2 positions[3] = vec2[3](
    vec2(-1.0, -3.0),
    vec2(3.0, 1.0),
    vec2(-1.0, 1.0)
);

void main() {
    gl_Position = vec4(positions[uint(gl_VertexIndex)], 0.0, 1.0);
}
";
