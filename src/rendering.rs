//! Rendering system with wgpu pipelines and a persistent canvas.
//!
//! Draw commands are painted onto an offscreen canvas texture that is never
//! cleared between frames (the fade rectangle produces the trails), then
//! the canvas is blitted to the window.

use bytemuck::{Pod, Zeroable};
use std::sync::Arc;
use tracing::info;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::error::RenderError;
use crate::particles::{DrawCommand, Frame, Rect};
use crate::surface::RenderSurface;

/// Canvas pixel format (blending happens on gamma-encoded values)
const CANVAS_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Shape vertex (pixel position, disc-local coordinates, straight RGBA)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub local: [f32; 2],
    pub color: [f32; 4],
    /// 0 = rect, 1 = disc
    pub shape: f32,
}

/// Uniform buffer for the canvas shader
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct CanvasUniforms {
    pub size: [f32; 2],
    pub _padding: [f32; 2],
}

const SHAPE_RECT: f32 = 0.0;
const SHAPE_DISC: f32 = 1.0;

/// Convert a frame into triangle-list vertices in painter's order
pub fn tessellate(frame: &Frame, vertices: &mut Vec<Vertex>) {
    vertices.clear();
    for command in &frame.commands {
        match *command {
            DrawCommand::Fade { rect, color, alpha } => {
                push_quad(vertices, rect, rgba(color.to_rgb(), alpha), SHAPE_RECT);
            }
            DrawCommand::Bar { rect, color } => {
                push_quad(vertices, rect, rgba(color.to_rgb(), 1.0), SHAPE_RECT);
            }
            DrawCommand::Circle {
                center,
                radius,
                color,
                alpha,
            } => {
                if alpha <= 0.0 {
                    continue;
                }
                let rect = Rect::new(
                    center.x - radius,
                    center.y - radius,
                    radius * 2.0,
                    radius * 2.0,
                );
                push_quad(vertices, rect, rgba(color.to_rgb(), alpha), SHAPE_DISC);
            }
        }
    }
}

fn rgba([r, g, b]: [f32; 3], alpha: f32) -> [f32; 4] {
    [r, g, b, alpha.clamp(0.0, 1.0)]
}

fn push_quad(vertices: &mut Vec<Vertex>, rect: Rect, color: [f32; 4], shape: f32) {
    let (x0, y0) = (rect.x, rect.y);
    let (x1, y1) = (rect.x + rect.width, rect.y + rect.height);
    let corner = |x, y, lx, ly| Vertex {
        position: [x, y],
        local: [lx, ly],
        color,
        shape,
    };

    let top_left = corner(x0, y0, -1.0, -1.0);
    let top_right = corner(x1, y0, 1.0, -1.0);
    let bottom_left = corner(x0, y1, -1.0, 1.0);
    let bottom_right = corner(x1, y1, 1.0, 1.0);

    vertices.extend_from_slice(&[
        top_left,
        bottom_left,
        top_right,
        top_right,
        bottom_left,
        bottom_right,
    ]);
}

/// Offscreen canvas the shapes accumulate on
struct Canvas {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    blit_bind_group: wgpu::BindGroup,
    size: (u32, u32),
    /// Not yet cleared to black
    fresh: bool,
}

/// Rendering system managing wgpu device, pipelines, and buffers
pub struct Renderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    shape_pipeline: wgpu::RenderPipeline,
    blit_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    blit_bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    canvas: Canvas,
    vertex_buffer: wgpu::Buffer,
    vertex_capacity: usize,
    vertices: Vec<Vertex>,
}

impl Renderer {
    /// Create new rendering system
    pub async fn new(window: Arc<Window>, canvas_size: RenderSurface) -> Result<Self, RenderError> {
        let size = window.inner_size();

        // Create wgpu instance
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // Create surface (window must have 'static lifetime via Arc)
        let surface = instance.create_surface(window)?;

        // Request adapter
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::Adapter)?;

        info!("GPU: {}", adapter.get_info().name);

        // Request device
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Main Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        // Configure surface; canvas colors are already gamma-encoded, so
        // prefer a non-sRGB swapchain
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        // Load shaders
        let canvas_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Canvas Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("canvas.wgsl").into()),
        });

        let blit_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Blit Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("blit.wgsl").into()),
        });

        // Create canvas uniforms and bind group
        let uniforms = CanvasUniforms {
            size: [canvas_size.width as f32, canvas_size.height as f32],
            _padding: [0.0; 2],
        };

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Canvas Uniform Buffer"),
            contents: bytemuck::cast_slice(&[uniforms]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Canvas Uniform Bind Group Layout"),
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
            label: Some("Canvas Uniform Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        // Create shape pipeline (draws onto the canvas)
        let shape_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Shape Pipeline Layout"),
                bind_group_layouts: &[&uniform_bind_group_layout],
                push_constant_ranges: &[],
            });

        let shape_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Shape Pipeline"),
            layout: Some(&shape_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &canvas_shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x2,
                        1 => Float32x2,
                        2 => Float32x4,
                        3 => Float32
                    ],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &canvas_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: CANVAS_FORMAT,
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
            multiview: None,
            cache: None,
        });

        // Create blit pipeline (canvas -> swapchain)
        let blit_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Blit Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let blit_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Blit Pipeline Layout"),
                bind_group_layouts: &[&blit_bind_group_layout],
                push_constant_ranges: &[],
            });

        let blit_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Blit Pipeline"),
            layout: Some(&blit_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &blit_shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &blit_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: None,
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
            multiview: None,
            cache: None,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Canvas Sampler"),
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let canvas = create_canvas(&device, &blit_bind_group_layout, &sampler, canvas_size);

        // Room for the fade rect, 128 bars and a few thousand particles
        let vertex_capacity = 6 * 4096;
        let vertex_buffer = create_vertex_buffer(&device, vertex_capacity);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            shape_pipeline,
            blit_pipeline,
            uniform_buffer,
            uniform_bind_group,
            blit_bind_group_layout,
            sampler,
            canvas,
            vertex_buffer,
            vertex_capacity,
            vertices: Vec::with_capacity(vertex_capacity),
        })
    }

    /// Track a new window size; the canvas is recreated (and cleared) when
    /// the drawing surface changed
    pub fn resize(&mut self, window_width: u32, window_height: u32, canvas_size: RenderSurface) {
        if window_width > 0 && window_height > 0 {
            self.config.width = window_width;
            self.config.height = window_height;
            self.surface.configure(&self.device, &self.config);
        }

        if (canvas_size.width, canvas_size.height) != self.canvas.size {
            self.canvas = create_canvas(
                &self.device,
                &self.blit_bind_group_layout,
                &self.sampler,
                canvas_size,
            );
            let uniforms = CanvasUniforms {
                size: [canvas_size.width as f32, canvas_size.height as f32],
                _padding: [0.0; 2],
            };
            self.queue
                .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));
        }
    }

    /// Reconfigure after a lost or outdated surface
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Paint a frame onto the canvas and present it
    pub fn render(&mut self, frame: &Frame) -> Result<(), wgpu::SurfaceError> {
        tessellate(frame, &mut self.vertices);
        if self.vertices.len() > self.vertex_capacity {
            self.vertex_capacity = self.vertices.len().next_power_of_two();
            self.vertex_buffer = create_vertex_buffer(&self.device, self.vertex_capacity);
        }
        self.queue
            .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&self.vertices));

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let load = if self.canvas.fresh {
                wgpu::LoadOp::Clear(wgpu::Color::BLACK)
            } else {
                wgpu::LoadOp::Load
            };
            let mut canvas_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Canvas Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.canvas.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if !self.vertices.is_empty() {
                canvas_pass.set_pipeline(&self.shape_pipeline);
                canvas_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                canvas_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
                canvas_pass.draw(0..self.vertices.len() as u32, 0..1);
            }
        }
        self.canvas.fresh = false;

        {
            let mut blit_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Blit Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            // Canvas covers the top of the window (height fraction)
            let (width, height) = self.canvas.size;
            blit_pass.set_viewport(
                0.0,
                0.0,
                width.min(self.config.width) as f32,
                height.min(self.config.height) as f32,
                0.0,
                1.0,
            );
            blit_pass.set_pipeline(&self.blit_pipeline);
            blit_pass.set_bind_group(0, &self.canvas.blit_bind_group, &[]);
            blit_pass.draw(0..3, 0..1); // Fullscreen triangle
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn create_vertex_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Shape Vertex Buffer"),
        size: (capacity * std::mem::size_of::<Vertex>()) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_canvas(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    size: RenderSurface,
) -> Canvas {
    let (width, height) = (size.width.max(1), size.height.max(1));
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Canvas Texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: CANVAS_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    let blit_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Blit Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });

    Canvas {
        _texture: texture,
        view,
        blit_bind_group,
        size: (size.width, size.height),
        fresh: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::{Color, Hsl};
    use glam::Vec2;

    #[test]
    fn test_vertex_layout() {
        assert_eq!(std::mem::size_of::<Vertex>(), 36);
        assert_eq!(std::mem::size_of::<CanvasUniforms>(), 16);
    }

    #[test]
    fn test_tessellate_rect() {
        let mut frame = Frame::default();
        frame.push(DrawCommand::Fade {
            rect: Rect::new(0.0, 0.0, 100.0, 50.0),
            color: Color::BLACK,
            alpha: 0.15,
        });

        let mut vertices = Vec::new();
        tessellate(&frame, &mut vertices);
        assert_eq!(vertices.len(), 6);
        assert!(vertices.iter().all(|v| v.shape == SHAPE_RECT));
        assert!(vertices.iter().all(|v| v.color == [0.0, 0.0, 0.0, 0.15]));
        assert_eq!(vertices[5].position, [100.0, 50.0]);
    }

    #[test]
    fn test_tessellate_circle_bounds() {
        let mut frame = Frame::default();
        frame.push(DrawCommand::Circle {
            center: Vec2::new(10.0, 20.0),
            radius: 4.0,
            color: Color::Hsl(Hsl::new(0.0, 100.0, 50.0)),
            alpha: 0.5,
        });

        let mut vertices = Vec::new();
        tessellate(&frame, &mut vertices);
        assert_eq!(vertices.len(), 6);
        assert_eq!(vertices[0].position, [6.0, 16.0]);
        assert_eq!(vertices[0].local, [-1.0, -1.0]);
        assert_eq!(vertices[5].position, [14.0, 24.0]);
        assert_eq!(vertices[5].local, [1.0, 1.0]);
        assert_eq!(vertices[0].color[3], 0.5);
        assert!(vertices.iter().all(|v| v.shape == SHAPE_DISC));
    }

    #[test]
    fn test_transparent_circle_skipped() {
        let mut frame = Frame::default();
        frame.push(DrawCommand::Circle {
            center: Vec2::ZERO,
            radius: 3.0,
            color: Color::BLACK,
            alpha: 0.0,
        });

        let mut vertices = vec![Vertex::zeroed()];
        tessellate(&frame, &mut vertices);
        assert!(vertices.is_empty());
    }
}
