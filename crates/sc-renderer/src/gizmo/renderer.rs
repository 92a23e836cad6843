//! wgpu renderer for manipulator gizmos

use bytemuck::{Pod, Zeroable};
use glam::{DMat4, Mat4};
use wgpu::util::DeviceExt;

use super::geometry::{
    GizmoVertex, generate_rotation_gizmo, generate_scale_gizmo, generate_translation_gizmo,
};
use super::{GizmoDrawList, GizmoShape};
use crate::config::GizmoConfig;
use crate::constants::gizmo::MAX_INSTANCES;

/// Errors raised while creating GPU resources for gizmos
#[derive(Debug, thiserror::Error)]
pub enum GizmoRendererError {
    /// The gizmo shader or pipeline failed validation
    #[error("Gizmo shader failed to compile: {0}")]
    ShaderCompilation(String),
    /// No GPU adapter is available
    #[error("No compatible GPU adapter found")]
    NoAdapter,
    /// The adapter refused to create a device
    #[error("Failed to create GPU device: {0}")]
    RequestDevice(String),
}

/// Camera uniform
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GizmoCameraUniform {
    /// Projection times view
    pub view_proj: [[f32; 4]; 4],
}

impl GizmoCameraUniform {
    /// Uniform for the given view and projection matrices
    pub fn new(view: &DMat4, projection: &DMat4) -> Self {
        Self {
            view_proj: (*projection * *view).as_mat4().to_cols_array_2d(),
        }
    }
}

/// Axis colors uniform
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct GizmoStyleUniform {
    x_axis_color: [f32; 4],
    y_axis_color: [f32; 4],
    z_axis_color: [f32; 4],
    highlight_color: [f32; 4],
}

impl From<&GizmoConfig> for GizmoStyleUniform {
    fn from(config: &GizmoConfig) -> Self {
        Self {
            x_axis_color: config.x_axis_color,
            y_axis_color: config.y_axis_color,
            z_axis_color: config.z_axis_color,
            highlight_color: config.highlight_color,
        }
    }
}

/// Gizmo instance data
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GizmoInstance {
    /// Manipulator frame
    pub transform: [[f32; 4]; 4],
    /// Uniform size
    pub scale: f32,
    /// -1 = none, 0 = X, 1 = Y, 2 = Z
    pub highlighted_axis: f32,
    /// Padding
    pub _pad: [f32; 2],
}

impl Default for GizmoInstance {
    fn default() -> Self {
        Self {
            transform: Mat4::IDENTITY.to_cols_array_2d(),
            scale: 1.0,
            highlighted_axis: -1.0,
            _pad: [0.0; 2],
        }
    }
}

/// Vertex and index buffers of one gizmo shape
struct GizmoMesh {
    shape: GizmoShape,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl GizmoMesh {
    fn new(device: &wgpu::Device, shape: GizmoShape) -> Self {
        let (vertices, indices) = match shape {
            GizmoShape::RotationRings => generate_rotation_gizmo(),
            GizmoShape::TranslationArrows => generate_translation_gizmo(),
            GizmoShape::ScaleHandles => generate_scale_gizmo(),
        };

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Gizmo Vertex Buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Gizmo Index Buffer"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            shape,
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }
}

impl Drop for GizmoMesh {
    fn drop(&mut self) {
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
    }
}

/// Gizmo renderer.
///
/// Owns every GPU resource used to draw gizmos. Buffers are released when
/// the renderer is dropped.
pub struct GizmoRenderer {
    pipeline: wgpu::RenderPipeline,
    meshes: Vec<GizmoMesh>,
    camera_buffer: wgpu::Buffer,
    style_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    /// Shape and instance slot of each prepared draw
    batches: Vec<(GizmoShape, u32)>,
}

impl GizmoRenderer {
    /// Create the pipeline and meshes.
    ///
    /// Shader and pipeline validation errors are captured and returned
    /// instead of being reported through the device error handler.
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
        config: &GizmoConfig,
    ) -> Result<Self, GizmoRendererError> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Gizmo Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/gizmo.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Gizmo Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Gizmo Camera Buffer"),
            contents: bytemuck::cast_slice(&[GizmoCameraUniform {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let style_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Gizmo Style Buffer"),
            contents: bytemuck::cast_slice(&[GizmoStyleUniform::from(config)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Gizmo Bind Group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: style_buffer.as_entire_binding(),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Gizmo Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Gizmo Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[
                    // Vertex buffer
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<GizmoVertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &[
                            wgpu::VertexAttribute {
                                offset: 0,
                                shader_location: 0,
                                format: wgpu::VertexFormat::Float32x3,
                            },
                            wgpu::VertexAttribute {
                                offset: 12,
                                shader_location: 1,
                                format: wgpu::VertexFormat::Float32x4,
                            },
                            wgpu::VertexAttribute {
                                offset: 28,
                                shader_location: 2,
                                format: wgpu::VertexFormat::Uint32,
                            },
                        ],
                    },
                    // Instance buffer
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<GizmoInstance>() as u64,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &[
                            wgpu::VertexAttribute {
                                offset: 0,
                                shader_location: 3,
                                format: wgpu::VertexFormat::Float32x4,
                            },
                            wgpu::VertexAttribute {
                                offset: 16,
                                shader_location: 4,
                                format: wgpu::VertexFormat::Float32x4,
                            },
                            wgpu::VertexAttribute {
                                offset: 32,
                                shader_location: 5,
                                format: wgpu::VertexFormat::Float32x4,
                            },
                            wgpu::VertexAttribute {
                                offset: 48,
                                shader_location: 6,
                                format: wgpu::VertexFormat::Float32x4,
                            },
                            wgpu::VertexAttribute {
                                offset: 64,
                                shader_location: 7,
                                format: wgpu::VertexFormat::Float32x4,
                            },
                        ],
                    },
                ],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: depth_format,
                depth_write_enabled: false, // Gizmo always on top
                depth_compare: wgpu::CompareFunction::Always,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            tracing::error!("Gizmo pipeline creation failed: {}", error);
            return Err(GizmoRendererError::ShaderCompilation(error.to_string()));
        }

        let meshes = GizmoShape::ALL
            .iter()
            .map(|&shape| GizmoMesh::new(device, shape))
            .collect();

        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Gizmo Instance Buffer"),
            size: (std::mem::size_of::<GizmoInstance>() * MAX_INSTANCES) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        tracing::debug!("Gizmo renderer created");

        Ok(Self {
            pipeline,
            meshes,
            camera_buffer,
            style_buffer,
            instance_buffer,
            bind_group,
            batches: Vec::new(),
        })
    }

    /// Upload the camera and this frame's gizmos
    pub fn prepare(&mut self, queue: &wgpu::Queue, camera: GizmoCameraUniform, draws: &GizmoDrawList) {
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[camera]));

        if draws.len() > MAX_INSTANCES {
            tracing::warn!(
                "Dropping {} gizmos over the limit of {}",
                draws.len() - MAX_INSTANCES,
                MAX_INSTANCES
            );
        }

        let mut instances = Vec::with_capacity(draws.len().min(MAX_INSTANCES));
        self.batches.clear();
        for draw in draws.iter().take(MAX_INSTANCES) {
            self.batches.push((draw.shape, instances.len() as u32));
            instances.push(GizmoInstance {
                transform: draw.to_world.as_mat4().to_cols_array_2d(),
                scale: draw.scale as f32,
                highlighted_axis: draw.highlight.to_shader_index(),
                _pad: [0.0; 2],
            });
        }
        if !instances.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }
    }

    /// Record draw calls for the prepared gizmos
    pub fn render(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        if self.batches.is_empty() {
            return;
        }

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));

        for (shape, instance) in &self.batches {
            let Some(mesh) = self.meshes.iter().find(|m| m.shape == *shape) else {
                continue;
            };
            render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..mesh.index_count, 0, *instance..*instance + 1);
        }
    }

    /// Draw `draws` into an offscreen target of the given size and wait for
    /// the GPU to finish
    pub fn render_offscreen(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        size: (u32, u32),
        camera: GizmoCameraUniform,
        draws: &GizmoDrawList,
    ) {
        let extent = wgpu::Extent3d {
            width: size.0.max(1),
            height: size.1.max(1),
            depth_or_array_layers: 1,
        };
        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Gizmo Offscreen Color"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: OFFSCREEN_COLOR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let depth = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Gizmo Offscreen Depth"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: OFFSCREEN_DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());
        let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());

        self.prepare(queue, camera, draws);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Gizmo Offscreen Encoder"),
        });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Gizmo Offscreen Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.render(&mut render_pass);
        }
        queue.submit(std::iter::once(encoder.finish()));
        device.poll(wgpu::Maintain::Wait);

        color.destroy();
        depth.destroy();
    }
}

impl Drop for GizmoRenderer {
    fn drop(&mut self) {
        self.camera_buffer.destroy();
        self.style_buffer.destroy();
        self.instance_buffer.destroy();
    }
}

/// Color format of [`GizmoRenderer::render_offscreen`] targets
pub const OFFSCREEN_COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Depth format of [`GizmoRenderer::render_offscreen`] targets
pub const OFFSCREEN_DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Create a device without a surface, for offscreen rendering
pub fn headless_device() -> Result<(wgpu::Device, wgpu::Queue), GizmoRendererError> {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::default(),
        compatible_surface: None,
        force_fallback_adapter: false,
    }))
    .ok_or(GizmoRendererError::NoAdapter)?;

    tracing::info!("Using GPU adapter {}", adapter.get_info().name);

    pollster::block_on(adapter.request_device(
        &wgpu::DeviceDescriptor {
            label: Some("Gizmo Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults(),
            memory_hints: wgpu::MemoryHints::default(),
        },
        None,
    ))
    .map_err(|e| GizmoRendererError::RequestDevice(e.to_string()))
}
