use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::core::Viewport;
use crate::geometry::Vertex;
use crate::math::Rgb;
use crate::scene::{Drawable, Material, MeshHandle, NodeId, Scene};
use crate::traits::{RenderFrame, RenderSurface, SceneRenderer};
use crate::uniforms::{OverlayGpu, WaterGpu};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Per-frame camera, light and fog block shared by the mesh and water shaders
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct GlobalsGpu {
    view_proj: [[f32; 4]; 4],
    camera_position: [f32; 4],
    ambient: [f32; 4],
    light_color: [f32; 4],
    light_direction: [f32; 4],
    fog_color: [f32; 4],
    /// near, far, enabled
    fog_range: [f32; 4],
}

impl GlobalsGpu {
    fn new(frame: &RenderFrame<'_>) -> Self {
        let lighting = frame.scene.lighting();
        let (fog_color, fog_range) = match frame.scene.fog {
            Some(fog) => (fog.color.to_linear(), [fog.near, fog.far, 1.0, 0.0]),
            None => ([0.0; 3], [0.0; 4]),
        };
        Self {
            view_proj: frame.camera.view_projection().to_cols_array_2d(),
            camera_position: frame.camera.position.extend(1.0).to_array(),
            ambient: lighting.ambient.extend(0.0).to_array(),
            light_color: lighting.directional.extend(0.0).to_array(),
            light_direction: lighting.direction.extend(0.0).to_array(),
            fog_color: [fog_color[0], fog_color[1], fog_color[2], 1.0],
            fog_range,
        }
    }
}

/// Per-node block: transform plus flat material color
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct ObjectGpu {
    model: [[f32; 4]; 4],
    normal_matrix: [[f32; 4]; 4],
    color: [f32; 4],
    /// x: 1 when lit
    params: [f32; 4],
}

impl ObjectGpu {
    fn new(drawable: &Drawable) -> Self {
        let (color, lit) = match drawable.material {
            Material::Basic { color } => (color, 0.0),
            Material::Lambert { color } => (color, 1.0),
            Material::Water | Material::Overlay => (Rgb::WHITE, 0.0),
        };
        let [r, g, b] = color.to_linear();
        Self {
            model: drawable.world.to_cols_array_2d(),
            normal_matrix: normal_matrix(drawable.world).to_cols_array_2d(),
            color: [r, g, b, 1.0],
            params: [lit, 0.0, 0.0, 0.0],
        }
    }
}

fn normal_matrix(world: Mat4) -> Mat4 {
    if world.determinant().abs() < f32::EPSILON {
        return Mat4::IDENTITY;
    }
    world.inverse().transpose()
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

struct ObjectSlot {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Offscreen color and depth at the render pixel ratio
struct RenderTarget {
    size: (u32, u32),
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    display_bind_group: wgpu::BindGroup,
}

/// egui output kept between `run_ui` and `render`
struct PendingUi {
    shapes: Vec<egui::epaint::ClippedShape>,
    textures_delta: egui::TexturesDelta,
    pixels_per_point: f32,
}

/// wgpu scene renderer with an egui overlay
///
/// The scene is drawn into an offscreen target sized by the viewport's pixel
/// ratio, stretched onto the window surface, then egui is drawn on top.
pub struct Renderer {
    window: Arc<Window>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    target: RenderTarget,
    /// Latest size and pixel ratio pushed through `RenderSurface`
    viewport: Viewport,

    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    object_layout: wgpu::BindGroupLayout,
    water_buffer: wgpu::Buffer,
    water_bind_group: wgpu::BindGroup,
    overlay_buffer: wgpu::Buffer,
    overlay_bind_group: wgpu::BindGroup,

    mesh_pipeline: wgpu::RenderPipeline,
    water_pipeline: wgpu::RenderPipeline,
    overlay_pipeline: wgpu::RenderPipeline,
    display_pipeline: wgpu::RenderPipeline,
    display_layout: wgpu::BindGroupLayout,
    display_sampler: wgpu::Sampler,

    meshes: HashMap<MeshHandle, GpuMesh>,
    objects: HashMap<NodeId, ObjectSlot>,

    egui_renderer: egui_wgpu::Renderer,
    egui_state: egui_winit::State,
    egui_ctx: egui::Context,
    pending_ui: Option<PendingUi>,
}

impl Renderer {
    pub async fn new(window: Arc<Window>, viewport: Viewport) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("Failed to create surface")?;
        let adapter = Self::request_adapter(&instance, &surface).await?;
        let (device, queue) = Self::request_device(&adapter).await?;

        let surface_config = Self::create_surface_config(&surface, &adapter, size)?;
        surface.configure(&device, &surface_config);

        let uniform_layout = |label: &str, visibility: wgpu::ShaderStages| {
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(label),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            })
        };
        let globals_layout = uniform_layout("Globals Layout", wgpu::ShaderStages::VERTEX_FRAGMENT);
        let object_layout = uniform_layout("Object Layout", wgpu::ShaderStages::VERTEX_FRAGMENT);
        let water_layout = uniform_layout("Water Layout", wgpu::ShaderStages::VERTEX_FRAGMENT);
        let overlay_layout = uniform_layout("Overlay Layout", wgpu::ShaderStages::FRAGMENT);

        let (globals_buffer, globals_bind_group) = Self::create_uniform(
            &device,
            "Globals",
            &globals_layout,
            std::mem::size_of::<GlobalsGpu>(),
        );
        let (water_buffer, water_bind_group) =
            Self::create_uniform(&device, "Water", &water_layout, std::mem::size_of::<WaterGpu>());
        let (overlay_buffer, overlay_bind_group) = Self::create_uniform(
            &device,
            "Overlay",
            &overlay_layout,
            std::mem::size_of::<OverlayGpu>(),
        );

        let mesh_shader = device.create_shader_module(wgpu::include_wgsl!("shaders/mesh.wgsl"));
        let water_shader = device.create_shader_module(wgpu::include_wgsl!("shaders/water.wgsl"));
        let overlay_shader = device.create_shader_module(wgpu::include_wgsl!("shaders/overlay.wgsl"));
        let display_shader = device.create_shader_module(wgpu::include_wgsl!("shaders/display.wgsl"));

        let opaque_depth = wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        };

        let mesh_pipeline = Self::create_scene_pipeline(
            &device,
            "Mesh",
            &mesh_shader,
            &[&globals_layout, &object_layout],
            None,
            opaque_depth.clone(),
        );
        let water_pipeline = Self::create_scene_pipeline(
            &device,
            "Water",
            &water_shader,
            &[&globals_layout, &object_layout, &water_layout],
            None,
            opaque_depth,
        );
        // Drawn last over everything, never occluded
        let overlay_pipeline = Self::create_scene_pipeline(
            &device,
            "Overlay",
            &overlay_shader,
            &[&overlay_layout],
            Some(wgpu::BlendState::ALPHA_BLENDING),
            wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Always,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            },
        );

        let display_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Display Layout"),
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
        let display_pipeline =
            Self::create_display_pipeline(&device, &display_shader, &display_layout, surface_config.format);
        let display_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let target = Self::create_target(
            &device,
            &display_layout,
            &display_sampler,
            viewport.physical_size(),
        );

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(
            &device,
            surface_config.format,
            egui_wgpu::RendererOptions::default(),
        );

        log::info!(
            "Renderer initialized: surface {}x{} {:?}, target {}x{}",
            surface_config.width,
            surface_config.height,
            surface_config.format,
            target.size.0,
            target.size.1
        );

        Ok(Self {
            window,
            device,
            queue,
            surface,
            surface_config,
            target,
            viewport,
            globals_buffer,
            globals_bind_group,
            object_layout,
            water_buffer,
            water_bind_group,
            overlay_buffer,
            overlay_bind_group,
            mesh_pipeline,
            water_pipeline,
            overlay_pipeline,
            display_pipeline,
            display_layout,
            display_sampler,
            meshes: HashMap::new(),
            objects: HashMap::new(),
            egui_renderer,
            egui_state,
            egui_ctx,
            pending_ui: None,
        })
    }

    async fn request_adapter(instance: &wgpu::Instance, surface: &wgpu::Surface<'_>) -> Result<wgpu::Adapter> {
        instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(surface),
                force_fallback_adapter: false,
            })
            .await
            .context("Failed to find appropriate adapter")
    }

    async fn request_device(adapter: &wgpu::Adapter) -> Result<(wgpu::Device, wgpu::Queue)> {
        adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                experimental_features: Default::default(),
                trace: Default::default(),
            })
            .await
            .context("Failed to create device")
    }

    fn create_surface_config(
        surface: &wgpu::Surface,
        adapter: &wgpu::Adapter,
        size: winit::dpi::PhysicalSize<u32>,
    ) -> Result<wgpu::SurfaceConfiguration> {
        let surface_caps = surface.get_capabilities(adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| anyhow!("Surface reports no supported formats"))?;

        Ok(wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        })
    }

    fn create_uniform(
        device: &wgpu::Device,
        label: &str,
        layout: &wgpu::BindGroupLayout,
        size: usize,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: size as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        (buffer, bind_group)
    }

    fn create_scene_pipeline(
        device: &wgpu::Device,
        label: &str,
        shader: &wgpu::ShaderModule,
        bind_group_layouts: &[&wgpu::BindGroupLayout],
        blend: Option<wgpu::BlendState>,
        depth_stencil: wgpu::DepthStencilState,
    ) -> wgpu::RenderPipeline {
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts,
            push_constant_ranges: &[],
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: TARGET_FORMAT,
                    blend,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Floor and water are seen from both sides when orbiting
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(depth_stencil),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        })
    }

    fn create_display_pipeline(
        device: &wgpu::Device,
        shader: &wgpu::ShaderModule,
        bind_group_layout: &wgpu::BindGroupLayout,
        format: wgpu::TextureFormat,
    ) -> wgpu::RenderPipeline {
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Display Pipeline Layout"),
            bind_group_layouts: &[bind_group_layout],
            push_constant_ranges: &[],
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Display Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
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
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        })
    }

    fn create_target(
        device: &wgpu::Device,
        display_layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        size: (u32, u32),
    ) -> RenderTarget {
        let extent = wgpu::Extent3d {
            width: size.0.max(1),
            height: size.1.max(1),
            depth_or_array_layers: 1,
        };
        let texture = |label: &str, format: wgpu::TextureFormat, usage: wgpu::TextureUsages| {
            device
                .create_texture(&wgpu::TextureDescriptor {
                    label: Some(label),
                    size: extent,
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format,
                    usage,
                    view_formats: &[],
                })
                .create_view(&wgpu::TextureViewDescriptor::default())
        };

        let color_view = texture(
            "Scene Color",
            TARGET_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        );
        let depth_view = texture("Scene Depth", DEPTH_FORMAT, wgpu::TextureUsages::RENDER_ATTACHMENT);

        let display_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Display Bind Group"),
            layout: display_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&color_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        RenderTarget {
            size: (extent.width, extent.height),
            color_view,
            depth_view,
            display_bind_group,
        }
    }

    /// Let egui see a window event; true when egui consumed it
    pub fn handle_event(&mut self, event: &winit::event::WindowEvent) -> bool {
        self.egui_state.on_window_event(&self.window, event).consumed
    }

    fn reconfigure_surface(&mut self) {
        let size = self.window.inner_size();
        if size.width == 0 || size.height == 0 {
            return;
        }
        self.surface_config.width = size.width;
        self.surface_config.height = size.height;
        self.surface.configure(&self.device, &self.surface_config);
        log::debug!("Surface configured to {}x{}", size.width, size.height);
    }

    /// Bring the surface and offscreen target in line with the window and viewport
    fn sync_sizes(&mut self, viewport: Viewport) {
        let window_size = self.window.inner_size();
        if (window_size.width, window_size.height) != (self.surface_config.width, self.surface_config.height) {
            self.reconfigure_surface();
        }

        let physical = viewport.physical_size();
        if physical != self.target.size {
            self.target = Self::create_target(
                &self.device,
                &self.display_layout,
                &self.display_sampler,
                physical,
            );
            log::debug!("Render target resized to {}x{}", physical.0, physical.1);
        }
    }

    fn upload_mesh(&mut self, scene: &Scene, handle: MeshHandle) {
        if self.meshes.contains_key(&handle) {
            return;
        }
        let Some(data) = scene.mesh(handle) else {
            log::warn!("Drawable references missing mesh {}", handle.index());
            return;
        };

        let vertices = data.to_vertices();
        let vertex_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertices"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Indices"),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        log::debug!(
            "Uploaded mesh {}: {} vertices, {} triangles",
            handle.index(),
            data.vertex_count(),
            data.triangle_count()
        );

        self.meshes.insert(
            handle,
            GpuMesh {
                vertex_buffer,
                index_buffer,
                index_count: data.indices.len() as u32,
            },
        );
    }

    fn write_object(&mut self, drawable: &Drawable) {
        let object = ObjectGpu::new(drawable);
        let slot = self.objects.entry(drawable.node).or_insert_with(|| {
            let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Object"),
                size: std::mem::size_of::<ObjectGpu>() as wgpu::BufferAddress,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Object"),
                layout: &self.object_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            });
            ObjectSlot { buffer, bind_group }
        });
        self.queue.write_buffer(&slot.buffer, 0, bytemuck::cast_slice(&[object]));
    }

    fn draw_scene(&self, encoder: &mut wgpu::CommandEncoder, drawables: &[Drawable], background: Rgb) {
        let [r, g, b] = background.to_linear();
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: r as f64,
                        g: g as f64,
                        b: b as f64,
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.target.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        for drawable in drawables {
            let (Some(mesh), Some(object)) = (self.meshes.get(&drawable.mesh), self.objects.get(&drawable.node))
            else {
                continue;
            };

            match drawable.material {
                Material::Basic { .. } | Material::Lambert { .. } => {
                    render_pass.set_pipeline(&self.mesh_pipeline);
                    render_pass.set_bind_group(0, &self.globals_bind_group, &[]);
                    render_pass.set_bind_group(1, &object.bind_group, &[]);
                }
                Material::Water => {
                    render_pass.set_pipeline(&self.water_pipeline);
                    render_pass.set_bind_group(0, &self.globals_bind_group, &[]);
                    render_pass.set_bind_group(1, &object.bind_group, &[]);
                    render_pass.set_bind_group(2, &self.water_bind_group, &[]);
                }
                Material::Overlay => {
                    render_pass.set_pipeline(&self.overlay_pipeline);
                    render_pass.set_bind_group(0, &self.overlay_bind_group, &[]);
                }
            }

            render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }

    fn draw_display(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Display Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        render_pass.set_pipeline(&self.display_pipeline);
        render_pass.set_bind_group(0, &self.target.display_bind_group, &[]);
        render_pass.draw(0..3, 0..1);
    }

    fn draw_ui(&mut self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        let Some(ui) = self.pending_ui.take() else {
            return;
        };

        let tris = self.egui_ctx.tessellate(ui.shapes, ui.pixels_per_point);
        for (id, image_delta) in &ui.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.surface_config.width, self.surface_config.height],
            pixels_per_point: ui.pixels_per_point,
        };
        self.egui_renderer
            .update_buffers(&self.device, &self.queue, encoder, &tris, &screen_descriptor);

        {
            let mut render_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: None,
                    occlusion_query_set: None,
                    timestamp_writes: None,
                })
                .forget_lifetime();
            self.egui_renderer
                .render(&mut render_pass, &tris, &screen_descriptor);
        }

        for id in &ui.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

impl RenderSurface for Renderer {
    fn set_size(&mut self, width: u32, height: u32) {
        self.viewport.width = width;
        self.viewport.height = height;
    }

    fn set_pixel_ratio(&mut self, ratio: f64) {
        self.viewport.pixel_ratio = ratio;
    }
}

impl SceneRenderer for Renderer {
    fn run_ui(&mut self, build: &mut dyn FnMut(&egui::Context)) {
        let raw_input = self.egui_state.take_egui_input(&self.window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| build(ctx));

        self.egui_state
            .handle_platform_output(&self.window, full_output.platform_output);

        // A frame skipped after a lost surface must not drop texture uploads
        let textures_delta = match self.pending_ui.take() {
            Some(mut previous) => {
                previous.textures_delta.append(full_output.textures_delta);
                previous.textures_delta
            }
            None => full_output.textures_delta,
        };
        self.pending_ui = Some(PendingUi {
            shapes: full_output.shapes,
            textures_delta,
            pixels_per_point: full_output.pixels_per_point,
        });
    }

    fn render(&mut self, frame: &RenderFrame<'_>) -> Result<()> {
        let window_size = self.window.inner_size();
        if window_size.width == 0 || window_size.height == 0 {
            return Ok(());
        }
        self.sync_sizes(self.viewport);

        let drawables = frame.scene.drawables();
        for drawable in &drawables {
            self.upload_mesh(frame.scene, drawable.mesh);
            self.write_object(drawable);
        }

        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::cast_slice(&[GlobalsGpu::new(frame)]));
        self.queue
            .write_buffer(&self.water_buffer, 0, bytemuck::cast_slice(&[WaterGpu::pack(frame.water)?]));
        self.queue.write_buffer(
            &self.overlay_buffer,
            0,
            bytemuck::cast_slice(&[OverlayGpu::pack(frame.overlay)?]),
        );

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost or outdated, reconfiguring");
                self.reconfigure_surface();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Surface texture timed out, skipping frame");
                return Ok(());
            }
            Err(e) => return Err(anyhow!("Failed to acquire surface texture: {}", e)),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Encoder"),
            });

        self.draw_scene(&mut encoder, &drawables, frame.scene.background);
        self.draw_display(&mut encoder, &view);
        self.draw_ui(&mut encoder, &view);

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn request_next_frame(&self) {
        self.window.request_redraw();
    }
}
