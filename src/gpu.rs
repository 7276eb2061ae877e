//! GPU backend for the segment renderer
//!
//! Implements `SegmentCanvas` on wgpu. Calls made during a frame are
//! recorded; `present` uploads one uniform block per bar into a
//! dynamic-offset uniform buffer and replays the bars in a single render
//! pass on the layer surface.

use std::ffi::c_void;
use std::num::NonZeroU64;
use std::ptr::NonNull;

use bytemuck::{Pod, Zeroable};
use log::{debug, info, warn};
use raw_window_handle::{
    RawDisplayHandle, RawWindowHandle, WaylandDisplayHandle, WaylandWindowHandle,
};
use wayland_client::protocol::wl_surface::WlSurface;
use wayland_client::{Connection, Proxy};
use wgpu::util::DeviceExt;

use crate::display::geometry::{BarShape, XY};
use crate::display::{SegmentCanvas, Uniform};
use crate::error::StartupError;

/// Upper bound of bars drawn in one frame; six glyphs need at most 42
pub const MAX_BARS: usize = 64;

/// Location of the `pos` attribute in the segment program
const POSITION_LOCATION: u32 = 0;

const SEGMENT_SHADER: &str = include_str!("../shaders/segment.wgsl");

/// Uniform block of the segment program, one per bar
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SegmentUniforms {
    pub offset: [f32; 2],
    pub scale: [f32; 2],
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DrawRecord {
    uniforms: SegmentUniforms,
    shape: BarShape,
    vertex_count: u32,
}

/// Calls recorded for the frame being built
#[derive(Debug, Default)]
struct FrameRecording {
    clear: bool,
    offset: XY,
    scale: XY,
    bound: Option<BarShape>,
    draws: Vec<DrawRecord>,
}

impl FrameRecording {
    fn is_empty(&self) -> bool {
        !self.clear && self.draws.is_empty()
    }
}

impl SegmentCanvas for FrameRecording {
    fn clear(&mut self) {
        self.clear = true;
        self.draws.clear();
    }

    fn set_uniform(&mut self, uniform: Uniform, value: XY) {
        match uniform {
            Uniform::Offset => self.offset = value,
            Uniform::Scale => self.scale = value,
        }
    }

    fn bind_vertices(&mut self, shape: BarShape) {
        self.bound = Some(shape);
    }

    fn draw_triangle_strip(&mut self, vertex_count: u32) {
        let Some(shape) = self.bound else {
            warn!("Draw without bound vertices ignored");
            return;
        };
        self.draws.push(DrawRecord {
            uniforms: SegmentUniforms {
                offset: self.offset.to_array(),
                scale: self.scale.to_array(),
            },
            shape,
            vertex_count: vertex_count.min(shape.vertex_count()),
        });
    }
}

/// wgpu state bound to one Wayland surface
pub struct GpuCanvas {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_stride: u64,
    bind_group: wgpu::BindGroup,
    horizontal: wgpu::Buffer,
    vertical: wgpu::Buffer,
    frame: FrameRecording,
}

impl GpuCanvas {
    /// Create the GPU surface, device and segment program for `surface`.
    ///
    /// The connection and the surface must outlive the returned canvas.
    pub fn new(
        conn: &Connection,
        surface: &WlSurface,
        width: u32,
        height: u32,
    ) -> Result<Self, StartupError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::VULKAN | wgpu::Backends::GL,
            ..Default::default()
        });

        let display = NonNull::new(conn.backend().display_ptr() as *mut c_void)
            .ok_or(StartupError::RawHandle)?;
        let window =
            NonNull::new(surface.id().as_ptr() as *mut c_void).ok_or(StartupError::RawHandle)?;
        let target = wgpu::SurfaceTargetUnsafe::RawHandle {
            raw_display_handle: RawDisplayHandle::Wayland(WaylandDisplayHandle::new(display)),
            raw_window_handle: RawWindowHandle::Wayland(WaylandWindowHandle::new(window)),
        };
        // SAFETY: both handles stay valid for the life of the canvas, which
        // is dropped before the surface is destroyed and the connection closed.
        let gpu_surface = unsafe { instance.create_surface_unsafe(target)? };

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            force_fallback_adapter: false,
            compatible_surface: Some(&gpu_surface),
        }))
        .ok_or(StartupError::NoAdapter)?;
        info!("Using GPU adapter: {}", adapter.get_info().name);

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("segclock"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: wgpu::MemoryHints::MemoryUsage,
            },
            None,
        ))?;

        let caps = gpu_surface.get_capabilities(&adapter);
        let format = surface_format(&caps.formats)?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            desired_maximum_frame_latency: 2,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
        };
        gpu_surface.configure(&device, &config);

        let uniform_size = std::mem::size_of::<SegmentUniforms>() as u64;
        let uniform_stride = wgpu::util::align_to(
            uniform_size,
            u64::from(device.limits().min_uniform_buffer_offset_alignment),
        );

        // Shader and pipeline errors surface here, once, and are fatal
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("segment"),
            source: wgpu::ShaderSource::Wgsl(SEGMENT_SHADER.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("segment uniforms"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(uniform_size),
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("segment"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("segment"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<[f32; 2]>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x2,
                        offset: 0,
                        shader_location: POSITION_LOCATION,
                    }],
                }],
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            multiview: None,
            cache: None,
        });

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(StartupError::Shader(err.to_string()));
        }

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("segment uniforms"),
            size: uniform_stride * MAX_BARS as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("segment uniforms"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &uniform_buffer,
                    offset: 0,
                    size: NonZeroU64::new(uniform_size),
                }),
            }],
        });

        let horizontal = create_shape_buffer(&device, BarShape::Horizontal);
        let vertical = create_shape_buffer(&device, BarShape::Vertical);

        info!("GPU canvas ready ({}x{}, {:?})", config.width, config.height, format);

        Ok(Self {
            surface: gpu_surface,
            device,
            queue,
            config,
            pipeline,
            uniform_buffer,
            uniform_stride,
            bind_group,
            horizontal,
            vertical,
            frame: FrameRecording::default(),
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Reconfigure the swapchain after the surface changed size
    pub fn resize(&mut self, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        if (width, height) == self.size() {
            return;
        }
        debug!("Resizing GPU surface to {}x{}", width, height);
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
    }

    fn vertex_buffer(&self, shape: BarShape) -> &wgpu::Buffer {
        match shape {
            BarShape::Horizontal => &self.horizontal,
            BarShape::Vertical => &self.vertical,
        }
    }

    /// Submit the recorded frame. Returns whether anything was presented.
    pub fn present(&mut self) -> bool {
        let frame = std::mem::take(&mut self.frame);
        if frame.is_empty() {
            return false;
        }

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                debug!("Surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return false;
            }
            Err(e) => {
                warn!("Failed to acquire frame: {}", e);
                return false;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let draws = &frame.draws[..frame.draws.len().min(MAX_BARS)];
        if draws.len() < frame.draws.len() {
            warn!("Dropping {} bars over the per-frame limit", frame.draws.len() - draws.len());
        }

        let stride = self.uniform_stride as usize;
        let mut uniforms = vec![0u8; stride * draws.len()];
        for (block, draw) in uniforms.chunks_exact_mut(stride).zip(draws) {
            let bytes = bytemuck::bytes_of(&draw.uniforms);
            block[..bytes.len()].copy_from_slice(bytes);
        }
        if !uniforms.is_empty() {
            self.queue.write_buffer(&self.uniform_buffer, 0, &uniforms);
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("segclock frame"),
            });
        {
            let load = if frame.clear {
                wgpu::LoadOp::Clear(wgpu::Color::BLACK)
            } else {
                wgpu::LoadOp::Load
            };
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("segments"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
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
            pass.set_pipeline(&self.pipeline);
            for (i, draw) in draws.iter().enumerate() {
                let offset = (i as u64 * self.uniform_stride) as u32;
                pass.set_bind_group(0, &self.bind_group, &[offset]);
                pass.set_vertex_buffer(0, self.vertex_buffer(draw.shape).slice(..));
                pass.draw(0..draw.vertex_count, 0..1);
            }
        }

        self.queue.submit(Some(encoder.finish()));
        output.present();
        true
    }
}

impl SegmentCanvas for GpuCanvas {
    fn clear(&mut self) {
        self.frame.clear();
    }

    fn set_uniform(&mut self, uniform: Uniform, value: XY) {
        self.frame.set_uniform(uniform, value);
    }

    fn bind_vertices(&mut self, shape: BarShape) {
        self.frame.bind_vertices(shape);
    }

    fn draw_triangle_strip(&mut self, vertex_count: u32) {
        self.frame.draw_triangle_strip(vertex_count);
    }
}

/// Preferred format of the surface: the first one the adapter reports
fn surface_format(formats: &[wgpu::TextureFormat]) -> Result<wgpu::TextureFormat, StartupError> {
    formats.first().copied().ok_or(StartupError::NoSurfaceFormat)
}

fn create_shape_buffer(device: &wgpu::Device, shape: BarShape) -> wgpu::Buffer {
    let vertices = shape.vertices().map(|v| v.to_array());
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(match shape {
            BarShape::Horizontal => "horizontal bar",
            BarShape::Vertical => "vertical bar",
        }),
        contents: bytemuck::cast_slice(&vertices),
        usage: wgpu::BufferUsages::VERTEX,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::ClockRenderer;

    #[test]
    fn segment_shader_validates() {
        let module = naga::front::wgsl::parse_str(SEGMENT_SHADER).unwrap();
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::empty(),
        )
        .validate(&module)
        .unwrap();

        let has_entry = |name: &str, stage: naga::ShaderStage| {
            module
                .entry_points
                .iter()
                .any(|e| e.name == name && e.stage == stage)
        };
        assert!(has_entry("vs_main", naga::ShaderStage::Vertex));
        assert!(has_entry("fs_main", naga::ShaderStage::Fragment));
    }

    #[test]
    fn surface_without_formats_is_its_own_error() {
        assert!(matches!(surface_format(&[]), Err(StartupError::NoSurfaceFormat)));
        let formats = [wgpu::TextureFormat::Bgra8UnormSrgb, wgpu::TextureFormat::Rgba8Unorm];
        assert_eq!(surface_format(&formats).unwrap(), wgpu::TextureFormat::Bgra8UnormSrgb);
    }

    #[test]
    fn uniform_block_is_two_vec2() {
        assert_eq!(std::mem::size_of::<SegmentUniforms>(), 16);
        let block = SegmentUniforms {
            offset: [1.0, 2.0],
            scale: [3.0, 4.0],
        };
        let floats: &[f32] = bytemuck::cast_slice(bytemuck::bytes_of(&block));
        assert_eq!(floats, &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn recording_captures_uniforms_per_draw() {
        let mut frame = FrameRecording::default();
        frame.clear();
        frame.set_uniform(Uniform::Scale, XY::new(0.02, 0.04));
        frame.set_uniform(Uniform::Offset, XY::new(1.0, 2.0));
        frame.bind_vertices(BarShape::Vertical);
        frame.draw_triangle_strip(6);
        frame.set_uniform(Uniform::Offset, XY::new(3.0, 4.0));
        frame.bind_vertices(BarShape::Horizontal);
        frame.draw_triangle_strip(6);

        assert!(frame.clear);
        assert_eq!(frame.draws.len(), 2);
        assert_eq!(frame.draws[0].shape, BarShape::Vertical);
        assert_eq!(
            frame.draws[0].uniforms,
            SegmentUniforms {
                offset: [1.0, 2.0],
                scale: [0.02, 0.04]
            }
        );
        assert_eq!(frame.draws[1].uniforms.offset, [3.0, 4.0]);
        assert_eq!(frame.draws[1].shape, BarShape::Horizontal);
    }

    #[test]
    fn draw_without_bind_is_ignored() {
        let mut frame = FrameRecording::default();
        frame.draw_triangle_strip(6);
        assert!(frame.draws.is_empty());
        assert!(frame.is_empty());
    }

    #[test]
    fn vertex_count_is_capped_at_shape_size() {
        let mut frame = FrameRecording::default();
        frame.bind_vertices(BarShape::Horizontal);
        frame.draw_triangle_strip(100);
        assert_eq!(frame.draws[0].vertex_count, 6);
    }

    #[test]
    fn a_full_clock_fits_the_uniform_buffer() {
        let mut frame = FrameRecording::default();
        // 08:08:08
        let outcome = ClockRenderer::new(false).render(&mut frame, 800, 600, 29_288.0);
        assert!(matches!(outcome, crate::display::FrameOutcome::Drawn { bars } if bars <= MAX_BARS));
        assert!(frame.draws.len() <= MAX_BARS);
        assert_eq!(frame.draws.len(), 6 * 3 + 7 * 3);
    }
}
