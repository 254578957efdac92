use super::{FrameSink, FrameSnapshot};
use anyhow::{Context, Result};
use winit::dpi::PhysicalSize;

const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
const MAX_VIEWS: usize = 2;

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct ViewUniform {
    view_projection: [[f32; 4]; 4],
    background: [f32; 4],
}

struct HeadlessTarget {
    texture: wgpu::Texture,
    size: PhysicalSize<u32>,
}

/// Headless GPU backend: clears the target with the primary view's
/// background colour and uploads the per-view matrices.
pub struct GpuFrameSink {
    device: wgpu::Device,
    queue: wgpu::Queue,
    view_buffer: wgpu::Buffer,
    target: Option<HeadlessTarget>,
    frames: u64,
}

impl GpuFrameSink {
    pub fn new() -> Result<Self> {
        pollster::block_on(Self::init())
    }

    async fn init() -> Result<Self> {
        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .context("Failed to request headless adapter")?;
        let device_desc = wgpu::DeviceDescriptor {
            label: Some("Viewport Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
            experimental_features: wgpu::ExperimentalFeatures::default(),
            memory_hints: wgpu::MemoryHints::default(),
            trace: wgpu::Trace::default(),
        };
        let (device, queue) =
            adapter.request_device(&device_desc).await.context("Failed to request headless device")?;
        let view_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Viewport View Uniforms"),
            size: (std::mem::size_of::<ViewUniform>() * MAX_VIEWS) as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        log::info!("[render] headless adapter: {}", adapter.get_info().name);
        Ok(Self { device, queue, view_buffer, target: None, frames: 0 })
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    fn target_view(&mut self, size: PhysicalSize<u32>) -> Result<wgpu::TextureView> {
        let size = PhysicalSize::new(size.width.max(1), size.height.max(1));
        if self.target.as_ref().map(|target| target.size) != Some(size) {
            let texture = self.device.create_texture(&wgpu::TextureDescriptor {
                label: Some("Viewport Render Target"),
                size: wgpu::Extent3d { width: size.width, height: size.height, depth_or_array_layers: 1 },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: TARGET_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
                view_formats: &[],
            });
            self.target = Some(HeadlessTarget { texture, size });
        }
        self.target
            .as_ref()
            .map(|target| target.texture.create_view(&wgpu::TextureViewDescriptor::default()))
            .context("Render target missing")
    }
}

impl FrameSink for GpuFrameSink {
    fn render(&mut self, frame: &FrameSnapshot) -> Result<()> {
        let uniforms: Vec<ViewUniform> = frame
            .views
            .iter()
            .take(MAX_VIEWS)
            .map(|view| ViewUniform {
                view_projection: view.view_projection.to_cols_array_2d(),
                background: view.background_color.to_array(),
            })
            .collect();
        if !uniforms.is_empty() {
            self.queue.write_buffer(&self.view_buffer, 0, bytemuck::cast_slice(&uniforms));
        }

        let view = self.target_view(frame.target.size)?;
        let mut encoder =
            self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("Viewport Encoder") });
        let background = frame.views.first().map(|view| view.background_color).unwrap_or(glam::Vec4::W);
        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Viewport Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: f64::from(background.x),
                            g: f64::from(background.y),
                            b: f64::from(background.z),
                            a: f64::from(background.w),
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        self.frames += 1;
        Ok(())
    }
}
