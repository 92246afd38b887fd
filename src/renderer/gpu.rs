//! wgpu frame backend
//!
//! wgpu orders acquire, submit and present on its own, so semaphores carry no
//! data here. Completion fences are flags raised from
//! `Queue::on_submitted_work_done` and waited on by polling the device.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use glam::Vec2;
use winit::window::Window;

use super::commands::DrawSequence;
use super::frames::{Acquire, BackendError, FrameBackend, PresentStatus, SubmitSignals, SurfaceSize};
use super::shapes::{MeshId, MeshLibrary};
use super::vertex::{Vertex, colors, modulate};
use crate::settings::Settings;
use crate::sim::World;

/// Longest a fence wait may take before the GPU is considered hung
const FENCE_TIMEOUT: Duration = Duration::from_secs(2);

/// Map a world position to normalized device coordinates
///
/// x in `[0, world_width]` fills the viewport; the visible height follows the
/// aspect ratio with y = 0 at the bottom edge.
pub fn world_to_ndc(p: Vec2, world_width: f32, size: SurfaceSize) -> Vec2 {
    let aspect = size.width.max(1) as f32 / size.height.max(1) as f32;
    let visible_height = world_width / aspect;
    Vec2::new(
        p.x / world_width * 2.0 - 1.0,
        p.y / visible_height * 2.0 - 1.0,
    )
}

/// Swapchain latency matching the number of frame slots in flight
pub fn frame_latency(frames_in_flight: usize) -> u32 {
    u32::try_from(frames_in_flight).unwrap_or(u32::MAX).max(1)
}

/// Completion flag raised by the queue
#[derive(Debug, Clone)]
pub struct GpuFence(Arc<AtomicBool>);

impl GpuFence {
    fn is_signaled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Acquired swapchain image
pub struct SurfaceImage {
    texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
}

/// Per-slot recording target: a vertex buffer and the command buffer built
/// against it
pub struct SlotRecorder {
    vertices: Vec<Vertex>,
    buffer: wgpu::Buffer,
    capacity: usize,
    commands: Option<wgpu::CommandBuffer>,
}

pub struct WgpuBackend {
    surface: Option<wgpu::Surface<'static>>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    meshes: MeshLibrary,
    world_width: f32,
    recorder_count: usize,
}

impl WgpuBackend {
    pub async fn new(
        window: Arc<Window>,
        world: &World,
        settings: &Settings,
    ) -> Result<Self, BackendError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        let surface = instance
            .create_surface(window.clone())
            .map_err(|e| BackendError::Init(format!("no presentation surface: {e}")))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| BackendError::Init(format!("no suitable adapter: {e}")))?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("luna-lander-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await
            .map_err(|e| BackendError::Init(format!("device request failed: {e}")))?;

        let surface_caps = surface.get_capabilities(&adapter);
        log::debug!("Surface formats: {:?}", surface_caps.formats);
        log::debug!("Surface present modes: {:?}", surface_caps.present_modes);

        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| BackendError::Init("surface is incompatible with the adapter".into()))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        log::info!("Using surface format: {:?}", surface_format);

        let size = window.inner_size();
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if settings.window.vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: frame_latency(settings.frames_in_flight),
        };
        // A minimised window is configured later, on the first rebuild
        if size.width > 0 && size.height > 0 {
            surface.configure(&device, &config);
        }

        let pipeline = create_pipeline(&device, config.format);
        let meshes = MeshLibrary::build(world);
        log::info!("Built {} mesh vertices", meshes.total_vertices());

        Ok(Self {
            surface: Some(surface),
            device,
            queue,
            config,
            pipeline,
            meshes,
            world_width: world.terrain.world_width(),
            recorder_count: 0,
        })
    }

    fn surface(&self) -> Result<&wgpu::Surface<'static>, BackendError> {
        self.surface.as_ref().ok_or(BackendError::SurfaceReleased)
    }

    fn size(&self) -> SurfaceSize {
        SurfaceSize::new(self.config.width, self.config.height)
    }

    fn create_vertex_buffer(&self, capacity: usize) -> wgpu::Buffer {
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("slot_vertex_buffer"),
            size: (capacity * std::mem::size_of::<Vertex>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Transform every command's mesh into NDC vertices
    fn flatten(&self, draws: &DrawSequence, out: &mut Vec<Vertex>) {
        let size = self.size();
        for command in draws.commands() {
            for v in self.meshes.get(command.mesh) {
                let world = command.transform.transform_point2(v.pos());
                let ndc = world_to_ndc(world, self.world_width, size);
                out.push(Vertex::at(ndc, modulate(v.color, command.tint)));
            }
        }
    }
}

fn create_pipeline(device: &wgpu::Device, format: wgpu::TextureFormat) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("pipeline_layout"),
        bind_group_layouts: &[],
        immediate_size: 0,
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("render_pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::desc()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
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
    })
}

impl FrameBackend for WgpuBackend {
    type Image = SurfaceImage;
    type Fence = GpuFence;
    type Semaphore = ();
    type Recorder = SlotRecorder;

    fn create_fence(&mut self, signaled: bool) -> Result<GpuFence, BackendError> {
        Ok(GpuFence(Arc::new(AtomicBool::new(signaled))))
    }

    fn create_semaphore(&mut self) -> Result<(), BackendError> {
        Ok(())
    }

    fn create_recorder(&mut self) -> Result<SlotRecorder, BackendError> {
        // Room for every mesh plus a wrap ghost of the lander and flame
        let capacity = self.meshes.total_vertices()
            + self.meshes.get(MeshId::Lander).len()
            + self.meshes.get(MeshId::Flame).len();
        self.recorder_count += 1;
        log::debug!("Creating recorder {}", self.recorder_count);
        Ok(SlotRecorder {
            vertices: Vec::with_capacity(capacity),
            buffer: self.create_vertex_buffer(capacity),
            capacity,
            commands: None,
        })
    }

    fn wait_fence(&mut self, fence: &GpuFence) -> Result<(), BackendError> {
        let start = Instant::now();
        while !fence.is_signaled() {
            self.device
                .poll(wgpu::PollType::Poll)
                .map_err(|e| BackendError::Device(e.to_string()))?;
            if fence.is_signaled() {
                break;
            }
            if start.elapsed() > FENCE_TIMEOUT {
                return Err(BackendError::Timeout(FENCE_TIMEOUT));
            }
            std::thread::yield_now();
        }
        Ok(())
    }

    fn reset_fence(&mut self, fence: &GpuFence) -> Result<(), BackendError> {
        fence.0.store(false, Ordering::Release);
        Ok(())
    }

    fn acquire_next_image(&mut self, _: &()) -> Result<Acquire<SurfaceImage>, BackendError> {
        match self.surface()?.get_current_texture() {
            Ok(texture) => {
                let view = texture
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                Ok(Acquire::Ready(SurfaceImage { texture, view }))
            }
            Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => Ok(Acquire::Stale),
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Timed out acquiring a surface image");
                Ok(Acquire::Stale)
            }
            Err(wgpu::SurfaceError::OutOfMemory) => Err(BackendError::OutOfMemory),
            Err(e) => Err(BackendError::Surface(e.to_string())),
        }
    }

    fn reset_recorder(&mut self, recorder: &mut SlotRecorder) -> Result<(), BackendError> {
        recorder.vertices.clear();
        recorder.commands = None;
        Ok(())
    }

    fn record(
        &mut self,
        recorder: &mut SlotRecorder,
        image: &SurfaceImage,
        draws: &DrawSequence,
    ) -> Result<(), BackendError> {
        self.flatten(draws, &mut recorder.vertices);
        if recorder.vertices.len() > recorder.capacity {
            recorder.capacity = recorder.vertices.len().next_power_of_two();
            recorder.buffer = self.create_vertex_buffer(recorder.capacity);
        }
        self.queue
            .write_buffer(&recorder.buffer, 0, bytemuck::cast_slice(&recorder.vertices));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("render_encoder"),
            });

        {
            let [r, g, b, a] = colors::BACKGROUND.map(f64::from);
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &image.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            if !recorder.vertices.is_empty() {
                render_pass.set_pipeline(&self.pipeline);
                render_pass.set_vertex_buffer(0, recorder.buffer.slice(..));
                render_pass.draw(0..recorder.vertices.len() as u32, 0..1);
            }
        }

        recorder.commands = Some(encoder.finish());
        Ok(())
    }

    fn submit(
        &mut self,
        recorder: &mut SlotRecorder,
        _: &(),
        signals: SubmitSignals<'_, GpuFence, ()>,
    ) -> Result<(), BackendError> {
        let commands = recorder
            .commands
            .take()
            .ok_or_else(|| BackendError::Device("submit without recorded commands".into()))?;
        self.queue.submit(std::iter::once(commands));

        let done = Arc::clone(&signals.completion.0);
        self.queue
            .on_submitted_work_done(move || done.store(true, Ordering::Release));
        Ok(())
    }

    fn present(&mut self, image: SurfaceImage, _: &()) -> Result<PresentStatus, BackendError> {
        let SurfaceImage { texture, view } = image;
        drop(view);
        let suboptimal = texture.suboptimal;
        texture.present();
        if suboptimal {
            Ok(PresentStatus::Stale)
        } else {
            Ok(PresentStatus::Presented)
        }
    }

    fn rebuild_surface(&mut self, size: SurfaceSize) -> Result<(), BackendError> {
        self.config.width = size.width;
        self.config.height = size.height;
        let surface = self.surface()?;
        surface.configure(&self.device, &self.config);
        Ok(())
    }

    fn destroy_recorder(&mut self, recorder: SlotRecorder) {
        recorder.buffer.destroy();
    }

    fn destroy_semaphore(&mut self, _: ()) {}

    fn destroy_fence(&mut self, fence: GpuFence) {
        if !fence.is_signaled() {
            log::warn!("Releasing a fence that never signaled");
        }
    }

    fn destroy_surface(&mut self) {
        if self.surface.take().is_some() {
            log::info!("Presentation surface released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_to_ndc_corners() {
        let size = SurfaceSize::new(1280, 720);
        let width = 40.0;
        let height = width * 720.0 / 1280.0;

        assert_eq!(world_to_ndc(Vec2::ZERO, width, size), Vec2::new(-1.0, -1.0));
        let top_right = world_to_ndc(Vec2::new(width, height), width, size);
        assert!((top_right - Vec2::ONE).length() < 1e-5);
        let centre = world_to_ndc(Vec2::new(width / 2.0, height / 2.0), width, size);
        assert!(centre.length() < 1e-5);
    }

    #[test]
    fn test_world_to_ndc_follows_aspect() {
        // A square window shows the full width and an equally tall slice
        let p = world_to_ndc(Vec2::new(20.0, 40.0), 40.0, SurfaceSize::new(500, 500));
        assert_eq!(p, Vec2::new(0.0, 1.0));
    }

    #[test]
    fn test_frame_latency_follows_slot_count() {
        assert_eq!(frame_latency(Settings::default().frames_in_flight), 2);
        assert_eq!(frame_latency(3), 3);
        assert_eq!(frame_latency(0), 1);
    }

    #[test]
    fn test_world_to_ndc_zero_size_is_finite() {
        let p = world_to_ndc(Vec2::new(5.0, 5.0), 40.0, SurfaceSize::new(0, 0));
        assert!(p.is_finite());
    }
}
