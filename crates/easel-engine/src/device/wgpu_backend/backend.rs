use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use super::GpuInit;
use super::surface;
use crate::device::{
    AcquireOutcome, Backend, DeviceError, Extent, PresentOutcome, Submission,
};

/// Presentable surface bound to one platform window.
pub struct WgpuSurface {
    surface: Arc<wgpu::Surface<'static>>,
}

/// Configured surface plus the texture currently acquired from it.
pub struct WgpuSwapchain {
    surface: Arc<wgpu::Surface<'static>>,
    config: wgpu::SurfaceConfiguration,

    /// Holding the texture prevents acquisition of the next one.
    frame: Option<wgpu::SurfaceTexture>,

    image_count: u32,
    next_image: u32,
}

impl WgpuSwapchain {
    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn extent(&self) -> Extent {
        Extent::new(self.config.width, self.config.height)
    }
}

/// Queue order already serializes acquire, submit and present under wgpu.
#[derive(Debug)]
pub struct WgpuSemaphore(());

/// Shared "work pending" flag; clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct WgpuFence {
    pending: Rc<Cell<bool>>,
}

/// Replayable description of one render pass over a swapchain image.
#[derive(Debug, Default)]
pub struct WgpuCommands {
    /// Clear color; `None` loads the previous contents.
    pub clear: Option<wgpu::Color>,

    /// Viewport as `[x, y, width, height]` in framebuffer pixels.
    pub viewport: Option<[f32; 4]>,

    /// Pre-recorded draw work executed inside the pass.
    pub bundles: Vec<wgpu::RenderBundle>,
}

impl WgpuCommands {
    fn reset(&mut self) {
        self.clear = None;
        self.viewport = None;
        self.bundles.clear();
    }
}

/// Owns the wgpu instance, adapter, device and queue.
pub struct WgpuBackend {
    instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    init: GpuInit,
}

impl WgpuBackend {
    /// Creates the device synchronously.
    pub fn new(init: GpuInit) -> Result<Self, DeviceError> {
        pollster::block_on(Self::new_async(init))
    }

    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new_async(init: GpuInit) -> Result<Self, DeviceError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // Surfaces are created per canvas later; any presentable adapter will do.
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| DeviceError::Adapter(e.to_string()))?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("easel-engine device"),
                required_features: init.required_features,
                required_limits: init.required_limits.clone(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| DeviceError::Device(e.to_string()))?;

        log::debug!("wgpu adapter: {:?}", adapter.get_info());

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            init,
        })
    }

    /// Returns a reference to the logical device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Returns a reference to the command queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    fn poll_idle(&self) {
        if let Err(e) = self.device.poll(wgpu::PollType::wait_indefinitely()) {
            log::warn!("device poll failed: {e}");
        }
    }
}

fn encode_pass(
    encoder: &mut wgpu::CommandEncoder,
    view: &wgpu::TextureView,
    commands: &WgpuCommands,
) {
    let load = match commands.clear {
        Some(color) => wgpu::LoadOp::Clear(color),
        None => wgpu::LoadOp::Load,
    };

    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("easel pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
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

    if let Some([x, y, w, h]) = commands.viewport {
        pass.set_viewport(x, y, w, h, 0.0, 1.0);
    }

    if !commands.bundles.is_empty() {
        pass.execute_bundles(commands.bundles.iter());
    }
}

impl Backend for WgpuBackend {
    type Surface = WgpuSurface;
    type Swapchain = WgpuSwapchain;
    type Semaphore = WgpuSemaphore;
    type Fence = WgpuFence;
    type CommandBuffer = WgpuCommands;

    fn wait_idle(&mut self) {
        self.poll_idle();
    }

    fn create_surface<W>(&mut self, window: &W) -> Result<WgpuSurface, DeviceError>
    where
        W: HasWindowHandle + HasDisplayHandle,
    {
        // SAFETY: the presenter destroys every surface before the window that
        // backs it is closed.
        let target = unsafe { wgpu::SurfaceTargetUnsafe::from_window(window) }
            .map_err(|e| DeviceError::Surface(e.to_string()))?;
        let surface = unsafe { self.instance.create_surface_unsafe(target) }
            .map_err(|e| DeviceError::Surface(e.to_string()))?;

        if !self.adapter.is_surface_supported(&surface) {
            return Err(DeviceError::Surface(
                "adapter cannot present to this window".to_string(),
            ));
        }

        Ok(WgpuSurface {
            surface: Arc::new(surface),
        })
    }

    fn destroy_surface(&mut self, surface: WgpuSurface) {
        drop(surface);
    }

    fn create_swapchain(
        &mut self,
        surface: &WgpuSurface,
        extent: Extent,
    ) -> Result<WgpuSwapchain, DeviceError> {
        let caps = surface.surface.get_capabilities(&self.adapter);
        let format = surface::choose_surface_format(&caps, self.init.prefer_srgb)
            .ok_or_else(|| DeviceError::Swapchain("no supported surface formats".to_string()))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: extent.width.max(1),
            height: extent.height.max(1),
            present_mode: surface::choose_present_mode(&caps, self.init.present_mode),
            alpha_mode: surface::choose_alpha_mode(&caps, self.init.alpha_mode),
            view_formats: vec![],
            desired_maximum_frame_latency: self.init.desired_maximum_frame_latency,
        };

        // wgpu cannot configure a 0x0 surface; configuration waits for recreate.
        if !extent.is_empty() {
            surface.surface.configure(&self.device, &config);
        }

        Ok(WgpuSwapchain {
            surface: Arc::clone(&surface.surface),
            config,
            frame: None,
            image_count: self.init.image_count(),
            next_image: 0,
        })
    }

    fn recreate_swapchain(
        &mut self,
        swapchain: &mut WgpuSwapchain,
        extent: Extent,
    ) -> Result<(), DeviceError> {
        if extent.is_empty() {
            return Err(DeviceError::Swapchain(format!(
                "cannot configure a {}x{} surface",
                extent.width, extent.height
            )));
        }

        swapchain.frame = None;
        swapchain.config.width = extent.width;
        swapchain.config.height = extent.height;
        swapchain.surface.configure(&self.device, &swapchain.config);
        swapchain.next_image = 0;
        Ok(())
    }

    fn destroy_swapchain(&mut self, swapchain: WgpuSwapchain) {
        drop(swapchain);
    }

    fn image_count(&self, swapchain: &WgpuSwapchain) -> u32 {
        swapchain.image_count
    }

    fn acquire(&mut self, swapchain: &mut WgpuSwapchain, _signal: &WgpuSemaphore) -> AcquireOutcome {
        // An unpresented texture is discarded when dropped.
        swapchain.frame = None;

        match swapchain.surface.get_current_texture() {
            Ok(frame) => {
                let image = swapchain.next_image;
                swapchain.next_image = (image + 1) % swapchain.image_count;
                let suboptimal = frame.suboptimal;
                swapchain.frame = Some(frame);
                if suboptimal {
                    AcquireOutcome::Suboptimal(image)
                } else {
                    AcquireOutcome::Acquired(image)
                }
            }
            Err(err) => surface::map_acquire_error(err),
        }
    }

    fn present(
        &mut self,
        swapchain: &mut WgpuSwapchain,
        _image: u32,
        _wait: &WgpuSemaphore,
    ) -> PresentOutcome {
        let Some(frame) = swapchain.frame.take() else {
            log::warn!("present without an acquired surface texture");
            return PresentOutcome::Failed;
        };

        let suboptimal = frame.suboptimal;
        frame.present();

        if suboptimal {
            PresentOutcome::Suboptimal
        } else {
            PresentOutcome::Presented
        }
    }

    fn create_semaphore(&mut self) -> WgpuSemaphore {
        WgpuSemaphore(())
    }

    fn destroy_semaphore(&mut self, _semaphore: WgpuSemaphore) {}

    fn create_fence(&mut self, _signaled: bool) -> WgpuFence {
        WgpuFence::default()
    }

    fn destroy_fence(&mut self, _fence: WgpuFence) {}

    fn wait_fence(&mut self, fence: &WgpuFence) {
        if fence.pending.replace(false) {
            self.poll_idle();
        }
    }

    fn create_command_buffer(&mut self) -> WgpuCommands {
        WgpuCommands::default()
    }

    fn destroy_command_buffer(&mut self, commands: WgpuCommands) {
        drop(commands);
    }

    fn reset_commands(&mut self, commands: &mut WgpuCommands) {
        commands.reset();
    }

    fn blank_commands(
        &mut self,
        _swapchain: &WgpuSwapchain,
        _image: u32,
        commands: &mut WgpuCommands,
    ) {
        commands.reset();
        commands.clear = Some(wgpu::Color::BLACK);
    }

    fn submit(
        &mut self,
        swapchain: &mut WgpuSwapchain,
        submission: &Submission<'_, Self>,
    ) -> Result<(), DeviceError> {
        let frame = swapchain
            .frame
            .as_ref()
            .ok_or(DeviceError::NoAcquiredImage)?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("easel submit encoder"),
            });

        for commands in submission.commands() {
            encode_pass(&mut encoder, &view, commands);
        }

        self.queue.submit(std::iter::once(encoder.finish()));

        if let Some(fence) = submission.completion_fence() {
            fence.pending.set(true);
        }

        Ok(())
    }
}
