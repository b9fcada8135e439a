use super::recorder::Recorder;
use super::renderer::CanvasTarget;
use super::request::Id;
use super::swapchain::{Swapchain, SwapchainStatus};
use super::sync::{FRAMES_IN_FLIGHT, FrameSync};
use crate::device::{Backend, DeviceError, Extent};
use crate::time::FrameTimestamps;

/// A render target bound to one window through one surface.
///
/// Owns the swapchain, the synchronization set, one command buffer per
/// swapchain image and the recorder that caches their content.
/// `cur_frame` selects the frame-in-flight slot and only advances after a
/// successful submission; the acquired image index is independent of it.
pub struct Canvas<B: Backend> {
    id: Id,
    width: u32,
    height: u32,
    scale: f32,

    pub(crate) swapchain: Swapchain<B>,
    pub(crate) sync: FrameSync<B>,
    pub(crate) commands: Vec<B::CommandBuffer>,
    pub(crate) recorder: Option<Recorder>,
    pub(crate) timestamps: FrameTimestamps,
    pub(crate) cur_frame: usize,
}

impl<B: Backend> Canvas<B> {
    /// Creates the swapchain, sync set and command buffers on `surface`.
    pub(crate) fn new(
        backend: &mut B,
        id: Id,
        surface: &B::Surface,
        framebuffer: Extent,
        scale: f32,
    ) -> Result<Self, DeviceError> {
        let raw = backend.create_swapchain(surface, framebuffer)?;
        let image_count = backend.image_count(&raw);
        let sync = FrameSync::new(backend, image_count);
        let commands = (0..image_count)
            .map(|_| backend.create_command_buffer())
            .collect();

        Ok(Self {
            id,
            width: framebuffer.width,
            height: framebuffer.height,
            scale,
            swapchain: Swapchain::new(raw, image_count),
            sync,
            commands,
            recorder: None,
            timestamps: FrameTimestamps::new(),
            cur_frame: 0,
        })
    }

    pub fn id(&self) -> Id {
        self.id
    }

    /// Framebuffer width in physical pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Framebuffer height in physical pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Framebuffer/screen size ratio.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn cur_frame(&self) -> usize {
        self.cur_frame
    }

    pub fn swapchain(&self) -> &Swapchain<B> {
        &self.swapchain
    }

    pub fn status(&self) -> SwapchainStatus {
        self.swapchain.status()
    }

    pub fn recorder(&self) -> Option<&Recorder> {
        self.recorder.as_ref()
    }

    pub fn commands(&self) -> &[B::CommandBuffer] {
        &self.commands
    }

    pub fn timestamps(&self) -> &FrameTimestamps {
        &self.timestamps
    }

    pub(crate) fn target(&self, image: u32) -> CanvasTarget {
        CanvasTarget {
            id: self.id,
            image,
            width: self.width,
            height: self.height,
            scale: self.scale,
        }
    }

    /// Forces the next tick through the recreate path.
    pub(crate) fn invalidate(&mut self) {
        self.swapchain.set_status(SwapchainStatus::NeedRecreate);
    }

    /// Slot index the next frame will use.
    pub(crate) fn next_frame(&self) -> usize {
        (self.cur_frame + 1) % FRAMES_IN_FLIGHT
    }

    pub(crate) fn advance_frame(&mut self) {
        self.cur_frame = self.next_frame();
    }

    /// Rebuilds the swapchain for a new framebuffer size.
    ///
    /// Per-image state follows the (possibly changed) image count; the
    /// swapchain is ready again on success.
    pub(crate) fn recreate(
        &mut self,
        backend: &mut B,
        framebuffer: Extent,
        screen_width: u32,
    ) -> Result<(), DeviceError> {
        backend.recreate_swapchain(&mut self.swapchain.raw, framebuffer)?;

        self.width = framebuffer.width;
        self.height = framebuffer.height;
        if screen_width > 0 {
            self.scale = framebuffer.width as f32 / screen_width as f32;
        }

        let image_count = backend.image_count(&self.swapchain.raw);
        if image_count != self.swapchain.image_count() {
            log::debug!(
                "canvas #{:x}: swapchain image count {} -> {}",
                self.id,
                self.swapchain.image_count(),
                image_count
            );
            self.swapchain.set_image_count(image_count);
            self.sync.resize_images(image_count);
            if let Some(recorder) = self.recorder.as_mut() {
                recorder.resize(image_count);
            }

            let wanted = image_count as usize;
            while self.commands.len() > wanted {
                if let Some(commands) = self.commands.pop() {
                    backend.destroy_command_buffer(commands);
                }
            }
            while self.commands.len() < wanted {
                self.commands.push(backend.create_command_buffer());
            }
        }

        self.swapchain.set_status(SwapchainStatus::Ready);
        Ok(())
    }

    /// Destroys the swapchain, then the sync set and command buffers.
    ///
    /// The recorder is handed back so the caller controls when it goes.
    pub(crate) fn destroy(self, backend: &mut B) -> Option<Recorder> {
        let Self {
            swapchain,
            sync,
            commands,
            recorder,
            ..
        } = self;

        backend.destroy_swapchain(swapchain.raw);
        sync.destroy(backend);
        for buffer in commands {
            backend.destroy_command_buffer(buffer);
        }
        recorder
    }
}
