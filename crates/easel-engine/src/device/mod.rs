//! GPU device seam.
//!
//! The presenter never talks to a graphics API directly. It drives a
//! [`Backend`], which owns the device, queues and every synchronization
//! primitive, and hands out opaque handles for them:
//! - surfaces and swapchains (acquire / present / recreate)
//! - semaphores (GPU-GPU) and fences (GPU-host)
//! - command buffers (reset / blank / submit)
//!
//! [`wgpu_backend::WgpuBackend`] is the production implementation.

mod error;
pub mod wgpu_backend;

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

pub use error::DeviceError;

/// Size of a presentable image in framebuffer pixels.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns true when either side is zero (minimized window).
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Result of a swapchain image acquisition.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AcquireOutcome {
    /// An image was acquired; the semaphore will be signalled.
    Acquired(u32),
    /// An image was acquired but the swapchain no longer matches the surface.
    Suboptimal(u32),
    /// No image; the swapchain must be recreated.
    OutOfDate,
    /// No image; the device could not serve the request.
    Failed,
}

/// Result of presenting an image.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PresentOutcome {
    Presented,
    Suboptimal,
    OutOfDate,
    Failed,
}

/// One queue submission: command buffers plus their synchronization.
///
/// Built fresh for each frame; it only borrows handles owned elsewhere.
pub struct Submission<'a, B: Backend + ?Sized> {
    commands: Vec<&'a B::CommandBuffer>,
    wait: Option<&'a B::Semaphore>,
    signal: Option<&'a B::Semaphore>,
    fence: Option<&'a B::Fence>,
    image: u32,
}

impl<'a, B: Backend + ?Sized> Submission<'a, B> {
    pub fn new(image: u32) -> Self {
        Self {
            commands: Vec::new(),
            wait: None,
            signal: None,
            fence: None,
            image,
        }
    }

    /// Appends a command buffer; buffers execute in push order.
    pub fn push_commands(&mut self, commands: &'a B::CommandBuffer) {
        self.commands.push(commands);
    }

    /// Semaphore waited on at the color-attachment output stage.
    pub fn wait_on(&mut self, semaphore: &'a B::Semaphore) {
        self.wait = Some(semaphore);
    }

    /// Semaphore signalled once every command buffer has executed.
    pub fn signal(&mut self, semaphore: &'a B::Semaphore) {
        self.signal = Some(semaphore);
    }

    /// Fence signalled on completion (reset by the back-end before use).
    pub fn fence(&mut self, fence: &'a B::Fence) {
        self.fence = Some(fence);
    }

    pub fn image(&self) -> u32 {
        self.image
    }

    pub fn commands(&self) -> &[&'a B::CommandBuffer] {
        &self.commands
    }

    pub fn wait_semaphore(&self) -> Option<&'a B::Semaphore> {
        self.wait
    }

    pub fn signal_semaphore(&self) -> Option<&'a B::Semaphore> {
        self.signal
    }

    pub fn completion_fence(&self) -> Option<&'a B::Fence> {
        self.fence
    }
}

/// Low-level GPU operations consumed by the presenter.
///
/// Handles are owned by the caller and given back for destruction. Fences are
/// `Clone` because the per-image backup slots hold copies of the handles of
/// the frame-in-flight fences.
pub trait Backend {
    type Surface;
    type Swapchain;
    type Semaphore;
    type Fence: Clone;
    type CommandBuffer;

    /// Blocks until the device has no outstanding work.
    fn wait_idle(&mut self);

    /// Creates a presentable surface for a platform window.
    ///
    /// The window must outlive the surface.
    fn create_surface<W>(&mut self, window: &W) -> Result<Self::Surface, DeviceError>
    where
        W: HasWindowHandle + HasDisplayHandle;

    fn destroy_surface(&mut self, surface: Self::Surface);

    fn create_swapchain(
        &mut self,
        surface: &Self::Surface,
        extent: Extent,
    ) -> Result<Self::Swapchain, DeviceError>;

    /// Rebuilds the swapchain (and dependent framebuffers) for a new extent.
    fn recreate_swapchain(
        &mut self,
        swapchain: &mut Self::Swapchain,
        extent: Extent,
    ) -> Result<(), DeviceError>;

    fn destroy_swapchain(&mut self, swapchain: Self::Swapchain);

    fn image_count(&self, swapchain: &Self::Swapchain) -> u32;

    /// Acquires the next image, signalling `signal` when it is ready.
    fn acquire(
        &mut self,
        swapchain: &mut Self::Swapchain,
        signal: &Self::Semaphore,
    ) -> AcquireOutcome;

    /// Queues `image` for presentation once `wait` is signalled.
    fn present(
        &mut self,
        swapchain: &mut Self::Swapchain,
        image: u32,
        wait: &Self::Semaphore,
    ) -> PresentOutcome;

    fn create_semaphore(&mut self) -> Self::Semaphore;
    fn destroy_semaphore(&mut self, semaphore: Self::Semaphore);

    fn create_fence(&mut self, signaled: bool) -> Self::Fence;
    fn destroy_fence(&mut self, fence: Self::Fence);

    /// Blocks until `fence` is signalled.
    fn wait_fence(&mut self, fence: &Self::Fence);

    fn create_command_buffer(&mut self) -> Self::CommandBuffer;
    fn destroy_command_buffer(&mut self, commands: Self::CommandBuffer);
    fn reset_commands(&mut self, commands: &mut Self::CommandBuffer);

    /// Records a no-op pass (clear only) targeting `image`.
    fn blank_commands(
        &mut self,
        swapchain: &Self::Swapchain,
        image: u32,
        commands: &mut Self::CommandBuffer,
    );

    fn submit(
        &mut self,
        swapchain: &mut Self::Swapchain,
        submission: &Submission<'_, Self>,
    ) -> Result<(), DeviceError>;
}
