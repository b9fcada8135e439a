//! Window/client layer seam + winit runtime.
//!
//! The presenter consumes windows through [`Client`] (an id-keyed registry
//! that also receives resize notifications) and [`ClientWindow`]. The winit
//! [`Runtime`] is the production client.

mod runtime;

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use crate::present::{CanvasFlags, Id};

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx, WinitClient, WinitWindow};

/// Resize notification emitted after a swapchain recreation.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ResizeEvent {
    pub window_id: Id,
    pub framebuffer_width: u32,
    pub framebuffer_height: u32,
    pub screen_width: u32,
    pub screen_height: u32,
}

/// Events the presenter emits to the window/client layer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ClientEvent {
    Resize(ResizeEvent),
}

/// A platform window a canvas can present to.
///
/// Screen size is in logical (screen) pixels; framebuffer size is in
/// physical pixels and differs under DPI scaling.
pub trait ClientWindow: HasWindowHandle + HasDisplayHandle {
    fn screen_size(&self) -> (u32, u32);

    fn framebuffer_size(&self) -> (u32, u32);

    /// Refreshes the cached sizes from the platform.
    fn poll_size(&mut self);

    fn set_fullscreen(&mut self, fullscreen: bool);
}

/// Window registry and event sink.
pub trait Client {
    type Window: ClientWindow;

    /// Creates a window of the given screen size under `id`.
    fn create_window(
        &mut self,
        id: Id,
        width: u32,
        height: u32,
        flags: CanvasFlags,
    ) -> anyhow::Result<&mut Self::Window>;

    fn window(&mut self, id: Id) -> Option<&mut Self::Window>;

    /// Closes and forgets the window registered under `id`, if any.
    ///
    /// Called once the presenter has released everything bound to it.
    fn destroy_window(&mut self, id: Id);

    fn emit(&mut self, event: ClientEvent);

    /// Monotonic frame counter of the client loop.
    fn frame_index(&self) -> u64;
}
