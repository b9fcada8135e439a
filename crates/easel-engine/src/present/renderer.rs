use super::recorder::RecorderCommand;
use super::request::{Id, Request};
use crate::device::Backend;

/// Canvas geometry handed to the renderer while it records commands.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CanvasTarget {
    pub id: Id,
    pub image: u32,
    pub width: u32,
    pub height: u32,
    pub scale: f32,
}

/// Monotonic maximum, e.g. the largest swapchain image count seen so far.
///
/// Shared allocators are sized from it, so it never decreases.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Watermark(u32);

impl Watermark {
    pub fn get(self) -> u32 {
        self.0
    }

    /// Raises the watermark to `value` if larger; returns the new value.
    pub fn update(&mut self, value: u32) -> u32 {
        self.0 = self.0.max(value);
        self.0
    }
}

/// One line of the resource monitor overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorEntry {
    pub label: String,
    pub used: u64,
    pub capacity: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonitorStats {
    pub entries: Vec<MonitorEntry>,
}

/// The renderer black box.
///
/// It owns the GPU back-end and the canvas *shells*; the presenter owns the
/// presentation state bound to them (surface, swapchain, sync, recorder).
pub trait Renderer {
    type Backend: Backend;

    fn backend(&mut self) -> &mut Self::Backend;

    /// Applies one request. Called exactly once per request, in order.
    fn apply(&mut self, request: &Request) -> anyhow::Result<()>;

    /// Whether a canvas shell exists for `id`.
    fn has_canvas(&self, id: Id) -> bool;

    /// Translates one recorder command into GPU commands.
    fn record(
        &mut self,
        target: CanvasTarget,
        command: &RecorderCommand,
        commands: &mut <Self::Backend as Backend>::CommandBuffer,
    ) -> anyhow::Result<()>;

    /// Largest swapchain image count across all canvases.
    fn image_count_watermark(&mut self) -> &mut Watermark;

    /// Runs pending transfers that target swapchain image `image`.
    fn flush_transfers(&mut self, image: u32) {
        let _ = image;
    }

    /// Allocation statistics for the monitor overlay.
    fn monitor(&self) -> MonitorStats {
        MonitorStats::default()
    }
}
