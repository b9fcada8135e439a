//! Frame presentation.
//!
//! The [`Presenter`] turns request batches into window-bound canvases and
//! drives, per window and per tick, the acquire / record / submit / present
//! cycle over [`FRAMES_IN_FLIGHT`] synchronization slots.
//!
//! Layout:
//! - `request`: request vocabulary and [`Batch`]
//! - `recorder`: per-canvas command cache with per-image dirty bits
//! - `swapchain`, `sync`, `canvas`: per-canvas presentation state
//! - `gui`: GUI toolkit seam and overlays
//! - `presenter`, `router`: lifecycle, frame driver and batch routing
//! - `config`, `diagnostics`: opt-in request tracing and export

mod canvas;
mod config;
mod diagnostics;
mod error;
mod gui;
mod presenter;
mod recorder;
mod renderer;
mod request;
mod router;
mod swapchain;
mod sync;

pub use canvas::Canvas;
pub use config::{DiagnosticsConfig, PresenterConfig, ENV_EXPORT, ENV_VERBOSE};
pub use error::PresentError;
pub use gui::{
    FnOverlay, FpsOverlay, Gui, GuiCallback, GuiPanel, GuiWindow, MonitorOverlay, NoGui,
    NoGuiWindow, Overlay, OverlayCtx,
};
pub use presenter::{FrameOutcome, Presenter};
pub use recorder::{Recorder, RecorderCommand};
pub use renderer::{CanvasTarget, MonitorEntry, MonitorStats, Renderer, Watermark};
pub use request::{Batch, CanvasFlags, Id, Request, RequestAction, RequestContent, RequestObject};
pub use swapchain::{Swapchain, SwapchainStatus};
pub use sync::{FrameSync, FRAMES_IN_FLIGHT};
