//! Easel engine crate.
//!
//! Frame presentation for a GPU renderer: binds canvases to windows and
//! surfaces and drives the swapchain acquire / submit / present loop.
//!
//! - [`present`]: the presenter, its request vocabulary and collaborator seams
//! - [`device`]: the GPU seam and the wgpu back-end
//! - [`window`]: the window/client seam and the winit runtime

pub mod core;
pub mod device;
pub mod present;
pub mod time;
pub mod window;

pub mod logging;

#[cfg(test)]
mod test_utils;
