//! `wgpu` implementation of the device seam.
//!
//! wgpu hides swapchain images and queue synchronization, so this back-end
//! maps the explicit model onto it:
//! - the configured surface is the swapchain; image indices rotate over
//!   `desired_maximum_frame_latency + 1` slots
//! - semaphores are tokens (queue order already serializes the work)
//! - a fence is a "work pending" flag resolved by polling the device
//! - a command buffer is a replayable pass description (clear, viewport,
//!   render bundles) encoded into a real encoder at submit time

mod backend;
mod init;
mod surface;

pub use backend::{WgpuBackend, WgpuCommands, WgpuFence, WgpuSemaphore, WgpuSurface, WgpuSwapchain};
pub use init::GpuInit;
