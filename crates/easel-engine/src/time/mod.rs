//! Frame timing and telemetry.
//!
//! - [`FrameTimestamps`]: per-canvas ring of submission times
//! - [`FpsCounter`]: presenter-wide frame rate, ticked once per presented frame

mod fps;
mod timestamps;

pub use fps::{FpsCounter, FrameTime};
pub use timestamps::{FrameTimestamps, MAX_TIMESTAMPS};
