use thiserror::Error;

/// Failures reported by a [`Backend`](super::Backend).
///
/// Acquire and present report their status through outcome enums instead;
/// these errors cover object creation and queue submission.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("failed to create surface: {0}")]
    Surface(String),

    #[error("failed to create swapchain: {0}")]
    Swapchain(String),

    #[error("no suitable GPU adapter: {0}")]
    Adapter(String),

    #[error("failed to create device/queue: {0}")]
    Device(String),

    #[error("submission without an acquired swapchain image")]
    NoAcquiredImage,

    #[error("queue submission failed: {0}")]
    Submit(String),
}
