use crate::device::{AcquireOutcome, Backend, PresentOutcome};

/// Swapchain state driving the frame state machine.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SwapchainStatus {
    /// Images can be acquired and rendered.
    Ready,
    /// Size or surface changed; recreate before rendering.
    NeedRecreate,
    /// The device failed to serve an image; skip until an acquire succeeds.
    Invalid,
}

/// A back-end swapchain plus the presenter-side status around it.
pub struct Swapchain<B: Backend> {
    pub(crate) raw: B::Swapchain,
    status: SwapchainStatus,
    image_index: u32,
    image_count: u32,
}

impl<B: Backend> Swapchain<B> {
    pub(crate) fn new(raw: B::Swapchain, image_count: u32) -> Self {
        Self {
            raw,
            status: SwapchainStatus::Ready,
            image_index: 0,
            image_count,
        }
    }

    pub fn status(&self) -> SwapchainStatus {
        self.status
    }

    /// Index of the image acquired last.
    pub fn image_index(&self) -> u32 {
        self.image_index
    }

    pub fn image_count(&self) -> u32 {
        self.image_count
    }

    pub fn raw(&self) -> &B::Swapchain {
        &self.raw
    }

    pub(crate) fn set_status(&mut self, status: SwapchainStatus) {
        self.status = status;
    }

    pub(crate) fn set_image_count(&mut self, image_count: u32) {
        self.image_count = image_count;
        if self.image_index >= image_count {
            self.image_index = 0;
        }
    }

    /// Folds an acquire outcome into the status.
    ///
    /// A pending recreate survives a successful acquire so a forced resize is
    /// never lost; a successful acquire clears `Invalid`.
    pub(crate) fn on_acquire(&mut self, outcome: AcquireOutcome) {
        match outcome {
            AcquireOutcome::Acquired(image) => {
                self.image_index = image;
                if self.status == SwapchainStatus::Invalid {
                    self.status = SwapchainStatus::Ready;
                }
            }
            AcquireOutcome::Suboptimal(image) => {
                self.image_index = image;
                self.status = SwapchainStatus::NeedRecreate;
            }
            AcquireOutcome::OutOfDate => self.status = SwapchainStatus::NeedRecreate,
            AcquireOutcome::Failed => {
                log::error!("failed acquiring the swapchain image");
                self.status = SwapchainStatus::Invalid;
            }
        }
    }

    /// Folds a present outcome into the status for the next tick.
    pub(crate) fn on_present(&mut self, outcome: PresentOutcome) {
        match outcome {
            PresentOutcome::Presented => {}
            PresentOutcome::Suboptimal | PresentOutcome::OutOfDate => {
                log::trace!("swapchain out of date after present, recreate next tick");
                self.status = SwapchainStatus::NeedRecreate;
            }
            PresentOutcome::Failed => {
                log::error!("failed presenting the swapchain image");
                self.status = SwapchainStatus::Invalid;
            }
        }
    }
}
