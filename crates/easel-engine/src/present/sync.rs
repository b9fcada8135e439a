use crate::device::Backend;

/// Number of frames the CPU may record ahead of the GPU.
pub const FRAMES_IN_FLIGHT: usize = 2;

/// Per-canvas synchronization set.
///
/// Fences and semaphores are indexed by frame-in-flight slot; the backup
/// fences are indexed by swapchain image and hold copies of the slot fence
/// that last rendered to that image.
pub struct FrameSync<B: Backend> {
    pub(crate) render_finished_fences: Vec<B::Fence>,
    pub(crate) image_fences: Vec<Option<B::Fence>>,
    pub(crate) image_available: Vec<B::Semaphore>,
    pub(crate) render_finished: Vec<B::Semaphore>,
}

impl<B: Backend> FrameSync<B> {
    pub(crate) fn new(backend: &mut B, image_count: u32) -> Self {
        // Slot fences start signalled so the first wait on each returns at once.
        let render_finished_fences = (0..FRAMES_IN_FLIGHT)
            .map(|_| backend.create_fence(true))
            .collect();
        let image_available = (0..FRAMES_IN_FLIGHT)
            .map(|_| backend.create_semaphore())
            .collect();
        let render_finished = (0..FRAMES_IN_FLIGHT)
            .map(|_| backend.create_semaphore())
            .collect();

        Self {
            render_finished_fences,
            image_fences: vec![None; image_count as usize],
            image_available,
            render_finished,
        }
    }

    /// Replaces both semaphore sets with fresh, unsignalled ones.
    ///
    /// Required after a recreate: an image acquired but never submitted leaves
    /// its image-available semaphore signalled.
    pub(crate) fn recreate_semaphores(&mut self, backend: &mut B) {
        for semaphores in [&mut self.image_available, &mut self.render_finished] {
            for semaphore in semaphores.iter_mut() {
                let stale = std::mem::replace(semaphore, backend.create_semaphore());
                backend.destroy_semaphore(stale);
            }
        }
    }

    /// Copies the slot fence into the backup slot of `image`.
    pub(crate) fn track_image(&mut self, frame: usize, image: u32) {
        let slot = image as usize;
        if slot >= self.image_fences.len() {
            self.image_fences.resize(slot + 1, None);
        }
        self.image_fences[slot] = Some(self.render_finished_fences[frame].clone());
    }

    pub(crate) fn resize_images(&mut self, image_count: u32) {
        self.image_fences.clear();
        self.image_fences.resize(image_count as usize, None);
    }

    pub(crate) fn destroy(self, backend: &mut B) {
        // Backup slots only hold copies; the slot fences own the handles.
        drop(self.image_fences);
        for fence in self.render_finished_fences {
            backend.destroy_fence(fence);
        }
        for semaphore in self.image_available.into_iter().chain(self.render_finished) {
            backend.destroy_semaphore(semaphore);
        }
    }
}
