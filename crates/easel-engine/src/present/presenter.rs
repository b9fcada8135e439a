use std::collections::HashMap;

use super::canvas::Canvas;
use super::config::PresenterConfig;
use super::diagnostics::Diagnostics;
use super::error::PresentError;
use super::gui::{
    self, FnOverlay, FpsOverlay, Gui, GuiCallback, GuiWindow, MonitorOverlay, NoGui, Overlay,
    OverlayCtx,
};
use super::recorder::Recorder;
use super::renderer::{MonitorStats, Renderer};
use super::request::{CanvasFlags, Id, Request, RequestContent};
use super::swapchain::SwapchainStatus;
use crate::device::{Backend, Extent, Submission};
use crate::time::FpsCounter;
use crate::window::{Client, ClientEvent, ClientWindow, ResizeEvent};

type BackendOf<R> = <R as Renderer>::Backend;

/// What one frame tick did.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameOutcome {
    /// A frame was submitted and queued for presentation.
    Presented,
    /// The swapchain was rebuilt and every command buffer re-recorded.
    Recreated,
    /// Nothing was submitted (invalid swapchain, minimized window or a
    /// recovered device error); the next tick retries.
    Skipped,
}

/// Binds canvases to windows and drives their frame loop.
///
/// The presenter owns the presentation side of every canvas (surface,
/// swapchain, synchronization, command buffers, recorder) and the optional
/// GUI subsystem. The renderer it wraps owns the GPU back-end and the canvas
/// shells; the window client is borrowed per call.
pub struct Presenter<R: Renderer, G: Gui<R::Backend> = NoGui> {
    renderer: R,
    gui: Option<G>,

    canvases: HashMap<Id, Canvas<BackendOf<R>>>,
    surfaces: HashMap<Id, <BackendOf<R> as Backend>::Surface>,
    gui_windows: HashMap<Id, G::Window>,
    callbacks: Vec<GuiCallback<G::Window>>,

    fps: FpsCounter,
    pub(crate) diagnostics: Diagnostics,
}

impl<R: Renderer, G: Gui<R::Backend>> Presenter<R, G> {
    pub fn new(renderer: R, gui: Option<G>, config: PresenterConfig) -> Self {
        Self {
            renderer,
            gui,
            canvases: HashMap::new(),
            surfaces: HashMap::new(),
            gui_windows: HashMap::new(),
            callbacks: Vec::new(),
            fps: FpsCounter::new(),
            diagnostics: Diagnostics::new(config.diagnostics),
        }
    }

    // ── accessors ─────────────────────────────────────────────────────────

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn canvas(&self, id: Id) -> Option<&Canvas<BackendOf<R>>> {
        self.canvases.get(&id)
    }

    pub fn canvas_ids(&self) -> impl Iterator<Item = Id> + '_ {
        self.canvases.keys().copied()
    }

    pub fn gui_window(&self, id: Id) -> Option<&G::Window> {
        self.gui_windows.get(&id)
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    pub fn gui_window_count(&self) -> usize {
        self.gui_windows.len()
    }

    pub fn callback_count(&self) -> usize {
        self.callbacks.len()
    }

    pub fn fps(&self) -> &FpsCounter {
        &self.fps
    }

    // ── canvas lifecycle ──────────────────────────────────────────────────

    /// Binds the renderer's canvas shell to a new window and surface.
    ///
    /// The canvas starts in `NeedRecreate` so its first tick sizes the
    /// swapchain from the live window.
    pub(crate) fn create_canvas<C: Client>(
        &mut self,
        client: &mut C,
        request: &Request,
    ) -> Result<(), PresentError> {
        let id = request.id;
        let flags = request.flags;
        let RequestContent::Canvas {
            screen_width,
            screen_height,
        } = request.content
        else {
            return Err(PresentError::MissingContent(id));
        };

        if screen_width == 0 || screen_height == 0 {
            return Err(PresentError::ZeroSize {
                id,
                width: screen_width,
                height: screen_height,
            });
        }
        if !self.renderer.has_canvas(id) {
            return Err(PresentError::MissingCanvasShell(id));
        }
        if self.canvases.contains_key(&id) {
            return Err(PresentError::DuplicateCanvas(id));
        }
        if flags.wants_gui() && self.gui.is_none() {
            return Err(PresentError::GuiUnavailable(id));
        }

        let window = client
            .create_window(id, screen_width, screen_height, flags)
            .map_err(|reason| PresentError::Window { id, reason })?;

        let (width, height) = window.framebuffer_size();
        let scale = width as f32 / screen_width as f32;
        log::debug!("canvas #{id:x} size is {width}x{height}, scale is {scale:.2}");

        // Every failure below closes the window again so the client never
        // keeps a window without a canvas.
        let backend = self.renderer.backend();
        let surface = match backend.create_surface(&*window) {
            Ok(surface) => surface,
            Err(e) => {
                client.destroy_window(id);
                return Err(e.into());
            }
        };
        // Minimized at creation: build a 1x1 swapchain, the first tick resizes it.
        let extent = Extent::new(width.max(1), height.max(1));
        let mut canvas = match Canvas::new(backend, id, &surface, extent, scale) {
            Ok(canvas) => canvas,
            Err(e) => {
                backend.destroy_surface(surface);
                client.destroy_window(id);
                return Err(e.into());
            }
        };

        let image_count = canvas.swapchain().image_count();
        canvas.recorder = Some(Recorder::new(image_count));

        if flags.wants_gui() {
            if let Some(gui) = self.gui.as_mut() {
                match gui.create_window(backend, &*window, canvas.swapchain().raw(), image_count, id) {
                    Ok(gui_window) => {
                        self.gui_windows.insert(id, gui_window);
                    }
                    Err(reason) => {
                        canvas.destroy(backend);
                        backend.destroy_surface(surface);
                        client.destroy_window(id);
                        return Err(PresentError::Gui { id, reason });
                    }
                }
            }
        }

        self.surfaces.insert(id, surface);

        let watermark = self.renderer.image_count_watermark().update(image_count);
        log::trace!("image count watermark is {watermark}");

        window.set_fullscreen(flags.contains(CanvasFlags::FULLSCREEN));

        if flags.contains(CanvasFlags::FPS) {
            self.callbacks.push(GuiCallback {
                window_id: id,
                overlay: Box::new(FpsOverlay),
            });
        }
        if flags.contains(CanvasFlags::MONITOR) {
            self.callbacks.push(GuiCallback {
                window_id: id,
                overlay: Box::new(MonitorOverlay),
            });
        }

        canvas.invalidate();
        self.canvases.insert(id, canvas);
        Ok(())
    }

    /// Tears a canvas down after draining the device.
    ///
    /// Order: swapchain, recorder, surface, GUI window. The window itself is
    /// left to the client.
    pub(crate) fn delete_canvas(&mut self, id: Id) -> Result<(), PresentError> {
        if !self.canvases.contains_key(&id) {
            return Err(PresentError::MissingCanvas(id));
        }

        let backend = self.renderer.backend();
        backend.wait_idle();

        let surface = self.surfaces.remove(&id);
        if let Some(canvas) = self.canvases.remove(&id) {
            if let Some(recorder) = canvas.destroy(backend) {
                log::trace!("canvas #{id:x}: dropping recorder ({} commands)", recorder.len());
            }
        }
        if let Some(surface) = surface {
            backend.destroy_surface(surface);
        }

        if let Some(gui_window) = self.gui_windows.remove(&id) {
            if let Some(gui) = self.gui.as_mut() {
                gui.destroy_window(backend, gui_window);
            }
        }

        log::debug!("canvas #{id:x} deleted");
        Ok(())
    }

    /// Window-close path: deletes the canvas bound to the window, if any.
    ///
    /// Returns whether a canvas was deleted.
    pub fn on_window_close(&mut self, id: Id) -> Result<bool, PresentError> {
        if !self.canvases.contains_key(&id) {
            log::trace!("window #{id:x} closed without a canvas");
            return Ok(false);
        }
        log::trace!("delete window #{id:x}");
        self.delete_canvas(id)?;
        Ok(true)
    }

    /// Schedules a swapchain recreation on the next tick of canvas `id`.
    pub fn mark_resized(&mut self, id: Id) -> bool {
        match self.canvases.get_mut(&id) {
            Some(canvas) => {
                canvas.invalidate();
                true
            }
            None => false,
        }
    }

    /// Appends a record request to the canvas recorder.
    pub(crate) fn record_request(&mut self, request: &Request) -> Result<(), PresentError> {
        let RequestContent::Record(command) = &request.content else {
            return Err(PresentError::MissingContent(request.id));
        };
        let canvas = self
            .canvases
            .get_mut(&request.id)
            .ok_or(PresentError::MissingCanvas(request.id))?;
        let recorder = canvas
            .recorder
            .as_mut()
            .ok_or(PresentError::MissingRecorder(request.id))?;
        recorder.apply(command.clone());
        Ok(())
    }

    // ── GUI callbacks ─────────────────────────────────────────────────────

    /// Registers an overlay drawn every frame window `window_id` renders.
    ///
    /// Registrations accumulate and run in registration order.
    pub fn add_gui_callback(
        &mut self,
        window_id: Id,
        overlay: Box<dyn Overlay<G::Window>>,
    ) -> Result<(), PresentError> {
        if window_id == 0 {
            return Err(PresentError::NullWindowId);
        }
        log::debug!("add GUI callback to window #{window_id:x}");
        self.callbacks.push(GuiCallback { window_id, overlay });
        Ok(())
    }

    pub fn on_gui<F>(&mut self, window_id: Id, f: F) -> Result<(), PresentError>
    where
        F: FnMut(&mut OverlayCtx<'_, G::Window>) + 'static,
    {
        self.add_gui_callback(window_id, Box::new(FnOverlay(f)))
    }

    // ── frame driver ──────────────────────────────────────────────────────

    /// Runs one frame tick for window `id`.
    ///
    /// Errors are broken contracts only (no such window, canvas or
    /// recorder). Device trouble is absorbed: the tick is skipped or the
    /// swapchain recreated.
    pub fn frame<C: Client>(&mut self, client: &mut C, id: Id) -> Result<FrameOutcome, PresentError> {
        if client.window(id).is_none() {
            return Err(PresentError::MissingWindow(id));
        }
        let canvas = self
            .canvases
            .get_mut(&id)
            .ok_or(PresentError::MissingCanvas(id))?;
        if canvas.recorder.is_none() {
            return Err(PresentError::MissingRecorder(id));
        }

        log::trace!("frame {}, window #{id:x}", client.frame_index());

        let cur = canvas.cur_frame();
        {
            let backend = self.renderer.backend();
            backend.wait_fence(&canvas.sync.render_finished_fences[canvas.next_frame()]);
            let acquired = backend.acquire(&mut canvas.swapchain.raw, &canvas.sync.image_available[cur]);
            canvas.swapchain.on_acquire(acquired);
        }

        let gui_window = self.gui_windows.get_mut(&id);
        let outcome = match canvas.status() {
            SwapchainStatus::Invalid => {
                self.renderer.backend().wait_idle();
                return Ok(FrameOutcome::Skipped);
            }
            SwapchainStatus::NeedRecreate => {
                recreate::<R, G, C>(&mut self.renderer, canvas, gui_window, client)?
            }
            SwapchainStatus::Ready => {
                let gui_window = gui_window.filter(|_| !self.callbacks.is_empty());
                render::<R, G>(
                    &mut self.renderer,
                    canvas,
                    gui_window,
                    &mut self.callbacks,
                    &mut self.fps,
                )
            }
        };

        self.renderer.flush_transfers(canvas.swapchain().image_index());
        Ok(outcome)
    }
}

/// Recreate branch of the frame tick.
fn recreate<R, G, C>(
    renderer: &mut R,
    canvas: &mut Canvas<BackendOf<R>>,
    gui_window: Option<&mut G::Window>,
    client: &mut C,
) -> Result<FrameOutcome, PresentError>
where
    R: Renderer,
    G: Gui<R::Backend>,
    C: Client,
{
    let id = canvas.id();
    log::trace!("recreating the swapchain of canvas #{id:x}");

    let backend = renderer.backend();
    backend.wait_idle();

    let window = client.window(id).ok_or(PresentError::MissingWindow(id))?;
    window.poll_size();
    let (screen_width, screen_height) = window.screen_size();
    let (fb_width, fb_height) = window.framebuffer_size();
    let framebuffer = Extent::new(fb_width, fb_height);

    // An acquired but unsubmitted image leaves its semaphore signalled, so
    // every early exit below replaces the set.
    if framebuffer.is_empty() {
        log::trace!("window #{id:x} is minimized, postponing the recreate");
        canvas.sync.recreate_semaphores(backend);
        return Ok(FrameOutcome::Skipped);
    }

    if let Err(e) = canvas.recreate(backend, framebuffer, screen_width) {
        log::warn!("canvas #{id:x}: swapchain recreation failed, retrying next tick: {e}");
        canvas.sync.recreate_semaphores(backend);
        return Ok(FrameOutcome::Skipped);
    }
    canvas.sync.recreate_semaphores(backend);

    if let Some(gui_window) = gui_window {
        gui_window.resize(canvas.width(), canvas.height());
    }

    client.emit(ClientEvent::Resize(ResizeEvent {
        window_id: id,
        framebuffer_width: canvas.width(),
        framebuffer_height: canvas.height(),
        screen_width,
        screen_height,
    }));

    renderer
        .image_count_watermark()
        .update(canvas.swapchain().image_count());

    if let Some(recorder) = canvas.recorder.as_mut() {
        recorder.set_dirty();
    }
    for image in 0..canvas.swapchain().image_count() {
        record_image(renderer, canvas, image);
    }

    Ok(FrameOutcome::Recreated)
}

/// Ready branch of the frame tick: record if dirty, compose, submit, present.
fn render<R, G>(
    renderer: &mut R,
    canvas: &mut Canvas<BackendOf<R>>,
    gui_window: Option<&mut G::Window>,
    callbacks: &mut [GuiCallback<G::Window>],
    fps: &mut FpsCounter,
) -> FrameOutcome
where
    R: Renderer,
    G: Gui<R::Backend>,
{
    let id = canvas.id();
    let cur = canvas.cur_frame();
    let image = canvas.swapchain().image_index();

    canvas.timestamps.record();
    canvas.sync.track_image(cur, image);

    if canvas.recorder.as_ref().is_some_and(|r| r.needs_record(image)) {
        record_image(renderer, canvas, image);
    }

    let monitor = match gui_window {
        Some(_) => renderer.monitor(),
        None => MonitorStats::default(),
    };

    let backend = renderer.backend();
    let gui_window = gui_window.map(|window| {
        gui::compose(backend, window, callbacks, image, fps, &monitor);
        &*window
    });

    let Some(commands) = canvas.commands.get(image as usize) else {
        log::error!("canvas #{id:x}: no command buffer for image {image}");
        return FrameOutcome::Skipped;
    };

    let mut submission = Submission::new(image);
    submission.push_commands(commands);
    if let Some(window) = gui_window {
        submission.push_commands(GuiWindow::<BackendOf<R>>::commands(window));
    }
    submission.wait_on(&canvas.sync.image_available[cur]);
    submission.signal(&canvas.sync.render_finished[cur]);
    submission.fence(&canvas.sync.render_finished_fences[cur]);

    if let Err(e) = backend.submit(&mut canvas.swapchain.raw, &submission) {
        log::error!("canvas #{id:x}: submission failed: {e}");
        backend.wait_idle();
        canvas.sync.recreate_semaphores(backend);
        canvas.invalidate();
        return FrameOutcome::Skipped;
    }

    let presented = backend.present(&mut canvas.swapchain.raw, image, &canvas.sync.render_finished[cur]);
    canvas.swapchain.on_present(presented);

    fps.tick();
    canvas.advance_frame();
    FrameOutcome::Presented
}

/// Refills the command buffer of `image` from the canvas recorder.
fn record_image<R: Renderer>(renderer: &mut R, canvas: &mut Canvas<BackendOf<R>>, image: u32) {
    let target = canvas.target(image);
    let Some(commands) = canvas.commands.get_mut(image as usize) else {
        return;
    };
    let Some(recorder) = canvas.recorder.as_mut() else {
        return;
    };

    let backend = renderer.backend();
    backend.reset_commands(commands);
    if recorder.is_empty() {
        log::debug!("record blank commands in the command buffer");
        backend.blank_commands(&canvas.swapchain.raw, image, commands);
    }

    for command in recorder.record(image) {
        if let Err(e) = renderer.record(target, command, commands) {
            log::error!("canvas #{:x}: failed recording {command:?}: {e:#}", target.id);
        }
    }
}

impl<R: Renderer, G: Gui<R::Backend>> Drop for Presenter<R, G> {
    fn drop(&mut self) {
        log::trace!("destroying the presenter");
        let backend = self.renderer.backend();
        backend.wait_idle();

        for (id, canvas) in self.canvases.drain() {
            log::trace!("destroying remaining canvas #{id:x}");
            drop(canvas.destroy(backend));
        }

        match self.gui.take() {
            Some(mut gui) => {
                for (_, window) in self.gui_windows.drain() {
                    gui.destroy_window(backend, window);
                }
                gui.destroy(backend);
            }
            None => self.gui_windows.clear(),
        }

        self.callbacks.clear();

        for (_, surface) in self.surfaces.drain() {
            backend.destroy_surface(surface);
        }

        self.fps.reset();
        log::trace!("presenter destroyed");
    }
}
