use super::renderer::MonitorStats;
use super::request::Id;
use crate::device::Backend;
use crate::time::FpsCounter;
use crate::window::ClientWindow;

/// Widget surface the overlays draw on.
pub trait GuiPanel {
    /// Draws a titled panel with one text line per entry.
    fn text_panel(&mut self, title: &str, lines: &[String]);
}

/// A GUI render target bound to the swapchain images of one canvas.
pub trait GuiWindow<B: Backend>: GuiPanel {
    /// Id of the canvas the window is bound to.
    fn id(&self) -> Id;

    /// Starts recording the GUI pass for swapchain image `image`.
    fn begin(&mut self, backend: &mut B, image: u32);

    /// Finishes recording; [`commands`](Self::commands) is then ready to submit.
    fn end(&mut self, backend: &mut B, image: u32);

    fn resize(&mut self, width: u32, height: u32);

    fn commands(&self) -> &B::CommandBuffer;
}

/// The GUI toolkit.
///
/// Windows must be destroyed before the subsystem: the widget back-end keeps
/// platform bindings that outlive the render bindings of each window.
pub trait Gui<B: Backend> {
    type Window: GuiWindow<B>;

    fn create_window<W: ClientWindow>(
        &mut self,
        backend: &mut B,
        window: &W,
        swapchain: &B::Swapchain,
        image_count: u32,
        id: Id,
    ) -> anyhow::Result<Self::Window>;

    fn destroy_window(&mut self, backend: &mut B, window: Self::Window);

    fn destroy(self, backend: &mut B);
}

/// Placeholder GUI for presenters without a toolkit. It has no windows.
#[derive(Debug, Default)]
pub struct NoGui;

#[derive(Debug)]
pub enum NoGuiWindow {}

impl GuiPanel for NoGuiWindow {
    fn text_panel(&mut self, _title: &str, _lines: &[String]) {
        match *self {}
    }
}

impl<B: Backend> GuiWindow<B> for NoGuiWindow {
    fn id(&self) -> Id {
        match *self {}
    }

    fn begin(&mut self, _backend: &mut B, _image: u32) {
        match *self {}
    }

    fn end(&mut self, _backend: &mut B, _image: u32) {
        match *self {}
    }

    fn resize(&mut self, _width: u32, _height: u32) {
        match *self {}
    }

    fn commands(&self) -> &B::CommandBuffer {
        match *self {}
    }
}

impl<B: Backend> Gui<B> for NoGui {
    type Window = NoGuiWindow;

    fn create_window<W: ClientWindow>(
        &mut self,
        _backend: &mut B,
        _window: &W,
        _swapchain: &B::Swapchain,
        _image_count: u32,
        id: Id,
    ) -> anyhow::Result<NoGuiWindow> {
        anyhow::bail!("no GUI toolkit available for window #{id:x}")
    }

    fn destroy_window(&mut self, _backend: &mut B, window: NoGuiWindow) {
        match window {}
    }

    fn destroy(self, _backend: &mut B) {}
}

// ── overlays ──────────────────────────────────────────────────────────────

/// State handed to an overlay while it draws.
pub struct OverlayCtx<'a, W: ?Sized> {
    pub window: &'a mut W,
    pub fps: &'a FpsCounter,
    pub monitor: &'a MonitorStats,
}

/// Something drawn into a GUI window every frame that window renders.
pub trait Overlay<W: ?Sized> {
    fn render(&mut self, ctx: &mut OverlayCtx<'_, W>);
}

/// Built-in frame rate panel.
#[derive(Debug, Default, Clone, Copy)]
pub struct FpsOverlay;

impl<W: GuiPanel + ?Sized> Overlay<W> for FpsOverlay {
    fn render(&mut self, ctx: &mut OverlayCtx<'_, W>) {
        let fps = ctx.fps.fps();
        let frame_ms = if fps > 0.0 { 1000.0 / fps } else { 0.0 };
        let lines = [format!("{fps:.1} FPS"), format!("{frame_ms:.2} ms")];
        ctx.window.text_panel("FPS", &lines);
    }
}

/// Built-in resource monitor panel.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonitorOverlay;

impl<W: GuiPanel + ?Sized> Overlay<W> for MonitorOverlay {
    fn render(&mut self, ctx: &mut OverlayCtx<'_, W>) {
        let lines: Vec<String> = ctx
            .monitor
            .entries
            .iter()
            .map(|e| format!("{}: {} / {}", e.label, e.used, e.capacity))
            .collect();
        ctx.window.text_panel("Monitor", &lines);
    }
}

/// Adapts a closure into an [`Overlay`].
pub struct FnOverlay<F>(pub F);

impl<W: ?Sized, F> Overlay<W> for FnOverlay<F>
where
    F: FnMut(&mut OverlayCtx<'_, W>),
{
    fn render(&mut self, ctx: &mut OverlayCtx<'_, W>) {
        (self.0)(ctx)
    }
}

/// One GUI callback registration.
pub struct GuiCallback<W> {
    pub window_id: Id,
    pub overlay: Box<dyn Overlay<W>>,
}

/// Records the GUI pass of `window` for `image`.
///
/// Every callback registered for the window runs in registration order
/// between `begin` and `end`.
pub(crate) fn compose<B, W>(
    backend: &mut B,
    window: &mut W,
    callbacks: &mut [GuiCallback<W>],
    image: u32,
    fps: &FpsCounter,
    monitor: &MonitorStats,
) where
    B: Backend,
    W: GuiWindow<B>,
{
    let id = window.id();
    window.begin(backend, image);
    {
        let mut ctx = OverlayCtx {
            window: &mut *window,
            fps,
            monitor,
        };
        for callback in callbacks.iter_mut().filter(|c| c.window_id == id) {
            callback.overlay.render(&mut ctx);
        }
    }
    window.end(backend, image);
}
