use anyhow::{Context, Result};
use std::collections::HashMap;
use std::sync::Arc;

use raw_window_handle::{
    DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, WindowHandle,
};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Fullscreen, Window, WindowId};

use super::{Client, ClientEvent, ClientWindow};
use crate::core::{App, AppControl};
use crate::present::{Batch, CanvasFlags, Gui, Id, Presenter, Renderer};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Window titles are `"{title} #{id}"`.
    pub title: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "easel".to_string(),
        }
    }
}

/// Runtime context passed to the application.
///
/// Commands are buffered and applied after the current callback returns.
#[derive(Default)]
pub struct RuntimeCtx {
    commands: Vec<Command>,
}

impl RuntimeCtx {
    /// Queues a batch for the presenter.
    pub fn submit(&mut self, batch: Batch) {
        self.commands.push(Command::Submit(batch));
    }

    pub fn exit(&mut self) {
        self.commands.push(Command::Exit);
    }

    fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

enum Command {
    Submit(Batch),
    Exit,
}

/// A winit window registered under a canvas id.
pub struct WinitWindow {
    id: Id,
    window: Arc<Window>,
    screen: (u32, u32),
    framebuffer: (u32, u32),
}

impl WinitWindow {
    fn new(id: Id, window: Window) -> Self {
        let mut w = Self {
            id,
            window: Arc::new(window),
            screen: (0, 0),
            framebuffer: (0, 0),
        };
        w.poll_size();
        w
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn window(&self) -> &Window {
        &self.window
    }
}

impl HasWindowHandle for WinitWindow {
    fn window_handle(&self) -> Result<WindowHandle<'_>, HandleError> {
        self.window.window_handle()
    }
}

impl HasDisplayHandle for WinitWindow {
    fn display_handle(&self) -> Result<DisplayHandle<'_>, HandleError> {
        self.window.display_handle()
    }
}

impl ClientWindow for WinitWindow {
    fn screen_size(&self) -> (u32, u32) {
        self.screen
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        self.framebuffer
    }

    fn poll_size(&mut self) {
        let physical = self.window.inner_size();
        let logical: LogicalSize<u32> = physical.to_logical(self.window.scale_factor());
        self.framebuffer = (physical.width, physical.height);
        self.screen = (logical.width, logical.height);
    }

    fn set_fullscreen(&mut self, fullscreen: bool) {
        self.window
            .set_fullscreen(fullscreen.then_some(Fullscreen::Borderless(None)));
    }
}

#[derive(Default)]
struct Registry {
    title: String,
    windows: HashMap<Id, WinitWindow>,
    ids: HashMap<WindowId, Id>,
    events: Vec<ClientEvent>,
    frame: u64,
}

impl Registry {
    fn remove(&mut self, id: Id) {
        if let Some(w) = self.windows.remove(&id) {
            self.ids.remove(&w.window.id());
        }
    }
}

/// [`Client`] over the live winit event loop.
///
/// Only exists while a winit callback runs, since window creation needs the
/// active event loop.
pub struct WinitClient<'a> {
    event_loop: &'a ActiveEventLoop,
    registry: &'a mut Registry,
}

impl Client for WinitClient<'_> {
    type Window = WinitWindow;

    fn create_window(
        &mut self,
        id: Id,
        width: u32,
        height: u32,
        _flags: CanvasFlags,
    ) -> Result<&mut WinitWindow> {
        let attrs = Window::default_attributes()
            .with_title(format!("{} #{id}", self.registry.title))
            .with_inner_size(LogicalSize::new(width, height));

        let window = self
            .event_loop
            .create_window(attrs)
            .with_context(|| format!("failed to create window #{id:x}"))?;

        self.registry.remove(id);
        self.registry.ids.insert(window.id(), id);
        Ok(self
            .registry
            .windows
            .entry(id)
            .or_insert(WinitWindow::new(id, window)))
    }

    fn window(&mut self, id: Id) -> Option<&mut WinitWindow> {
        self.registry.windows.get_mut(&id)
    }

    fn destroy_window(&mut self, id: Id) {
        self.registry.remove(id);
    }

    fn emit(&mut self, event: ClientEvent) {
        self.registry.events.push(event);
    }

    fn frame_index(&self) -> u64 {
        self.registry.frame
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Runs the winit loop until the application exits or the last window
    /// closes. The presenter is dropped before the windows it presents to.
    pub fn run<R, G, A>(config: RuntimeConfig, presenter: Presenter<R, G>, app: A) -> Result<()>
    where
        R: Renderer + 'static,
        G: Gui<R::Backend> + 'static,
        A: App + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState {
            presenter,
            app,
            registry: Registry {
                title: config.title,
                ..Registry::default()
            },
            started: false,
            exit_requested: false,
        };

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        Ok(())
    }
}

// Field order matters: the presenter (and its surfaces) drops before the
// registry (and its windows).
struct AppState<R, G, A>
where
    R: Renderer,
    G: Gui<R::Backend>,
{
    presenter: Presenter<R, G>,
    app: A,
    registry: Registry,
    started: bool,
    exit_requested: bool,
}

impl<R, G, A> AppState<R, G, A>
where
    R: Renderer,
    G: Gui<R::Backend>,
    A: App,
{
    fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    /// Applies queued commands, then forwards client events to the app until
    /// neither produces more work.
    fn apply_commands(&mut self, event_loop: &ActiveEventLoop, mut ctx: RuntimeCtx) {
        loop {
            for cmd in ctx.commands.drain(..) {
                match cmd {
                    Command::Submit(batch) => {
                        let mut client = WinitClient {
                            event_loop,
                            registry: &mut self.registry,
                        };
                        if let Err(e) = self.presenter.submit(&mut client, batch) {
                            log::error!("batch rejected: {e:#}");
                            self.exit_requested = true;
                        }
                    }
                    Command::Exit => self.exit_requested = true,
                }
            }

            for event in std::mem::take(&mut self.registry.events) {
                self.app.on_event(&event, &mut ctx);
            }

            if ctx.is_empty() {
                break;
            }
        }

        if self.started && self.registry.windows.is_empty() {
            self.request_exit();
        }

        if self.exit_requested {
            event_loop.exit();
        }
    }

    fn close_window(&mut self, id: Id) {
        if let Err(e) = self.presenter.on_window_close(id) {
            log::error!("failed closing window #{id:x}: {e:#}");
        }
        self.registry.remove(id);
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop, id: Id) {
        self.registry.frame += 1;

        let mut ctx = RuntimeCtx::default();
        let mut client = WinitClient {
            event_loop,
            registry: &mut self.registry,
        };
        if !tick(&mut self.presenter, &mut self.app, &mut client, id, &mut ctx) {
            self.request_exit();
        }
        self.apply_commands(event_loop, ctx);
    }
}

/// One redraw of window `id`: the presenter frame, then the app's frame hook.
///
/// A window whose canvas is already gone (a redraw queued before its
/// deletion) is skipped. Returns `false` when the frame failed.
fn tick<R, G, A, C>(
    presenter: &mut Presenter<R, G>,
    app: &mut A,
    client: &mut C,
    id: Id,
    ctx: &mut RuntimeCtx,
) -> bool
where
    R: Renderer,
    G: Gui<R::Backend>,
    A: App,
    C: Client,
{
    if presenter.canvas(id).is_none() {
        log::trace!("window #{id:x} has no canvas, skipping redraw");
        return true;
    }

    let presented = match presenter.frame(client, id) {
        Ok(_) => true,
        Err(e) => {
            log::error!("frame failed for window #{id:x}: {e:#}");
            false
        }
    };

    if app.on_frame(id, ctx) == AppControl::Exit {
        ctx.exit();
    }
    presented
}

impl<R, G, A> ApplicationHandler for AppState<R, G, A>
where
    R: Renderer,
    G: Gui<R::Backend>,
    A: App,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.started {
            return;
        }

        let mut ctx = RuntimeCtx::default();
        self.app.on_start(&mut ctx);
        self.apply_commands(event_loop, ctx);
        self.started = true;

        if self.registry.windows.is_empty() {
            log::warn!("application started without any canvas");
            self.request_exit();
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw.
        for w in self.registry.windows.values() {
            w.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        let Some(id) = self.registry.ids.get(&window_id).copied() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                self.close_window(id);
                if self.registry.windows.is_empty() {
                    self.request_exit();
                }
            }

            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                self.presenter.mark_resized(id);
                if let Some(w) = self.registry.windows.get(&id) {
                    w.window.request_redraw();
                }
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop, id),

            _ => {}
        }

        if self.exit_requested {
            event_loop.exit();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{presenter, FakeClient, FakePresenter};

    #[derive(Default)]
    struct FrameCounter {
        frames: Vec<Id>,
        exit_after: Option<usize>,
    }

    impl App for FrameCounter {
        fn on_start(&mut self, _ctx: &mut RuntimeCtx) {}

        fn on_frame(&mut self, id: Id, _ctx: &mut RuntimeCtx) -> AppControl {
            self.frames.push(id);
            match self.exit_after {
                Some(n) if self.frames.len() >= n => AppControl::Exit,
                _ => AppControl::Continue,
            }
        }
    }

    fn submit(p: &mut FakePresenter, client: &mut FakeClient, f: impl FnOnce(&mut Batch)) {
        let mut batch = Batch::new();
        f(&mut batch);
        p.submit(client, batch).unwrap();
    }

    // ── tick ──────────────────────────────────────────────────────────────

    #[test]
    fn tick_runs_the_frame_then_the_app_hook() {
        let (mut p, mut client, _log) = presenter();
        submit(&mut p, &mut client, |b| {
            b.create_canvas(1, 800, 600, CanvasFlags::empty());
        });

        let mut app = FrameCounter::default();
        let mut ctx = RuntimeCtx::default();
        assert!(tick(&mut p, &mut app, &mut client, 1, &mut ctx));
        assert!(tick(&mut p, &mut app, &mut client, 1, &mut ctx));
        assert_eq!(app.frames, [1, 1]);
        assert_eq!(p.fps().frame_count(), 1);
        assert!(ctx.is_empty());
    }

    #[test]
    fn deleted_canvas_closes_its_window_and_is_not_ticked() {
        let (mut p, mut client, _log) = presenter();
        submit(&mut p, &mut client, |b| {
            b.create_canvas(1, 800, 600, CanvasFlags::empty())
                .create_canvas(2, 400, 300, CanvasFlags::empty());
        });
        submit(&mut p, &mut client, |b| {
            b.delete_canvas(1);
        });
        assert!(!client.has_window(1));
        assert!(client.has_window(2));

        // A redraw queued before the deletion must not stop the runtime.
        let mut app = FrameCounter::default();
        let mut ctx = RuntimeCtx::default();
        assert!(tick(&mut p, &mut app, &mut client, 1, &mut ctx));
        assert!(app.frames.is_empty());

        assert!(tick(&mut p, &mut app, &mut client, 2, &mut ctx));
        assert_eq!(app.frames, [2]);
    }

    #[test]
    fn tick_reports_a_failed_frame_and_forwards_app_exit() {
        let (mut p, mut client, _log) = presenter();
        submit(&mut p, &mut client, |b| {
            b.create_canvas(1, 800, 600, CanvasFlags::empty());
        });
        // Canvas without a window: the presenter rejects the frame.
        client.close(1);

        let mut app = FrameCounter {
            exit_after: Some(1),
            ..FrameCounter::default()
        };
        let mut ctx = RuntimeCtx::default();
        assert!(!tick(&mut p, &mut app, &mut client, 1, &mut ctx));
        assert!(matches!(ctx.commands.as_slice(), [Command::Exit]));
    }

    // ── commands ──────────────────────────────────────────────────────────

    #[test]
    fn ctx_buffers_commands_in_order() {
        let mut ctx = RuntimeCtx::default();
        assert!(ctx.is_empty());

        let mut batch = Batch::new();
        batch.delete_canvas(1);
        ctx.submit(batch);
        ctx.exit();

        let kinds: Vec<&str> = ctx
            .commands
            .iter()
            .map(|c| match c {
                Command::Submit(_) => "submit",
                Command::Exit => "exit",
            })
            .collect();
        assert_eq!(kinds, ["submit", "exit"]);
    }

    #[test]
    fn registry_remove_forgets_unknown_ids() {
        let mut registry = Registry::default();
        registry.remove(3);
        assert!(registry.windows.is_empty());
    }
}
