//! In-memory collaborators for presenter tests.
//!
//! Every fake appends to one shared [`Log`], so tests can assert on the
//! global order of GPU, renderer, client and GUI calls.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use raw_window_handle::{
    DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, WindowHandle,
};

use crate::device::{AcquireOutcome, Backend, DeviceError, Extent, PresentOutcome, Submission};
use crate::present::{
    CanvasFlags, CanvasTarget, Gui, GuiPanel, GuiWindow, Id, MonitorStats, Presenter,
    PresenterConfig, RecorderCommand, Renderer, Request, RequestAction, RequestObject, Watermark,
};
use crate::window::{Client, ClientEvent, ClientWindow};

pub(crate) type Log = Rc<RefCell<Vec<Call>>>;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    // device
    WaitIdle,
    CreateSurface(u64),
    DestroySurface(u64),
    CreateSwapchain(u64, Extent),
    RecreateSwapchain(u64, Extent),
    DestroySwapchain(u64),
    Acquire(u64),
    Present { swapchain: u64, image: u32 },
    WaitFence(u64),
    DestroySemaphore(u64),
    DestroyFence(u64),
    ResetCommands(u64),
    BlankCommands { commands: u64, image: u32 },
    Submit { image: u32, commands: Vec<u64> },

    // renderer
    Apply(RequestAction, RequestObject, Id),
    Record { canvas: Id, image: u32, command: RecorderCommand },
    FlushTransfers(u32),

    // client
    CreateWindow(Id),
    DestroyWindow(Id),
    Emit(ClientEvent),

    // gui
    CreateGuiWindow(Id),
    DestroyGuiWindow(Id),
    DestroyGui,
    GuiBegin { id: Id, image: u32 },
    GuiEnd { id: Id, image: u32 },
    GuiResize { id: Id, width: u32, height: u32 },
    GuiPanel { id: Id, title: String },
}

// ── backend ───────────────────────────────────────────────────────────────

#[derive(Debug)]
pub(crate) struct FakeSurface(pub u64);

#[derive(Debug)]
pub(crate) struct FakeSwapchain {
    pub id: u64,
    pub image_count: u32,
    pub extent: Extent,
    next_image: u32,
}

impl FakeSwapchain {
    /// A swapchain no back-end knows about.
    pub fn detached(image_count: u32) -> Self {
        Self {
            id: 0,
            image_count,
            extent: Extent::default(),
            next_image: 0,
        }
    }
}

#[derive(Debug)]
pub(crate) struct FakeSemaphore(pub u64);

#[derive(Debug, Clone)]
pub(crate) struct FakeFence(pub u64);

#[derive(Debug)]
pub(crate) struct FakeCommands(pub u64);

/// Scriptable back-end that checks the semaphore protocol.
///
/// A semaphore signalled while already signalled, or waited on while
/// unsignalled, is recorded as a violation instead of panicking so tests
/// can assert on the whole run.
pub(crate) struct FakeBackend {
    log: Log,
    next_id: u64,
    image_count: u32,
    acquire_script: VecDeque<AcquireOutcome>,
    present_script: VecDeque<PresentOutcome>,
    failing_submits: usize,
    failing_surfaces: usize,
    live_semaphores: HashSet<u64>,
    signalled: HashSet<u64>,
    violations: Vec<String>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::with_image_count(3)
    }

    pub fn with_image_count(image_count: u32) -> Self {
        Self {
            log: Log::default(),
            next_id: 1,
            image_count,
            acquire_script: VecDeque::new(),
            present_script: VecDeque::new(),
            failing_submits: 0,
            failing_surfaces: 0,
            live_semaphores: HashSet::new(),
            signalled: HashSet::new(),
            violations: Vec::new(),
        }
    }

    pub fn log(&self) -> Log {
        self.log.clone()
    }

    /// Image count of swapchains created or recreated from now on.
    pub fn set_image_count(&mut self, image_count: u32) {
        self.image_count = image_count;
    }

    pub fn fake_surface(&mut self) -> FakeSurface {
        FakeSurface(self.alloc())
    }

    pub fn script_acquire(&mut self, outcome: AcquireOutcome) {
        self.acquire_script.push_back(outcome);
    }

    pub fn script_present(&mut self, outcome: PresentOutcome) {
        self.present_script.push_back(outcome);
    }

    pub fn fail_next_submit(&mut self) {
        self.failing_submits += 1;
    }

    pub fn fail_next_surface(&mut self) {
        self.failing_surfaces += 1;
    }

    pub fn live_semaphores(&self) -> usize {
        self.live_semaphores.len()
    }

    pub fn violations(&self) -> &[String] {
        &self.violations
    }

    fn alloc(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn push(&self, call: Call) {
        self.log.borrow_mut().push(call);
    }

    fn signal(&mut self, semaphore: u64) {
        if !self.signalled.insert(semaphore) {
            self.violations
                .push(format!("semaphore {semaphore} signalled while already signalled"));
        }
    }

    fn consume(&mut self, semaphore: u64) {
        if !self.signalled.remove(&semaphore) {
            self.violations
                .push(format!("wait on unsignalled semaphore {semaphore}"));
        }
    }
}

impl Backend for FakeBackend {
    type Surface = FakeSurface;
    type Swapchain = FakeSwapchain;
    type Semaphore = FakeSemaphore;
    type Fence = FakeFence;
    type CommandBuffer = FakeCommands;

    fn wait_idle(&mut self) {
        self.push(Call::WaitIdle);
    }

    fn create_surface<W>(&mut self, _window: &W) -> Result<FakeSurface, DeviceError>
    where
        W: HasWindowHandle + HasDisplayHandle,
    {
        if self.failing_surfaces > 0 {
            self.failing_surfaces -= 1;
            return Err(DeviceError::Surface("scripted failure".into()));
        }
        let surface = self.fake_surface();
        self.push(Call::CreateSurface(surface.0));
        Ok(surface)
    }

    fn destroy_surface(&mut self, surface: FakeSurface) {
        self.push(Call::DestroySurface(surface.0));
    }

    fn create_swapchain(
        &mut self,
        _surface: &FakeSurface,
        extent: Extent,
    ) -> Result<FakeSwapchain, DeviceError> {
        let id = self.alloc();
        self.push(Call::CreateSwapchain(id, extent));
        Ok(FakeSwapchain {
            id,
            image_count: self.image_count,
            extent,
            next_image: 0,
        })
    }

    fn recreate_swapchain(
        &mut self,
        swapchain: &mut FakeSwapchain,
        extent: Extent,
    ) -> Result<(), DeviceError> {
        self.push(Call::RecreateSwapchain(swapchain.id, extent));
        swapchain.extent = extent;
        swapchain.image_count = self.image_count;
        swapchain.next_image = 0;
        Ok(())
    }

    fn destroy_swapchain(&mut self, swapchain: FakeSwapchain) {
        self.push(Call::DestroySwapchain(swapchain.id));
    }

    fn image_count(&self, swapchain: &FakeSwapchain) -> u32 {
        swapchain.image_count
    }

    fn acquire(&mut self, swapchain: &mut FakeSwapchain, signal: &FakeSemaphore) -> AcquireOutcome {
        self.push(Call::Acquire(swapchain.id));
        let outcome = self.acquire_script.pop_front().unwrap_or_else(|| {
            let image = swapchain.next_image;
            swapchain.next_image = (image + 1) % swapchain.image_count.max(1);
            AcquireOutcome::Acquired(image)
        });
        if matches!(
            outcome,
            AcquireOutcome::Acquired(_) | AcquireOutcome::Suboptimal(_)
        ) {
            self.signal(signal.0);
        }
        outcome
    }

    fn present(
        &mut self,
        swapchain: &mut FakeSwapchain,
        image: u32,
        wait: &FakeSemaphore,
    ) -> PresentOutcome {
        self.push(Call::Present {
            swapchain: swapchain.id,
            image,
        });
        self.consume(wait.0);
        self.present_script
            .pop_front()
            .unwrap_or(PresentOutcome::Presented)
    }

    fn create_semaphore(&mut self) -> FakeSemaphore {
        let id = self.alloc();
        self.live_semaphores.insert(id);
        FakeSemaphore(id)
    }

    fn destroy_semaphore(&mut self, semaphore: FakeSemaphore) {
        self.push(Call::DestroySemaphore(semaphore.0));
        self.live_semaphores.remove(&semaphore.0);
        self.signalled.remove(&semaphore.0);
    }

    fn create_fence(&mut self, _signaled: bool) -> FakeFence {
        FakeFence(self.alloc())
    }

    fn destroy_fence(&mut self, fence: FakeFence) {
        self.push(Call::DestroyFence(fence.0));
    }

    fn wait_fence(&mut self, fence: &FakeFence) {
        self.push(Call::WaitFence(fence.0));
    }

    fn create_command_buffer(&mut self) -> FakeCommands {
        FakeCommands(self.alloc())
    }

    fn destroy_command_buffer(&mut self, _commands: FakeCommands) {}

    fn reset_commands(&mut self, commands: &mut FakeCommands) {
        self.push(Call::ResetCommands(commands.0));
    }

    fn blank_commands(&mut self, _swapchain: &FakeSwapchain, image: u32, commands: &mut FakeCommands) {
        self.push(Call::BlankCommands {
            commands: commands.0,
            image,
        });
    }

    fn submit(
        &mut self,
        _swapchain: &mut FakeSwapchain,
        submission: &Submission<'_, Self>,
    ) -> Result<(), DeviceError> {
        if self.failing_submits > 0 {
            self.failing_submits -= 1;
            return Err(DeviceError::Submit("scripted failure".into()));
        }

        self.push(Call::Submit {
            image: submission.image(),
            commands: submission.commands().iter().map(|c| c.0).collect(),
        });
        if let Some(wait) = submission.wait_semaphore() {
            self.consume(wait.0);
        }
        if let Some(signal) = submission.signal_semaphore() {
            self.signal(signal.0);
        }
        Ok(())
    }
}

// ── renderer ──────────────────────────────────────────────────────────────

pub(crate) struct FakeRenderer {
    backend: FakeBackend,
    log: Log,
    canvases: HashSet<Id>,
    watermark: Watermark,
    failing: HashSet<Id>,
    pub monitor: MonitorStats,
}

impl FakeRenderer {
    pub fn new(backend: FakeBackend) -> Self {
        Self {
            log: backend.log(),
            backend,
            canvases: HashSet::new(),
            watermark: Watermark::default(),
            failing: HashSet::new(),
            monitor: MonitorStats::default(),
        }
    }

    /// Makes every request targeting `id` fail.
    pub fn fail_requests_for(&mut self, id: Id) {
        self.failing.insert(id);
    }

    pub fn fake_backend(&self) -> &FakeBackend {
        &self.backend
    }

    pub fn watermark(&self) -> u32 {
        self.watermark.get()
    }
}

impl Renderer for FakeRenderer {
    type Backend = FakeBackend;

    fn backend(&mut self) -> &mut FakeBackend {
        &mut self.backend
    }

    fn apply(&mut self, request: &Request) -> anyhow::Result<()> {
        self.log
            .borrow_mut()
            .push(Call::Apply(request.action, request.object, request.id));
        if self.failing.contains(&request.id) {
            anyhow::bail!("scripted failure");
        }
        if request.object == RequestObject::Canvas {
            match request.action {
                RequestAction::Create => {
                    self.canvases.insert(request.id);
                }
                RequestAction::Delete => {
                    self.canvases.remove(&request.id);
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn has_canvas(&self, id: Id) -> bool {
        self.canvases.contains(&id)
    }

    fn record(
        &mut self,
        target: CanvasTarget,
        command: &RecorderCommand,
        _commands: &mut FakeCommands,
    ) -> anyhow::Result<()> {
        self.log.borrow_mut().push(Call::Record {
            canvas: target.id,
            image: target.image,
            command: command.clone(),
        });
        Ok(())
    }

    fn image_count_watermark(&mut self) -> &mut Watermark {
        &mut self.watermark
    }

    fn flush_transfers(&mut self, image: u32) {
        self.log.borrow_mut().push(Call::FlushTransfers(image));
    }

    fn monitor(&self) -> MonitorStats {
        self.monitor.clone()
    }
}

// ── client ────────────────────────────────────────────────────────────────

/// Window with a fixed DPI scale; resizes apply on `poll_size`.
#[derive(Debug)]
pub(crate) struct FakeWindow {
    pub screen: (u32, u32),
    pub framebuffer: (u32, u32),
    pub fullscreen: bool,
    scale: u32,
    pending: Option<(u32, u32)>,
}

impl FakeWindow {
    /// Queues a new screen size, visible after the next poll.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.pending = Some((width, height));
    }
}

impl HasWindowHandle for FakeWindow {
    fn window_handle(&self) -> Result<WindowHandle<'_>, HandleError> {
        Err(HandleError::Unavailable)
    }
}

impl HasDisplayHandle for FakeWindow {
    fn display_handle(&self) -> Result<DisplayHandle<'_>, HandleError> {
        Err(HandleError::Unavailable)
    }
}

impl ClientWindow for FakeWindow {
    fn screen_size(&self) -> (u32, u32) {
        self.screen
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        self.framebuffer
    }

    fn poll_size(&mut self) {
        if let Some((w, h)) = self.pending.take() {
            self.screen = (w, h);
            self.framebuffer = (w * self.scale, h * self.scale);
        }
    }

    fn set_fullscreen(&mut self, fullscreen: bool) {
        self.fullscreen = fullscreen;
    }
}

pub(crate) struct FakeClient {
    log: Log,
    scale: u32,
    windows: HashMap<Id, FakeWindow>,
    pub events: Vec<ClientEvent>,
    pub frame: u64,
}

impl FakeClient {
    /// Client whose windows have a framebuffer twice the screen size.
    pub fn new(log: Log) -> Self {
        Self {
            log,
            scale: 2,
            windows: HashMap::new(),
            events: Vec::new(),
            frame: 0,
        }
    }

    pub fn fake_window(&mut self, id: Id) -> &mut FakeWindow {
        self.windows
            .get_mut(&id)
            .unwrap_or_else(|| panic!("no window #{id:x}"))
    }

    pub fn close(&mut self, id: Id) {
        self.windows.remove(&id);
    }

    pub fn has_window(&self, id: Id) -> bool {
        self.windows.contains_key(&id)
    }
}

impl Client for FakeClient {
    type Window = FakeWindow;

    fn create_window(
        &mut self,
        id: Id,
        width: u32,
        height: u32,
        _flags: CanvasFlags,
    ) -> anyhow::Result<&mut FakeWindow> {
        self.log.borrow_mut().push(Call::CreateWindow(id));
        let scale = self.scale;
        Ok(self.windows.entry(id).or_insert(FakeWindow {
            screen: (width, height),
            framebuffer: (width * scale, height * scale),
            fullscreen: false,
            scale,
            pending: None,
        }))
    }

    fn window(&mut self, id: Id) -> Option<&mut FakeWindow> {
        self.windows.get_mut(&id)
    }

    fn destroy_window(&mut self, id: Id) {
        if self.windows.remove(&id).is_some() {
            self.log.borrow_mut().push(Call::DestroyWindow(id));
        }
    }

    fn emit(&mut self, event: ClientEvent) {
        self.log.borrow_mut().push(Call::Emit(event));
        self.events.push(event);
    }

    fn frame_index(&self) -> u64 {
        self.frame
    }
}

// ── gui ───────────────────────────────────────────────────────────────────

pub(crate) struct FakeGui {
    log: Log,
}

impl FakeGui {
    pub fn new(log: Log) -> Self {
        Self { log }
    }
}

pub(crate) struct FakeGuiWindow {
    id: Id,
    log: Log,
    commands: FakeCommands,
    pub size: (u32, u32),
}

impl GuiPanel for FakeGuiWindow {
    fn text_panel(&mut self, title: &str, _lines: &[String]) {
        self.log.borrow_mut().push(Call::GuiPanel {
            id: self.id,
            title: title.to_string(),
        });
    }
}

impl GuiWindow<FakeBackend> for FakeGuiWindow {
    fn id(&self) -> Id {
        self.id
    }

    fn begin(&mut self, _backend: &mut FakeBackend, image: u32) {
        self.log.borrow_mut().push(Call::GuiBegin { id: self.id, image });
    }

    fn end(&mut self, _backend: &mut FakeBackend, image: u32) {
        self.log.borrow_mut().push(Call::GuiEnd { id: self.id, image });
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        self.log.borrow_mut().push(Call::GuiResize {
            id: self.id,
            width,
            height,
        });
    }

    fn commands(&self) -> &FakeCommands {
        &self.commands
    }
}

impl Gui<FakeBackend> for FakeGui {
    type Window = FakeGuiWindow;

    fn create_window<W: ClientWindow>(
        &mut self,
        backend: &mut FakeBackend,
        window: &W,
        _swapchain: &FakeSwapchain,
        _image_count: u32,
        id: Id,
    ) -> anyhow::Result<FakeGuiWindow> {
        self.log.borrow_mut().push(Call::CreateGuiWindow(id));
        Ok(FakeGuiWindow {
            id,
            log: self.log.clone(),
            commands: backend.create_command_buffer(),
            size: window.framebuffer_size(),
        })
    }

    fn destroy_window(&mut self, backend: &mut FakeBackend, window: FakeGuiWindow) {
        self.log.borrow_mut().push(Call::DestroyGuiWindow(window.id));
        backend.destroy_command_buffer(window.commands);
    }

    fn destroy(self, _backend: &mut FakeBackend) {
        self.log.borrow_mut().push(Call::DestroyGui);
    }
}

// ── fixtures ──────────────────────────────────────────────────────────────

pub(crate) type FakePresenter = Presenter<FakeRenderer, FakeGui>;

/// Presenter over fakes with a GUI subsystem, plus its client and log.
pub(crate) fn presenter() -> (FakePresenter, FakeClient, Log) {
    presenter_with(FakeBackend::new())
}

pub(crate) fn presenter_with(backend: FakeBackend) -> (FakePresenter, FakeClient, Log) {
    let log = backend.log();
    let renderer = FakeRenderer::new(backend);
    let presenter = Presenter::new(
        renderer,
        Some(FakeGui::new(log.clone())),
        PresenterConfig::default(),
    );
    (presenter, FakeClient::new(log.clone()), log)
}

/// Number of log entries matching `pred`.
pub(crate) fn count(log: &Log, pred: impl Fn(&Call) -> bool) -> usize {
    log.borrow().iter().filter(|c| pred(c)).count()
}
