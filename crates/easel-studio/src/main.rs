mod renderer;

use std::collections::HashMap;

use easel_engine::core::{App, AppControl};
use easel_engine::device::wgpu_backend::{GpuInit, WgpuBackend};
use easel_engine::logging::{init_logging, LoggingConfig};
use easel_engine::present::{Batch, CanvasFlags, Id, Presenter, PresenterConfig};
use easel_engine::window::{ClientEvent, Runtime, RuntimeConfig, RuntimeCtx};

use renderer::ClearRenderer;

const MAIN: Id = 1;
const SIDE: Id = 2;

/// Frames between two background changes of the main canvas.
const CYCLE: u64 = 90;

const COLORS: [[f32; 4]; 4] = [
    [0.10, 0.12, 0.20, 1.0],
    [0.20, 0.10, 0.12, 1.0],
    [0.10, 0.20, 0.12, 1.0],
    [0.18, 0.18, 0.18, 1.0],
];

/// Two canvases: the main one cycles its background, the side one stays put.
#[derive(Default)]
struct Studio {
    frames: u64,
    color: usize,
    /// Last known screen size per canvas.
    sizes: HashMap<Id, [f32; 2]>,
}

impl Studio {
    fn record(&mut self, batch: &mut Batch, id: Id, width: f32, height: f32) {
        self.sizes.insert(id, [width, height]);
        batch
            .record_begin(id)
            .record_viewport(id, [0.0, 0.0], [width, height])
            .record_end(id);
    }
}

impl App for Studio {
    fn on_start(&mut self, ctx: &mut RuntimeCtx) {
        let mut batch = Batch::new();
        batch
            .create_canvas(MAIN, 800, 600, CanvasFlags::empty())
            .set_background(MAIN, COLORS[0]);
        self.record(&mut batch, MAIN, 800.0, 600.0);

        batch
            .create_canvas(SIDE, 420, 300, CanvasFlags::empty())
            .set_background(SIDE, [0.05, 0.05, 0.05, 1.0]);
        self.record(&mut batch, SIDE, 420.0, 300.0);

        ctx.submit(batch);
    }

    fn on_event(&mut self, event: &ClientEvent, ctx: &mut RuntimeCtx) {
        let ClientEvent::Resize(resize) = event;
        log::info!(
            "canvas #{:x} resized: framebuffer {}x{}, screen {}x{}",
            resize.window_id,
            resize.framebuffer_width,
            resize.framebuffer_height,
            resize.screen_width,
            resize.screen_height
        );

        let mut batch = Batch::new();
        self.record(
            &mut batch,
            resize.window_id,
            resize.screen_width as f32,
            resize.screen_height as f32,
        );
        ctx.submit(batch);
    }

    fn on_frame(&mut self, id: Id, ctx: &mut RuntimeCtx) -> AppControl {
        if id != MAIN {
            return AppControl::Continue;
        }

        self.frames += 1;
        if self.frames % CYCLE == 0 {
            self.color = (self.color + 1) % COLORS.len();
            // The recorder is only dirtied by record requests, so re-record
            // after changing the background.
            let [width, height] = self.sizes.get(&MAIN).copied().unwrap_or([800.0, 600.0]);
            let mut batch = Batch::new();
            batch.set_background(MAIN, COLORS[self.color]);
            self.record(&mut batch, MAIN, width, height);
            ctx.submit(batch);
        }
        AppControl::Continue
    }
}

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let backend = WgpuBackend::new(GpuInit::default())?;
    let presenter: Presenter<ClearRenderer> =
        Presenter::new(ClearRenderer::new(backend), None, PresenterConfig::from_env());

    Runtime::run(
        RuntimeConfig {
            title: "Easel Studio".to_string(),
        },
        presenter,
        Studio::default(),
    )
}
