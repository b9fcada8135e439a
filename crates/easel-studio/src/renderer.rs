use std::collections::HashMap;

use easel_engine::device::wgpu_backend::{WgpuBackend, WgpuCommands};
use easel_engine::present::{
    CanvasTarget, Id, MonitorEntry, MonitorStats, RecorderCommand, Renderer, Request,
    RequestAction, RequestContent, RequestObject, Watermark,
};

const DEFAULT_BACKGROUND: [f32; 4] = [0.08, 0.08, 0.10, 1.0];

/// Canvas shells and their background colors.
#[derive(Debug, Default)]
pub struct Palette {
    colors: HashMap<Id, [f32; 4]>,
}

impl Palette {
    pub fn apply(&mut self, request: &Request) -> anyhow::Result<()> {
        match (request.object, request.action) {
            (RequestObject::Canvas, RequestAction::Create) => {
                self.colors.insert(request.id, DEFAULT_BACKGROUND);
            }
            (RequestObject::Canvas, RequestAction::Delete) => {
                self.colors.remove(&request.id);
            }
            (RequestObject::Background, RequestAction::Set) => {
                let RequestContent::Background(rgba) = request.content else {
                    anyhow::bail!("background request #{:x} carries no color", request.id);
                };
                let color = self
                    .colors
                    .get_mut(&request.id)
                    .ok_or_else(|| anyhow::anyhow!("no canvas #{:x}", request.id))?;
                *color = rgba;
            }
            _ => log::trace!("ignoring {request}"),
        }
        Ok(())
    }

    pub fn contains(&self, id: Id) -> bool {
        self.colors.contains_key(&id)
    }

    pub fn color(&self, id: Id) -> Option<[f32; 4]> {
        self.colors.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }
}

/// Renderer that clears each canvas to its background color.
pub struct ClearRenderer {
    backend: WgpuBackend,
    palette: Palette,
    watermark: Watermark,
}

impl ClearRenderer {
    pub fn new(backend: WgpuBackend) -> Self {
        Self {
            backend,
            palette: Palette::default(),
            watermark: Watermark::default(),
        }
    }
}

impl Renderer for ClearRenderer {
    type Backend = WgpuBackend;

    fn backend(&mut self) -> &mut WgpuBackend {
        &mut self.backend
    }

    fn apply(&mut self, request: &Request) -> anyhow::Result<()> {
        self.palette.apply(request)
    }

    fn has_canvas(&self, id: Id) -> bool {
        self.palette.contains(id)
    }

    fn record(
        &mut self,
        target: CanvasTarget,
        command: &RecorderCommand,
        commands: &mut WgpuCommands,
    ) -> anyhow::Result<()> {
        match command {
            RecorderCommand::Begin => {
                let [r, g, b, a] = self.palette.color(target.id).unwrap_or(DEFAULT_BACKGROUND);
                commands.clear = Some(wgpu::Color {
                    r: r as f64,
                    g: g as f64,
                    b: b as f64,
                    a: a as f64,
                });
            }
            RecorderCommand::Viewport { offset, shape } => {
                let s = target.scale;
                commands.viewport = Some([offset[0] * s, offset[1] * s, shape[0] * s, shape[1] * s]);
            }
            RecorderCommand::End => {}
            other => log::trace!("canvas #{:x}: no pipeline for {other:?}", target.id),
        }
        Ok(())
    }

    fn image_count_watermark(&mut self) -> &mut Watermark {
        &mut self.watermark
    }

    fn monitor(&self) -> MonitorStats {
        MonitorStats {
            entries: vec![MonitorEntry {
                label: "canvases".into(),
                used: self.palette.len() as u64,
                capacity: self.palette.len() as u64,
            }],
        }
    }
}
