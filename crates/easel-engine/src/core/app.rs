use crate::present::Id;
use crate::window::{ClientEvent, RuntimeCtx};

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by higher layers.
pub trait App {
    /// Called once when the event loop is ready; queue the initial canvases here.
    fn on_start(&mut self, ctx: &mut RuntimeCtx);

    /// Called for presenter notifications (e.g. a canvas was resized).
    fn on_event(&mut self, event: &ClientEvent, ctx: &mut RuntimeCtx) {
        let _ = (event, ctx);
    }

    /// Called after each frame tick of window `id`.
    fn on_frame(&mut self, id: Id, ctx: &mut RuntimeCtx) -> AppControl {
        let _ = (id, ctx);
        AppControl::Continue
    }
}
