use thiserror::Error;

use super::request::{Id, RequestAction, RequestObject};
use crate::device::DeviceError;

/// Presenter failures.
///
/// Everything except `Renderer` and `Device` is a broken caller contract
/// (missing collaborator, zero size, unknown id): the operation is aborted
/// and nothing is retried.
#[derive(Debug, Error)]
pub enum PresentError {
    #[error("canvas #{id:x} has a zero screen size ({width}x{height})")]
    ZeroSize { id: Id, width: u32, height: u32 },

    #[error("the renderer has no canvas #{0:x}")]
    MissingCanvasShell(Id),

    #[error("no canvas #{0:x}")]
    MissingCanvas(Id),

    #[error("canvas #{0:x} already exists")]
    DuplicateCanvas(Id),

    #[error("no window #{0:x}")]
    MissingWindow(Id),

    #[error("canvas #{0:x} has no recorder")]
    MissingRecorder(Id),

    #[error("canvas request #{0:x} carries no canvas content")]
    MissingContent(Id),

    #[error("canvas #{0:x} requests a GUI but the presenter has no GUI subsystem")]
    GuiUnavailable(Id),

    #[error("GUI callbacks need a non-zero window id")]
    NullWindowId,

    #[error("failed to create window #{id:x}: {reason:#}")]
    Window { id: Id, reason: anyhow::Error },

    #[error("failed to create the GUI window of canvas #{id:x}: {reason:#}")]
    Gui { id: Id, reason: anyhow::Error },

    #[error("renderer failed on {action:?} {object:?} #{id:x}: {reason:#}")]
    Renderer {
        id: Id,
        action: RequestAction,
        object: RequestObject,
        reason: anyhow::Error,
    },

    #[error(transparent)]
    Device(#[from] DeviceError),
}
