use std::fmt;

use serde::{Serialize, Serializer};

use super::recorder::RecorderCommand;

/// Object id. Canvases share their id with the window they present to.
pub type Id = u64;

bitflags::bitflags! {
    /// Canvas creation flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CanvasFlags: u32 {
        /// Attach a GUI window to the canvas.
        const GUI = 0b0000_0001;
        /// Built-in FPS overlay (implies `GUI`).
        const FPS = 0b0000_0010;
        /// Built-in resource monitor overlay (implies `GUI`).
        const MONITOR = 0b0000_0100;
        /// Open the window fullscreen.
        const FULLSCREEN = 0b0000_1000;
    }
}

impl CanvasFlags {
    /// Whether the canvas needs a GUI window.
    pub fn wants_gui(self) -> bool {
        self.intersects(Self::GUI | Self::FPS | Self::MONITOR)
    }
}

impl Serialize for CanvasFlags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.bits().serialize(serializer)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestAction {
    Create,
    Delete,
    Resize,
    Update,
    Bind,
    Record,
    Upload,
    Set,
    Get,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestObject {
    Canvas,
    Dat,
    Tex,
    Sampler,
    Graphics,
    Compute,
    Background,
    Record,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestContent {
    None,
    Canvas { screen_width: u32, screen_height: u32 },
    Record(RecorderCommand),
    Background([f32; 4]),
    Bytes(Vec<u8>),
}

/// One renderer request.
///
/// Only `Canvas` requests (window/surface binding) and `Record` requests
/// (recorder content) are interpreted by the presenter; everything else is
/// opaque and goes to the renderer alone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    pub id: Id,
    pub action: RequestAction,
    pub object: RequestObject,
    pub flags: CanvasFlags,
    pub content: RequestContent,
}

impl Request {
    pub fn new(action: RequestAction, object: RequestObject, id: Id) -> Self {
        Self {
            id,
            action,
            object,
            flags: CanvasFlags::empty(),
            content: RequestContent::None,
        }
    }

    pub fn with_flags(mut self, flags: CanvasFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_content(mut self, content: RequestContent) -> Self {
        self.content = content;
        self
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {:?} #{:x}", self.action, self.object, self.id)?;
        match &self.content {
            RequestContent::None => Ok(()),
            RequestContent::Canvas {
                screen_width,
                screen_height,
            } => write!(f, " {screen_width}x{screen_height} flags={:#x}", self.flags.bits()),
            RequestContent::Record(command) => write!(f, " {command:?}"),
            RequestContent::Background(rgba) => write!(f, " {rgba:?}"),
            RequestContent::Bytes(bytes) => write!(f, " ({} bytes)", bytes.len()),
        }
    }
}

/// Ordered requests applied together.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Batch {
    requests: Vec<Request>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, request: Request) -> &mut Self {
        self.requests.push(request);
        self
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Request> {
        self.requests.iter()
    }

    pub fn create_canvas(
        &mut self,
        id: Id,
        screen_width: u32,
        screen_height: u32,
        flags: CanvasFlags,
    ) -> &mut Self {
        self.push(
            Request::new(RequestAction::Create, RequestObject::Canvas, id)
                .with_flags(flags)
                .with_content(RequestContent::Canvas {
                    screen_width,
                    screen_height,
                }),
        )
    }

    pub fn delete_canvas(&mut self, id: Id) -> &mut Self {
        self.push(Request::new(RequestAction::Delete, RequestObject::Canvas, id))
    }

    pub fn set_background(&mut self, canvas: Id, rgba: [f32; 4]) -> &mut Self {
        self.push(
            Request::new(RequestAction::Set, RequestObject::Background, canvas)
                .with_content(RequestContent::Background(rgba)),
        )
    }

    fn record(&mut self, canvas: Id, command: RecorderCommand) -> &mut Self {
        self.push(
            Request::new(RequestAction::Record, RequestObject::Record, canvas)
                .with_content(RequestContent::Record(command)),
        )
    }

    pub fn record_begin(&mut self, canvas: Id) -> &mut Self {
        self.record(canvas, RecorderCommand::Begin)
    }

    pub fn record_viewport(&mut self, canvas: Id, offset: [f32; 2], shape: [f32; 2]) -> &mut Self {
        self.record(canvas, RecorderCommand::Viewport { offset, shape })
    }

    pub fn record_draw(
        &mut self,
        canvas: Id,
        graphics: Id,
        first_vertex: u32,
        vertex_count: u32,
        first_instance: u32,
        instance_count: u32,
    ) -> &mut Self {
        self.record(
            canvas,
            RecorderCommand::Draw {
                graphics,
                first_vertex,
                vertex_count,
                first_instance,
                instance_count,
            },
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn record_draw_indexed(
        &mut self,
        canvas: Id,
        graphics: Id,
        first_index: u32,
        vertex_offset: i32,
        index_count: u32,
        first_instance: u32,
        instance_count: u32,
    ) -> &mut Self {
        self.record(
            canvas,
            RecorderCommand::DrawIndexed {
                graphics,
                first_index,
                vertex_offset,
                index_count,
                first_instance,
                instance_count,
            },
        )
    }

    pub fn record_end(&mut self, canvas: Id) -> &mut Self {
        self.record(canvas, RecorderCommand::End)
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a Request;
    type IntoIter = std::slice::Iter<'a, Request>;

    fn into_iter(self) -> Self::IntoIter {
        self.requests.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_and_monitor_imply_gui() {
        assert!(CanvasFlags::FPS.wants_gui());
        assert!(CanvasFlags::MONITOR.wants_gui());
        assert!(CanvasFlags::GUI.wants_gui());
        assert!(!CanvasFlags::FULLSCREEN.wants_gui());
        assert!(!CanvasFlags::empty().wants_gui());
    }

    #[test]
    fn builder_keeps_arrival_order() {
        let mut batch = Batch::new();
        batch
            .create_canvas(1, 800, 600, CanvasFlags::empty())
            .record_begin(1)
            .record_end(1)
            .delete_canvas(1);

        let actions: Vec<_> = batch.iter().map(|r| r.action).collect();
        assert_eq!(
            actions,
            [
                RequestAction::Create,
                RequestAction::Record,
                RequestAction::Record,
                RequestAction::Delete,
            ]
        );
    }

    #[test]
    fn display_is_compact() {
        let req = Request::new(RequestAction::Delete, RequestObject::Canvas, 0x2a);
        assert_eq!(req.to_string(), "Delete Canvas #2a");
    }

    #[test]
    fn serializes_flags_as_bits() {
        let mut batch = Batch::new();
        batch.create_canvas(3, 10, 20, CanvasFlags::GUI | CanvasFlags::FULLSCREEN);
        let json = serde_json::to_value(&batch).unwrap();
        assert_eq!(json["requests"][0]["flags"], 9);
        assert_eq!(json["requests"][0]["object"], "canvas");
    }
}
