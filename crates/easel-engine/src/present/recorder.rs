use serde::Serialize;

use super::request::Id;

/// A command replayed into a canvas command buffer by the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecorderCommand {
    Begin,
    Viewport {
        offset: [f32; 2],
        shape: [f32; 2],
    },
    Draw {
        graphics: Id,
        first_vertex: u32,
        vertex_count: u32,
        first_instance: u32,
        instance_count: u32,
    },
    DrawIndexed {
        graphics: Id,
        first_index: u32,
        vertex_offset: i32,
        index_count: u32,
        first_instance: u32,
        instance_count: u32,
    },
    DrawIndirect {
        graphics: Id,
        indirect: Id,
        draw_count: u32,
    },
    End,
}

/// Per-canvas command cache with one dirty bit per swapchain image.
///
/// The recorded command list is shared by every image; an image's command
/// buffer is refilled only while its bit is set, so unchanged frames reuse
/// the buffer recorded earlier. An empty recorder always needs recording:
/// the first use of an image emits a blank pass instead of leaving the
/// command buffer undefined.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    commands: Vec<RecorderCommand>,
    dirty: Vec<bool>,
}

impl Recorder {
    /// Creates a recorder for `image_count` images, all dirty.
    pub fn new(image_count: u32) -> Self {
        Self {
            commands: Vec::new(),
            dirty: vec![true; image_count as usize],
        }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn commands(&self) -> &[RecorderCommand] {
        &self.commands
    }

    pub fn image_count(&self) -> u32 {
        self.dirty.len() as u32
    }

    /// Applies one recorded command. `Begin` starts a new command list.
    pub fn apply(&mut self, command: RecorderCommand) {
        if command == RecorderCommand::Begin {
            self.commands.clear();
        }
        self.commands.push(command);
        self.set_dirty();
    }

    /// Drops every command; images fall back to blank passes.
    pub fn clear(&mut self) {
        self.commands.clear();
        self.set_dirty();
    }

    /// Marks every image dirty.
    pub fn set_dirty(&mut self) {
        self.dirty.fill(true);
    }

    /// Dirty bit for one image. Out-of-range images are dirty.
    pub fn is_dirty(&self, image: u32) -> bool {
        self.dirty.get(image as usize).copied().unwrap_or(true)
    }

    /// Whether the image's command buffer must be (re)filled this frame.
    pub fn needs_record(&self, image: u32) -> bool {
        self.is_empty() || self.is_dirty(image)
    }

    /// Clears the image's dirty bit and returns the commands to replay.
    pub fn record(&mut self, image: u32) -> &[RecorderCommand] {
        let slot = image as usize;
        if slot >= self.dirty.len() {
            self.dirty.resize(slot + 1, true);
        }
        self.dirty[slot] = false;
        &self.commands
    }

    /// Tracks a new swapchain image count; every image becomes dirty.
    pub fn resize(&mut self, image_count: u32) {
        self.dirty.clear();
        self.dirty.resize(image_count as usize, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> RecorderCommand {
        RecorderCommand::Viewport {
            offset: [0.0, 0.0],
            shape: [100.0, 50.0],
        }
    }

    fn filled(image_count: u32) -> Recorder {
        let mut r = Recorder::new(image_count);
        r.apply(RecorderCommand::Begin);
        r.apply(viewport());
        r.apply(RecorderCommand::End);
        r
    }

    // ── dirty bits ────────────────────────────────────────────────────────

    #[test]
    fn fresh_recorder_is_dirty_everywhere() {
        let r = Recorder::new(3);
        assert!((0..3).all(|i| r.is_dirty(i)));
        assert!((0..3).all(|i| r.needs_record(i)));
    }

    #[test]
    fn recording_clears_only_that_image() {
        let mut r = filled(3);
        r.record(1);
        assert!(r.is_dirty(0));
        assert!(!r.is_dirty(1));
        assert!(r.is_dirty(2));
    }

    #[test]
    fn recorded_image_stays_clean_until_dirtied() {
        let mut r = filled(2);
        let first = r.record(0).to_vec();
        assert!(!r.needs_record(0));
        assert!(!r.needs_record(0));

        // Recording again without dirtying replays the same cached content.
        let second = r.record(0).to_vec();
        assert_eq!(first, second);

        r.set_dirty();
        assert!(r.needs_record(0));
    }

    #[test]
    fn set_dirty_marks_every_image() {
        let mut r = filled(3);
        for i in 0..3 {
            r.record(i);
        }
        r.set_dirty();
        assert!((0..3).all(|i| r.is_dirty(i)));
    }

    #[test]
    fn empty_recorder_always_needs_record() {
        let mut r = Recorder::new(2);
        r.record(0);
        assert!(!r.is_dirty(0));
        assert!(r.needs_record(0));
    }

    // ── content ───────────────────────────────────────────────────────────

    #[test]
    fn begin_restarts_the_command_list() {
        let mut r = filled(2);
        assert_eq!(r.len(), 3);
        r.apply(RecorderCommand::Begin);
        assert_eq!(r.commands(), &[RecorderCommand::Begin]);
    }

    #[test]
    fn applying_a_command_dirties_recorded_images() {
        let mut r = filled(2);
        r.record(0);
        r.record(1);
        r.apply(viewport());
        assert!(r.is_dirty(0) && r.is_dirty(1));
    }

    #[test]
    fn resize_tracks_new_image_count() {
        let mut r = filled(2);
        r.record(0);
        r.resize(4);
        assert_eq!(r.image_count(), 4);
        assert!((0..4).all(|i| r.is_dirty(i)));
        assert_eq!(r.len(), 3);
    }

    #[test]
    fn out_of_range_image_is_dirty() {
        let r = filled(2);
        assert!(r.is_dirty(7));
    }
}
