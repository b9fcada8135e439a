use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous tick, in seconds (clamped).
    pub dt: f32,

    /// Monotonic timestamp taken at the tick.
    pub now: Instant,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Frame rate counter fed once per presented frame.
///
/// Delta time is clamped so a debugger pause or a minimized window does not
/// poison the average, and the last `history` deltas are kept for the overlay.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    last: Option<Instant>,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
    deltas: VecDeque<f32>,
    capacity: usize,
}

impl FpsCounter {
    /// Default history length, in frames.
    pub const HISTORY: usize = 120;

    pub fn new() -> Self {
        Self::with_history(Self::HISTORY)
    }

    pub fn with_history(capacity: usize) -> Self {
        Self {
            last: None,
            frame_index: 0,
            dt_min: Duration::from_micros(100),
            dt_max: Duration::from_millis(250),
            deltas: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = match self.last {
            Some(last) => now
                .saturating_duration_since(last)
                .clamp(self.dt_min, self.dt_max)
                .as_secs_f32(),
            // First tick has no baseline; it is not part of the history.
            None => 0.0,
        };

        if self.last.is_some() {
            if self.deltas.len() == self.capacity {
                self.deltas.pop_front();
            }
            self.deltas.push_back(dt);
        }
        self.last = Some(now);

        let ft = FrameTime {
            dt,
            now,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }

    /// Frames per second over the stored history; zero before two ticks.
    pub fn fps(&self) -> f32 {
        let total: f32 = self.deltas.iter().sum();
        if total <= 0.0 {
            0.0
        } else {
            self.deltas.len() as f32 / total
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_index
    }

    /// Stored deltas in seconds, oldest first.
    pub fn history(&self) -> impl Iterator<Item = f32> + '_ {
        self.deltas.iter().copied()
    }

    /// Forgets the baseline, e.g. after a long stall.
    pub fn reset(&mut self) {
        self.last = None;
        self.deltas.clear();
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}
