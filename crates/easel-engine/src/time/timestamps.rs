use std::time::{Duration, Instant};

/// Capacity of the per-canvas timestamp ring.
pub const MAX_TIMESTAMPS: usize = 32;

/// Ring buffer of the instants at which a canvas started rendering a frame.
#[derive(Debug, Clone)]
pub struct FrameTimestamps {
    slots: [Option<Instant>; MAX_TIMESTAMPS],
    next: u64,
}

impl FrameTimestamps {
    pub fn new() -> Self {
        Self {
            slots: [None; MAX_TIMESTAMPS],
            next: 0,
        }
    }

    /// Stores `Instant::now()` and returns the slot it landed in.
    pub fn record(&mut self) -> usize {
        self.record_at(Instant::now())
    }

    pub fn record_at(&mut self, now: Instant) -> usize {
        let slot = (self.next % MAX_TIMESTAMPS as u64) as usize;
        self.slots[slot] = Some(now);
        self.next = self.next.wrapping_add(1);
        slot
    }

    /// Total number of recorded frames (not capped by the ring size).
    pub fn count(&self) -> u64 {
        self.next
    }

    pub fn latest(&self) -> Option<Instant> {
        let last = self.next.checked_sub(1)?;
        self.slots[(last % MAX_TIMESTAMPS as u64) as usize]
    }

    /// Mean interval between the stored timestamps.
    pub fn mean_interval(&self) -> Option<Duration> {
        let stored = self.next.min(MAX_TIMESTAMPS as u64);
        if stored < 2 {
            return None;
        }

        let newest = self.latest()?;
        let oldest_seq = self.next - stored;
        let oldest = self.slots[(oldest_seq % MAX_TIMESTAMPS as u64) as usize]?;
        let span = newest.saturating_duration_since(oldest);
        Some(span / (stored - 1) as u32)
    }
}

impl Default for FrameTimestamps {
    fn default() -> Self {
        Self::new()
    }
}
