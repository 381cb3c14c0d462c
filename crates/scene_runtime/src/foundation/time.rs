//! Frame timing utilities

use std::time::{Duration, Instant};

/// Per-frame clock driven by the owning loop.
///
/// Call [`tick`](FrameClock::tick) once per frame to advance the frame count
/// and delta time.
pub struct FrameClock {
    last_tick: Instant,
    delta: Duration,
    frame_count: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    /// Create a clock at frame zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            last_tick: Instant::now(),
            delta: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Advance to the next frame.
    pub fn tick(&mut self) {
        let now = Instant::now();
        self.delta = now.duration_since(self.last_tick);
        self.last_tick = now;
        self.frame_count += 1;
    }

    /// Time elapsed between the two most recent ticks, in seconds.
    #[must_use]
    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Number of ticks so far.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// Simple stopwatch for measuring elapsed wall-clock time.
pub struct Stopwatch {
    started: Instant,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::start_new()
    }
}

impl Stopwatch {
    /// Create a stopwatch and start it immediately.
    #[must_use]
    pub fn start_new() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    /// Reset the elapsed time to zero.
    pub fn restart(&mut self) {
        self.started = Instant::now();
    }

    /// Elapsed time since the last (re)start.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_millis(&self) -> f32 {
        self.elapsed().as_secs_f32() * 1000.0
    }
}
