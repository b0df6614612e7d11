use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Snapshot of the time state supplied to the shader uniforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSample {
    /// Seconds elapsed since the first rendered frame.
    pub seconds: f32,
    /// Monotonic frame counter for the running session.
    pub frame_index: u64,
}

impl TimeSample {
    pub fn new(seconds: f32, frame_index: u64) -> Self {
        Self {
            seconds,
            frame_index,
        }
    }
}

/// Abstraction over where time values originate from.
pub trait TimeSource: Send {
    /// Produces a time sample for a frame presented at `now`.
    fn sample(&mut self, now: Instant) -> TimeSample;
}

/// Time source anchored to the first frame it is asked about.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource {
    origin: Option<Instant>,
    frame: u64,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TimeSource for SystemTimeSource {
    fn sample(&mut self, now: Instant) -> TimeSample {
        let origin = *self.origin.get_or_insert(now);
        let elapsed = now.saturating_duration_since(origin);
        let sample = TimeSample::new(elapsed.as_secs_f32(), self.frame);
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

/// Time source that always reports a fixed timestamp.
#[derive(Debug, Clone, Copy)]
pub struct FixedTimeSource {
    time: f32,
    frame: u64,
}

impl FixedTimeSource {
    pub fn new(time: f32) -> Self {
        Self { time, frame: 0 }
    }
}

impl TimeSource for FixedTimeSource {
    fn sample(&mut self, _now: Instant) -> TimeSample {
        let sample = TimeSample::new(self.time, self.frame);
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

/// Convenient alias for owning time sources behind trait objects.
pub type BoxedTimeSource = Box<dyn TimeSource + Send>;

/// Optional frame-rate cap layered on top of the display refresh.
///
/// Ticks that arrive sooner than `interval` after the last accepted tick are
/// rejected; the caller keeps scheduling regardless.
#[derive(Debug, Clone, Copy)]
pub struct FrameGate {
    interval: Option<Duration>,
    last: Option<Instant>,
}

impl FrameGate {
    pub fn new(interval: Option<Duration>) -> Self {
        Self {
            interval: interval.filter(|value| !value.is_zero()),
            last: None,
        }
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    pub fn ready(&mut self, now: Instant) -> bool {
        let Some(interval) = self.interval else {
            self.last = Some(now);
            return true;
        };
        match self.last {
            Some(last) if now.saturating_duration_since(last) < interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

/// Cancellation flag shared between the frame loop and its teardown paths.
///
/// Cloning yields handles onto the same flag; only the first `cancel` call
/// reports success.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels the loop. Returns `true` for the call that flipped the flag.
    pub fn cancel(&self) -> bool {
        !self.cancelled.swap(true, Ordering::AcqRel)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Rolling per-second counters for the debug "render stats" line.
#[derive(Debug, Clone, Copy)]
pub struct FrameStats {
    window_start: Option<Instant>,
    drawn: u32,
    skipped: u32,
}

/// Summary emitted when a one-second window closes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub fps: f32,
    pub drawn: u32,
    pub skipped: u32,
}

impl FrameStats {
    pub fn new() -> Self {
        Self {
            window_start: None,
            drawn: 0,
            skipped: 0,
        }
    }

    pub fn record(&mut self, now: Instant, drawn: bool) -> Option<FrameReport> {
        let start = *self.window_start.get_or_insert(now);
        if drawn {
            self.drawn += 1;
        } else {
            self.skipped += 1;
        }
        let elapsed = now.saturating_duration_since(start);
        if elapsed < Duration::from_secs(1) {
            return None;
        }
        let report = FrameReport {
            fps: self.drawn as f32 / elapsed.as_secs_f32(),
            drawn: self.drawn,
            skipped: self.skipped,
        };
        self.window_start = Some(now);
        self.drawn = 0;
        self.skipped = 0;
        Some(report)
    }
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new()
    }
}
