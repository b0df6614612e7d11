use std::time::{Duration, Instant};

/// Default minimum spacing between applied pointer samples.
pub const DEFAULT_POINTER_THROTTLE: Duration = Duration::from_millis(30);

/// Bounding box of the drawing surface, in the same space as pointer events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl SurfaceRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rect anchored at the origin, e.g. a window's client area.
    pub fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Maps `(x, y)` into `[0, 1]²` with a top-left origin, clamping points
    /// that fall outside the rect.
    pub fn normalize(&self, x: f64, y: f64) -> [f32; 2] {
        [
            normalize_axis(x - self.x, self.width),
            normalize_axis(y - self.y, self.height),
        ]
    }
}

fn normalize_axis(offset: f64, extent: f64) -> f32 {
    if !(extent > 0.0) || !offset.is_finite() {
        return 0.5;
    }
    (offset / extent).clamp(0.0, 1.0) as f32
}

/// Tracks the latest pointer or touch position in normalised coordinates.
///
/// There is no "pointer absent" state: the position starts at the centre and
/// holds its last value until another event arrives. With a throttle set,
/// samples landing inside the window are parked and the newest one is applied
/// once the window has elapsed.
#[derive(Debug, Clone)]
pub struct PointerTracker {
    position: [f32; 2],
    throttle: Option<Duration>,
    last_applied: Option<Instant>,
    pending: Option<[f32; 2]>,
}

impl PointerTracker {
    pub const CENTER: [f32; 2] = [0.5, 0.5];

    pub fn new(throttle: Option<Duration>) -> Self {
        Self {
            position: Self::CENTER,
            throttle: throttle.filter(|value| !value.is_zero()),
            last_applied: None,
            pending: None,
        }
    }

    /// Records a move event at `(x, y)` relative to `rect`.
    ///
    /// Returns `true` when the sample was applied immediately.
    pub fn record(&mut self, x: f64, y: f64, rect: &SurfaceRect, now: Instant) -> bool {
        let sample = rect.normalize(x, y);
        if self.window_open(now) {
            self.apply(sample, now);
            true
        } else {
            self.pending = Some(sample);
            false
        }
    }

    /// Applies a parked sample once its throttle window has passed.
    pub fn flush(&mut self, now: Instant) -> bool {
        if self.pending.is_none() || !self.window_open(now) {
            return false;
        }
        match self.pending.take() {
            Some(sample) => {
                self.apply(sample, now);
                true
            }
            None => false,
        }
    }

    /// Normalised position with a top-left origin.
    pub fn position(&self) -> [f32; 2] {
        self.position
    }

    /// Position flipped vertically to match the shader's bottom-left origin.
    pub fn shader_position(&self) -> [f32; 2] {
        [self.position[0], 1.0 - self.position[1]]
    }

    fn window_open(&self, now: Instant) -> bool {
        match (self.throttle, self.last_applied) {
            (Some(throttle), Some(last)) => now.saturating_duration_since(last) >= throttle,
            _ => true,
        }
    }

    fn apply(&mut self, sample: [f32; 2], now: Instant) {
        self.position = sample;
        self.last_applied = Some(now);
        self.pending = None;
    }
}

impl Default for PointerTracker {
    fn default() -> Self {
        Self::new(Some(DEFAULT_POINTER_THROTTLE))
    }
}
