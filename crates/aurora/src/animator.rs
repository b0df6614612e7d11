use crate::color::{approach, Palette};

/// Fraction of the remaining distance covered per frame.
pub const DEFAULT_SMOOTHING: f32 = 0.05;

/// Smallest speed we accept; keeps the time multiplier strictly positive.
pub const MIN_SPEED: f32 = 1e-3;

/// Eases the shader palette and speed toward the caller's latest request.
///
/// Callers only ever write the target; [`Animator::step`] is the only place
/// the current values move, which keeps palette swaps free of popping.
#[derive(Debug, Clone, PartialEq)]
pub struct Animator {
    current_palette: Palette,
    target_palette: Palette,
    current_speed: f32,
    target_speed: f32,
    smoothing: f32,
}

impl Animator {
    pub fn new(palette: Palette, speed: f32, smoothing: f32) -> Self {
        let speed = sanitize_speed(speed);
        Self {
            current_palette: palette,
            target_palette: palette,
            current_speed: speed,
            target_speed: speed,
            smoothing: sanitize_smoothing(smoothing),
        }
    }

    pub fn set_target_palette(&mut self, palette: Palette) {
        self.target_palette = palette;
    }

    pub fn set_target_speed(&mut self, speed: f32) {
        self.target_speed = sanitize_speed(speed);
    }

    /// Advances one frame of exponential easing.
    pub fn step(&mut self) {
        self.current_palette = self
            .current_palette
            .approach(self.target_palette, self.smoothing);
        self.current_speed =
            approach(self.current_speed, self.target_speed, self.smoothing).max(MIN_SPEED);
    }

    pub fn palette(&self) -> Palette {
        self.current_palette
    }

    pub fn target_palette(&self) -> Palette {
        self.target_palette
    }

    pub fn speed(&self) -> f32 {
        self.current_speed
    }

    pub fn target_speed(&self) -> f32 {
        self.target_speed
    }

    pub fn smoothing(&self) -> f32 {
        self.smoothing
    }

    /// Whether the current state sits within `epsilon` of the target.
    pub fn settled(&self, epsilon: f32) -> bool {
        self.current_palette.distance(self.target_palette) <= epsilon
            && (self.current_speed - self.target_speed).abs() <= epsilon
    }
}

pub(crate) fn sanitize_speed(speed: f32) -> f32 {
    if speed.is_finite() {
        speed.max(MIN_SPEED)
    } else {
        MIN_SPEED
    }
}

pub(crate) fn sanitize_smoothing(smoothing: f32) -> f32 {
    if smoothing.is_finite() && smoothing > 0.0 {
        smoothing.min(1.0)
    } else {
        DEFAULT_SMOOTHING
    }
}
