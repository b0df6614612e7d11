use std::time::{Duration, Instant};

use crate::color::PaletteOverride;

/// Palette and speed a host section asks the background for.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionCue {
    pub name: String,
    pub palette: PaletteOverride,
    pub speed: f32,
}

/// Ordered list of sections with a cursor and an optional auto-advance timer.
///
/// Switching only changes which cue is current; the renderer's easing turns
/// each switch into a cross-fade.
#[derive(Debug, Clone)]
pub struct SectionCycle {
    cues: Vec<SectionCue>,
    index: usize,
    interval: Option<Duration>,
    last_switch: Option<Instant>,
}

impl SectionCycle {
    pub fn new(cues: Vec<SectionCue>, start: usize, interval: Option<Duration>) -> Self {
        let index = if cues.is_empty() {
            0
        } else {
            start.min(cues.len() - 1)
        };
        Self {
            cues,
            index,
            interval: interval.filter(|value| !value.is_zero()),
            last_switch: None,
        }
    }

    pub fn current(&self) -> Option<&SectionCue> {
        self.cues.get(self.index)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    pub fn next(&mut self, now: Instant) -> Option<&SectionCue> {
        if self.cues.is_empty() {
            return None;
        }
        let target = (self.index + 1) % self.cues.len();
        self.switch_to(target, now)
    }

    pub fn previous(&mut self, now: Instant) -> Option<&SectionCue> {
        if self.cues.is_empty() {
            return None;
        }
        let target = (self.index + self.cues.len() - 1) % self.cues.len();
        self.switch_to(target, now)
    }

    /// Jumps to `index`; out-of-range or unchanged targets are ignored.
    pub fn jump(&mut self, index: usize, now: Instant) -> Option<&SectionCue> {
        if index >= self.cues.len() || index == self.index {
            return None;
        }
        self.switch_to(index, now)
    }

    /// Advances when the auto-cycle interval has elapsed since the last switch.
    pub fn tick(&mut self, now: Instant) -> Option<&SectionCue> {
        let interval = self.interval?;
        let last = *self.last_switch.get_or_insert(now);
        if now.saturating_duration_since(last) < interval {
            return None;
        }
        self.next(now)
    }

    /// When the auto-cycle will next fire, if enabled. An interval too long
    /// to represent as an `Instant` never fires.
    pub fn deadline(&self) -> Option<Instant> {
        self.last_switch?.checked_add(self.interval?)
    }

    fn switch_to(&mut self, index: usize, now: Instant) -> Option<&SectionCue> {
        if self.cues.len() < 2 && index == self.index {
            self.last_switch = Some(now);
            return None;
        }
        self.index = index;
        self.last_switch = Some(now);
        self.cues.get(index)
    }
}
