//! Platform-agnostic render loop.
//!
//! [`AuroraRenderer`] owns every piece of per-mount state: the eased palette,
//! pointer, viewport and clock, plus the accelerated backend when one could be
//! acquired. Hosts feed it events and call [`AuroraRenderer::step`] once per
//! display refresh; the backend only ever sees finished uniform blocks.

use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, error, info, warn};
use winit::dpi::{LogicalSize, PhysicalSize};

use crate::animator::{Animator, DEFAULT_SMOOTHING};
use crate::color::PaletteOverride;
use crate::compile::ProgramError;
use crate::fallback::FallbackLayer;
use crate::input::{PointerTracker, SurfaceRect, DEFAULT_POINTER_THROTTLE};
use crate::runtime::{BoxedTimeSource, CancelToken, FrameGate, FrameStats, SystemTimeSource};
use crate::uniforms::AuroraUniforms;
use crate::viewport::{Viewport, DEFAULT_DPR_CAP};

/// Default animation speed for hosts that do not pick one.
pub const DEFAULT_SPEED: f32 = 2.0;

/// Accelerated drawing path driven by the render loop.
pub trait Backend {
    /// Called whenever the backing store or the displayed size changed.
    fn resize(&mut self, viewport: &Viewport);
    /// Issues the single fullscreen draw for one frame.
    fn draw(&mut self, uniforms: &AuroraUniforms) -> Result<(), DrawError>;
    /// Whether the underlying context reported an asynchronous loss.
    fn context_lost(&self) -> bool;
    /// Releases GPU resources. Must tolerate repeated calls.
    fn release(&mut self);
}

/// Failure acquiring the accelerated path at mount.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("accelerated context unavailable: {0}")]
    ContextUnavailable(String),
    #[error(transparent)]
    Program(#[from] ProgramError),
}

/// Failure while drawing a frame.
#[derive(Debug, Error)]
pub enum DrawError {
    /// The frame could not be presented but the context is still usable.
    #[error("frame skipped: {0}")]
    Skipped(String),
    #[error("GPU context lost: {0}")]
    ContextLost(String),
}

/// Tunables for a mounted renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct AuroraConfig {
    pub speed: f32,
    pub palette: PaletteOverride,
    /// Easing fraction per frame, in `(0, 1]`.
    pub smoothing: f32,
    /// Minimum spacing between drawn frames; `None` draws on every tick.
    pub frame_interval: Option<Duration>,
    pub pointer_throttle: Option<Duration>,
    pub dpr_cap: f64,
    /// Skip probing and start on the static layer.
    pub force_fallback: bool,
}

impl Default for AuroraConfig {
    fn default() -> Self {
        Self {
            speed: DEFAULT_SPEED,
            palette: PaletteOverride::default(),
            smoothing: DEFAULT_SMOOTHING,
            frame_interval: None,
            pointer_throttle: Some(DEFAULT_POINTER_THROTTLE),
            dpr_cap: DEFAULT_DPR_CAP,
            force_fallback: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Running,
    Disposed,
}

/// What a call to [`AuroraRenderer::step`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    /// One draw was issued with these uniforms.
    Drawn(AuroraUniforms),
    /// The frame gate or a transient surface error skipped the draw.
    Skipped,
    /// The context was lost during this frame; the static layer took over.
    FellBack,
    /// The static layer is active. Nothing to draw.
    Fallback,
    Disposed,
}

pub struct AuroraRenderer<B: Backend> {
    lifecycle: Lifecycle,
    backend: Option<B>,
    fallback: Option<FallbackLayer>,
    animator: Animator,
    pointer: PointerTracker,
    viewport: Viewport,
    clock: BoxedTimeSource,
    gate: FrameGate,
    stats: FrameStats,
    cancel: CancelToken,
    last_time: f32,
    last_frame: u64,
}

impl<B: Backend> AuroraRenderer<B> {
    /// Mounts a renderer, probing for an accelerated backend.
    ///
    /// Probe failures never propagate: they are logged and the renderer
    /// starts on the static layer instead.
    pub fn mount<F>(
        config: &AuroraConfig,
        logical: LogicalSize<f64>,
        scale_factor: f64,
        probe: F,
    ) -> Self
    where
        F: FnOnce(&Viewport) -> Result<B, InitError>,
    {
        let palette = config.palette.resolve();
        let viewport = Viewport::new(logical, scale_factor, config.dpr_cap);
        let mut renderer = Self {
            lifecycle: Lifecycle::Uninitialized,
            backend: None,
            fallback: None,
            animator: Animator::new(palette, config.speed, config.smoothing),
            pointer: PointerTracker::new(config.pointer_throttle),
            viewport,
            clock: Box::new(SystemTimeSource::new()),
            gate: FrameGate::new(config.frame_interval),
            stats: FrameStats::new(),
            cancel: CancelToken::new(),
            last_time: 0.0,
            last_frame: 0,
        };

        if config.force_fallback {
            info!("accelerated rendering disabled by configuration");
            renderer.activate_fallback();
            return renderer;
        }

        match probe(&renderer.viewport) {
            Ok(mut backend) => {
                backend.resize(&renderer.viewport);
                renderer.backend = Some(backend);
                renderer.lifecycle = Lifecycle::Running;
                let backing = renderer.viewport.backing_size();
                debug!(
                    width = backing.width,
                    height = backing.height,
                    ratio = renderer.viewport.effective_ratio(),
                    "aurora renderer running"
                );
            }
            Err(InitError::Program(err)) => {
                error!(error = %err, "aurora program failed to build");
                renderer.activate_fallback();
            }
            Err(err) => {
                warn!(error = %err, "aurora renderer initialisation failed");
                renderer.activate_fallback();
            }
        }
        renderer
    }

    /// Replaces the clock, e.g. with a fixed one for stills and tests.
    pub fn with_time_source(mut self, clock: BoxedTimeSource) -> Self {
        self.clock = clock;
        self
    }

    /// Requests a new palette. Running renderers ease toward it; the static
    /// layer adopts it directly.
    pub fn set_palette(&mut self, palette: &PaletteOverride) {
        let resolved = palette.resolve();
        self.animator.set_target_palette(resolved);
        if let Some(layer) = self.fallback.as_mut() {
            layer.set_palette(resolved);
        }
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.animator.set_target_speed(speed);
    }

    /// Records a pointer or touch move at `(x, y)` relative to `rect`.
    pub fn pointer_moved(&mut self, x: f64, y: f64, rect: &SurfaceRect, now: Instant) {
        self.pointer.record(x, y, rect, now);
    }

    /// Syncs the viewport. Returns `true` when the backend had to be resized.
    pub fn resize(&mut self, logical: LogicalSize<f64>, scale_factor: f64) -> bool {
        self.sync_viewport(|viewport| viewport.update(logical, scale_factor))
    }

    /// Same as [`AuroraRenderer::resize`] for hosts that report physical pixels.
    pub fn resize_physical(&mut self, size: PhysicalSize<u32>, scale_factor: f64) -> bool {
        self.sync_viewport(|viewport| viewport.update_physical(size, scale_factor))
    }

    fn sync_viewport<F>(&mut self, update: F) -> bool
    where
        F: FnOnce(&mut Viewport) -> Option<PhysicalSize<u32>>,
    {
        let display = self.viewport.display_size();
        let backing_changed = update(&mut self.viewport).is_some();
        if !backing_changed && display == self.viewport.display_size() {
            return false;
        }
        if let Some(backend) = self.backend.as_mut() {
            backend.resize(&self.viewport);
        }
        true
    }

    /// Handles an asynchronous context-loss notification.
    ///
    /// Returns `true` if this call switched the renderer to the static layer.
    pub fn context_lost(&mut self) -> bool {
        if self.lifecycle != Lifecycle::Running {
            return false;
        }
        warn!("accelerated context lost; switching to static background");
        self.teardown_backend();
        self.lifecycle = Lifecycle::Disposed;
        self.activate_fallback();
        true
    }

    /// Runs one frame of the loop.
    pub fn step(&mut self, now: Instant) -> FrameOutcome {
        if self.cancel.is_cancelled() {
            self.dispose();
            return FrameOutcome::Disposed;
        }
        if self.fallback.is_some() {
            return FrameOutcome::Fallback;
        }
        if self.lifecycle != Lifecycle::Running {
            return FrameOutcome::Disposed;
        }
        if self.backend.as_ref().is_some_and(|backend| backend.context_lost()) {
            self.context_lost();
            return FrameOutcome::FellBack;
        }

        self.pointer.flush(now);
        if !self.gate.ready(now) {
            self.record_stats(now, false);
            return FrameOutcome::Skipped;
        }

        let sample = self.clock.sample(now);
        self.last_time = sample.seconds;
        self.last_frame = sample.frame_index;
        self.animator.step();
        let uniforms = self.uniforms();

        let Some(backend) = self.backend.as_mut() else {
            return FrameOutcome::Disposed;
        };
        match backend.draw(&uniforms) {
            Ok(()) => {
                self.record_stats(now, true);
                FrameOutcome::Drawn(uniforms)
            }
            Err(DrawError::Skipped(reason)) => {
                debug!(%reason, "frame skipped");
                self.record_stats(now, false);
                FrameOutcome::Skipped
            }
            Err(DrawError::ContextLost(reason)) => {
                warn!(%reason, "draw reported context loss");
                self.context_lost();
                FrameOutcome::FellBack
            }
        }
    }

    /// Cancels the loop and releases the backend. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        self.cancel.cancel();
        if self.lifecycle == Lifecycle::Disposed && self.backend.is_none() {
            return;
        }
        self.teardown_backend();
        self.lifecycle = Lifecycle::Disposed;
        debug!("aurora renderer disposed");
    }

    /// Handle that lets another owner stop the loop; the next `step` disposes.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    pub fn fallback_layer(&self) -> Option<&FallbackLayer> {
        self.fallback.as_ref()
    }

    pub fn backend(&self) -> Option<&B> {
        self.backend.as_ref()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn animator(&self) -> &Animator {
        &self.animator
    }

    /// Index of the most recent frame handed to the backend.
    pub fn frame_index(&self) -> u64 {
        self.last_frame
    }

    pub fn pointer_position(&self) -> [f32; 2] {
        self.pointer.position()
    }

    /// Uniform block for the current state without advancing anything.
    pub fn uniforms(&self) -> AuroraUniforms {
        AuroraUniforms::new(
            self.viewport.resolution(),
            self.last_time,
            self.pointer.shader_position(),
            self.animator.speed(),
            &self.animator.palette(),
        )
    }

    fn activate_fallback(&mut self) {
        if self.fallback.is_some() {
            return;
        }
        self.fallback = Some(FallbackLayer::new(self.animator.palette()));
        info!("static aurora background active");
    }

    fn teardown_backend(&mut self) {
        if let Some(mut backend) = self.backend.take() {
            backend.release();
        }
    }

    fn record_stats(&mut self, now: Instant, drawn: bool) {
        if let Some(report) = self.stats.record(now, drawn) {
            debug!(
                fps = report.fps.round(),
                drawn = report.drawn,
                skipped = report.skipped,
                frame = self.last_frame,
                time = self.last_time,
                speed = self.animator.speed(),
                "render stats"
            );
        }
    }
}

impl<B: Backend> Drop for AuroraRenderer<B> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;

    #[derive(Default)]
    struct CountingBackend {
        draws: usize,
        resizes: usize,
        released: usize,
    }

    impl Backend for CountingBackend {
        fn resize(&mut self, _viewport: &Viewport) {
            self.resizes += 1;
        }

        fn draw(&mut self, _uniforms: &AuroraUniforms) -> Result<(), DrawError> {
            self.draws += 1;
            Ok(())
        }

        fn context_lost(&self) -> bool {
            false
        }

        fn release(&mut self) {
            self.released += 1;
        }
    }

    fn mount(config: &AuroraConfig) -> AuroraRenderer<CountingBackend> {
        AuroraRenderer::mount(config, LogicalSize::new(800.0, 600.0), 1.0, |_| {
            Ok(CountingBackend::default())
        })
    }

    #[test]
    fn mount_runs_and_sizes_backend() {
        let renderer = mount(&AuroraConfig::default());
        assert_eq!(renderer.lifecycle(), Lifecycle::Running);
        assert_eq!(renderer.backend().map(|b| b.resizes), Some(1));
        assert!(!renderer.is_fallback());
    }

    #[test]
    fn gate_skips_fast_ticks() {
        let config = AuroraConfig {
            frame_interval: Some(Duration::from_millis(30)),
            ..AuroraConfig::default()
        };
        let mut renderer = mount(&config);
        let start = Instant::now();
        assert!(matches!(renderer.step(start), FrameOutcome::Drawn(_)));
        assert_eq!(
            renderer.step(start + Duration::from_millis(10)),
            FrameOutcome::Skipped
        );
        assert!(matches!(
            renderer.step(start + Duration::from_millis(31)),
            FrameOutcome::Drawn(_)
        ));
        assert_eq!(renderer.backend().map(|b| b.draws), Some(2));
    }

    #[test]
    fn palette_changes_are_eased_not_snapped() {
        let mut renderer = mount(&AuroraConfig::default());
        let red = PaletteOverride {
            primary: Some(Rgb::new(1.0, 0.0, 0.0)),
            ..PaletteOverride::default()
        };
        renderer.set_palette(&red);
        let before = renderer.animator().palette();
        renderer.step(Instant::now());
        let after = renderer.animator().palette();
        assert_ne!(after, before);
        assert_ne!(after.primary, Rgb::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn cancel_token_disposes_on_next_step() {
        let mut renderer = mount(&AuroraConfig::default());
        let token = renderer.cancel_token();
        assert!(token.cancel());
        assert_eq!(renderer.step(Instant::now()), FrameOutcome::Disposed);
        assert_eq!(renderer.lifecycle(), Lifecycle::Disposed);
        assert!(renderer.backend().is_none());
    }

    #[test]
    fn program_errors_fall_back() {
        let renderer: AuroraRenderer<CountingBackend> = AuroraRenderer::mount(
            &AuroraConfig::default(),
            LogicalSize::new(640.0, 480.0),
            1.0,
            |_| Err(ProgramError::Link("missing entry point".into()).into()),
        );
        assert!(renderer.is_fallback());
        assert_eq!(renderer.lifecycle(), Lifecycle::Uninitialized);
    }
}
