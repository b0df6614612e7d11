use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use tracing::{debug, info, warn};
use winit::dpi::{LogicalSize, PhysicalPosition};
use winit::event::{ElementState, Event, KeyEvent, TouchPhase, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use crate::cycle::{SectionCue, SectionCycle};
use crate::engine::{AuroraConfig, AuroraRenderer, FrameOutcome, Lifecycle};
use crate::gpu::{GpuState, StaticPresenter};
use crate::input::SurfaceRect;

/// Everything the interactive window needs.
#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub title: String,
    /// Logical inner size.
    pub size: (u32, u32),
    pub aurora: AuroraConfig,
    pub sections: Vec<SectionCue>,
    pub start_section: usize,
    /// Auto-advance interval for section cycling.
    pub cycle: Option<Duration>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "aurora".to_string(),
            size: (1280, 720),
            aurora: AuroraConfig::default(),
            sections: Vec::new(),
            start_section: 0,
            cycle: None,
        }
    }
}

/// Host state for one window. Field order matters: GPU owners are declared
/// before the window so their surfaces drop first.
struct WindowHost {
    renderer: AuroraRenderer<GpuState>,
    presenter: Option<StaticPresenter>,
    presenter_failed: bool,
    sections: SectionCycle,
    window: Arc<Window>,
}

impl WindowHost {
    fn new(window: Arc<Window>, config: &WindowConfig) -> Self {
        let sections = SectionCycle::new(
            config.sections.clone(),
            config.start_section,
            config.cycle,
        );
        let mut aurora = config.aurora.clone();
        if let Some(cue) = sections.current() {
            aurora.palette = aurora.palette.merged_with(&cue.palette);
            aurora.speed = cue.speed;
            info!(section = %cue.name, "starting on section");
        }

        let scale_factor = window.scale_factor();
        let logical: LogicalSize<f64> = window.inner_size().to_logical(scale_factor);
        let renderer = AuroraRenderer::mount(&aurora, logical, scale_factor, |viewport| {
            GpuState::new(window.as_ref(), viewport)
        });

        Self {
            renderer,
            presenter: None,
            presenter_failed: false,
            sections,
            window,
        }
    }

    fn surface_rect(&self) -> SurfaceRect {
        let size = self.window.inner_size();
        SurfaceRect::from_size(size.width as f64, size.height as f64)
    }

    fn pointer_moved(&mut self, position: PhysicalPosition<f64>) {
        let rect = self.surface_rect();
        self.renderer
            .pointer_moved(position.x, position.y, &rect, Instant::now());
    }

    fn resize(&mut self) {
        let size = self.window.inner_size();
        self.renderer
            .resize_physical(size, self.window.scale_factor());
        if let Some(presenter) = self.presenter.as_mut() {
            presenter.resize(size);
        }
        self.window.request_redraw();
    }

    fn handle_key(&mut self, event: &KeyEvent, elwt: &EventLoopWindowTarget<()>) {
        if event.state != ElementState::Pressed || event.repeat {
            return;
        }
        let now = Instant::now();
        let switched = match &event.logical_key {
            Key::Named(NamedKey::Escape) => {
                self.renderer.dispose();
                elwt.exit();
                return;
            }
            Key::Named(NamedKey::Space | NamedKey::ArrowRight) => self.sections.next(now).cloned(),
            Key::Named(NamedKey::ArrowLeft) => self.sections.previous(now).cloned(),
            Key::Character(value) => match value.as_str() {
                " " => self.sections.next(now).cloned(),
                digit => match digit.parse::<usize>() {
                    Ok(number @ 1..=9) => self.sections.jump(number - 1, now).cloned(),
                    _ => None,
                },
            },
            _ => None,
        };
        if let Some(cue) = switched {
            self.apply_section(&cue);
        }
    }

    fn apply_section(&mut self, cue: &SectionCue) {
        info!(
            section = %cue.name,
            index = self.sections.index(),
            speed = cue.speed,
            "switching section"
        );
        self.renderer.set_palette(&cue.palette);
        self.renderer.set_speed(cue.speed);
        self.window.request_redraw();
    }

    fn redraw(&mut self) {
        match self.renderer.step(Instant::now()) {
            FrameOutcome::Drawn(_) | FrameOutcome::Skipped | FrameOutcome::Disposed => {}
            FrameOutcome::FellBack | FrameOutcome::Fallback => self.present_fallback(),
        }
    }

    fn present_fallback(&mut self) {
        let Some(layer) = self.renderer.fallback_layer().copied() else {
            return;
        };
        if self.presenter.is_none() && !self.presenter_failed {
            match StaticPresenter::new(self.window.as_ref(), self.window.inner_size()) {
                Ok(presenter) => self.presenter = Some(presenter),
                Err(err) => {
                    warn!(error = %err, "static background unavailable; window stays blank");
                    self.presenter_failed = true;
                }
            }
        }
        if let Some(presenter) = self.presenter.as_mut() {
            if let Err(err) = presenter.present(&layer) {
                debug!(error = %err, "static background present skipped");
            }
        }
    }

    fn about_to_wait(&mut self, elwt: &EventLoopWindowTarget<()>) {
        let now = Instant::now();
        if let Some(cue) = self.sections.tick(now).cloned() {
            self.apply_section(&cue);
        }
        let animating = self.renderer.lifecycle() == Lifecycle::Running
            && !self.renderer.is_fallback()
            && !self.renderer.cancel_token().is_cancelled();
        if animating {
            self.window.request_redraw();
            elwt.set_control_flow(ControlFlow::Wait);
        } else if let Some(deadline) = self.sections.deadline() {
            elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
        } else {
            elwt.set_control_flow(ControlFlow::Wait);
        }
    }
}

/// Opens a window and runs the background until it is closed.
pub fn run_window(config: WindowConfig) -> Result<()> {
    let event_loop = EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;
    let window = WindowBuilder::new()
        .with_title(config.title.clone())
        .with_inner_size(LogicalSize::new(config.size.0, config.size.1))
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create window: {err}"))?;
    let window = Arc::new(window);
    let window_id = window.id();

    let mut host = WindowHost::new(window, &config);
    host.window.request_redraw();

    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent {
                window_id: id,
                event,
            } if id == window_id => match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                    host.renderer.dispose();
                    elwt.exit();
                }
                WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                    host.resize();
                }
                WindowEvent::CursorMoved { position, .. } => host.pointer_moved(position),
                WindowEvent::Touch(touch)
                    if matches!(touch.phase, TouchPhase::Started | TouchPhase::Moved) =>
                {
                    host.pointer_moved(touch.location);
                }
                WindowEvent::KeyboardInput { event, .. } => host.handle_key(&event, elwt),
                WindowEvent::RedrawRequested => host.redraw(),
                _ => {}
            },
            Event::AboutToWait => host.about_to_wait(elwt),
            _ => {}
        })
        .map_err(|err| anyhow!("window event loop error: {err}"))
}
