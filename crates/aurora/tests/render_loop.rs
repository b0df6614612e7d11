use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};

use aurora::shading::{
    self, BAND_HIGH, BAND_HIGHLIGHT, BAND_LOW, BAND_SECONDARY, GAMMA, WEIGHT_HIGH,
    WEIGHT_HIGHLIGHT, WEIGHT_LOW, WEIGHT_SECONDARY,
};
use aurora::{
    AuroraConfig, AuroraRenderer, AuroraUniforms, Backend, DrawError, FixedTimeSource,
    FrameOutcome, InitError, Lifecycle, PaletteOverride, Rgb, SurfaceRect, Viewport,
};
use winit::dpi::{LogicalSize, PhysicalSize};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Resize(u32, u32),
    Draw(AuroraUniforms),
    Release,
}

/// Backend double that records every call into a shared log.
#[derive(Clone, Default)]
struct MockBackend {
    log: Rc<RefCell<Vec<Call>>>,
    lost: Rc<Cell<bool>>,
    fail_draw_at: Option<usize>,
}

impl MockBackend {
    fn draws(&self) -> usize {
        self.count(|call| matches!(call, Call::Draw(_)))
    }

    fn resizes(&self) -> usize {
        self.count(|call| matches!(call, Call::Resize(..)))
    }

    fn releases(&self) -> usize {
        self.count(|call| matches!(call, Call::Release))
    }

    fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.log.borrow().iter().filter(|call| predicate(call)).count()
    }
}

impl Backend for MockBackend {
    fn resize(&mut self, viewport: &Viewport) {
        let backing = viewport.backing_size();
        self.log
            .borrow_mut()
            .push(Call::Resize(backing.width, backing.height));
    }

    fn draw(&mut self, uniforms: &AuroraUniforms) -> Result<(), DrawError> {
        if self.fail_draw_at == Some(self.draws()) {
            return Err(DrawError::ContextLost("device reset".into()));
        }
        self.log.borrow_mut().push(Call::Draw(*uniforms));
        Ok(())
    }

    fn context_lost(&self) -> bool {
        self.lost.get()
    }

    fn release(&mut self) {
        self.log.borrow_mut().push(Call::Release);
    }
}

fn config() -> AuroraConfig {
    AuroraConfig {
        pointer_throttle: None,
        ..AuroraConfig::default()
    }
}

fn mount(config: &AuroraConfig, backend: &MockBackend) -> AuroraRenderer<MockBackend> {
    let probe = backend.clone();
    AuroraRenderer::mount(config, LogicalSize::new(800.0, 600.0), 1.0, move |_| Ok(probe))
        .with_time_source(Box::new(FixedTimeSource::new(0.0)))
}

fn frames(start: Instant, count: u64) -> impl Iterator<Item = Instant> {
    (0..count).map(move |i| start + Duration::from_millis(16 * i))
}

#[test]
fn identical_inputs_give_identical_frames() {
    let run = || {
        let backend = MockBackend::default();
        let mut renderer = mount(&config(), &backend);
        let start = Instant::now();
        let rect = SurfaceRect::from_size(800.0, 600.0);
        renderer.set_palette(&PaletteOverride {
            primary: Some(Rgb::new(0.2, 1.0, 0.5)),
            ..PaletteOverride::default()
        });
        renderer.pointer_moved(200.0, 150.0, &rect, start);
        let outcomes: Vec<_> = frames(start, 12).map(|now| renderer.step(now)).collect();
        let log = backend.log.borrow().clone();
        (outcomes, log)
    };
    assert_eq!(run(), run());
}

#[test]
fn failed_probe_never_draws() {
    let probes = Cell::new(0);
    let mut renderer: AuroraRenderer<MockBackend> = AuroraRenderer::mount(
        &config(),
        LogicalSize::new(640.0, 480.0),
        2.0,
        |_| {
            probes.set(probes.get() + 1);
            Err(InitError::ContextUnavailable("no adapter".into()))
        },
    );
    assert_eq!(probes.get(), 1);
    assert!(renderer.is_fallback());
    assert!(renderer.backend().is_none());
    for now in frames(Instant::now(), 5) {
        assert_eq!(renderer.step(now), FrameOutcome::Fallback);
    }
    assert_eq!(renderer.lifecycle(), Lifecycle::Uninitialized);
}

#[test]
fn forced_fallback_skips_probe() {
    let forced = AuroraConfig {
        force_fallback: true,
        ..config()
    };
    let backend = MockBackend::default();
    let mut renderer = mount(&forced, &backend);

    assert!(renderer.backend().is_none());
    assert_eq!(renderer.step(Instant::now()), FrameOutcome::Fallback);
    assert!(backend.log.borrow().is_empty());

    let violet = Rgb::new(0.7, 0.4, 1.0);
    renderer.set_palette(&PaletteOverride {
        primary: Some(violet),
        ..PaletteOverride::default()
    });
    let layer = renderer.fallback_layer().expect("static layer");
    assert_eq!(layer.palette().primary, violet);
}

#[test]
fn asynchronous_loss_falls_back_once() {
    let backend = MockBackend::default();
    let mut renderer = mount(&config(), &backend);
    let mut ticks = frames(Instant::now(), 10);

    assert!(matches!(
        renderer.step(ticks.next().unwrap()),
        FrameOutcome::Drawn(_)
    ));
    backend.lost.set(true);
    assert_eq!(renderer.step(ticks.next().unwrap()), FrameOutcome::FellBack);
    for now in ticks {
        assert_eq!(renderer.step(now), FrameOutcome::Fallback);
    }

    assert!(!renderer.context_lost());
    assert_eq!(backend.draws(), 1);
    assert_eq!(backend.releases(), 1);
    assert!(renderer.is_fallback());
    assert_eq!(renderer.lifecycle(), Lifecycle::Disposed);
}

#[test]
fn draw_reported_loss_falls_back() {
    let backend = MockBackend {
        fail_draw_at: Some(3),
        ..MockBackend::default()
    };
    let mut renderer = mount(&config(), &backend);
    let outcomes: Vec<_> = frames(Instant::now(), 6)
        .map(|now| renderer.step(now))
        .collect();

    assert!(outcomes[..3]
        .iter()
        .all(|outcome| matches!(outcome, FrameOutcome::Drawn(_))));
    assert_eq!(outcomes[3], FrameOutcome::FellBack);
    assert_eq!(outcomes[4..], [FrameOutcome::Fallback, FrameOutcome::Fallback]);
    assert_eq!(backend.draws(), 3);
    assert_eq!(backend.releases(), 1);
}

#[test]
fn unchanged_resize_does_not_touch_backend() {
    let backend = MockBackend::default();
    let mut renderer = mount(&config(), &backend);
    assert_eq!(backend.resizes(), 1);

    for _ in 0..4 {
        assert!(!renderer.resize(LogicalSize::new(800.0, 600.0), 1.0));
    }
    assert_eq!(backend.resizes(), 1);

    assert!(renderer.resize(LogicalSize::new(1024.0, 768.0), 2.0));
    assert_eq!(backend.resizes(), 2);
    assert_eq!(
        backend.log.borrow().last(),
        Some(&Call::Resize(1536, 1152))
    );
}

#[test]
fn physical_resize_uses_the_same_short_circuit() {
    let backend = MockBackend::default();
    let mut renderer = mount(&config(), &backend);

    assert!(renderer.resize_physical(PhysicalSize::new(1600, 1200), 2.0));
    assert_eq!(backend.log.borrow().last(), Some(&Call::Resize(1200, 900)));
    assert!(!renderer.resize_physical(PhysicalSize::new(1600, 1200), 2.0));
    assert_eq!(backend.resizes(), 2);

    // A bogus scale factor is treated as 1.
    assert!(renderer.resize_physical(PhysicalSize::new(800, 600), f64::NAN));
    assert_eq!(renderer.viewport().scale_factor(), 1.0);
    assert_eq!(backend.log.borrow().last(), Some(&Call::Resize(800, 600)));
}

#[test]
fn frame_index_counts_drawn_frames() {
    let backend = MockBackend::default();
    let mut renderer = mount(&config(), &backend);
    assert_eq!(renderer.frame_index(), 0);
    for now in frames(Instant::now(), 4) {
        renderer.step(now);
    }
    assert_eq!(renderer.frame_index(), 3);
}

#[test]
fn dispose_is_idempotent() {
    let backend = MockBackend::default();
    let mut renderer = mount(&config(), &backend);
    renderer.step(Instant::now());

    renderer.dispose();
    renderer.dispose();
    assert_eq!(backend.releases(), 1);
    assert_eq!(renderer.lifecycle(), Lifecycle::Disposed);
    assert_eq!(renderer.step(Instant::now()), FrameOutcome::Disposed);

    drop(renderer);
    assert_eq!(backend.releases(), 1);
}

#[test]
fn cancel_token_stops_the_loop() {
    let backend = MockBackend::default();
    let mut renderer = mount(&config(), &backend);
    let token = renderer.cancel_token();

    assert!(matches!(renderer.step(Instant::now()), FrameOutcome::Drawn(_)));
    token.cancel();
    assert_eq!(renderer.step(Instant::now()), FrameOutcome::Disposed);
    assert_eq!(backend.releases(), 1);
    assert_eq!(backend.draws(), 1);
}

#[test]
fn red_blue_black_centre_pixel() {
    let palette = PaletteOverride {
        primary: Some(Rgb::new(1.0, 0.0, 0.0)),
        secondary: Some(Rgb::new(0.0, 0.0, 1.0)),
        base: Some(Rgb::BLACK),
    };
    let config = AuroraConfig {
        speed: 1.0,
        palette,
        ..config()
    };
    let backend = MockBackend::default();
    let mut renderer = mount(&config, &backend);

    let FrameOutcome::Drawn(uniforms) = renderer.step(Instant::now()) else {
        panic!("expected a drawn frame");
    };
    assert_eq!(uniforms.time, 0.0);
    assert_eq!(uniforms.pointer, [0.5, 0.5]);
    assert_eq!(uniforms.resolution, [800.0, 600.0]);

    // At t = 0 with the pointer centred, the warp leaves the centre at
    // y = 0.5 + 0.1 + 0.05 * cos(0.2) and both breath and vignette are 1.
    let y = 0.5 + 0.1 + 0.05 * 0.2_f32.cos();
    let highlight = BAND_HIGHLIGHT.intensity(y) * WEIGHT_HIGHLIGHT;
    let red = BAND_LOW.intensity(y) * WEIGHT_LOW + BAND_HIGH.intensity(y) * WEIGHT_HIGH;
    let blue = BAND_SECONDARY.intensity(y) * WEIGHT_SECONDARY;
    let expected = [
        (red + highlight).clamp(0.0, 1.0).powf(GAMMA),
        highlight.powf(GAMMA),
        (blue + highlight).clamp(0.0, 1.0).powf(GAMMA),
    ];

    let shaded = shading::shade([0.5, 0.5], &uniforms);
    for (actual, expected) in shaded.iter().zip(expected) {
        assert!((actual - expected).abs() < 1e-4, "{shaded:?} vs {expected:?}");
    }
    // The centre sits on the lower flank of the secondary band, so blue
    // dominates and green only carries the faint highlight.
    assert!(shaded[2] > shaded[0]);
    assert!(shaded[1] < 0.05);
}
