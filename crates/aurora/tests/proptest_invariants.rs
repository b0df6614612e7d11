use std::time::{Duration, Instant};

use aurora::{Animator, Palette, PointerTracker, Rgb, SurfaceRect};
use proptest::prelude::*;

fn channel() -> impl Strategy<Value = f32> {
    -4.0f32..4.0
}

fn rgb() -> impl Strategy<Value = Rgb> {
    (0.0f32..=1.0, 0.0f32..=1.0, 0.0f32..=1.0).prop_map(|(r, g, b)| Rgb::new(r, g, b))
}

fn palette() -> impl Strategy<Value = Palette> {
    (rgb(), rgb(), rgb())
        .prop_map(|(primary, secondary, base)| Palette::new(primary, secondary, base))
}

fn between(value: f32, a: f32, b: f32) -> bool {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    value >= lo - 1e-6 && value <= hi + 1e-6
}

proptest! {
    #[test]
    fn colours_always_clamp(r in channel(), g in channel(), b in channel()) {
        let color = Rgb::new(r, g, b);
        for value in color.to_array() {
            prop_assert!((0.0..=1.0).contains(&value));
        }
    }

    #[test]
    fn easing_never_overshoots(
        start in palette(),
        target in palette(),
        smoothing in 0.01f32..=1.0,
        steps in 1usize..200,
    ) {
        let mut animator = Animator::new(start, 1.0, smoothing);
        animator.set_target_palette(target);
        let mut previous = animator.palette().distance(target);
        for _ in 0..steps {
            animator.step();
            let current = animator.palette();
            let pairs = [
                (current.primary, start.primary, target.primary),
                (current.secondary, start.secondary, target.secondary),
                (current.base, start.base, target.base),
            ];
            for (now, from, to) in pairs {
                let channels = now
                    .to_array()
                    .into_iter()
                    .zip(from.to_array())
                    .zip(to.to_array());
                for ((n, f), t) in channels {
                    prop_assert!(between(n, f, t), "{n} left [{f}, {t}]");
                }
            }
            let distance = current.distance(target);
            prop_assert!(distance <= previous + 1e-6);
            previous = distance;
        }
    }

    #[test]
    fn easing_converges(start in palette(), target in palette(), speed in 0.1f32..5.0) {
        let mut animator = Animator::new(start, 1.0, 0.05);
        animator.set_target_palette(target);
        animator.set_target_speed(speed);
        for _ in 0..600 {
            animator.step();
        }
        prop_assert!(animator.settled(1e-3));
    }

    #[test]
    fn pointer_stays_normalised(
        origin in (-500.0f64..500.0, -500.0f64..500.0),
        extent in (1.0f64..4000.0, 1.0f64..4000.0),
        point in (-10_000.0f64..10_000.0, -10_000.0f64..10_000.0),
    ) {
        let rect = SurfaceRect::new(origin.0, origin.1, extent.0, extent.1);
        let mut tracker = PointerTracker::new(Some(Duration::from_millis(30)));
        let now = Instant::now();
        tracker.record(point.0, point.1, &rect, now);
        tracker.flush(now + Duration::from_millis(31));
        for value in tracker.position().into_iter().chain(tracker.shader_position()) {
            prop_assert!((0.0..=1.0).contains(&value));
        }
    }
}
