//! Reference evaluation of the aurora pattern on the CPU.
//!
//! The constants below are spliced into the GLSL source by
//! [`crate::compile`], so the GPU path and this mirror cannot drift apart.
//! The mirror backs still exports and the deterministic colour tests.

use image::{Rgba, RgbaImage};

use crate::uniforms::AuroraUniforms;

pub const ROTATION_AMPLITUDE: f32 = 0.15;
pub const ROTATION_FREQUENCY: f32 = 0.05;

pub const SWIRL_STRENGTH: f32 = 1.2;
pub const SWIRL_FALLOFF: f32 = 4.0;
pub const POINTER_PULL: f32 = 0.08;

pub const FLOW_PRIMARY_AMPLITUDE: f32 = 0.10;
pub const FLOW_PRIMARY_FREQUENCY: f32 = 3.0;
pub const FLOW_PRIMARY_RATE: [f32; 2] = [0.6, 0.5];
pub const FLOW_DETAIL_AMPLITUDE: f32 = 0.05;
pub const FLOW_DETAIL_FREQUENCY: [f32; 2] = [7.0, 6.0];
pub const FLOW_DETAIL_RATE: [f32; 2] = [0.9, 0.7];
pub const FLOW_DETAIL_SHEAR: f32 = 2.0;

/// Soft horizontal stripe: `exp(-0.5 * ((y - center) / width)^2)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub center: f32,
    pub width: f32,
}

impl Band {
    pub const fn new(center: f32, width: f32) -> Self {
        Self { center, width }
    }

    pub fn intensity(&self, y: f32) -> f32 {
        let z = (y - self.center) / self.width;
        (-0.5 * z * z).exp()
    }
}

/// Lower primary band.
pub const BAND_LOW: Band = Band::new(0.12, 0.10);
/// Upper primary band.
pub const BAND_HIGH: Band = Band::new(0.88, 0.10);
/// Secondary band just under the upper primary band.
pub const BAND_SECONDARY: Band = Band::new(0.78, 0.12);
/// Faint white highlight.
pub const BAND_HIGHLIGHT: Band = Band::new(0.30, 0.09);

pub const WEIGHT_LOW: f32 = 1.0;
pub const WEIGHT_HIGH: f32 = 1.1;
pub const WEIGHT_SECONDARY: f32 = 1.1;
pub const WEIGHT_HIGHLIGHT: f32 = 0.05;

pub const BREATH_AMPLITUDE: f32 = 0.05;
pub const BREATH_FREQUENCY: f32 = 0.4;

pub const VIGNETTE_FLOOR: f32 = 0.66;
pub const GAMMA: f32 = 0.93;

/// Evaluates one fragment. `uv` is in `[0, 1]²` with a bottom-left origin.
pub fn shade(uv: [f32; 2], uniforms: &AuroraUniforms) -> [f32; 3] {
    let aspect = uniforms.aspect();
    let t = uniforms.time * uniforms.speed;

    let mut p = [(uv[0] - 0.5) * aspect, uv[1] - 0.5];

    p = rotate(p, ROTATION_AMPLITUDE * (t * ROTATION_FREQUENCY).sin());

    let pointer = [
        (uniforms.pointer[0] - 0.5) * aspect,
        uniforms.pointer[1] - 0.5,
    ];
    let offset = [p[0] - pointer[0], p[1] - pointer[1]];
    let radius = (offset[0] * offset[0] + offset[1] * offset[1]).sqrt();
    let twisted = rotate(offset, SWIRL_STRENGTH * (-radius * SWIRL_FALLOFF).exp());
    p = [
        pointer[0] + twisted[0] - pointer[0] * POINTER_PULL,
        pointer[1] + twisted[1] - pointer[1] * POINTER_PULL,
    ];

    p = flow(p, t);

    let y = p[1] + 0.5;
    let low = BAND_LOW.intensity(y);
    let high = BAND_HIGH.intensity(y);
    let secondary = BAND_SECONDARY.intensity(y);
    let highlight = BAND_HIGHLIGHT.intensity(y);

    let breath = 1.0 + BREATH_AMPLITUDE * (t * BREATH_FREQUENCY).sin();
    let vignette = vignette(uv);

    let mut out = [0.0_f32; 3];
    for (channel, slot) in out.iter_mut().enumerate() {
        let composite = uniforms.base[channel]
            + uniforms.primary[channel] * (low * WEIGHT_LOW + high * WEIGHT_HIGH)
            + uniforms.secondary[channel] * secondary * WEIGHT_SECONDARY
            + highlight * WEIGHT_HIGHLIGHT;
        *slot = (composite * breath * vignette).clamp(0.0, 1.0).powf(GAMMA);
    }
    out
}

/// Two-pass domain warp; each pass reads the coordinates the previous one
/// produced.
pub fn flow(p: [f32; 2], t: f32) -> [f32; 2] {
    let first = [
        p[0] + FLOW_PRIMARY_AMPLITUDE
            * (p[1] * FLOW_PRIMARY_FREQUENCY + t * FLOW_PRIMARY_RATE[0]).sin(),
        p[1] + FLOW_PRIMARY_AMPLITUDE
            * (p[0] * FLOW_PRIMARY_FREQUENCY - t * FLOW_PRIMARY_RATE[1]).cos(),
    ];
    [
        first[0]
            + FLOW_DETAIL_AMPLITUDE
                * (first[1] * FLOW_DETAIL_FREQUENCY[0] - t * FLOW_DETAIL_RATE[0]
                    + first[0] * FLOW_DETAIL_SHEAR)
                    .sin(),
        first[1]
            + FLOW_DETAIL_AMPLITUDE
                * (first[0] * FLOW_DETAIL_FREQUENCY[1] + t * FLOW_DETAIL_RATE[1]
                    - first[1] * FLOW_DETAIL_SHEAR)
                    .cos(),
    ]
}

/// 1.0 at the centre, easing down to [`VIGNETTE_FLOOR`] at the corners.
pub fn vignette(uv: [f32; 2]) -> f32 {
    let dx = uv[0] - 0.5;
    let dy = uv[1] - 0.5;
    let r = ((dx * dx + dy * dy).sqrt() * std::f32::consts::SQRT_2).clamp(0.0, 1.0);
    let eased = r * r * (3.0 - 2.0 * r);
    1.0 + (VIGNETTE_FLOOR - 1.0) * eased
}

pub fn rotate(v: [f32; 2], angle: f32) -> [f32; 2] {
    let (s, c) = angle.sin_cos();
    [c * v[0] - s * v[1], s * v[0] + c * v[1]]
}

/// Renders a full frame on the CPU, sampling at pixel centres.
pub fn render_still(width: u32, height: u32, uniforms: &AuroraUniforms) -> RgbaImage {
    let width = width.max(1);
    let height = height.max(1);
    let mut uniforms = *uniforms;
    uniforms.resolution = [width as f32, height as f32];
    RgbaImage::from_fn(width, height, |x, y| {
        let uv = [
            (x as f32 + 0.5) / width as f32,
            1.0 - (y as f32 + 0.5) / height as f32,
        ];
        let [r, g, b] = shade(uv, &uniforms);
        Rgba([to_byte(r), to_byte(g), to_byte(b), 255])
    })
}

fn to_byte(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{Palette, Rgb};

    #[test]
    fn band_peaks_at_center() {
        assert_eq!(BAND_LOW.intensity(0.12), 1.0);
        let one_sigma = BAND_LOW.intensity(0.22);
        assert!((one_sigma - (-0.5_f32).exp()).abs() < 1e-6);
    }

    #[test]
    fn vignette_spans_center_to_floor() {
        assert_eq!(vignette([0.5, 0.5]), 1.0);
        assert!((vignette([0.0, 0.0]) - VIGNETTE_FLOOR).abs() < 1e-5);
        assert!(vignette([0.2, 0.5]) < 1.0);
    }

    #[test]
    fn output_is_clamped_for_hot_palettes() {
        let palette = Palette::new(Rgb::WHITE, Rgb::WHITE, Rgb::WHITE);
        let uniforms = AuroraUniforms::new([640.0, 480.0], 3.0, [0.2, 0.8], 2.0, &palette);
        for uv in [[0.5, 0.12], [0.1, 0.9], [0.5, 0.5]] {
            for channel in shade(uv, &uniforms) {
                assert!((0.0..=1.0).contains(&channel));
            }
        }
    }

    #[test]
    fn still_render_has_requested_size() {
        let uniforms = AuroraUniforms::default();
        let image = render_still(8, 4, &uniforms);
        assert_eq!(image.dimensions(), (8, 4));
        assert!(image.pixels().all(|pixel| pixel.0[3] == 255));
    }
}
