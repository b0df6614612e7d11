use std::fmt::Write as _;

use image::{Rgba, RgbaImage};

use crate::color::{Palette, Rgb};
use crate::shading::{BAND_HIGH, BAND_LOW};

/// Elliptical radial gradient fading from `color` at its centre to fully
/// transparent at `fade_stop`.
///
/// Coordinates follow CSS: fractions of the layer size with a top-left origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadialGradient {
    pub center: [f32; 2],
    pub radius: [f32; 2],
    pub color: Rgb,
    pub opacity: f32,
    pub fade_stop: f32,
}

impl RadialGradient {
    /// Opacity contributed at `(x, y)` in layer fractions.
    pub fn coverage(&self, x: f32, y: f32) -> f32 {
        let dx = (x - self.center[0]) / self.radius[0].max(f32::EPSILON);
        let dy = (y - self.center[1]) / self.radius[1].max(f32::EPSILON);
        let distance = (dx * dx + dy * dy).sqrt();
        let stop = self.fade_stop.clamp(f32::EPSILON, 1.0);
        (1.0 - distance / stop).clamp(0.0, 1.0) * self.opacity
    }

    fn to_css(&self) -> String {
        let [r, g, b] = self.color.to_bytes();
        format!(
            "radial-gradient(ellipse {rx}% {ry}% at {cx}% {cy}%, rgba({r}, {g}, {b}, {a}) 0%, rgba({r}, {g}, {b}, 0) {stop}%)",
            rx = percent(self.radius[0]),
            ry = percent(self.radius[1]),
            cx = percent(self.center[0]),
            cy = percent(self.center[1]),
            a = round3(self.opacity),
            stop = percent(self.fade_stop),
        )
    }
}

const BAND_OPACITY: f32 = 0.55;
const BAND_RADIUS: [f32; 2] = [0.9, 0.28];
const BAND_FADE_STOP: f32 = 0.85;

/// Static stand-in for the animated layer.
///
/// The two outer bands become primary-coloured radial gradients over a flat
/// base colour. Nothing here animates or reacts to input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallbackLayer {
    palette: Palette,
}

impl FallbackLayer {
    pub fn new(palette: Palette) -> Self {
        Self { palette }
    }

    pub fn palette(&self) -> Palette {
        self.palette
    }

    pub fn set_palette(&mut self, palette: Palette) {
        self.palette = palette;
    }

    /// Gradients in paint order, topmost first (CSS `background` order).
    pub fn gradients(&self) -> [RadialGradient; 2] {
        let band = |center: f32| RadialGradient {
            // Bands are positioned bottom-up; CSS measures from the top.
            center: [0.5, 1.0 - center],
            radius: BAND_RADIUS,
            color: self.palette.primary,
            opacity: BAND_OPACITY,
            fade_stop: BAND_FADE_STOP,
        };
        [band(BAND_HIGH.center), band(BAND_LOW.center)]
    }

    /// CSS `background` value reproducing this layer.
    pub fn to_css(&self) -> String {
        let mut css = String::new();
        for gradient in self.gradients() {
            let _ = write!(css, "{}, ", gradient.to_css());
        }
        let [r, g, b] = self.palette.base.to_bytes();
        let _ = write!(css, "rgb({r}, {g}, {b})");
        css
    }

    /// Colour at `(x, y)` in layer fractions (top-left origin).
    pub fn sample(&self, x: f32, y: f32) -> [f32; 3] {
        let mut color = self.palette.base.to_array();
        // Paint bottom layer first so the first-listed gradient ends on top.
        for gradient in self.gradients().iter().rev() {
            let alpha = gradient.coverage(x, y);
            let top = gradient.color.to_array();
            for (channel, value) in color.iter_mut().enumerate() {
                *value = *value * (1.0 - alpha) + top[channel] * alpha;
            }
        }
        color
    }

    /// Rasterises the layer, sampling at pixel centres.
    pub fn rasterize(&self, width: u32, height: u32) -> RgbaImage {
        let width = width.max(1);
        let height = height.max(1);
        RgbaImage::from_fn(width, height, |x, y| {
            let fx = (x as f32 + 0.5) / width as f32;
            let fy = (y as f32 + 0.5) / height as f32;
            let rgb = Rgb::from(self.sample(fx, fy)).to_bytes();
            Rgba([rgb[0], rgb[1], rgb[2], 255])
        })
    }
}

impl Default for FallbackLayer {
    fn default() -> Self {
        Self::new(Palette::AURORA)
    }
}

fn percent(fraction: f32) -> f32 {
    round3(fraction * 100.0)
}

fn round3(value: f32) -> f32 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn red_blue_black() -> Palette {
        Palette::new(
            Rgb::new(1.0, 0.0, 0.0),
            Rgb::new(0.0, 0.0, 1.0),
            Rgb::BLACK,
        )
    }

    #[test]
    fn css_lists_both_bands_over_base() {
        let css = FallbackLayer::new(red_blue_black()).to_css();
        assert_eq!(css.matches("radial-gradient").count(), 2);
        assert!(css.contains("at 50% 12%"), "{css}");
        assert!(css.contains("at 50% 88%"), "{css}");
        assert!(css.contains("rgba(255, 0, 0, 0.55)"));
        assert!(css.ends_with("rgb(0, 0, 0)"));
    }

    #[test]
    fn band_centres_take_the_primary_colour() {
        let layer = FallbackLayer::new(red_blue_black());
        let top = layer.sample(0.5, 0.12);
        let middle = layer.sample(0.5, 0.5);
        assert!(top[0] > 0.5);
        assert_eq!(top[2], 0.0);
        assert!(middle[0] < top[0]);
    }

    #[test]
    fn raster_channels_stay_in_range_and_opaque() {
        let layer = FallbackLayer::new(Palette::new(Rgb::WHITE, Rgb::WHITE, Rgb::WHITE));
        let image = layer.rasterize(16, 9);
        assert_eq!(image.dimensions(), (16, 9));
        assert!(image.pixels().all(|pixel| pixel.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn never_blank_even_for_black_primary() {
        let layer = FallbackLayer::new(Palette::new(
            Rgb::BLACK,
            Rgb::BLACK,
            Rgb::new(0.2, 0.2, 0.2),
        ));
        let pixel = layer.rasterize(4, 4).get_pixel(0, 0).0;
        assert_eq!(pixel[3], 255);
        assert!(pixel[0] > 0);
    }
}
