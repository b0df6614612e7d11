use serde::{Deserialize, Serialize};

/// Linear RGB triple with every channel held inside `[0, 1]`.
///
/// Construction always clamps, so values reaching the shader or the fallback
/// gradients are in range even when the caller hands us garbage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 3]", into = "[f32; 3]")]
pub struct Rgb {
    r: f32,
    g: f32,
    b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };
    pub const WHITE: Rgb = Rgb {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self {
            r: clamp_channel(r),
            g: clamp_channel(g),
            b: clamp_channel(b),
        }
    }

    pub fn r(&self) -> f32 {
        self.r
    }

    pub fn g(&self) -> f32 {
        self.g
    }

    pub fn b(&self) -> f32 {
        self.b
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    /// Packs the colour as a std140 `vec4` with an opaque alpha.
    pub fn to_vec4(self) -> [f32; 4] {
        [self.r, self.g, self.b, 1.0]
    }

    /// Moves `factor` of the remaining distance toward `target`.
    pub fn approach(self, target: Rgb, factor: f32) -> Rgb {
        Rgb::new(
            approach(self.r, target.r, factor),
            approach(self.g, target.g, factor),
            approach(self.b, target.b, factor),
        )
    }

    /// Largest per-channel distance to `other`.
    pub fn distance(self, other: Rgb) -> f32 {
        (self.r - other.r)
            .abs()
            .max((self.g - other.g).abs())
            .max((self.b - other.b).abs())
    }

    /// Quantises to 8-bit sRGB-style bytes for CSS and raster output.
    pub fn to_bytes(self) -> [u8; 3] {
        [to_byte(self.r), to_byte(self.g), to_byte(self.b)]
    }
}

impl From<[f32; 3]> for Rgb {
    fn from(value: [f32; 3]) -> Self {
        Rgb::new(value[0], value[1], value[2])
    }
}

impl From<Rgb> for [f32; 3] {
    fn from(value: Rgb) -> Self {
        value.to_array()
    }
}

fn clamp_channel(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn to_byte(value: f32) -> u8 {
    (clamp_channel(value) * 255.0).round() as u8
}

/// Exponential step used by both colour and speed easing.
pub(crate) fn approach(current: f32, target: f32, factor: f32) -> f32 {
    current + (target - current) * factor
}

/// Three-colour palette consumed by the aurora shader.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    /// Colour of the two outer bands.
    pub primary: Rgb,
    /// Colour of the upper inner band.
    pub secondary: Rgb,
    /// Background the bands are added onto.
    pub base: Rgb,
}

impl Palette {
    pub const AURORA: Palette = Palette {
        primary: Rgb {
            r: 1.0,
            g: 0.42,
            b: 0.22,
        },
        secondary: Rgb {
            r: 0.20,
            g: 0.44,
            b: 1.0,
        },
        base: Rgb {
            r: 0.04,
            g: 0.06,
            b: 0.08,
        },
    };

    pub fn new(primary: Rgb, secondary: Rgb, base: Rgb) -> Self {
        Self {
            primary,
            secondary,
            base,
        }
    }

    pub fn approach(self, target: Palette, factor: f32) -> Palette {
        Palette {
            primary: self.primary.approach(target.primary, factor),
            secondary: self.secondary.approach(target.secondary, factor),
            base: self.base.approach(target.base, factor),
        }
    }

    pub fn distance(self, other: Palette) -> f32 {
        self.primary
            .distance(other.primary)
            .max(self.secondary.distance(other.secondary))
            .max(self.base.distance(other.base))
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::AURORA
    }
}

/// Caller-facing palette where every role is optional.
///
/// Missing roles resolve against [`Palette::AURORA`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PaletteOverride {
    #[serde(default)]
    pub primary: Option<Rgb>,
    #[serde(default)]
    pub secondary: Option<Rgb>,
    #[serde(default)]
    pub base: Option<Rgb>,
}

impl PaletteOverride {
    pub fn resolve(&self) -> Palette {
        self.resolve_against(Palette::AURORA)
    }

    pub fn resolve_against(&self, defaults: Palette) -> Palette {
        Palette {
            primary: self.primary.unwrap_or(defaults.primary),
            secondary: self.secondary.unwrap_or(defaults.secondary),
            base: self.base.unwrap_or(defaults.base),
        }
    }

    /// Layers `other` on top of `self`; roles set in `other` win.
    pub fn merged_with(&self, other: &PaletteOverride) -> PaletteOverride {
        PaletteOverride {
            primary: other.primary.or(self.primary),
            secondary: other.secondary.or(self.secondary),
            base: other.base.or(self.base),
        }
    }
}

impl From<Palette> for PaletteOverride {
    fn from(value: Palette) -> Self {
        Self {
            primary: Some(value.primary),
            secondary: Some(value.secondary),
            base: Some(value.base),
        }
    }
}

/// Parses `r,g,b` with float channels, as used on the command line.
pub fn parse_rgb(value: &str) -> Result<Rgb, String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!(
            "invalid colour '{value}'; expected three comma-separated channels (e.g. 1.0,0.42,0.22)"
        ));
    }
    let mut channels = [0.0_f32; 3];
    for (slot, part) in channels.iter_mut().zip(parts) {
        let parsed: f32 = part
            .parse()
            .map_err(|_| format!("invalid colour channel '{part}' in '{value}'"))?;
        if !parsed.is_finite() {
            return Err(format!("colour channel '{part}' must be finite"));
        }
        *slot = parsed;
    }
    Ok(Rgb::from(channels))
}
