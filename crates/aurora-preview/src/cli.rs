use std::path::PathBuf;
use std::time::Duration;

use aurora::{parse_rgb, Rgb};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "aurora-preview",
    author,
    version,
    about = "Animated aurora background with section palettes and a static fallback",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Section table (TOML). Defaults to `$AURORA_CONFIG_DIR/sections.toml`,
    /// then the platform config directory, then the bundled sections.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Section to start on (defaults to the table's `defaults.section`).
    #[arg(long, value_name = "NAME")]
    pub section: Option<String>,

    /// Animation speed multiplier; overrides every section's speed.
    #[arg(long, value_name = "SPEED", value_parser = parse_speed)]
    pub speed: Option<f32>,

    /// Primary band colour as `r,g,b` floats in [0, 1].
    #[arg(long, value_name = "R,G,B", value_parser = parse_rgb)]
    pub primary: Option<Rgb>,

    /// Secondary band colour as `r,g,b`.
    #[arg(long, value_name = "R,G,B", value_parser = parse_rgb)]
    pub secondary: Option<Rgb>,

    /// Base colour as `r,g,b`.
    #[arg(long, value_name = "R,G,B", value_parser = parse_rgb)]
    pub base: Option<Rgb>,

    /// Switch to the next section on this interval (e.g. `8s`).
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub cycle: Option<Duration>,

    /// Cap the frame rate by skipping ticks closer than this (e.g. `30ms`).
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub frame_interval: Option<Duration>,

    /// Minimum spacing between applied pointer samples (`0` disables).
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub pointer_throttle: Option<Duration>,

    /// Upper bound for the device pixel ratio used by the backing store.
    #[arg(long, value_name = "RATIO", value_parser = parse_dpr_cap)]
    pub dpr_cap: Option<f64>,

    /// Per-frame easing fraction in (0, 1].
    #[arg(long, value_name = "FRACTION", value_parser = parse_smoothing)]
    pub smoothing: Option<f32>,

    /// Start on the static background without probing the GPU.
    #[arg(long)]
    pub force_fallback: bool,

    /// Window size in logical pixels (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<(u32, u32)>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render one frame on the CPU and write it as PNG.
    Export(ExportArgs),
    /// Print the CSS `background` value of the static fallback layer.
    FallbackCss,
    /// List the resolved sections as JSON.
    Sections,
}

#[derive(Parser, Debug)]
pub struct ExportArgs {
    /// Destination PNG file.
    #[arg(long, value_name = "FILE")]
    pub out: PathBuf,

    /// Elapsed time in seconds to render at.
    #[arg(long, value_name = "SECONDS", default_value_t = 0.0)]
    pub time: f32,

    /// Pointer position as `x,y` in [0, 1], top-left origin.
    #[arg(long, value_name = "X,Y", value_parser = parse_pointer)]
    pub pointer: Option<[f32; 2]>,

    /// Image size in pixels; defaults to 1280x720.
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<(u32, u32)>,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let trimmed = value.trim();
    let (width, height) = trimmed
        .split_once(['x', 'X', '×'])
        .ok_or_else(|| "expected WxH format, e.g. 1920x1080".to_string())?;

    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| "invalid width in size".to_string())?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| "invalid height in size".to_string())?;

    if width == 0 || height == 0 {
        return Err("dimensions must be greater than zero".to_string());
    }

    Ok((width, height))
}

pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let trimmed = value.trim();
    if trimmed == "0" || trimmed.eq_ignore_ascii_case("off") {
        return Ok(Duration::ZERO);
    }
    humantime::parse_duration(trimmed).map_err(|err| format!("invalid duration '{trimmed}': {err}"))
}

pub fn parse_speed(value: &str) -> Result<f32, String> {
    let speed: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid speed '{value}'"))?;
    if !speed.is_finite() || speed <= 0.0 {
        return Err("speed must be a positive number".to_string());
    }
    Ok(speed)
}

pub fn parse_smoothing(value: &str) -> Result<f32, String> {
    let smoothing: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid smoothing '{value}'"))?;
    if !(smoothing > 0.0 && smoothing <= 1.0) {
        return Err("smoothing must be in (0, 1]".to_string());
    }
    Ok(smoothing)
}

pub fn parse_dpr_cap(value: &str) -> Result<f64, String> {
    let cap: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid pixel ratio cap '{value}'"))?;
    if !cap.is_finite() || cap < 1.0 {
        return Err("pixel ratio cap must be >= 1".to_string());
    }
    Ok(cap)
}

pub fn parse_pointer(value: &str) -> Result<[f32; 2], String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| "expected X,Y, e.g. 0.5,0.5".to_string())?;
    let parse_axis = |raw: &str| -> Result<f32, String> {
        let parsed: f32 = raw
            .trim()
            .parse()
            .map_err(|_| format!("invalid pointer coordinate '{raw}'"))?;
        if !parsed.is_finite() {
            return Err("pointer coordinates must be finite".to_string());
        }
        Ok(parsed.clamp(0.0, 1.0))
    };
    Ok([parse_axis(x)?, parse_axis(y)?])
}
