use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use aurora::{
    run_window, AuroraConfig, FallbackLayer, PaletteOverride, Rgb, SectionCue, WindowConfig,
    DEFAULT_DPR_CAP, DEFAULT_POINTER_THROTTLE, DEFAULT_SMOOTHING,
};
use sections::{ResolvedSection, SectionsConfig};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, ExportArgs, RunArgs};
use crate::defaults;
use crate::export::{export_still, StillFrame, DEFAULT_EXPORT_SIZE};
use crate::paths::AppPaths;

/// Everything resolved from the section table plus command-line overrides.
#[derive(Debug, Clone)]
struct LaunchPlan {
    aurora: AuroraConfig,
    cues: Vec<SectionCue>,
    start: usize,
    cycle: Option<Duration>,
}

impl LaunchPlan {
    fn current(&self) -> Option<&SectionCue> {
        self.cues.get(self.start)
    }

    fn palette(&self) -> PaletteOverride {
        self.current()
            .map(|cue| self.aurora.palette.merged_with(&cue.palette))
            .unwrap_or(self.aurora.palette)
    }

    fn speed(&self) -> f32 {
        self.current().map_or(self.aurora.speed, |cue| cue.speed)
    }
}

pub fn run(cli: Cli) -> Result<()> {
    initialise_tracing();

    let Cli { run: args, command } = cli;
    let table = load_sections(&args)?;
    let plan = build_plan(&args, &table)?;
    tracing::debug!(
        sections = plan.cues.len(),
        start = plan.start,
        speed = plan.speed(),
        "resolved launch plan"
    );

    match command {
        None => run_interactive(&args, plan),
        Some(Command::Export(export)) => run_export(&export, &plan),
        Some(Command::FallbackCss) => {
            let layer = FallbackLayer::new(plan.palette().resolve());
            println!("{}", layer.to_css());
            Ok(())
        }
        Some(Command::Sections) => {
            let listing: Vec<ResolvedSection> = table.resolved();
            let json = serde_json::to_string_pretty(&listing)
                .context("failed to serialise section listing")?;
            println!("{json}");
            Ok(())
        }
    }
}

fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout carries command output (CSS, JSON), so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_sections(args: &RunArgs) -> Result<SectionsConfig> {
    if let Some(path) = args.config.as_deref() {
        return read_sections(path);
    }

    let paths = AppPaths::discover()?;
    let candidate = paths.sections_file();
    if candidate.is_file() {
        return read_sections(&candidate);
    }

    tracing::debug!(
        config = %paths.config_dir().display(),
        "no sections.toml found; using bundled sections"
    );
    defaults::bundled()
}

fn read_sections(path: &Path) -> Result<SectionsConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read section table {}", path.display()))?;
    let table = SectionsConfig::from_toml_str(&contents)
        .with_context(|| format!("invalid section table {}", path.display()))?;
    tracing::info!(path = %path.display(), sections = table.sections.len(), "loaded section table");
    Ok(table)
}

fn build_plan(args: &RunArgs, table: &SectionsConfig) -> Result<LaunchPlan> {
    let overrides = PaletteOverride {
        primary: args.primary,
        secondary: args.secondary,
        base: args.base,
    };

    let cues: Vec<SectionCue> = table
        .resolved()
        .into_iter()
        .map(|section| section_cue(section, &overrides, args.speed))
        .collect();

    let start = match args.section.as_deref() {
        Some(name) => table.position(name).ok_or_else(|| {
            let known: Vec<&str> = table.sections.iter().map(|s| s.name.as_str()).collect();
            anyhow!("unknown section '{name}'; known sections: {}", known.join(", "))
        })?,
        None => table.default_index(),
    };

    let defaults = &table.defaults;
    let aurora = AuroraConfig {
        speed: args
            .speed
            .or(defaults.speed)
            .unwrap_or(sections::FALLBACK_SPEED),
        palette: overrides,
        smoothing: args
            .smoothing
            .or(defaults.smoothing)
            .unwrap_or(DEFAULT_SMOOTHING),
        frame_interval: args
            .frame_interval
            .or(defaults.frame_interval)
            .filter(|interval| !interval.is_zero()),
        pointer_throttle: Some(
            args.pointer_throttle
                .or(defaults.pointer_throttle)
                .unwrap_or(DEFAULT_POINTER_THROTTLE),
        ),
        dpr_cap: args.dpr_cap.or(defaults.dpr_cap).unwrap_or(DEFAULT_DPR_CAP),
        force_fallback: args.force_fallback,
    };

    Ok(LaunchPlan {
        aurora,
        cues,
        start,
        cycle: args
            .cycle
            .or(defaults.cycle)
            .filter(|interval| !interval.is_zero()),
    })
}

/// Command-line colours and speed win over every section's own values.
fn section_cue(
    section: ResolvedSection,
    overrides: &PaletteOverride,
    speed: Option<f32>,
) -> SectionCue {
    let palette = PaletteOverride {
        primary: section.primary.map(Rgb::from),
        secondary: section.secondary.map(Rgb::from),
        base: section.base.map(Rgb::from),
    }
    .merged_with(overrides);
    SectionCue {
        name: section.name,
        palette,
        speed: speed.unwrap_or(section.speed),
    }
}

fn run_interactive(args: &RunArgs, plan: LaunchPlan) -> Result<()> {
    let size = args.size.unwrap_or(WindowConfig::default().size);
    tracing::info!(
        width = size.0,
        height = size.1,
        force_fallback = plan.aurora.force_fallback,
        cycle = ?plan.cycle,
        "starting aurora preview"
    );
    run_window(WindowConfig {
        title: "aurora".to_string(),
        size,
        aurora: plan.aurora,
        sections: plan.cues,
        start_section: plan.start,
        cycle: plan.cycle,
    })
}

fn run_export(export: &ExportArgs, plan: &LaunchPlan) -> Result<()> {
    let frame = StillFrame {
        size: export.size.unwrap_or(DEFAULT_EXPORT_SIZE),
        time: export.time,
        pointer: export.pointer.unwrap_or([0.5, 0.5]),
        speed: plan.speed(),
        palette: plan.palette().resolve(),
    };
    export_still(&frame, &export.out)
}
