use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use aurora::{render_still, AuroraUniforms, Palette};
use tracing::info;

pub const DEFAULT_EXPORT_SIZE: (u32, u32) = (1280, 720);

#[derive(Debug, Clone, Copy)]
pub struct StillFrame {
    pub size: (u32, u32),
    pub time: f32,
    /// Top-left origin, like pointer events.
    pub pointer: [f32; 2],
    pub speed: f32,
    pub palette: Palette,
}

impl StillFrame {
    pub fn uniforms(&self) -> AuroraUniforms {
        let (width, height) = self.size;
        // The shader expects a bottom-left origin.
        let pointer = [self.pointer[0], 1.0 - self.pointer[1]];
        AuroraUniforms::new(
            [width as f32, height as f32],
            self.time,
            pointer,
            self.speed,
            &self.palette,
        )
    }
}

/// Renders `frame` with the CPU shading path and writes it to `out` as PNG.
pub fn export_still(frame: &StillFrame, out: &Path) -> Result<()> {
    if let Some(parent) = out.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let (width, height) = frame.size;
    let image = render_still(width, height, &frame.uniforms());
    image
        .save_with_format(out, image::ImageFormat::Png)
        .with_context(|| format!("failed to write {}", out.display()))?;

    info!(
        path = %out.display(),
        width,
        height,
        time = frame.time,
        "exported still frame"
    );
    Ok(())
}
