use winit::dpi::{LogicalSize, PhysicalSize};

/// Upper bound applied to the device pixel ratio when sizing the backing store.
pub const DEFAULT_DPR_CAP: f64 = 1.5;

/// Keeps the backing-store resolution in sync with the logical viewport.
///
/// The display size always follows the window; only the resolution the shader
/// renders at is capped, which bounds fragment cost on dense displays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    logical: LogicalSize<f64>,
    scale_factor: f64,
    dpr_cap: f64,
    backing: PhysicalSize<u32>,
}

impl Viewport {
    pub fn new(logical: LogicalSize<f64>, scale_factor: f64, dpr_cap: f64) -> Self {
        let dpr_cap = sanitize_cap(dpr_cap);
        let scale_factor = sanitize_scale(scale_factor);
        Self {
            logical,
            scale_factor,
            dpr_cap,
            backing: backing_dimensions(logical, scale_factor, dpr_cap),
        }
    }

    /// Applies a new logical size and pixel ratio.
    ///
    /// Returns the new backing size only when it differs from the current
    /// one, so repeated calls with an unchanged viewport never reallocate.
    pub fn update(
        &mut self,
        logical: LogicalSize<f64>,
        scale_factor: f64,
    ) -> Option<PhysicalSize<u32>> {
        self.logical = logical;
        self.scale_factor = sanitize_scale(scale_factor);
        let backing = backing_dimensions(self.logical, self.scale_factor, self.dpr_cap);
        if backing == self.backing {
            return None;
        }
        self.backing = backing;
        Some(backing)
    }

    /// Same as [`Viewport::update`] for sizes reported in physical pixels.
    pub fn update_physical(
        &mut self,
        size: PhysicalSize<u32>,
        scale_factor: f64,
    ) -> Option<PhysicalSize<u32>> {
        let scale_factor = sanitize_scale(scale_factor);
        self.update(size.to_logical(scale_factor), scale_factor)
    }

    /// Size the layer is displayed at (uncapped pixel ratio).
    pub fn display_size(&self) -> PhysicalSize<u32> {
        let physical = self.logical.to_physical::<f64>(self.scale_factor);
        PhysicalSize::new(
            physical.width.round().max(1.0) as u32,
            physical.height.round().max(1.0) as u32,
        )
    }

    pub fn backing_size(&self) -> PhysicalSize<u32> {
        self.backing
    }

    pub fn effective_ratio(&self) -> f64 {
        self.scale_factor.min(self.dpr_cap)
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Backing-store resolution as fed to the `resolution` uniform.
    pub fn resolution(&self) -> [f32; 2] {
        [self.backing.width as f32, self.backing.height as f32]
    }
}

/// `logical * min(scale_factor, cap)`, rounded and never below one pixel.
pub fn backing_dimensions(
    logical: LogicalSize<f64>,
    scale_factor: f64,
    dpr_cap: f64,
) -> PhysicalSize<u32> {
    let ratio = sanitize_scale(scale_factor).min(sanitize_cap(dpr_cap));
    let width = (logical.width.max(0.0) * ratio).round().max(1.0);
    let height = (logical.height.max(0.0) * ratio).round().max(1.0);
    PhysicalSize::new(width as u32, height as u32)
}

fn sanitize_scale(scale_factor: f64) -> f64 {
    if scale_factor.is_finite() && scale_factor > 0.0 {
        scale_factor
    } else {
        1.0
    }
}

fn sanitize_cap(cap: f64) -> f64 {
    if cap.is_finite() && cap >= 1.0 {
        cap
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caps_dense_displays() {
        let viewport = Viewport::new(LogicalSize::new(1280.0, 720.0), 3.0, 1.5);
        assert_eq!(viewport.backing_size(), PhysicalSize::new(1920, 1080));
        assert_eq!(viewport.display_size(), PhysicalSize::new(3840, 2160));
        assert_eq!(viewport.effective_ratio(), 1.5);
    }

    #[test]
    fn low_density_is_not_upscaled() {
        let viewport = Viewport::new(LogicalSize::new(800.0, 600.0), 1.0, 2.0);
        assert_eq!(viewport.backing_size(), PhysicalSize::new(800, 600));
    }

    #[test]
    fn unchanged_size_short_circuits() {
        let mut viewport = Viewport::new(LogicalSize::new(800.0, 600.0), 2.0, 1.5);
        assert_eq!(viewport.update(LogicalSize::new(800.0, 600.0), 2.0), None);
        assert_eq!(viewport.update(LogicalSize::new(800.0, 600.0), 2.0), None);
        assert_eq!(
            viewport.update(LogicalSize::new(1000.0, 600.0), 2.0),
            Some(PhysicalSize::new(1500, 900))
        );
    }

    #[test]
    fn physical_updates_go_through_logical_space() {
        let mut viewport = Viewport::new(LogicalSize::new(1000.0, 500.0), 2.0, 1.5);
        assert_eq!(viewport.backing_size(), PhysicalSize::new(1500, 750));
        assert_eq!(
            viewport.update_physical(PhysicalSize::new(2000, 1000), 2.0),
            None
        );
        assert_eq!(
            viewport.update_physical(PhysicalSize::new(2000, 1000), f64::NAN),
            Some(PhysicalSize::new(2000, 1000))
        );
        assert_eq!(viewport.scale_factor(), 1.0);
    }

    #[test]
    fn zero_sizes_keep_one_pixel() {
        let viewport = Viewport::new(LogicalSize::new(0.0, 0.0), 1.0, 1.5);
        assert_eq!(viewport.backing_size(), PhysicalSize::new(1, 1));
    }
}
