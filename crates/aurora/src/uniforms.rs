use bytemuck::{Pod, Zeroable};

use crate::color::Palette;

/// CPU mirror of the `AuroraParams` std140 block in the fragment shader.
///
/// Colours travel as `vec4` so the layout never depends on how a driver pads
/// trailing `vec3` members.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct AuroraUniforms {
    pub resolution: [f32; 2],
    pub time: f32,
    pub speed: f32,
    /// Pointer in `[0, 1]²`, bottom-left origin.
    pub pointer: [f32; 2],
    pub _padding: [f32; 2],
    pub primary: [f32; 4],
    pub secondary: [f32; 4],
    pub base: [f32; 4],
}

impl AuroraUniforms {
    pub fn new(
        resolution: [f32; 2],
        time: f32,
        pointer: [f32; 2],
        speed: f32,
        palette: &Palette,
    ) -> Self {
        Self {
            resolution,
            time,
            speed,
            pointer,
            _padding: [0.0; 2],
            primary: palette.primary.to_vec4(),
            secondary: palette.secondary.to_vec4(),
            base: palette.base.to_vec4(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    /// Aspect ratio of the backing store. The height is floored at one
    /// pixel, matching the fragment shader.
    pub fn aspect(&self) -> f32 {
        self.resolution[0] / self.resolution[1].max(1.0)
    }
}

impl Default for AuroraUniforms {
    fn default() -> Self {
        Self::new([1.0, 1.0], 0.0, [0.5, 0.5], 1.0, &Palette::AURORA)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_std140_block() {
        assert_eq!(std::mem::size_of::<AuroraUniforms>(), 80);
        assert_eq!(std::mem::offset_of!(AuroraUniforms, pointer), 16);
        assert_eq!(std::mem::offset_of!(AuroraUniforms, primary), 32);
        assert_eq!(std::mem::offset_of!(AuroraUniforms, secondary), 48);
        assert_eq!(std::mem::offset_of!(AuroraUniforms, base), 64);
    }

    #[test]
    fn colours_are_opaque_vec4() {
        let uniforms = AuroraUniforms::default();
        assert_eq!(uniforms.primary[3], 1.0);
        assert_eq!(uniforms.base[..3], Palette::AURORA.base.to_array());
    }
}
