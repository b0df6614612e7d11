//! Animated aurora background renderer.
//!
//! The crate draws a single fullscreen procedural "aurora" layer: soft
//! horizontal colour bands warped by time and by the pointer, eased between
//! palettes as the host switches sections, with a static gradient stand-in
//! when no accelerated context is available.
//!
//! ```text
//!   host events ──▶ AuroraRenderer::{pointer_moved, resize, set_palette}
//!                          │
//!   display tick ──▶ AuroraRenderer::step ──▶ Animator::step ──▶ AuroraUniforms
//!                          │                                         │
//!                          │                          Backend::draw ◀┘ (GpuState)
//!                          └─▶ FallbackLayer (CSS string / raster) on loss
//! ```
//!
//! [`engine::AuroraRenderer`] is independent of wgpu; [`gpu::GpuState`] is the
//! accelerated backend and [`window::run_window`] the winit host. The CPU
//! mirror in [`shading`] shares every pattern constant with the GLSL source.

pub mod animator;
pub mod color;
pub mod compile;
pub mod cycle;
pub mod engine;
pub mod fallback;
pub mod gpu;
pub mod input;
pub mod runtime;
pub mod shading;
pub mod uniforms;
pub mod viewport;
pub mod window;

pub use animator::{Animator, DEFAULT_SMOOTHING};
pub use color::{parse_rgb, Palette, PaletteOverride, Rgb};
pub use compile::ProgramError;
pub use cycle::{SectionCue, SectionCycle};
pub use engine::{
    AuroraConfig, AuroraRenderer, Backend, DrawError, FrameOutcome, InitError, Lifecycle,
    DEFAULT_SPEED,
};
pub use fallback::FallbackLayer;
pub use input::{PointerTracker, SurfaceRect, DEFAULT_POINTER_THROTTLE};
pub use runtime::{CancelToken, FixedTimeSource, FrameGate, SystemTimeSource, TimeSource};
pub use shading::render_still;
pub use uniforms::AuroraUniforms;
pub use viewport::{Viewport, DEFAULT_DPR_CAP};
pub use window::{run_window, WindowConfig};
