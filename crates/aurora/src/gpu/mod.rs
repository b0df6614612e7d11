//! wgpu side of the renderer.
//!
//! - `context` owns instance/adapter/device/surface wiring, device-loss
//!   tracking and swapchain reconfiguration.
//! - `pipeline` builds the aurora and blit pipelines, reporting compile and
//!   link failures as [`crate::compile::ProgramError`].
//! - `state` is the accelerated [`crate::engine::Backend`].
//! - `presenter` shows the static fallback layer on a software adapter.

mod context;
mod pipeline;
mod presenter;
mod state;

pub use presenter::StaticPresenter;
pub use state::GpuState;
