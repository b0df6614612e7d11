use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::dpi::PhysicalSize;

use crate::engine::{DrawError, InitError};

/// Which adapter class to ask wgpu for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AdapterKind {
    /// High-performance hardware adapter.
    Accelerated,
    /// CPU rasteriser, used only for the static background.
    Software,
}

pub(crate) struct GpuContext {
    _instance: wgpu::Instance,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub surface_format: wgpu::TextureFormat,
    pub max_dimension: u32,
    lost: Arc<AtomicBool>,
}

impl GpuContext {
    /// Acquires a device and configures a surface for `target`.
    ///
    /// The surface must not outlive `target`; callers keep both in the same
    /// owner and drop the context first.
    pub(crate) fn new<T>(
        target: &T,
        size: PhysicalSize<u32>,
        kind: AdapterKind,
    ) -> Result<Self, InitError>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
            backend_options: wgpu::BackendOptions::default(),
        });

        let window_handle = target
            .window_handle()
            .map_err(|err| unavailable(format!("failed to acquire window handle: {err}")))?;
        let display_handle = target
            .display_handle()
            .map_err(|err| unavailable(format!("failed to acquire display handle: {err}")))?;

        let surface = unsafe {
            instance.create_surface_unsafe(wgpu::SurfaceTargetUnsafe::RawHandle {
                raw_display_handle: display_handle.as_raw(),
                raw_window_handle: window_handle.as_raw(),
            })
        }
        .map_err(|err| unavailable(format!("failed to create rendering surface: {err}")))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: match kind {
                AdapterKind::Accelerated => wgpu::PowerPreference::HighPerformance,
                AdapterKind::Software => wgpu::PowerPreference::LowPower,
            },
            compatible_surface: Some(&surface),
            force_fallback_adapter: matches!(kind, AdapterKind::Software),
        }))
        .map_err(|err| unavailable(format!("no suitable {kind:?} adapter: {err}")))?;

        let info = adapter.get_info();
        tracing::debug!(
            name = %info.name,
            backend = ?info.backend,
            device_type = ?info.device_type,
            ?kind,
            "selected GPU adapter"
        );
        if kind == AdapterKind::Accelerated && info.device_type == wgpu::DeviceType::Cpu {
            return Err(unavailable(format!(
                "only a software adapter is available ({})",
                info.name
            )));
        }

        let surface_caps = surface.get_capabilities(&adapter);
        // The shader applies its own gamma curve, so write values unencoded.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|format| !format.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| unavailable("surface is not supported by the adapter".into()))?;
        if surface_format.is_srgb() {
            tracing::warn!(
                ?surface_format,
                "no non-sRGB surface format available; colours will be re-encoded"
            );
        }
        let alpha_mode = surface_caps
            .alpha_modes
            .iter()
            .copied()
            .find(|mode| *mode == wgpu::CompositeAlphaMode::Opaque)
            .or_else(|| surface_caps.alpha_modes.first().copied())
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let present_mode = if surface_caps
            .present_modes
            .contains(&wgpu::PresentMode::Fifo)
        {
            wgpu::PresentMode::Fifo
        } else {
            wgpu::PresentMode::AutoVsync
        };

        let limits = adapter.limits();
        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("aurora device"),
            required_features: wgpu::Features::empty(),
            required_limits: limits.clone(),
            memory_hints: wgpu::MemoryHints::MemoryUsage,
            trace: wgpu::Trace::default(),
        }))
        .map_err(|err| unavailable(format!("failed to create GPU device: {err}")))?;

        let lost = Arc::new(AtomicBool::new(false));
        let lost_flag = Arc::clone(&lost);
        device.set_device_lost_callback(move |reason, message| {
            // `Destroyed` is our own teardown, not a loss.
            if reason != wgpu::DeviceLostReason::Destroyed {
                tracing::warn!(?reason, %message, "GPU device lost");
                lost_flag.store(true, Ordering::Release);
            }
        });
        let oom_flag = Arc::clone(&lost);
        device.on_uncaptured_error(Box::new(move |err| match err {
            wgpu::Error::OutOfMemory { .. } => {
                tracing::warn!(error = %err, "GPU out of memory");
                oom_flag.store(true, Ordering::Release);
            }
            other => tracing::error!(error = %other, "uncaptured GPU error"),
        }));

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self {
            _instance: instance,
            surface,
            device,
            queue,
            config,
            surface_format,
            max_dimension: limits.max_texture_dimension_2d,
            lost,
        })
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        let width = new_size.width.min(self.max_dimension);
        let height = new_size.height.min(self.max_dimension);
        if width == self.config.width && height == self.config.height {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
    }

    /// Clamps a texture size to what the device can allocate.
    pub(crate) fn clamp_size(&self, size: PhysicalSize<u32>) -> PhysicalSize<u32> {
        PhysicalSize::new(
            size.width.clamp(1, self.max_dimension),
            size.height.clamp(1, self.max_dimension),
        )
    }

    /// Acquires the next swapchain image, mapping surface errors onto the
    /// render loop's recoverable/lost split.
    pub(crate) fn acquire(&mut self) -> Result<wgpu::SurfaceTexture, DrawError> {
        match self.surface.get_current_texture() {
            Ok(frame) => Ok(frame),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                Err(DrawError::Skipped("surface reconfigured".into()))
            }
            Err(wgpu::SurfaceError::Timeout) => {
                Err(DrawError::Skipped("timed out acquiring frame".into()))
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                self.lost.store(true, Ordering::Release);
                Err(DrawError::ContextLost("out of memory acquiring frame".into()))
            }
            Err(other) => Err(DrawError::Skipped(other.to_string())),
        }
    }

    pub(crate) fn is_lost(&self) -> bool {
        self.lost.load(Ordering::Acquire)
    }

    /// Requests immediate release of the device's resources.
    pub(crate) fn destroy(&self) {
        self.device.destroy();
    }
}

fn unavailable(message: String) -> InitError {
    InitError::ContextUnavailable(message)
}
