use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::dpi::PhysicalSize;

use crate::engine::InitError;
use crate::fallback::FallbackLayer;

use super::context::{AdapterKind, GpuContext};
use super::pipeline::{BlitPipeline, SourceTexture};

/// Widest raster we upload; the blit's linear filter covers the rest and the
/// gradients have no detail to lose.
const MAX_RASTER_WIDTH: u32 = 960;

/// Shows a [`FallbackLayer`] on a software adapter.
///
/// Nothing animates: the layer is rasterised on the CPU and re-presented only
/// when the window or the palette changes.
pub struct StaticPresenter {
    context: GpuContext,
    blit: BlitPipeline,
    source: Option<SourceTexture>,
    presented: Option<FallbackLayer>,
}

impl StaticPresenter {
    pub fn new<T>(window: &T, size: PhysicalSize<u32>) -> Result<Self, InitError>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(window, size, AdapterKind::Software)?;
        let blit = BlitPipeline::new(&context.device, context.surface_format)?;
        Ok(Self {
            context,
            blit,
            source: None,
            presented: None,
        })
    }

    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        self.context.resize(size);
        self.presented = None;
    }

    /// Presents `layer`, skipping the upload when it is already on screen.
    pub fn present(&mut self, layer: &FallbackLayer) -> anyhow::Result<()> {
        let raster_size = raster_size(PhysicalSize::new(
            self.context.config.width,
            self.context.config.height,
        ));
        if self.presented.as_ref() != Some(layer) {
            self.upload(layer, raster_size);
        }

        let frame = self
            .context
            .acquire()
            .map_err(|err| anyhow::anyhow!("static background not presented: {err}"))?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let Some(source) = self.source.as_ref() else {
            return Ok(());
        };
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("static background encoder"),
                });
        self.blit.encode(&mut encoder, &view, &source.bind_group);
        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        self.presented = Some(*layer);
        Ok(())
    }

    fn upload(&mut self, layer: &FallbackLayer, size: PhysicalSize<u32>) {
        let reuse = self.source.as_ref().is_some_and(|source| source.size == size);
        if !reuse {
            self.source = Some(SourceTexture::new(
                &self.context.device,
                &self.blit,
                size,
                wgpu::TextureUsages::COPY_DST,
                "static background",
            ));
        }
        let Some(source) = self.source.as_ref() else {
            return;
        };
        let raster = layer.rasterize(size.width, size.height);
        self.context.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &source.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            raster.as_raw(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * size.width),
                rows_per_image: Some(size.height),
            },
            wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
        );
    }
}

/// Downscales `display` to at most [`MAX_RASTER_WIDTH`] wide, keeping aspect.
pub(crate) fn raster_size(display: PhysicalSize<u32>) -> PhysicalSize<u32> {
    let width = display.width.max(1);
    let height = display.height.max(1);
    if width <= MAX_RASTER_WIDTH {
        return PhysicalSize::new(width, height);
    }
    let scaled = (height as u64 * MAX_RASTER_WIDTH as u64 / width as u64).max(1) as u32;
    PhysicalSize::new(MAX_RASTER_WIDTH, scaled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raster_keeps_aspect_when_downscaling() {
        assert_eq!(
            raster_size(PhysicalSize::new(3840, 2160)),
            PhysicalSize::new(960, 540)
        );
        assert_eq!(
            raster_size(PhysicalSize::new(640, 480)),
            PhysicalSize::new(640, 480)
        );
        assert_eq!(raster_size(PhysicalSize::new(0, 0)), PhysicalSize::new(1, 1));
    }
}
