use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::debug;

use crate::engine::{Backend, DrawError, InitError};
use crate::uniforms::AuroraUniforms;
use crate::viewport::Viewport;

use super::context::{AdapterKind, GpuContext};
use super::pipeline::{AuroraPipeline, BlitPipeline, SourceTexture};

/// Accelerated backend: renders the aurora into an offscreen target at the
/// capped backing resolution, then blits it onto the window-sized swapchain.
pub struct GpuState {
    context: GpuContext,
    aurora: AuroraPipeline,
    blit: BlitPipeline,
    target: SourceTexture,
    released: bool,
}

impl GpuState {
    /// Probes for a hardware adapter and builds the program.
    pub fn new<T>(window: &T, viewport: &Viewport) -> Result<Self, InitError>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(window, viewport.display_size(), AdapterKind::Accelerated)?;
        let aurora = AuroraPipeline::new(&context.device)?;
        let blit = BlitPipeline::new(&context.device, context.surface_format)?;
        let target = SourceTexture::new(
            &context.device,
            &blit,
            context.clamp_size(viewport.backing_size()),
            wgpu::TextureUsages::RENDER_ATTACHMENT,
            "aurora backing store",
        );
        Ok(Self {
            context,
            aurora,
            blit,
            target,
            released: false,
        })
    }

    pub fn backing_size(&self) -> winit::dpi::PhysicalSize<u32> {
        self.target.size
    }
}

impl Backend for GpuState {
    fn resize(&mut self, viewport: &Viewport) {
        if self.released {
            return;
        }
        self.context.resize(viewport.display_size());
        let backing = self.context.clamp_size(viewport.backing_size());
        if backing != self.target.size {
            debug!(
                width = backing.width,
                height = backing.height,
                "reallocating aurora backing store"
            );
            self.target = SourceTexture::new(
                &self.context.device,
                &self.blit,
                backing,
                wgpu::TextureUsages::RENDER_ATTACHMENT,
                "aurora backing store",
            );
        }
    }

    fn draw(&mut self, uniforms: &AuroraUniforms) -> Result<(), DrawError> {
        if self.released {
            return Err(DrawError::ContextLost("backend released".into()));
        }
        let frame = self.context.acquire()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.aurora.write_uniforms(&self.context.queue, uniforms);
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("aurora encoder"),
                });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("aurora pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.target.view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.aurora.pipeline);
            pass.set_bind_group(0, &self.aurora.uniform_bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
        self.blit
            .encode(&mut encoder, &view, &self.target.bind_group);

        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();

        if self.context.is_lost() {
            return Err(DrawError::ContextLost("device lost during submit".into()));
        }
        Ok(())
    }

    fn context_lost(&self) -> bool {
        self.context.is_lost()
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.context.destroy();
        debug!("GPU resources released");
    }
}
