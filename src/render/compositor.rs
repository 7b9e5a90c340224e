use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::encode::sink::FrameSink;
use crate::foundation::core::{Affine, Fps, FrameIndex};
use crate::foundation::error::StudioResult;
use crate::geometry::grid::GridSpec;
use crate::render::composite::over_in_place;
use crate::render::cpu::{CpuSurface, FrameRGBA, paint_grid};

/// Lifecycle token for a capture loop.
///
/// Clones share state; `stop` is observed at the next tick boundary.
#[derive(Clone, Debug, Default)]
pub struct CaptureToken {
    stopped: Arc<AtomicBool>,
}

impl CaptureToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Supplies the glyph layer for each captured tick.
pub trait LayerSource {
    /// Premultiplied RGBA8 glyph layer at `t_ms`; must match the compositor size.
    fn layer_at(&mut self, idx: FrameIndex, t_ms: f64) -> StudioResult<&[u8]>;
}

/// Paints background + grid and the current glyph layer into the capture frame.
pub struct FrameCompositor {
    size: u32,
    grid_layer: Vec<u8>,
    frame: FrameRGBA,
}

impl FrameCompositor {
    pub fn new(size: u32, grid: &GridSpec) -> StudioResult<Self> {
        let mut surface = CpuSurface::square(size)?;
        let grid_layer = surface
            .draw(|ctx| {
                paint_grid(ctx, f64::from(size), grid, Affine::IDENTITY);
                Ok(())
            })?
            .to_vec();
        Ok(Self {
            size,
            grid_layer,
            frame: FrameRGBA::transparent(size, size),
        })
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Repaints the grid layer, then draws `glyph_layer` over it.
    pub fn compose(&mut self, glyph_layer: &[u8]) -> StudioResult<&FrameRGBA> {
        self.frame.data.copy_from_slice(&self.grid_layer);
        over_in_place(&mut self.frame.data, glyph_layer, 1.0)?;
        Ok(&self.frame)
    }

    /// Ticks at `fps` until `token` is stopped, pushing one composed frame per tick.
    ///
    /// Returns the number of frames pushed. The token is checked before each tick, so a stop
    /// requested while producing tick `n` still delivers tick `n`.
    pub fn run(
        &mut self,
        token: &CaptureToken,
        fps: Fps,
        source: &mut dyn LayerSource,
        sink: &mut dyn FrameSink,
    ) -> StudioResult<u64> {
        let mut idx = 0u64;
        while !token.is_stopped() {
            let fi = FrameIndex(idx);
            let layer = source.layer_at(fi, fps.frame_to_ms(fi))?;
            let frame = self.compose(layer)?;
            sink.push_frame(fi, frame)?;
            idx += 1;
        }
        tracing::debug!(frames = idx, "capture loop stopped");
        Ok(idx)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
