use crate::assets::glyph::GlyphData;
use crate::assets::source::GlyphDataSource;
use crate::encode::ffmpeg::{Container, is_mp4_mime, negotiate_mime};
use crate::encode::gif::{GifBackend, MIME_GIF};
use crate::encode::sink::{EncoderBackend, FrameSink, MediaEncoder, SinkConfig};
use crate::foundation::core::{Affine, Fps, FrameIndex};
use crate::foundation::error::{StudioError, StudioResult};
use crate::geometry::grid::GridSpec;
use crate::geometry::transform::glyph_transform;
use crate::render::compositor::{CaptureToken, FrameCompositor, LayerSource};
use crate::render::cpu::{CpuSurface, GlyphPaint, paint_glyph};
use crate::render::strokes::{StrokeTimeline, WriterStyle};

use super::naming::video_filename_base;

/// Frames kept after the last stroke finishes.
pub const SETTLE_MS: f64 = 120.0;

/// Settings for one video export.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Stage size the export is scaled from.
    pub size_px: u32,
    pub export_multiplier: f64,
    pub fps: u32,
    pub bitrate_kbps: u32,
    pub grid: GridSpec,
    pub style: WriterStyle,
    pub container: Container,
    pub settle_ms: f64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            size_px: 420,
            export_multiplier: 3.0,
            fps: 30,
            bitrate_kbps: 12000,
            grid: GridSpec::default(),
            style: WriterStyle::default(),
            container: Container::Mp4,
            settle_ms: SETTLE_MS,
        }
    }
}

impl ExportConfig {
    /// `round(size_px × export_multiplier)`, zero for non-finite or negative multipliers.
    pub fn output_dimension(&self) -> u32 {
        let d = f64::from(self.size_px) * self.export_multiplier;
        if d.is_finite() && d > 0.0 {
            d.round().min(f64::from(u32::MAX)) as u32
        } else {
            0
        }
    }
}

/// An encoded clip.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoBlob {
    pub bytes: Vec<u8>,
    pub mime: String,
    pub output_dimension_px: u32,
    /// `true` when the encoder produced MP4 directly.
    pub used_direct_mp4: bool,
    pub filename_base: String,
    pub frame_count: u64,
    pub duration_ms: f64,
}

/// Glyph layer that plays one animation and stops the capture after the settle delay.
struct AnimatedGlyphLayer<'a> {
    surface: CpuSurface,
    glyph: &'a GlyphData,
    timeline: StrokeTimeline,
    paint: GlyphPaint,
    transform: Affine,
    stop_at_ms: f64,
    token: CaptureToken,
}

impl LayerSource for AnimatedGlyphLayer<'_> {
    fn layer_at(&mut self, _idx: FrameIndex, t_ms: f64) -> StudioResult<&[u8]> {
        let frame = self.timeline.frame_at(t_ms);
        if t_ms >= self.stop_at_ms {
            self.token.stop();
        }
        let glyph = self.glyph;
        let paint = &self.paint;
        let transform = self.transform;
        self.surface.draw(|ctx| {
            paint_glyph(ctx, glyph, transform, paint, &frame);
            Ok(())
        })
    }
}

/// Captures the stroke animation of `character` into the best video format `backend` offers.
#[tracing::instrument(skip(cfg, source, backend), fields(backend = backend.name()))]
pub fn export_character_to_video(
    character: &str,
    cfg: &ExportConfig,
    source: &mut GlyphDataSource,
    backend: &dyn EncoderBackend,
) -> StudioResult<VideoBlob> {
    let glyph = source.fetch_glyph(character)?;
    let mime = negotiate_mime(backend, cfg.container)?;
    capture(&glyph, cfg, backend, mime)
}

/// Captures the stroke animation of `character` as a looping GIF.
#[tracing::instrument(skip(cfg, source))]
pub fn export_character_to_gif(
    character: &str,
    cfg: &ExportConfig,
    source: &mut GlyphDataSource,
) -> StudioResult<VideoBlob> {
    let glyph = source.fetch_glyph(character)?;
    let bg = cfg.grid.colors.background;
    let backend = GifBackend::new().with_background([bg.r, bg.g, bg.b]);
    capture(&glyph, cfg, &backend, MIME_GIF)
}

fn capture(
    glyph: &GlyphData,
    cfg: &ExportConfig,
    backend: &dyn EncoderBackend,
    mime: &str,
) -> StudioResult<VideoBlob> {
    let character = glyph.character.as_str();
    let dim = cfg.output_dimension();
    if dim == 0 {
        return Err(StudioError::no_capture_surface(
            character,
            format!(
                "output dimension is zero (size {} × multiplier {})",
                cfg.size_px, cfg.export_multiplier
            ),
        ));
    }
    let fps = Fps::whole(cfg.fps)?;
    let style = cfg.style.sanitized();

    let mut compositor = FrameCompositor::new(dim, &cfg.grid)
        .map_err(|e| StudioError::no_capture_surface(character, e.to_string()))?;
    let token = CaptureToken::new();
    let timeline = StrokeTimeline::new(glyph, style.speed, style.delay_between_strokes_ms);
    let settle = if cfg.settle_ms.is_finite() {
        cfg.settle_ms.max(0.0)
    } else {
        SETTLE_MS
    };
    let mut layer = AnimatedGlyphLayer {
        surface: CpuSurface::square(dim)
            .map_err(|e| StudioError::no_capture_surface(character, e.to_string()))?,
        glyph,
        stop_at_ms: timeline.total_ms() + settle,
        timeline,
        paint: GlyphPaint {
            stroke_color: style.stroke_color,
            radical_color: Some(style.radical_color),
            outline_color: style.outline_color,
            show_outline: style.show_outline,
        },
        transform: glyph_transform(f64::from(dim)),
        token: token.clone(),
    };

    let mut encoder = backend.create(mime).map_err(|e| with_character(e, character))?;
    let sink_cfg = SinkConfig::square(dim, fps, cfg.bitrate_kbps);
    encoder
        .begin(sink_cfg)
        .map_err(|e| with_character(e, character))?;
    let frames = compositor
        .run(&token, fps, &mut layer, encoder.as_mut() as &mut dyn FrameSink)
        .map_err(|e| with_character(e, character))?;
    let bytes = finish(encoder.as_mut()).map_err(|e| with_character(e, character))?;

    let blob = VideoBlob {
        mime: encoder.mime().to_string(),
        output_dimension_px: dim,
        used_direct_mp4: is_mp4_mime(encoder.mime()),
        filename_base: video_filename_base(character, dim, cfg.fps, cfg.bitrate_kbps, mime),
        frame_count: frames,
        duration_ms: frames as f64 * fps.frame_duration_ms(),
        bytes,
    };
    tracing::info!(
        character,
        dim,
        frames,
        mime = %blob.mime,
        bytes = blob.bytes.len(),
        "export finished"
    );
    Ok(blob)
}

fn finish(encoder: &mut dyn MediaEncoder) -> StudioResult<Vec<u8>> {
    encoder.end()?;
    let bytes = encoder.take_output()?;
    if bytes.is_empty() {
        return Err(StudioError::encode("encoder produced an empty file"));
    }
    Ok(bytes)
}

/// Prefixes encoder failures with the character being exported.
fn with_character(err: StudioError, character: &str) -> StudioError {
    match err {
        StudioError::Encode(msg) => StudioError::Encode(format!("'{character}': {msg}")),
        StudioError::EncoderUnsupported { requested, detail } => StudioError::EncoderUnsupported {
            requested,
            detail: format!("'{character}': {detail}"),
        },
        StudioError::Render(msg) => StudioError::no_capture_surface(character, msg),
        other => other,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/video.rs"]
mod tests;
