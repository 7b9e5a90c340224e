use super::*;
use crate::assets::glyph::GlyphRecord;
use crate::assets::source::BundledTier;
use crate::encode::ffmpeg::{MIME_MP4_H264, MIME_WEBM_VP9};
use crate::render::cpu::FrameRGBA;
use std::sync::{Arc, Mutex};

const BAR: &str = r#"{"strokes": ["M 100 400 L 900 400 L 900 500 L 100 500 Z"], "medians": [[[100, 450], [900, 450]]]}"#;

#[derive(Default)]
struct Recorded {
    cfg: Option<SinkConfig>,
    frames: Vec<FrameRGBA>,
}

struct FakeBackend {
    mimes: Vec<&'static str>,
    recorded: Arc<Mutex<Recorded>>,
}

impl FakeBackend {
    fn new(mimes: &[&'static str]) -> Self {
        Self {
            mimes: mimes.to_vec(),
            recorded: Arc::default(),
        }
    }
}

struct FakeEncoder {
    mime: String,
    recorded: Arc<Mutex<Recorded>>,
    done: bool,
}

impl FrameSink for FakeEncoder {
    fn begin(&mut self, cfg: SinkConfig) -> StudioResult<()> {
        self.recorded.lock().unwrap().cfg = Some(cfg);
        Ok(())
    }

    fn push_frame(&mut self, _idx: FrameIndex, frame: &FrameRGBA) -> StudioResult<()> {
        self.recorded.lock().unwrap().frames.push(frame.clone());
        Ok(())
    }

    fn end(&mut self) -> StudioResult<()> {
        self.done = true;
        Ok(())
    }
}

impl MediaEncoder for FakeEncoder {
    fn mime(&self) -> &str {
        &self.mime
    }

    fn take_output(&mut self) -> StudioResult<Vec<u8>> {
        if !self.done {
            return Err(StudioError::encode("not finished"));
        }
        Ok(b"fake-video".to_vec())
    }
}

impl EncoderBackend for FakeBackend {
    fn name(&self) -> &str {
        "fake"
    }

    fn supports_mime(&self, mime: &str) -> bool {
        self.mimes.contains(&mime)
    }

    fn create(&self, mime: &str) -> StudioResult<Box<dyn MediaEncoder>> {
        Ok(Box::new(FakeEncoder {
            mime: mime.to_string(),
            recorded: Arc::clone(&self.recorded),
            done: false,
        }))
    }
}

fn source() -> GlyphDataSource {
    let mut bundle = BundledTier::new();
    let record: GlyphRecord = serde_json::from_str(BAR).unwrap();
    bundle.insert("一", record);
    GlyphDataSource::new().with_tier(bundle)
}

fn fast_config() -> ExportConfig {
    ExportConfig {
        size_px: 30,
        export_multiplier: 2.0,
        style: WriterStyle {
            speed: 5.0,
            ..WriterStyle::default()
        },
        grid: GridSpec {
            subdivide: false,
            corner_radius: 0.0,
            ..GridSpec::default()
        },
        ..ExportConfig::default()
    }
}

fn expected_frames(total_ms: f64, fps: Fps) -> u64 {
    let stop = total_ms + SETTLE_MS;
    let mut n = 0u64;
    loop {
        let t = fps.frame_to_ms(FrameIndex(n));
        n += 1;
        if t >= stop {
            return n;
        }
    }
}

#[test]
fn default_output_dimension() {
    assert_eq!(ExportConfig::default().output_dimension(), 1260);
    let odd = ExportConfig {
        size_px: 421,
        export_multiplier: 1.5,
        ..ExportConfig::default()
    };
    assert_eq!(odd.output_dimension(), 632);
}

#[test]
fn records_animation_plus_settle() {
    let backend = FakeBackend::new(&[MIME_MP4_H264]);
    let cfg = fast_config();
    let mut src = source();
    let blob = export_character_to_video("一", &cfg, &mut src, &backend).unwrap();

    assert_eq!(blob.mime, MIME_MP4_H264);
    assert!(blob.used_direct_mp4);
    assert_eq!(blob.output_dimension_px, 60);
    assert_eq!(blob.filename_base, "hanzi-一-60px-30fps");
    assert_eq!(blob.bytes, b"fake-video");

    let total = (800.0 + 600.0) / (3.0 * 5.0);
    let fps = Fps::whole(30).unwrap();
    let recorded = backend.recorded.lock().unwrap();
    assert_eq!(recorded.frames.len() as u64, expected_frames(total, fps));
    assert_eq!(blob.frame_count, recorded.frames.len() as u64);

    let cfg = recorded.cfg.as_ref().unwrap();
    assert_eq!((cfg.width, cfg.height, cfg.bitrate_kbps), (60, 60, 12000));

    // stroke centre: outline only at first, stroke color at the end
    let first = recorded.frames[0].pixel(30, 27).unwrap();
    let last = recorded.frames.last().unwrap().pixel(30, 27).unwrap();
    assert!(first[0] > 0xC0, "{first:?}");
    assert!(last[0] < 0x30, "{last:?}");
}

#[test]
fn webm_names_carry_bitrate() {
    let backend = FakeBackend::new(&[MIME_WEBM_VP9]);
    let mut src = source();
    let blob = export_character_to_video("一", &fast_config(), &mut src, &backend).unwrap();
    assert_eq!(blob.mime, MIME_WEBM_VP9);
    assert!(!blob.used_direct_mp4);
    assert_eq!(blob.filename_base, "hanzi-一-60px-30fps-12000kbps");
}

#[test]
fn unsupported_backend_is_reported() {
    let backend = FakeBackend::new(&[]);
    let mut src = source();
    let err = export_character_to_video("一", &fast_config(), &mut src, &backend).unwrap_err();
    assert!(matches!(err, StudioError::EncoderUnsupported { .. }));
}

#[test]
fn zero_dimension_has_no_capture_surface() {
    let backend = FakeBackend::new(&[MIME_MP4_H264]);
    let cfg = ExportConfig {
        export_multiplier: 0.0,
        ..fast_config()
    };
    let mut src = source();
    let err = export_character_to_video("一", &cfg, &mut src, &backend).unwrap_err();
    assert!(matches!(err, StudioError::NoCaptureSurface { character, .. } if character == "一"));
}

#[test]
fn missing_glyph_propagates() {
    let backend = FakeBackend::new(&[MIME_MP4_H264]);
    let mut src = source();
    let err = export_character_to_video("龘", &fast_config(), &mut src, &backend).unwrap_err();
    assert!(matches!(err, StudioError::GlyphNotFound { .. }));
    assert!(backend.recorded.lock().unwrap().frames.is_empty());
}

#[test]
fn gif_export_produces_gif_bytes() {
    let cfg = ExportConfig {
        export_multiplier: 1.0,
        fps: 10,
        ..fast_config()
    };
    let mut src = source();
    let blob = export_character_to_gif("一", &cfg, &mut src).unwrap();
    assert_eq!(blob.mime, "image/gif");
    assert!(blob.bytes.starts_with(b"GIF89a"));
    assert_eq!(blob.filename_base, "hanzi-一-30px-10fps");
}
