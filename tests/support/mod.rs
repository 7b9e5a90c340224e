#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use hanzi_studio::assets::source::{BundledTier, StaticDirTier};
use hanzi_studio::{
    EncoderBackend, FrameIndex, FrameRGBA, FrameSink, GlyphDataSource, MediaEncoder, SinkConfig,
    StudioResult,
};

pub fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data")
}

/// Bundle file (佛, 一) followed by the static directory (二).
pub fn fixture_source() -> GlyphDataSource {
    hanzi_studio::logging::init_test_logging();
    let bundle = BundledTier::from_json_path(&data_dir().join("glyphs.json")).unwrap();
    GlyphDataSource::new()
        .with_tier(bundle)
        .with_tier(StaticDirTier::new(data_dir().join("static")))
}

#[derive(Default)]
pub struct Recorded {
    pub config: Option<SinkConfig>,
    pub indices: Vec<u64>,
    /// `(width, height)` of every pushed frame.
    pub sizes: Vec<(u32, u32)>,
    pub last: Option<FrameRGBA>,
}

/// Encoder backend that keeps every frame in memory.
pub struct RecordingBackend {
    pub mimes: Vec<&'static str>,
    pub recorded: Arc<Mutex<Recorded>>,
}

impl RecordingBackend {
    pub fn new(mimes: &[&'static str]) -> Self {
        Self {
            mimes: mimes.to_vec(),
            recorded: Arc::default(),
        }
    }
}

struct RecordingEncoder {
    mime: String,
    recorded: Arc<Mutex<Recorded>>,
}

impl FrameSink for RecordingEncoder {
    fn begin(&mut self, cfg: SinkConfig) -> StudioResult<()> {
        self.recorded.lock().unwrap().config = Some(cfg);
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> StudioResult<()> {
        let mut rec = self.recorded.lock().unwrap();
        rec.indices.push(idx.0);
        rec.sizes.push((frame.width, frame.height));
        rec.last = Some(frame.clone());
        Ok(())
    }

    fn end(&mut self) -> StudioResult<()> {
        Ok(())
    }
}

impl MediaEncoder for RecordingEncoder {
    fn mime(&self) -> &str {
        &self.mime
    }

    fn take_output(&mut self) -> StudioResult<Vec<u8>> {
        let n = self.recorded.lock().unwrap().indices.len();
        Ok(format!("{}:{n}", self.mime).into_bytes())
    }
}

impl EncoderBackend for RecordingBackend {
    fn name(&self) -> &str {
        "recording"
    }

    fn supports_mime(&self, mime: &str) -> bool {
        self.mimes.contains(&mime)
    }

    fn create(&self, mime: &str) -> StudioResult<Box<dyn MediaEncoder>> {
        Ok(Box::new(RecordingEncoder {
            mime: mime.to_string(),
            recorded: Arc::clone(&self.recorded),
        }))
    }
}
