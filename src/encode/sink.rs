use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{StudioError, StudioResult};
use crate::render::cpu::FrameRGBA;

/// Lowest and highest accepted video bitrate.
pub const BITRATE_RANGE_KBPS: (u32, u32) = (2000, 50000);

pub fn clamp_bitrate_kbps(kbps: u32) -> u32 {
    kbps.clamp(BITRATE_RANGE_KBPS.0, BITRATE_RANGE_KBPS.1)
}

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkConfig {
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
    /// Target video bitrate, already clamped.
    pub bitrate_kbps: u32,
}

impl SinkConfig {
    pub fn square(size: u32, fps: Fps, bitrate_kbps: u32) -> Self {
        Self {
            width: size,
            height: size,
            fps,
            bitrate_kbps: clamp_bitrate_kbps(bitrate_kbps),
        }
    }

    pub fn validate(&self) -> StudioResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(StudioError::validation("sink width/height must be non-zero"));
        }
        if self.fps.num == 0 || self.fps.den == 0 {
            return Err(StudioError::validation("fps must be non-zero"));
        }
        Ok(())
    }

    pub fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// Consumer of captured frames.
///
/// `push_frame` is called in strictly increasing `FrameIndex` order between `begin` and `end`.
pub trait FrameSink: Send {
    fn begin(&mut self, cfg: SinkConfig) -> StudioResult<()>;
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> StudioResult<()>;
    fn end(&mut self) -> StudioResult<()>;
}

/// A sink that produces one encoded media blob.
pub trait MediaEncoder: FrameSink {
    /// Mime type of the produced bytes.
    fn mime(&self) -> &str;
    /// Encoded bytes; valid after `end`.
    fn take_output(&mut self) -> StudioResult<Vec<u8>>;
}

/// Factory for encoders, queried for mime support before recording starts.
pub trait EncoderBackend {
    fn name(&self) -> &str;
    fn supports_mime(&self, mime: &str) -> bool;
    fn create(&self, mime: &str) -> StudioResult<Box<dyn MediaEncoder>>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, FrameRGBA)>,
    ended: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> Option<&SinkConfig> {
        self.cfg.as_ref()
    }

    pub fn frames(&self) -> &[(FrameIndex, FrameRGBA)] {
        &self.frames
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> StudioResult<()> {
        cfg.validate()?;
        self.cfg = Some(cfg);
        self.frames.clear();
        self.ended = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> StudioResult<()> {
        if self.cfg.is_none() {
            return Err(StudioError::encode("in-memory sink not started"));
        }
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> StudioResult<()> {
        self.ended = true;
        Ok(())
    }
}

/// Returns an error unless `idx` is after `last`; updates `last`.
pub(crate) fn check_order(last: &mut Option<FrameIndex>, idx: FrameIndex) -> StudioResult<()> {
    if let Some(prev) = *last
        && idx.0 <= prev.0
    {
        return Err(StudioError::encode("sink received out-of-order frame index"));
    }
    *last = Some(idx);
    Ok(())
}

pub(crate) fn check_frame(cfg: &SinkConfig, frame: &FrameRGBA) -> StudioResult<()> {
    if frame.width != cfg.width || frame.height != cfg.height {
        return Err(StudioError::validation(format!(
            "frame size mismatch: got {}x{}, expected {}x{}",
            frame.width, frame.height, cfg.width, cfg.height
        )));
    }
    if frame.data.len() != cfg.frame_len() {
        return Err(StudioError::validation("frame.data size mismatch with width*height*4"));
    }
    Ok(())
}
