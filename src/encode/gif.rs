use std::io::Write;
use std::sync::{Arc, Mutex};

use image::codecs::gif::{GifEncoder as ImageGifEncoder, Repeat};
use image::{Delay, Frame, RgbaImage};

use crate::encode::sink::{
    EncoderBackend, FrameSink, MediaEncoder, SinkConfig, check_frame, check_order,
};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{StudioError, StudioResult};
use crate::render::composite::flatten_premul_over_bg;
use crate::render::cpu::FrameRGBA;

pub const MIME_GIF: &str = "image/gif";

/// Quantizer speed passed to the GIF encoder (1 = best, 30 = fastest).
const GIF_SPEED: i32 = 10;

/// In-process GIF backend built on the `image` crate.
#[derive(Clone, Debug)]
pub struct GifBackend {
    background: [u8; 3],
}

impl Default for GifBackend {
    fn default() -> Self {
        Self {
            background: [255, 255, 255],
        }
    }
}

impl GifBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_background(mut self, rgb: [u8; 3]) -> Self {
        self.background = rgb;
        self
    }
}

impl EncoderBackend for GifBackend {
    fn name(&self) -> &str {
        "gif"
    }

    fn supports_mime(&self, mime: &str) -> bool {
        mime == MIME_GIF
    }

    fn create(&self, mime: &str) -> StudioResult<Box<dyn MediaEncoder>> {
        if !self.supports_mime(mime) {
            return Err(StudioError::encoder_unsupported(
                mime,
                "gif backend only produces image/gif",
            ));
        }
        Ok(Box::new(GifEncoder::new(self.background)))
    }
}

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| std::io::Error::other("gif buffer lock poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Looping animated GIF encoder; frames are flattened onto an opaque background.
pub struct GifEncoder {
    background: [u8; 3],
    buf: SharedBuf,
    inner: Option<ImageGifEncoder<SharedBuf>>,
    delay: Option<Delay>,
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
    output: Option<Vec<u8>>,
}

impl GifEncoder {
    pub fn new(background: [u8; 3]) -> Self {
        Self {
            background,
            buf: SharedBuf::default(),
            inner: None,
            delay: None,
            cfg: None,
            last_idx: None,
            output: None,
        }
    }
}

impl FrameSink for GifEncoder {
    fn begin(&mut self, cfg: SinkConfig) -> StudioResult<()> {
        cfg.validate()?;
        self.buf = SharedBuf::default();
        let mut inner = ImageGifEncoder::new_with_speed(self.buf.clone(), GIF_SPEED);
        inner
            .set_repeat(Repeat::Infinite)
            .map_err(|e| StudioError::encode(format!("gif setup failed: {e}")))?;
        self.delay = Some(Delay::from_numer_denom_ms(
            1000 * cfg.fps.den,
            cfg.fps.num,
        ));
        self.inner = Some(inner);
        self.cfg = Some(cfg);
        self.last_idx = None;
        self.output = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> StudioResult<()> {
        let (Some(cfg), Some(inner), Some(delay)) =
            (self.cfg.as_ref(), self.inner.as_mut(), self.delay)
        else {
            return Err(StudioError::encode("gif encoder not started"));
        };
        check_order(&mut self.last_idx, idx)?;
        check_frame(cfg, frame)?;

        let mut opaque = vec![0u8; frame.data.len()];
        flatten_premul_over_bg(&mut opaque, &frame.data, self.background)?;
        let img = RgbaImage::from_raw(frame.width, frame.height, opaque)
            .ok_or_else(|| StudioError::encode("gif frame buffer size mismatch"))?;
        inner
            .encode_frame(Frame::from_parts(img, 0, 0, delay))
            .map_err(|e| StudioError::encode(format!("gif frame encode failed: {e}")))?;
        Ok(())
    }

    fn end(&mut self) -> StudioResult<()> {
        let inner = self
            .inner
            .take()
            .ok_or_else(|| StudioError::encode("gif encoder not started"))?;
        // Dropping the encoder writes the trailer.
        drop(inner);
        let bytes = std::mem::take(
            &mut *self
                .buf
                .0
                .lock()
                .map_err(|_| StudioError::encode("gif buffer lock poisoned"))?,
        );
        self.output = Some(bytes);
        self.cfg = None;
        Ok(())
    }
}

impl MediaEncoder for GifEncoder {
    fn mime(&self) -> &str {
        MIME_GIF
    }

    fn take_output(&mut self) -> StudioResult<Vec<u8>> {
        self.output
            .take()
            .ok_or_else(|| StudioError::encode("gif encoder produced no output yet"))
    }
}
