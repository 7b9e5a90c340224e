use crate::encode::sink::{
    EncoderBackend, FrameSink, MediaEncoder, SinkConfig, check_frame, check_order,
};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{StudioError, StudioResult};
use crate::render::composite::flatten_premul_over_bg;
use crate::render::cpu::FrameRGBA;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};

pub const MIME_MP4_H264: &str = "video/mp4;codecs=h264";
pub const MIME_MP4: &str = "video/mp4";
pub const MIME_WEBM_VP9: &str = "video/webm;codecs=vp9";
pub const MIME_WEBM: &str = "video/webm";

/// Container preference order used when negotiating with a backend.
pub const MIME_PREFERENCE: [&str; 4] = [MIME_MP4_H264, MIME_MP4, MIME_WEBM_VP9, MIME_WEBM];

/// Video container a caller can ask to try first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    #[default]
    Mp4,
    Webm,
}

/// Picks the first mime in preference order the backend supports.
///
/// With `prefer = Webm` the two WebM entries move to the front.
pub fn negotiate_mime(
    backend: &dyn EncoderBackend,
    prefer: Container,
) -> StudioResult<&'static str> {
    let mut order = MIME_PREFERENCE.to_vec();
    if prefer == Container::Webm {
        order.rotate_left(2);
    }
    order
        .into_iter()
        .find(|m| backend.supports_mime(m))
        .ok_or_else(|| {
            StudioError::encoder_unsupported(
                backend.name().to_string(),
                format!("none of {} is supported", MIME_PREFERENCE.join(", ")),
            )
        })
}

pub fn is_mp4_mime(mime: &str) -> bool {
    mime.starts_with(MIME_MP4)
}

/// File extension for a mime produced by one of the crate's encoders.
pub fn mime_extension(mime: &str) -> &'static str {
    if is_mp4_mime(mime) {
        "mp4"
    } else if mime.starts_with(MIME_WEBM) {
        "webm"
    } else if mime == "image/gif" {
        "gif"
    } else {
        "bin"
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum VideoCodec {
    H264,
    Vp9,
    Vp8,
}

impl VideoCodec {
    fn encoder_name(self) -> &'static str {
        match self {
            Self::H264 => "libx264",
            Self::Vp9 => "libvpx-vp9",
            Self::Vp8 => "libvpx",
        }
    }

    fn container(self) -> &'static str {
        match self {
            Self::H264 => "mp4",
            Self::Vp9 | Self::Vp8 => "webm",
        }
    }
}

/// Encoder backend driving the system `ffmpeg` binary.
#[derive(Clone, Debug)]
pub struct FfmpegBackend {
    encoders: Vec<String>,
    background: [u8; 3],
}

impl FfmpegBackend {
    /// Queries `ffmpeg -encoders` for the video encoders this backend can use.
    pub fn probe() -> StudioResult<Self> {
        let out = Command::new("ffmpeg")
            .args(["-hide_banner", "-encoders"])
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(|e| {
                StudioError::encoder_unsupported(
                    "ffmpeg",
                    format!("failed to run ffmpeg (is it installed and on PATH?): {e}"),
                )
            })?;
        if !out.status.success() {
            return Err(StudioError::encoder_unsupported(
                "ffmpeg",
                format!("ffmpeg -encoders exited with status {}", out.status),
            ));
        }
        let listing = String::from_utf8_lossy(&out.stdout);
        let encoders = parse_encoder_list(&listing);
        tracing::debug!(?encoders, "probed ffmpeg encoders");
        Ok(Self::with_encoders(encoders))
    }

    /// Backend assuming exactly `encoders` are available.
    pub fn with_encoders<I, S>(encoders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            encoders: encoders.into_iter().map(Into::into).collect(),
            background: [255, 255, 255],
        }
    }

    /// Color that transparent frame pixels are flattened onto.
    pub fn with_background(mut self, rgb: [u8; 3]) -> Self {
        self.background = rgb;
        self
    }

    pub fn encoders(&self) -> &[String] {
        &self.encoders
    }

    fn has(&self, name: &str) -> bool {
        self.encoders.iter().any(|e| e == name)
    }

    fn codec_for(&self, mime: &str) -> Option<VideoCodec> {
        match mime {
            MIME_MP4_H264 | MIME_MP4 => self.has("libx264").then_some(VideoCodec::H264),
            MIME_WEBM_VP9 => self.has("libvpx-vp9").then_some(VideoCodec::Vp9),
            MIME_WEBM => {
                if self.has("libvpx-vp9") {
                    Some(VideoCodec::Vp9)
                } else {
                    self.has("libvpx").then_some(VideoCodec::Vp8)
                }
            }
            _ => None,
        }
    }
}

/// Names of the `libx264`/`libvpx*` encoders listed by `ffmpeg -encoders`.
pub(crate) fn parse_encoder_list(listing: &str) -> Vec<String> {
    const KNOWN: [&str; 3] = ["libx264", "libvpx-vp9", "libvpx"];
    listing
        .lines()
        .filter_map(|line| {
            let mut cols = line.split_whitespace();
            let flags = cols.next()?;
            let name = cols.next()?;
            (flags.starts_with('V') && KNOWN.contains(&name)).then(|| name.to_string())
        })
        .collect()
}

impl EncoderBackend for FfmpegBackend {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn supports_mime(&self, mime: &str) -> bool {
        self.codec_for(mime).is_some()
    }

    fn create(&self, mime: &str) -> StudioResult<Box<dyn MediaEncoder>> {
        let codec = self.codec_for(mime).ok_or_else(|| {
            StudioError::encoder_unsupported(mime, "no matching ffmpeg encoder")
        })?;
        Ok(Box::new(FfmpegEncoder::new(mime, codec, self.background)))
    }
}

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique scratch path in the system temp dir.
pub(crate) fn temp_path(stem: &str, ext: &str) -> PathBuf {
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!(
        "hanzi-studio-{stem}-{}-{n}.{ext}",
        std::process::id()
    ))
}

/// Sink that spawns `ffmpeg` and streams raw frames to its stdin.
///
/// Output goes to a scratch file (MP4 `+faststart` needs a seekable output) that is read back
/// on `end` and removed.
pub struct FfmpegEncoder {
    mime: String,
    codec: VideoCodec,
    background: [u8; 3],
    out_path: PathBuf,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    scratch: Vec<u8>,
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
    output: Option<Vec<u8>>,
}

impl FfmpegEncoder {
    fn new(mime: &str, codec: VideoCodec, background: [u8; 3]) -> Self {
        Self {
            mime: mime.to_string(),
            codec,
            background,
            out_path: temp_path("encode", codec.container()),
            child: None,
            stdin: None,
            stderr_drain: None,
            scratch: Vec::new(),
            cfg: None,
            last_idx: None,
            output: None,
        }
    }

    fn build_command(&self, cfg: &SinkConfig) -> Command {
        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        // Input is flattened to opaque RGBA8 in push_frame.
        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
        ]);
        push_input_fps(&mut cmd, cfg.fps);
        cmd.args(["-i", "pipe:0", "-an"]);

        // yuv420p needs even dimensions.
        cmd.args(["-vf", "pad=ceil(iw/2)*2:ceil(ih/2)*2"]);
        cmd.args([
            "-c:v",
            self.codec.encoder_name(),
            "-pix_fmt",
            "yuv420p",
            "-b:v",
            &format!("{}k", cfg.bitrate_kbps),
        ]);
        if self.codec == VideoCodec::H264 {
            cmd.args(["-movflags", "+faststart"]);
        }
        cmd.args(["-f", self.codec.container()]);
        cmd.arg(&self.out_path);
        cmd
    }
}

impl FrameSink for FfmpegEncoder {
    fn begin(&mut self, cfg: SinkConfig) -> StudioResult<()> {
        cfg.validate()?;
        if self.child.is_some() {
            return Err(StudioError::encode("ffmpeg encoder already started"));
        }

        let mut child = self.build_command(&cfg).spawn().map_err(|e| {
            StudioError::encoder_unsupported(
                self.mime.clone(),
                format!("failed to spawn ffmpeg (is it installed and on PATH?): {e}"),
            )
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| StudioError::encode("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| StudioError::encode("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        tracing::debug!(
            codec = self.codec.encoder_name(),
            width = cfg.width,
            height = cfg.height,
            kbps = cfg.bitrate_kbps,
            "ffmpeg encoder started"
        );
        self.scratch = vec![0u8; cfg.frame_len()];
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.last_idx = None;
        self.output = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> StudioResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| StudioError::encode("ffmpeg encoder not started"))?;
        check_order(&mut self.last_idx, idx)?;
        check_frame(cfg, frame)?;

        flatten_premul_over_bg(&mut self.scratch, &frame.data, self.background)?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(StudioError::encode("ffmpeg encoder is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(&self.scratch).map_err(|e| {
            StudioError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn end(&mut self) -> StudioResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| StudioError::encode("ffmpeg encoder not started"))?;

        let status = child.wait().map_err(|e| {
            StudioError::encode(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| StudioError::encode("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| StudioError::encode(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(StudioError::encode(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        let bytes = std::fs::read(&self.out_path).map_err(|e| {
            StudioError::encode(format!(
                "failed to read encoded output '{}': {e}",
                self.out_path.display()
            ))
        })?;
        let _ = std::fs::remove_file(&self.out_path);
        self.output = Some(bytes);
        self.cfg = None;
        Ok(())
    }
}

impl MediaEncoder for FfmpegEncoder {
    fn mime(&self) -> &str {
        &self.mime
    }

    fn take_output(&mut self) -> StudioResult<Vec<u8>> {
        self.output
            .take()
            .ok_or_else(|| StudioError::encode("ffmpeg encoder produced no output yet"))
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        let _ = std::fs::remove_file(&self.out_path);
    }
}

pub(crate) fn push_input_fps(cmd: &mut Command, fps: Fps) {
    // For rawvideo input, `-r` before `-i` sets the input framerate.
    cmd.args(["-r", &format!("{}/{}", fps.num, fps.den)]);
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> StudioResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
