use std::io::{BufRead, BufReader, Read};
use std::process::{Command, Stdio};

use crate::encode::ffmpeg::{mime_extension, temp_path};
use crate::foundation::core::Fps;
use crate::foundation::error::{StudioError, StudioResult};

/// One container conversion request.
#[derive(Clone, Copy, Debug)]
pub struct TranscodeJob<'a> {
    pub input: &'a [u8],
    pub input_mime: &'a str,
    pub fps: Fps,
    /// Clip length, used to turn encoder timestamps into a percentage.
    pub duration_ms: f64,
}

/// Converts an encoded clip to H.264 MP4.
pub trait Transcoder {
    /// Runs `job`, calling `progress` with a percentage in `0..=100`. The last call is `100`.
    fn transcode_to_mp4(
        &self,
        job: &TranscodeJob<'_>,
        progress: &mut dyn FnMut(f64),
    ) -> StudioResult<Vec<u8>>;
}

/// Transcoder running the system `ffmpeg` with `-progress` reporting.
#[derive(Clone, Debug, Default)]
pub struct FfmpegTranscoder;

impl FfmpegTranscoder {
    pub fn new() -> Self {
        Self
    }
}

/// Progress percentage from one `-progress` line, if it carries a timestamp.
pub(crate) fn progress_percent(line: &str, duration_ms: f64) -> Option<f64> {
    let (key, value) = line.trim().split_once('=')?;
    let micros = match key {
        "out_time_us" | "out_time_ms" => value.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if duration_ms <= 0.0 {
        return Some(0.0);
    }
    Some((micros / 1000.0 / duration_ms * 100.0).clamp(0.0, 100.0))
}

impl Transcoder for FfmpegTranscoder {
    fn transcode_to_mp4(
        &self,
        job: &TranscodeJob<'_>,
        progress: &mut dyn FnMut(f64),
    ) -> StudioResult<Vec<u8>> {
        let in_path = temp_path("transcode-in", mime_extension(job.input_mime));
        let out_path = temp_path("transcode-out", "mp4");
        std::fs::write(&in_path, job.input).map_err(|e| {
            StudioError::encode(format!(
                "failed to stage transcode input '{}': {e}",
                in_path.display()
            ))
        })?;

        let result = run_ffmpeg(job, &in_path, &out_path, progress);
        let _ = std::fs::remove_file(&in_path);
        let bytes = result.and_then(|()| {
            std::fs::read(&out_path)
                .map_err(|e| StudioError::encode(format!("failed to read transcode output: {e}")))
        });
        let _ = std::fs::remove_file(&out_path);
        let bytes = bytes?;
        progress(100.0);
        Ok(bytes)
    }
}

fn run_ffmpeg(
    job: &TranscodeJob<'_>,
    in_path: &std::path::Path,
    out_path: &std::path::Path,
    progress: &mut dyn FnMut(f64),
) -> StudioResult<()> {
    let mut cmd = Command::new("ffmpeg");
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .args(["-y", "-loglevel", "error", "-nostats", "-progress", "pipe:1", "-i"])
        .arg(in_path)
        .args([
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
            "-r",
            &format!("{}/{}", job.fps.num, job.fps.den),
        ])
        .arg(out_path);

    let mut child = cmd.spawn().map_err(|e| {
        StudioError::encoder_unsupported(
            "ffmpeg transcode",
            format!("failed to spawn ffmpeg (is it installed and on PATH?): {e}"),
        )
    })?;

    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| StudioError::encode("failed to open ffmpeg stderr (unexpected)"))?;
    let stderr_drain = std::thread::spawn(move || {
        let mut stderr_bytes = Vec::new();
        stderr.read_to_end(&mut stderr_bytes)?;
        Ok::<_, std::io::Error>(stderr_bytes)
    });

    if let Some(stdout) = child.stdout.take() {
        for line in BufReader::new(stdout).lines() {
            let line = line
                .map_err(|e| StudioError::encode(format!("ffmpeg progress read failed: {e}")))?;
            if let Some(pct) = progress_percent(&line, job.duration_ms) {
                progress(pct);
            }
        }
    }

    let status = child
        .wait()
        .map_err(|e| StudioError::encode(format!("failed to wait for ffmpeg to finish: {e}")))?;
    let stderr_bytes = stderr_drain
        .join()
        .map_err(|_| StudioError::encode("ffmpeg stderr drain thread panicked"))?
        .map_err(|e| StudioError::encode(format!("ffmpeg stderr read failed: {e}")))?;
    if !status.success() {
        return Err(StudioError::encode(format!(
            "transcode failed with status {}: {}",
            status,
            String::from_utf8_lossy(&stderr_bytes).trim()
        )));
    }
    Ok(())
}
