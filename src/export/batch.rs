use crate::assets::source::GlyphDataSource;
use crate::encode::ffmpeg::mime_extension;
use crate::encode::sink::EncoderBackend;
use crate::encode::transcode::{TranscodeJob, Transcoder};
use crate::foundation::core::Fps;
use crate::foundation::error::{StudioError, StudioResult};

use super::archive::{ArchiveEntry, build_zip};
use super::naming::{batch_archive_name, batch_index_width, index_prefix, sanitize_file_name};
use super::video::{ExportConfig, export_character_to_video};

/// What to do when one character cannot be exported.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the batch at the first failure.
    #[default]
    Abort,
    /// Leave the character out and keep going.
    Skip,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BatchOptions {
    pub failure_policy: FailurePolicy,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchStatus {
    Running,
    Finished,
    Failed(String),
}

/// Snapshot handed to a [`BatchObserver`].
#[derive(Clone, Debug, PartialEq)]
pub struct BatchProgress {
    /// 0-based index of the character being processed.
    pub current_index: usize,
    pub total: usize,
    pub current_label: String,
    pub conversion_percent: f64,
    pub archive_percent: u8,
    pub status: BatchStatus,
}

impl BatchProgress {
    fn new(total: usize) -> Self {
        Self {
            current_index: 0,
            total,
            current_label: String::new(),
            conversion_percent: 0.0,
            archive_percent: 0,
            status: BatchStatus::Running,
        }
    }
}

pub trait BatchObserver {
    /// Per-character recording and conversion updates.
    fn on_item(&mut self, progress: &BatchProgress);
    /// Archive building updates, including the final `Finished` event.
    fn on_archive(&mut self, progress: &BatchProgress);
}

/// Observer that ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl BatchObserver for NoopObserver {
    fn on_item(&mut self, _progress: &BatchProgress) {}
    fn on_archive(&mut self, _progress: &BatchProgress) {}
}

/// Observer that forwards events to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl BatchObserver for TracingObserver {
    fn on_item(&mut self, p: &BatchProgress) {
        tracing::info!(
            index = p.current_index + 1,
            total = p.total,
            convert = p.conversion_percent,
            "{}",
            p.current_label
        );
    }

    fn on_archive(&mut self, p: &BatchProgress) {
        match &p.status {
            BatchStatus::Failed(msg) => tracing::error!(error = %msg, "batch failed"),
            BatchStatus::Finished => tracing::info!("batch archive finished"),
            BatchStatus::Running => tracing::debug!(percent = p.archive_percent, "archiving"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchFailure {
    pub character: String,
    pub error: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BatchOutcome {
    pub archive: Vec<u8>,
    pub archive_name: String,
    /// Entry names in archive order.
    pub entries: Vec<String>,
    pub failures: Vec<BatchFailure>,
}

/// Exports every character in order and zips the results.
///
/// Non-MP4 clips are converted with `transcoder` when one is given.
#[tracing::instrument(skip_all, fields(total = characters.len()))]
pub fn export_many(
    characters: &[String],
    cfg: &ExportConfig,
    opts: &BatchOptions,
    source: &mut GlyphDataSource,
    encoder: &dyn EncoderBackend,
    transcoder: Option<&dyn Transcoder>,
    observer: &mut dyn BatchObserver,
) -> StudioResult<BatchOutcome> {
    let total = characters.len();
    let width = batch_index_width(total);
    let mut progress = BatchProgress::new(total);
    let mut files = Vec::with_capacity(total);
    let mut failures = Vec::new();

    for (i, ch) in characters.iter().enumerate() {
        progress.current_index = i;
        progress.current_label = format!("Record \"{ch}\"");
        progress.conversion_percent = 0.0;
        observer.on_item(&progress);

        let item = export_item(
            ch,
            index_prefix(i + 1, width),
            cfg,
            source,
            encoder,
            transcoder,
            &mut progress,
            observer,
        );
        match item {
            Ok(entry) => files.push(entry),
            Err(err) if opts.failure_policy == FailurePolicy::Skip && err.is_per_character() => {
                tracing::warn!(character = %ch, error = %err, "skipping character");
                failures.push(BatchFailure {
                    character: ch.clone(),
                    error: err.to_string(),
                });
            }
            Err(err) => {
                progress.status = BatchStatus::Failed(err.to_string());
                observer.on_archive(&progress);
                return Err(err);
            }
        }
    }

    progress.current_label = "Archive".to_string();
    let archive = build_zip(&files, &mut |p| {
        progress.archive_percent = p;
        observer.on_archive(&progress);
    });
    let archive = match archive {
        Ok(bytes) => bytes,
        Err(err) => {
            progress.status = BatchStatus::Failed(err.to_string());
            observer.on_archive(&progress);
            return Err(err);
        }
    };

    progress.archive_percent = 100;
    progress.status = BatchStatus::Finished;
    observer.on_archive(&progress);

    Ok(BatchOutcome {
        archive,
        archive_name: batch_archive_name(chrono::Utc::now()),
        entries: files.into_iter().map(|f| f.name).collect(),
        failures,
    })
}

#[allow(clippy::too_many_arguments)]
fn export_item(
    ch: &str,
    prefix: String,
    cfg: &ExportConfig,
    source: &mut GlyphDataSource,
    encoder: &dyn EncoderBackend,
    transcoder: Option<&dyn Transcoder>,
    progress: &mut BatchProgress,
    observer: &mut dyn BatchObserver,
) -> StudioResult<ArchiveEntry> {
    let blob = export_character_to_video(ch, cfg, source, encoder)?;
    progress.current_label = format!("Convert \"{ch}\"");

    let (bytes, ext) = match transcoder {
        Some(t) if !blob.used_direct_mp4 => {
            progress.conversion_percent = 0.0;
            observer.on_item(progress);
            let job = TranscodeJob {
                input: &blob.bytes,
                input_mime: &blob.mime,
                fps: Fps::whole(cfg.fps)?,
                duration_ms: blob.duration_ms,
            };
            let bytes = t
                .transcode_to_mp4(&job, &mut |p| {
                    progress.conversion_percent = p;
                    observer.on_item(progress);
                })
                .map_err(|e| match e {
                    StudioError::Encode(msg) => StudioError::Encode(format!("'{ch}': {msg}")),
                    other => other,
                })?;
            (bytes, "mp4")
        }
        _ => {
            progress.conversion_percent = 100.0;
            observer.on_item(progress);
            (blob.bytes, mime_extension(&blob.mime))
        }
    };

    let stem = sanitize_file_name(&blob.filename_base, ch);
    Ok(ArchiveEntry {
        name: format!("{prefix}_{stem}.{ext}"),
        bytes,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/export/batch.rs"]
mod tests;
