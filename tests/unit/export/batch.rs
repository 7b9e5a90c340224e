use super::*;
use crate::assets::glyph::GlyphRecord;
use crate::assets::source::BundledTier;
use crate::encode::ffmpeg::{MIME_MP4, MIME_WEBM};
use crate::encode::sink::{FrameSink, MediaEncoder, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::geometry::grid::GridSpec;
use crate::render::cpu::FrameRGBA;
use crate::render::strokes::WriterStyle;
use std::io::{Cursor, Read};

const BAR: &str = r#"{"strokes": ["M 100 400 L 900 400 L 900 500 L 100 500 Z"], "medians": [[[100, 450], [900, 450]]]}"#;

struct StubBackend(&'static str);

struct StubEncoder {
    mime: &'static str,
    frames: usize,
}

impl FrameSink for StubEncoder {
    fn begin(&mut self, _cfg: SinkConfig) -> StudioResult<()> {
        Ok(())
    }

    fn push_frame(&mut self, _idx: FrameIndex, _frame: &FrameRGBA) -> StudioResult<()> {
        self.frames += 1;
        Ok(())
    }

    fn end(&mut self) -> StudioResult<()> {
        Ok(())
    }
}

impl MediaEncoder for StubEncoder {
    fn mime(&self) -> &str {
        self.mime
    }

    fn take_output(&mut self) -> StudioResult<Vec<u8>> {
        Ok(format!("{}:{}", self.mime, self.frames).into_bytes())
    }
}

impl EncoderBackend for StubBackend {
    fn name(&self) -> &str {
        "stub"
    }

    fn supports_mime(&self, mime: &str) -> bool {
        mime == self.0
    }

    fn create(&self, mime: &str) -> StudioResult<Box<dyn MediaEncoder>> {
        Ok(Box::new(StubEncoder {
            mime: if mime == self.0 { self.0 } else { "" },
            frames: 0,
        }))
    }
}

struct UppercaseTranscoder;

impl Transcoder for UppercaseTranscoder {
    fn transcode_to_mp4(
        &self,
        job: &TranscodeJob<'_>,
        progress: &mut dyn FnMut(f64),
    ) -> StudioResult<Vec<u8>> {
        progress(50.0);
        progress(100.0);
        Ok(job.input.to_ascii_uppercase())
    }
}

#[derive(Default)]
struct Events {
    items: Vec<BatchProgress>,
    archive: Vec<BatchProgress>,
}

impl BatchObserver for Events {
    fn on_item(&mut self, p: &BatchProgress) {
        self.items.push(p.clone());
    }

    fn on_archive(&mut self, p: &BatchProgress) {
        self.archive.push(p.clone());
    }
}

fn source() -> GlyphDataSource {
    let mut bundle = BundledTier::new();
    let record: GlyphRecord = serde_json::from_str(BAR).unwrap();
    bundle.insert("一", record.clone());
    bundle.insert("二", record.clone());
    bundle.insert("/", record.clone());
    bundle.insert("\\", record);
    GlyphDataSource::new().with_tier(bundle)
}

fn config() -> ExportConfig {
    ExportConfig {
        size_px: 20,
        export_multiplier: 1.0,
        style: WriterStyle {
            speed: 10.0,
            ..WriterStyle::default()
        },
        grid: GridSpec {
            subdivide: false,
            ..GridSpec::default()
        },
        ..ExportConfig::default()
    }
}

fn chars(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn archives_mp4_entries_with_padded_indices() {
    let mut events = Events::default();
    let mut src = source();
    let out = export_many(
        &chars(&["一", "二"]),
        &config(),
        &BatchOptions::default(),
        &mut src,
        &StubBackend(MIME_MP4),
        None,
        &mut events,
    )
    .unwrap();

    assert_eq!(
        out.entries,
        vec!["01_hanzi-一-20px-30fps.mp4", "02_hanzi-二-20px-30fps.mp4"]
    );
    assert!(out.failures.is_empty());
    assert!(out.archive_name.starts_with("hanzi-mp4-"));

    let labels: Vec<&str> = events.items.iter().map(|p| p.current_label.as_str()).collect();
    assert_eq!(
        labels,
        vec!["Record \"一\"", "Convert \"一\"", "Record \"二\"", "Convert \"二\""]
    );
    assert_eq!(events.items[1].conversion_percent, 100.0);
    assert_eq!(events.items[2].current_index, 1);

    let last = events.archive.last().unwrap();
    assert_eq!(last.status, BatchStatus::Finished);
    assert_eq!(last.archive_percent, 100);

    let archive = zip::ZipArchive::new(Cursor::new(out.archive)).unwrap();
    assert_eq!(archive.len(), 2);
}

#[test]
fn transcodes_non_mp4_output() {
    let mut events = Events::default();
    let mut src = source();
    let out = export_many(
        &chars(&["一"]),
        &config(),
        &BatchOptions::default(),
        &mut src,
        &StubBackend(MIME_WEBM),
        Some(&UppercaseTranscoder),
        &mut events,
    )
    .unwrap();

    assert_eq!(out.entries, vec!["01_hanzi-一-20px-30fps-12000kbps.mp4"]);
    let percents: Vec<f64> = events
        .items
        .iter()
        .filter(|p| p.current_label.starts_with("Convert"))
        .map(|p| p.conversion_percent)
        .collect();
    assert_eq!(percents, vec![0.0, 50.0, 100.0]);

    let mut archive = zip::ZipArchive::new(Cursor::new(out.archive)).unwrap();
    let mut body = String::new();
    archive.by_index(0).unwrap().read_to_string(&mut body).unwrap();
    assert!(body.starts_with("VIDEO/WEBM:"));
}

#[test]
fn webm_without_transcoder_keeps_its_extension() {
    let mut src = source();
    let out = export_many(
        &chars(&["一"]),
        &config(),
        &BatchOptions::default(),
        &mut src,
        &StubBackend(MIME_WEBM),
        None,
        &mut NoopObserver,
    )
    .unwrap();
    assert_eq!(out.entries, vec!["01_hanzi-一-20px-30fps-12000kbps.webm"]);
}

#[test]
fn reserved_characters_are_stripped_from_entry_names() {
    let mut src = source();
    let out = export_many(
        &chars(&["/"]),
        &config(),
        &BatchOptions::default(),
        &mut src,
        &StubBackend(MIME_MP4),
        None,
        &mut NoopObserver,
    )
    .unwrap();
    assert_eq!(out.entries, vec!["01_hanzi--20px-30fps.mp4"]);
}

#[test]
fn colliding_names_still_get_one_entry_each() {
    let mut src = source();
    let out = export_many(
        &chars(&["一", "一", "/", "\\"]),
        &config(),
        &BatchOptions::default(),
        &mut src,
        &StubBackend(MIME_MP4),
        None,
        &mut NoopObserver,
    )
    .unwrap();
    assert_eq!(
        out.entries,
        vec![
            "01_hanzi-一-20px-30fps.mp4",
            "02_hanzi-一-20px-30fps.mp4",
            "03_hanzi--20px-30fps.mp4",
            "04_hanzi--20px-30fps.mp4",
        ]
    );

    let mut archive = zip::ZipArchive::new(Cursor::new(out.archive)).unwrap();
    assert_eq!(archive.len(), 4);
    let names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();
    assert_eq!(names, out.entries);
}

#[test]
fn abort_policy_stops_and_reports_failure() {
    let mut events = Events::default();
    let mut src = source();
    let err = export_many(
        &chars(&["一", "龘", "二"]),
        &config(),
        &BatchOptions::default(),
        &mut src,
        &StubBackend(MIME_MP4),
        None,
        &mut events,
    )
    .unwrap_err();
    assert!(matches!(err, StudioError::GlyphNotFound { .. }));
    assert!(matches!(
        events.archive.last().map(|p| &p.status),
        Some(BatchStatus::Failed(msg)) if msg.contains("龘")
    ));
    assert!(events.items.iter().all(|p| p.current_index < 2));
}

#[test]
fn skip_policy_collects_failures() {
    let mut events = Events::default();
    let mut src = source();
    let opts = BatchOptions {
        failure_policy: FailurePolicy::Skip,
    };
    let out = export_many(
        &chars(&["一", "龘", "二"]),
        &config(),
        &opts,
        &mut src,
        &StubBackend(MIME_MP4),
        None,
        &mut events,
    )
    .unwrap();
    assert_eq!(out.entries.len(), 2);
    assert_eq!(out.entries[1], "03_hanzi-二-20px-30fps.mp4");
    assert_eq!(out.failures.len(), 1);
    assert_eq!(out.failures[0].character, "龘");
    assert_eq!(
        events.archive.last().map(|p| p.status.clone()),
        Some(BatchStatus::Finished)
    );
}
