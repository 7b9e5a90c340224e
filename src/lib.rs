//! hanzi-studio renders Han character stroke-order animations.
//!
//! Glyph data (hanzi-writer-data JSON) is resolved through a tiered [`GlyphDataSource`] and
//! drawn on a practice grid by three surfaces that share one geometry model:
//!
//! - the interactive [`StageRenderer`] and the video/GIF capture pipeline (CPU raster)
//! - SVG snapshots and stroke-step sheets
//! - printable PDF practice worksheets
//!
//! Video frames stream through a [`FrameSink`] into an encoder backend; batches of characters
//! are zipped with progress reporting.
#![forbid(unsafe_code)]

mod foundation;

/// Glyph records, colors and the tiered glyph data source.
pub mod assets;
/// JSON configuration.
pub mod config;
/// Frame sinks and media encoders.
pub mod encode;
/// Video, GIF and batch export pipelines.
pub mod export;
/// Grid primitives and glyph placement.
pub mod geometry;
/// Tracing subscriber setup.
pub mod logging;
/// Practice-worksheet PDF generation.
pub mod pdf;
/// CPU and SVG rendering.
pub mod render;

pub use crate::foundation::core::{Affine, BezPath, Fps, FrameIndex, Point, Rect, Rgba8};
pub use crate::foundation::error::{StudioError, StudioResult};
pub use crate::foundation::math::{mm_to_pt, pt_to_mm};

pub use crate::assets::glyph::{GlyphData, GlyphRecord};
pub use crate::assets::source::{GlyphDataSource, normalize_character, parse_character_input};
pub use crate::config::{GlyphSourceConfig, LoggingConfig, StudioConfig};
pub use crate::encode::ffmpeg::{Container, FfmpegBackend};
pub use crate::encode::gif::GifBackend;
pub use crate::encode::sink::{EncoderBackend, FrameSink, InMemorySink, MediaEncoder, SinkConfig};
pub use crate::encode::transcode::{FfmpegTranscoder, Transcoder};
pub use crate::export::batch::{
    BatchObserver, BatchOptions, BatchOutcome, BatchProgress, BatchStatus, FailurePolicy,
    export_many,
};
pub use crate::export::video::{
    ExportConfig, VideoBlob, export_character_to_gif, export_character_to_video,
};
pub use crate::geometry::grid::{GridMode, GridPrimitive, GridSpec, compute_grid_primitives};
pub use crate::geometry::transform::{NativeBox, TransformSpec, glyph_transform, resolve_transform};
pub use crate::pdf::layout::{Orientation, PageSize, PdfLayoutPlan};
pub use crate::pdf::worksheet::{
    PdfBundle, PdfOptions, PdfOutput, PdfRequest, SourceMode, generate_combined_worksheet,
    generate_worksheet, generate_worksheet_zip,
};
pub use crate::render::cpu::{FrameRGBA, render_cell};
pub use crate::render::stage::{Reconfigure, StageParams, StageRenderer, StageState};
pub use crate::render::strokes::{StrokeTimeline, WriterStyle};
