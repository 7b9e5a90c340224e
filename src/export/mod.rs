//! Video, GIF and batch export.

/// Zip building with progress.
pub mod archive;
/// Sequential multi-character export.
pub mod batch;
/// Output file names.
pub mod naming;
/// Single-character capture pipeline.
pub mod video;
