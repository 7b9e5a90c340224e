//! Encoders for captured frame streams.
//!
//! Frames arrive in capture order through [`sink::FrameSink`]; encoders additionally hand back
//! the encoded bytes and their mime type.

/// `ffmpeg`-based video encoders (MP4 / WebM via system `ffmpeg`).
pub mod ffmpeg;
/// Animated GIF encoder.
pub mod gif;
/// Generic frame sink and encoder traits plus built-in sinks.
pub mod sink;
/// Container conversion to MP4.
pub mod transcode;
