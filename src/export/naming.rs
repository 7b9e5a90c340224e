//! Output file names.

use chrono::{DateTime, Utc};
use unicode_normalization::UnicodeNormalization;

use crate::encode::ffmpeg::is_mp4_mime;

const FORBIDDEN: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// NFC `name` without path separators, reserved punctuation or control characters.
///
/// An empty result falls back to `U+XXXX` for the first codepoint of `fallback_char`.
pub fn sanitize_file_name(name: &str, fallback_char: &str) -> String {
    let cleaned: String = name
        .nfc()
        .filter(|c| !FORBIDDEN.contains(c) && !c.is_control())
        .collect();
    let cleaned = cleaned.trim();
    if !cleaned.is_empty() {
        return cleaned.to_string();
    }
    match fallback_char.chars().next() {
        Some(c) => format!("U+{:X}", u32::from(c)),
        None => "U+0".to_string(),
    }
}

fn digits(n: usize) -> usize {
    n.max(1).to_string().len()
}

/// Zero-pad width for batch video entries: at least two digits.
pub fn batch_index_width(total: usize) -> usize {
    digits(total).max(2)
}

/// Zero-pad width for worksheet zip entries.
pub fn worksheet_index_width(total: usize) -> usize {
    digits(total)
}

/// `index` (1-based) left-padded with zeros to `width`.
pub fn index_prefix(index: usize, width: usize) -> String {
    format!("{index:0width$}")
}

/// `hanzi-<char>-<dim>px-<fps>fps`, plus `-<kbps>kbps` for non-MP4 output.
pub fn video_filename_base(
    character: &str,
    dimension_px: u32,
    fps: u32,
    bitrate_kbps: u32,
    mime: &str,
) -> String {
    let base = format!("hanzi-{character}-{dimension_px}px-{fps}fps");
    if is_mp4_mime(mime) || mime == crate::encode::gif::MIME_GIF {
        base
    } else {
        format!("{base}-{bitrate_kbps}kbps")
    }
}

/// `hanzi-mp4-<YYYY-MM-DDTHH-MM-SS>.zip` in UTC.
pub fn batch_archive_name(now: DateTime<Utc>) -> String {
    format!("hanzi-mp4-{}.zip", now.format("%Y-%m-%dT%H-%M-%S"))
}

/// `hanzi-practice-<pageSize>-<orientation>.pdf`.
pub fn worksheet_filename(page_size: &str, orientation: &str) -> String {
    format!("hanzi-practice-{page_size}-{orientation}.pdf")
}

/// `practice_<chars>.pdf`, or `practice_batch.pdf` without characters.
pub fn combined_worksheet_filename(characters: &[String]) -> String {
    let joined: String = characters.concat();
    let stem = sanitize_file_name(&joined, "");
    if joined.is_empty() || stem == "U+0" {
        "practice_batch.pdf".to_string()
    } else {
        format!("practice_{stem}.pdf")
    }
}

/// `practice_batch_<unix ms>.zip`.
pub fn worksheet_zip_name(now: DateTime<Utc>) -> String {
    format!("practice_batch_{}.zip", now.timestamp_millis())
}

#[cfg(test)]
#[path = "../../tests/unit/export/naming.rs"]
mod tests;
