use std::collections::HashSet;
use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::foundation::error::{StudioError, StudioResult};

/// One file to place in an archive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Zips `entries` in order into memory, reporting a 0–100 percentage after each entry.
///
/// Duplicate names get a `-2`, `-3`, ... suffix before the extension.
pub fn build_zip(
    entries: &[ArchiveEntry],
    on_progress: &mut dyn FnMut(u8),
) -> StudioResult<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let total_bytes: usize = entries.iter().map(|e| e.bytes.len()).sum::<usize>().max(1);
    let mut written = 0usize;
    let mut seen = HashSet::new();

    on_progress(0);
    for entry in entries {
        let name = unique_name(&entry.name, &mut seen);
        zip.start_file(name.as_str(), options)
            .map_err(|e| StudioError::encode(format!("zip entry '{name}' failed: {e}")))?;
        zip.write_all(&entry.bytes)
            .map_err(|e| StudioError::encode(format!("zip write '{name}' failed: {e}")))?;
        written += entry.bytes.len();
        on_progress(percent(written, total_bytes));
    }
    let cursor = zip
        .finish()
        .map_err(|e| StudioError::encode(format!("zip finalize failed: {e}")))?;
    on_progress(100);
    Ok(cursor.into_inner())
}

fn percent(done: usize, total: usize) -> u8 {
    ((done as f64 / total as f64) * 100.0).round().clamp(0.0, 100.0) as u8
}

fn unique_name(name: &str, seen: &mut HashSet<String>) -> String {
    if seen.insert(name.to_string()) {
        return name.to_string();
    }
    let (stem, ext) = match name.rfind('.') {
        Some(i) if i > 0 => (&name[..i], &name[i..]),
        _ => (name, ""),
    };
    let mut n = 2;
    loop {
        let candidate = format!("{stem}-{n}{ext}");
        if seen.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}
