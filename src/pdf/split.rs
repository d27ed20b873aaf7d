//! Size-bounded document splitting.
//!
//! Partitions a document's pages into contiguous chunks whose serialized
//! size stays within a byte budget. PDF serialized size is not the sum of
//! page sizes (shared objects, container overhead), so each boundary decision
//! is made empirically: serialize the candidate chunk to a temp file, measure
//! it, and either extend the chunk or cut it before the page that overflowed.
//! A single page that alone exceeds the budget still becomes its own chunk.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use lopdf::Document;
use tempfile::NamedTempFile;

use crate::cli::format_file_size;
use crate::error::ShrinkError;

/// Split the file at `path` into `<stem>_partNN.pdf` chunks of at most
/// `target_mb` megabytes each (page granularity). Returns the number of
/// chunks.
///
/// When every page fits in one chunk, nothing is written and the original
/// file stays in place; otherwise the original is deleted after the chunk
/// files are emitted.
pub fn split_by_size(path: &Path, target_mb: f64) -> Result<usize, ShrinkError> {
    if target_mb <= 0.0 {
        return Err(ShrinkError::InvalidSplitSize(target_mb));
    }
    let budget = (target_mb * 1024.0 * 1024.0) as u64;

    let doc = Document::load(path)?;
    let total_pages = doc.get_pages().len() as u32;
    if total_pages == 0 {
        return Ok(1);
    }

    let probe_dir = path.parent().filter(|p| !p.as_os_str().is_empty());

    let mut pages_in_chunk: u32 = 0;
    let mut chunk_number: u32 = 1;

    for page in 1..=total_pages {
        let first = page - pages_in_chunk;
        let candidate = serialize_page_range(&doc, total_pages, first, page)?;
        let probe_size = measure_serialized(&candidate, probe_dir)?;

        if probe_size > budget && pages_in_chunk > 0 {
            // Cut the chunk before this page and start a new one with it.
            write_chunk(&doc, total_pages, path, chunk_number, first, page - 1)?;
            chunk_number += 1;
            pages_in_chunk = 1;
        } else {
            pages_in_chunk += 1;
        }
    }

    if chunk_number == 1 {
        // Everything fit in one chunk; leave the original untouched.
        log::info!(
            "{} already fits within {} MB, no splitting needed",
            path.display(),
            target_mb
        );
        return Ok(1);
    }

    let first = total_pages - pages_in_chunk + 1;
    write_chunk(&doc, total_pages, path, chunk_number, first, total_pages)?;

    // The chunk files supersede the single-file document.
    fs::remove_file(path)?;
    log::info!("original file removed, created {} chunks", chunk_number);

    Ok(chunk_number as usize)
}

/// Serialize the contiguous page range [first, last] (1-indexed, inclusive)
/// as an independent document.
fn serialize_page_range(
    doc: &Document,
    total_pages: u32,
    first: u32,
    last: u32,
) -> Result<Vec<u8>, ShrinkError> {
    let mut chunk = doc.clone();

    // Delete in reverse so earlier page numbers stay valid.
    for page in (1..=total_pages).rev() {
        if page < first || page > last {
            chunk.delete_pages(&[page]);
        }
    }
    chunk.prune_objects();

    let mut buffer = Vec::new();
    chunk.save_to(&mut buffer)?;
    Ok(buffer)
}

/// Trial-serialization measurement: write the candidate to a temp file and
/// read its size. The temp file is removed on every exit path, including
/// errors, by `NamedTempFile`'s drop.
fn measure_serialized(bytes: &[u8], dir: Option<&Path>) -> Result<u64, ShrinkError> {
    let mut probe = match dir {
        Some(dir) => NamedTempFile::new_in(dir)?,
        None => NamedTempFile::new()?,
    };
    probe.write_all(bytes)?;
    probe.flush()?;
    Ok(probe.as_file().metadata()?.len())
}

fn write_chunk(
    doc: &Document,
    total_pages: u32,
    path: &Path,
    chunk_number: u32,
    first: u32,
    last: u32,
) -> Result<(), ShrinkError> {
    let chunk_path = part_path(path, chunk_number);
    let bytes = serialize_page_range(doc, total_pages, first, last)?;
    fs::write(&chunk_path, &bytes)?;

    log::info!(
        "chunk {} written to {} ({})",
        chunk_number,
        chunk_path.display(),
        format_file_size(bytes.len() as u64)
    );
    Ok(())
}

/// Numbered chunk filename: `<stem>_partNN.<ext>`, zero-padded to 2 digits.
pub fn part_path(path: &Path, chunk_number: u32) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let extension = path
        .extension()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "pdf".to_string());

    path.with_file_name(format!("{}_part{:02}.{}", stem, chunk_number, extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_path_numbering() {
        let path = Path::new("out/report.pdf");
        assert_eq!(part_path(path, 1), PathBuf::from("out/report_part01.pdf"));
        assert_eq!(part_path(path, 12), PathBuf::from("out/report_part12.pdf"));
    }

    #[test]
    fn test_rejects_non_positive_size() {
        assert!(matches!(
            split_by_size(Path::new("missing.pdf"), 0.0),
            Err(ShrinkError::InvalidSplitSize(_))
        ));
        assert!(matches!(
            split_by_size(Path::new("missing.pdf"), -1.5),
            Err(ShrinkError::InvalidSplitSize(_))
        ));
    }
}
