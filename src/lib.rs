pub mod cli;
pub mod config;
pub mod error;
pub mod pdf;

pub use cli::{Args, CompressionLevel};
pub use config::{CompressionProfile, Settings};
pub use error::ShrinkError;
pub use pdf::{compress_document, split_by_size, CompressOutcome};

use std::path::Path;

/// High-level API for shrinking a PDF file on disk.
///
/// This is the recommended entry point for library consumers. It resolves the
/// compression profile from the level, rewrites every embedded image (or
/// removes them all), clears document metadata, and writes the result.
///
/// # Arguments
///
/// * `input` - Path of the PDF to compress
/// * `output` - Path the compressed PDF is written to
/// * `level` - Compression aggressiveness (quality and image bounds)
/// * `remove_images` - Delete all images instead of recompressing them
///
/// # Returns
///
/// A [`CompressOutcome`] with page and image counts, or a [`ShrinkError`] on
/// a fatal document failure (unreadable input, unwritable output).
///
/// # Example
///
/// ```no_run
/// use pdfshrink::{shrink_pdf, CompressionLevel};
/// use std::path::Path;
///
/// let outcome = shrink_pdf(
///     Path::new("report.pdf"),
///     Path::new("report_compressed.pdf"),
///     CompressionLevel::High,
///     false,
/// ).unwrap();
///
/// println!("{} pages, {} images recompressed", outcome.pages, outcome.images_changed);
/// ```
pub fn shrink_pdf(
    input: &Path,
    output: &Path,
    level: CompressionLevel,
    remove_images: bool,
) -> Result<CompressOutcome, ShrinkError> {
    let settings = Settings {
        profile: CompressionProfile::for_level(level),
        remove_images,
    };
    pdf::compress_document(input, output, &settings)
}
