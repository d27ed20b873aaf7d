//! Whole-document compression.
//!
//! Drives the page image rewriter across every page in order, strips
//! document metadata, runs lopdf's container-level optimizations, and
//! serializes the result. Per-page problems are absorbed by the rewriter;
//! only load/save failures surface as errors.

use std::path::Path;

use lopdf::{Document, Object, ObjectId};

use crate::config::Settings;
use crate::error::ShrinkError;

use super::rewrite::rewrite_page_images;

/// Summary of one compression run.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompressOutcome {
    pub pages: usize,
    pub images_seen: usize,
    pub images_changed: usize,
}

/// Compress `input` into `output` per the settings.
///
/// Page count and order are preserved; document-level metadata is cleared
/// unconditionally. The write is all-or-nothing at lopdf's serialization
/// boundary - a failure leaves no partial state behind in the document.
pub fn compress_document(
    input: &Path,
    output: &Path,
    settings: &Settings,
) -> Result<CompressOutcome, ShrinkError> {
    if !input.exists() {
        return Err(ShrinkError::InputNotFound(input.to_path_buf()));
    }
    let mut doc = Document::load(input)?;

    let pages: Vec<ObjectId> = doc.get_pages().values().copied().collect();
    let mut outcome = CompressOutcome {
        pages: pages.len(),
        ..Default::default()
    };

    for page_id in pages {
        let stats = rewrite_page_images(&mut doc, page_id, settings);
        outcome.images_seen += stats.images_seen;
        outcome.images_changed += stats.images_changed;
    }

    log::info!(
        "processed {} images, changed {}",
        outcome.images_seen,
        outcome.images_changed
    );

    clear_metadata(&mut doc);

    // Container-level optimization: drop orphaned objects (deleted images,
    // the unhooked Info dictionary) and deflate uncompressed streams.
    doc.prune_objects();
    doc.compress();

    doc.save(output)?;

    Ok(outcome)
}

/// Clear document-level metadata: the trailer Info dictionary and the
/// catalog's XMP metadata stream. The orphaned objects are removed by the
/// prune pass that follows.
fn clear_metadata(doc: &mut Document) {
    doc.trailer.remove(b"Info");

    let root_id = match doc.trailer.get(b"Root") {
        Ok(Object::Reference(id)) => *id,
        _ => return,
    };
    if let Ok(catalog) = doc
        .get_object_mut(root_id)
        .and_then(|obj| obj.as_dict_mut())
    {
        catalog.remove(b"Metadata");
    }
}
