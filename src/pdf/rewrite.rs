//! Per-page image rewriting.
//!
//! Walks a page's image XObjects and either deletes each one or replaces its
//! payload with the recompressed version. The XObject names are snapshotted
//! before the loop because removal mutates the live dictionary. Per-image and
//! per-page failures are absorbed: the page is always emitted, at worst with
//! its images untouched.

use lopdf::{Document, Object, ObjectId};

use crate::config::Settings;

use super::filters::{decode_image, ImageData};
use super::recompress::recompress;

/// Counters for one page's image pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct RewriteStats {
    /// Image XObjects encountered
    pub images_seen: usize,
    /// Images removed or replaced with recompressed data
    pub images_changed: usize,
}

/// Where a page's XObject dictionary lives, so entries can be deleted from
/// the right place after the immutable walk.
#[derive(Debug, Clone, Copy)]
enum XObjectSlot {
    /// The XObject dictionary is its own indirect object
    Object(ObjectId),
    /// Inline inside a referenced Resources object
    Resources(ObjectId),
    /// Resources and XObject dictionaries both inline in the page
    Page(ObjectId),
}

/// Rewrite (or remove) every image XObject on one page.
pub fn rewrite_page_images(
    doc: &mut Document,
    page_id: ObjectId,
    settings: &Settings,
) -> RewriteStats {
    let mut stats = RewriteStats::default();

    // A malformed resource dictionary skips the page, never the document.
    let (slot, images) = match locate_page_images(doc, page_id) {
        Some(found) => found,
        None => return stats,
    };

    for (name, image_id) in images {
        stats.images_seen += 1;

        if settings.remove_images {
            remove_xobject_entry(doc, slot, &name);
            stats.images_changed += 1;
            continue;
        }

        if rewrite_image(doc, image_id, settings) {
            stats.images_changed += 1;
        }
    }

    stats
}

/// Recompress a single image object in place. Returns true when the payload
/// was replaced.
fn rewrite_image(doc: &mut Document, image_id: ObjectId, settings: &Settings) -> bool {
    let stream = match doc.get_object(image_id) {
        Ok(Object::Stream(stream)) => stream.clone(),
        _ => return false,
    };

    let decoded = decode_image(doc, &stream);
    if matches!(decoded, ImageData::Unsupported) {
        // Leave the payload and all metadata byte-identical.
        return false;
    }

    let replacement = match recompress(&decoded, &settings.profile) {
        Some(replacement) => replacement,
        None => return false,
    };

    let stream = match doc.get_object_mut(image_id) {
        Ok(Object::Stream(stream)) => stream,
        _ => return false,
    };

    stream.dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
    stream
        .dict
        .set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
    stream.dict.set("BitsPerComponent", Object::Integer(8));
    stream
        .dict
        .set("Width", Object::Integer(replacement.width as i64));
    stream
        .dict
        .set("Height", Object::Integer(replacement.height as i64));
    // These would now be inconsistent with the new encoding.
    stream.dict.remove(b"SMask");
    stream.dict.remove(b"Mask");
    stream.dict.remove(b"DecodeParms");
    // set_content also updates Length.
    stream.set_content(replacement.data);

    true
}

/// Find the page's XObject dictionary and snapshot its image entries
/// (name, referenced stream id). Returns None when the page has no image
/// resources or they are malformed.
fn locate_page_images(
    doc: &Document,
    page_id: ObjectId,
) -> Option<(XObjectSlot, Vec<(Vec<u8>, ObjectId)>)> {
    let page = doc.get_dictionary(page_id).ok()?;

    let resources = page.get(b"Resources").ok()?;
    let (resources_dict, resources_id) = match resources {
        Object::Reference(id) => (doc.get_dictionary(*id).ok()?, Some(*id)),
        Object::Dictionary(dict) => (dict, None),
        _ => return None,
    };

    let xobjects = resources_dict.get(b"XObject").ok()?;
    let (xobject_dict, slot) = match xobjects {
        Object::Reference(id) => (doc.get_dictionary(*id).ok()?, XObjectSlot::Object(*id)),
        Object::Dictionary(dict) => {
            let slot = match resources_id {
                Some(id) => XObjectSlot::Resources(id),
                None => XObjectSlot::Page(page_id),
            };
            (dict, slot)
        }
        _ => return None,
    };

    let mut images = Vec::new();
    for (name, value) in xobject_dict.iter() {
        if let Object::Reference(id) = value {
            if is_image(doc, *id) {
                images.push((name.clone(), *id));
            }
        }
    }

    Some((slot, images))
}

fn is_image(doc: &Document, id: ObjectId) -> bool {
    match doc.get_object(id) {
        Ok(Object::Stream(stream)) => matches!(
            stream.dict.get(b"Subtype"),
            Ok(Object::Name(name)) if name == b"Image"
        ),
        _ => false,
    }
}

/// Delete one entry from the XObject dictionary, wherever it lives.
fn remove_xobject_entry(doc: &mut Document, slot: XObjectSlot, name: &[u8]) {
    let dict = match slot {
        XObjectSlot::Object(id) => doc
            .get_object_mut(id)
            .ok()
            .and_then(|obj| obj.as_dict_mut().ok()),
        XObjectSlot::Resources(id) => doc
            .get_object_mut(id)
            .ok()
            .and_then(|obj| obj.as_dict_mut().ok())
            .and_then(|dict| dict.get_mut(b"XObject").ok())
            .and_then(|obj| obj.as_dict_mut().ok()),
        XObjectSlot::Page(id) => doc
            .get_object_mut(id)
            .ok()
            .and_then(|obj| obj.as_dict_mut().ok())
            .and_then(|dict| dict.get_mut(b"Resources").ok())
            .and_then(|obj| obj.as_dict_mut().ok())
            .and_then(|dict| dict.get_mut(b"XObject").ok())
            .and_then(|obj| obj.as_dict_mut().ok()),
    };

    if let Some(dict) = dict {
        dict.remove(name);
    }
}
