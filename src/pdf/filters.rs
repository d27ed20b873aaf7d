//! PDF image filter-chain decoding.
//!
//! A PDF image stream declares the encodings applied to its payload as an
//! ordered filter chain. To hand pixel data to the image codec we invert the
//! chain stage by stage - but only as far as needed: a `DCTDecode` stage means
//! the payload at that point is already a codec-ready JPEG stream, and the
//! fax/JBIG2/JPEG2000 encodings are declined outright.

use std::io::Read;

use flate2::read::ZlibDecoder;
use lopdf::{Dictionary, Document, Object, Stream};

/// Stream encodings recognized in an image's filter chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    FlateDecode,
    DctDecode,
    CcittFaxDecode,
    Jbig2Decode,
    JpxDecode,
    /// Anything else - never decoded
    Other,
}

impl Filter {
    fn from_name(name: &[u8]) -> Self {
        match name {
            b"FlateDecode" => Filter::FlateDecode,
            b"DCTDecode" => Filter::DctDecode,
            b"CCITTFaxDecode" => Filter::CcittFaxDecode,
            b"JBIG2Decode" => Filter::Jbig2Decode,
            b"JPXDecode" => Filter::JpxDecode,
            _ => Filter::Other,
        }
    }
}

/// Color space of raw image samples, as far as this tool interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    /// 3 samples per pixel (DeviceRGB)
    Rgb,
    /// 1 sample per pixel (DeviceGray)
    Gray,
    /// 4 samples per pixel (DeviceCMYK)
    Cmyk,
    /// ICCBased or anything else - interpreted by a size heuristic
    Unknown,
}

/// Raw samples recovered by inverting the filter chain, with the geometry
/// needed to reinterpret them as pixels.
#[derive(Debug, Clone)]
pub struct RawImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub color_space: ColorSpace,
    pub bits_per_component: u32,
}

/// Outcome of decoding one image stream.
#[derive(Debug, Clone)]
pub enum ImageData {
    /// Fully decoded raw samples
    Raw(RawImage),
    /// A complete JPEG stream the codec can consume directly
    Jpeg(Vec<u8>),
    /// Encoding this tool cannot or need not invert; the image must be left
    /// untouched by the caller
    Unsupported,
}

/// Decode an image stream's payload by walking its filter chain in declared
/// order.
///
/// Only `FlateDecode` is actually inverted. `DCTDecode` short-circuits with
/// the payload as-is (any filters after it are never reached), and the
/// remaining encodings - including unrecognized names and any inflate
/// failure - yield [`ImageData::Unsupported`] rather than an error.
pub fn decode_image(doc: &Document, stream: &Stream) -> ImageData {
    let mut data = stream.content.clone();

    for filter in filter_chain(doc, &stream.dict) {
        match filter {
            Filter::FlateDecode => {
                let mut decoder = ZlibDecoder::new(&data[..]);
                let mut decoded = Vec::new();
                if decoder.read_to_end(&mut decoded).is_err() {
                    return ImageData::Unsupported;
                }
                data = decoded;
            }
            Filter::DctDecode => return ImageData::Jpeg(data),
            Filter::CcittFaxDecode | Filter::Jbig2Decode | Filter::JpxDecode | Filter::Other => {
                return ImageData::Unsupported;
            }
        }
    }

    ImageData::Raw(RawImage {
        data,
        width: dict_u32(&stream.dict, b"Width").unwrap_or(0),
        height: dict_u32(&stream.dict, b"Height").unwrap_or(0),
        color_space: color_space(doc, &stream.dict),
        bits_per_component: dict_u32(&stream.dict, b"BitsPerComponent").unwrap_or(8),
    })
}

/// Read the declared filter chain (a single name, an array of names, or a
/// reference to either). Missing entry means the payload is already raw.
pub fn filter_chain(doc: &Document, dict: &Dictionary) -> Vec<Filter> {
    let obj = match dict.get(b"Filter") {
        Ok(obj) => obj,
        Err(_) => return Vec::new(),
    };

    match resolve(doc, obj) {
        Object::Name(name) => vec![Filter::from_name(name)],
        Object::Array(items) => items
            .iter()
            .map(|item| match resolve(doc, item) {
                Object::Name(name) => Filter::from_name(name),
                _ => Filter::Other,
            })
            .collect(),
        _ => vec![Filter::Other],
    }
}

/// Interpret the `ColorSpace` entry. The entry may be a name, an array such
/// as `[/ICCBased 12 0 R]`, or a reference to either.
fn color_space(doc: &Document, dict: &Dictionary) -> ColorSpace {
    let obj = match dict.get(b"ColorSpace") {
        Ok(obj) => obj,
        Err(_) => return ColorSpace::Unknown,
    };

    match resolve(doc, obj) {
        Object::Name(name) => color_space_from_name(name),
        Object::Array(items) => match items.first().map(|item| resolve(doc, item)) {
            Some(Object::Name(name)) => color_space_from_name(name),
            _ => ColorSpace::Unknown,
        },
        _ => ColorSpace::Unknown,
    }
}

fn color_space_from_name(name: &[u8]) -> ColorSpace {
    match name {
        b"DeviceRGB" | b"CalRGB" => ColorSpace::Rgb,
        b"DeviceGray" | b"CalGray" => ColorSpace::Gray,
        b"DeviceCMYK" => ColorSpace::Cmyk,
        _ => ColorSpace::Unknown,
    }
}

fn dict_u32(dict: &Dictionary, key: &[u8]) -> Option<u32> {
    match dict.get(key) {
        Ok(Object::Integer(n)) if *n >= 0 => Some(*n as u32),
        _ => None,
    }
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn image_stream(filters: Vec<&[u8]>, content: Vec<u8>) -> Stream {
        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"XObject".to_vec()));
        dict.set("Subtype", Object::Name(b"Image".to_vec()));
        dict.set("Width", Object::Integer(2));
        dict.set("Height", Object::Integer(2));
        dict.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
        dict.set("BitsPerComponent", Object::Integer(8));
        match filters.len() {
            0 => {}
            1 => dict.set("Filter", Object::Name(filters[0].to_vec())),
            _ => dict.set(
                "Filter",
                Object::Array(
                    filters
                        .into_iter()
                        .map(|f| Object::Name(f.to_vec()))
                        .collect(),
                ),
            ),
        }
        Stream::new(dict, content)
    }

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_no_filter_is_raw() {
        let doc = Document::new();
        let pixels = vec![0u8; 12];
        let stream = image_stream(vec![], pixels.clone());

        match decode_image(&doc, &stream) {
            ImageData::Raw(raw) => {
                assert_eq!(raw.data, pixels);
                assert_eq!((raw.width, raw.height), (2, 2));
                assert_eq!(raw.color_space, ColorSpace::Rgb);
                assert_eq!(raw.bits_per_component, 8);
            }
            other => panic!("expected raw, got {:?}", other),
        }
    }

    #[test]
    fn test_flate_is_inverted() {
        let doc = Document::new();
        let pixels: Vec<u8> = (0..12).collect();
        let stream = image_stream(vec![b"FlateDecode"], zlib(&pixels));

        match decode_image(&doc, &stream) {
            ImageData::Raw(raw) => assert_eq!(raw.data, pixels),
            other => panic!("expected raw, got {:?}", other),
        }
    }

    #[test]
    fn test_dct_passes_through() {
        let doc = Document::new();
        let jpeg = vec![0xFF, 0xD8, 0xFF, 0xE0];
        let stream = image_stream(vec![b"DCTDecode"], jpeg.clone());

        match decode_image(&doc, &stream) {
            ImageData::Jpeg(data) => assert_eq!(data, jpeg),
            other => panic!("expected jpeg, got {:?}", other),
        }
    }

    #[test]
    fn test_flate_then_dct_stops_at_dct() {
        let doc = Document::new();
        let jpeg = vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3];
        let stream = image_stream(vec![b"FlateDecode", b"DCTDecode"], zlib(&jpeg));

        match decode_image(&doc, &stream) {
            ImageData::Jpeg(data) => assert_eq!(data, jpeg),
            other => panic!("expected jpeg, got {:?}", other),
        }
    }

    #[test]
    fn test_declined_encodings_are_unsupported() {
        let doc = Document::new();
        for name in [b"CCITTFaxDecode".as_slice(), b"JBIG2Decode", b"JPXDecode"] {
            let stream = image_stream(vec![name], vec![1, 2, 3]);
            assert!(matches!(
                decode_image(&doc, &stream),
                ImageData::Unsupported
            ));
        }
    }

    #[test]
    fn test_unknown_filter_is_unsupported() {
        let doc = Document::new();
        let stream = image_stream(vec![b"LZWDecode"], vec![1, 2, 3]);
        assert!(matches!(
            decode_image(&doc, &stream),
            ImageData::Unsupported
        ));
    }

    #[test]
    fn test_corrupt_flate_is_unsupported() {
        let doc = Document::new();
        let stream = image_stream(vec![b"FlateDecode"], vec![0xDE, 0xAD, 0xBE, 0xEF]);
        assert!(matches!(
            decode_image(&doc, &stream),
            ImageData::Unsupported
        ));
    }
}
