//! Image recompression.
//!
//! Takes the decoder's output, normalizes it to opaque 8-bit RGB, scales it
//! down to the profile's bounding box, and re-encodes it as JPEG. Returns the
//! new bytes only when they are strictly smaller than the input - compression
//! never expands an image. Every failure path returns `None`, leaving the
//! caller to keep the original payload; failures here are routine (odd bit
//! depths, truncated data) and must not abort the page or document.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, GrayImage, ImageFormat, Rgb, RgbImage};

use crate::config::CompressionProfile;

use super::filters::{ColorSpace, ImageData, RawImage};

/// A recompressed JPEG payload and its pixel dimensions.
#[derive(Debug, Clone)]
pub struct RecompressedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Recompress a decoded image per the profile.
///
/// Returns `None` when the input is unsupported or empty, when the codec
/// cannot interpret it, or when the JPEG result is not strictly smaller than
/// the input payload.
pub fn recompress(image: &ImageData, profile: &CompressionProfile) -> Option<RecompressedImage> {
    let input_len = match image {
        ImageData::Raw(raw) => raw.data.len(),
        ImageData::Jpeg(data) => data.len(),
        ImageData::Unsupported => return None,
    };
    if input_len == 0 {
        return None;
    }

    let decoded = match image {
        ImageData::Raw(raw) => raw_to_image(raw)?,
        ImageData::Jpeg(data) => {
            image::load_from_memory_with_format(data, ImageFormat::Jpeg).ok()?
        }
        ImageData::Unsupported => return None,
    };

    // JPEG carries no transparency, so flatten first.
    let rgb = flatten_onto_white(&decoded);
    let rgb = resize_to_fit(rgb, profile.max_width, profile.max_height);
    let (width, height) = rgb.dimensions();

    let mut encoded = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut encoded, profile.quality);
    encoder
        .encode(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
        .ok()?;

    if encoded.len() < input_len {
        Some(RecompressedImage {
            data: encoded,
            width,
            height,
        })
    } else {
        None
    }
}

/// Reinterpret raw samples as pixels. Only 8 bits per component is handled;
/// the sample count decides the layout when the color space is unknown.
fn raw_to_image(raw: &RawImage) -> Option<DynamicImage> {
    if raw.bits_per_component != 8 || raw.width == 0 || raw.height == 0 {
        return None;
    }

    let pixels = raw.width as usize * raw.height as usize;

    match raw.color_space {
        ColorSpace::Rgb => rgb_from_samples(raw, pixels),
        ColorSpace::Gray => gray_from_samples(raw, pixels),
        ColorSpace::Cmyk => cmyk_from_samples(raw, pixels),
        ColorSpace::Unknown => {
            if raw.data.len() >= pixels * 3 {
                rgb_from_samples(raw, pixels)
            } else {
                gray_from_samples(raw, pixels)
            }
        }
    }
}

fn rgb_from_samples(raw: &RawImage, pixels: usize) -> Option<DynamicImage> {
    let expected = pixels * 3;
    if raw.data.len() < expected {
        return None;
    }
    RgbImage::from_raw(raw.width, raw.height, raw.data[..expected].to_vec())
        .map(DynamicImage::ImageRgb8)
}

fn gray_from_samples(raw: &RawImage, pixels: usize) -> Option<DynamicImage> {
    if raw.data.len() < pixels {
        return None;
    }
    GrayImage::from_raw(raw.width, raw.height, raw.data[..pixels].to_vec())
        .map(DynamicImage::ImageLuma8)
}

fn cmyk_from_samples(raw: &RawImage, pixels: usize) -> Option<DynamicImage> {
    let expected = pixels * 4;
    if raw.data.len() < expected {
        return None;
    }

    let mut rgb = Vec::with_capacity(pixels * 3);
    for chunk in raw.data[..expected].chunks_exact(4) {
        let c = chunk[0] as f32 / 255.0;
        let m = chunk[1] as f32 / 255.0;
        let y = chunk[2] as f32 / 255.0;
        let k = chunk[3] as f32 / 255.0;
        rgb.push(((1.0 - c) * (1.0 - k) * 255.0) as u8);
        rgb.push(((1.0 - m) * (1.0 - k) * 255.0) as u8);
        rgb.push(((1.0 - y) * (1.0 - k) * 255.0) as u8);
    }

    RgbImage::from_raw(raw.width, raw.height, rgb).map(DynamicImage::ImageRgb8)
}

/// Composite transparent images onto an opaque white background; convert
/// everything else straight to 8-bit RGB.
fn flatten_onto_white(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut out = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));

    for (x, y, pixel) in rgba.enumerate_pixels() {
        let alpha = pixel[3] as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha)) / 255) as u8;
        out.put_pixel(x, y, Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])]));
    }

    out
}

/// Scale down (never up) so both dimensions fit within the bounding box,
/// preserving aspect ratio.
fn resize_to_fit(rgb: RgbImage, max_width: u32, max_height: u32) -> RgbImage {
    let (width, height) = rgb.dimensions();
    if width <= max_width && height <= max_height {
        return rgb;
    }

    DynamicImage::ImageRgb8(rgb)
        .resize(max_width, max_height, image::imageops::FilterType::Lanczos3)
        .to_rgb8()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_raw_rgb(width: u32, height: u32) -> RawImage {
        RawImage {
            data: vec![180u8; (width * height * 3) as usize],
            width,
            height,
            color_space: ColorSpace::Rgb,
            bits_per_component: 8,
        }
    }

    #[test]
    fn test_solid_rgb_shrinks() {
        let raw = solid_raw_rgb(64, 64);
        let input_len = raw.data.len();
        let result = recompress(&ImageData::Raw(raw), &CompressionProfile::default())
            .expect("solid image should compress");

        assert!(result.data.len() < input_len);
        assert_eq!((result.width, result.height), (64, 64));
        // JPEG magic
        assert_eq!(&result.data[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_oversized_image_is_bounded() {
        let raw = solid_raw_rgb(1600, 400);
        let profile = CompressionProfile {
            quality: 50,
            max_width: 800,
            max_height: 600,
        };
        let result = recompress(&ImageData::Raw(raw), &profile).expect("should compress");

        assert!(result.width <= 800 && result.height <= 600);
        // Aspect ratio 4:1 preserved
        assert_eq!((result.width, result.height), (800, 200));
    }

    #[test]
    fn test_within_bounds_keeps_size() {
        let raw = solid_raw_rgb(100, 50);
        let result =
            recompress(&ImageData::Raw(raw), &CompressionProfile::default()).expect("compresses");
        assert_eq!((result.width, result.height), (100, 50));
    }

    #[test]
    fn test_never_expands() {
        // 2x2 gray image is 4 bytes; no JPEG can beat that.
        let raw = RawImage {
            data: vec![0u8; 4],
            width: 2,
            height: 2,
            color_space: ColorSpace::Gray,
            bits_per_component: 8,
        };
        assert!(recompress(&ImageData::Raw(raw), &CompressionProfile::default()).is_none());
    }

    #[test]
    fn test_unsupported_and_empty_are_skipped() {
        let profile = CompressionProfile::default();
        assert!(recompress(&ImageData::Unsupported, &profile).is_none());
        assert!(recompress(&ImageData::Jpeg(Vec::new()), &profile).is_none());
    }

    #[test]
    fn test_garbage_jpeg_is_skipped() {
        let profile = CompressionProfile::default();
        assert!(recompress(&ImageData::Jpeg(vec![0xDE, 0xAD]), &profile).is_none());
    }

    #[test]
    fn test_cmyk_converts() {
        // Pure black in CMYK (k=255)
        let mut data = Vec::new();
        for _ in 0..16 {
            data.extend_from_slice(&[0, 0, 0, 255]);
        }
        let raw = RawImage {
            data,
            width: 4,
            height: 4,
            color_space: ColorSpace::Cmyk,
            bits_per_component: 8,
        };
        let img = raw_to_image(&raw).expect("cmyk decodes");
        assert_eq!(img.to_rgb8().get_pixel(0, 0).0, [0, 0, 0]);
    }

    #[test]
    fn test_truncated_samples_are_skipped() {
        let raw = RawImage {
            data: vec![0u8; 10],
            width: 4,
            height: 4,
            color_space: ColorSpace::Rgb,
            bits_per_component: 8,
        };
        assert!(raw_to_image(&raw).is_none());
    }

    #[test]
    fn test_unusual_bit_depth_is_skipped() {
        let raw = RawImage {
            data: vec![0u8; 64],
            width: 4,
            height: 4,
            color_space: ColorSpace::Gray,
            bits_per_component: 1,
        };
        assert!(raw_to_image(&raw).is_none());
    }

    #[test]
    fn test_alpha_flattens_onto_white() {
        let mut rgba = image::RgbaImage::new(2, 1);
        rgba.put_pixel(0, 0, image::Rgba([0, 0, 0, 0])); // fully transparent
        rgba.put_pixel(1, 0, image::Rgba([10, 20, 30, 255])); // opaque
        let flat = flatten_onto_white(&DynamicImage::ImageRgba8(rgba));

        assert_eq!(flat.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(flat.get_pixel(1, 0).0, [10, 20, 30]);
    }
}
