use crate::cli::CompressionLevel;

/// JPEG quality for the `low` level
pub const LOW_QUALITY: u8 = 70;
/// JPEG quality for the `medium` level
pub const MEDIUM_QUALITY: u8 = 50;
/// JPEG quality for the `high` level
pub const HIGH_QUALITY: u8 = 20;

/// Image bounding box for the `low` level
pub const LOW_MAX_DIMENSIONS: (u32, u32) = (1200, 900);
/// Image bounding box for the `medium` level
pub const MEDIUM_MAX_DIMENSIONS: (u32, u32) = (800, 600);
/// Image bounding box for the `high` level
pub const HIGH_MAX_DIMENSIONS: (u32, u32) = (400, 300);

/// Quality and bounding dimensions controlling how aggressively embedded
/// images are recompressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionProfile {
    /// JPEG quality, 1-100 (lower = more compression)
    pub quality: u8,
    /// Maximum width after recompression
    pub max_width: u32,
    /// Maximum height after recompression
    pub max_height: u32,
}

impl CompressionProfile {
    pub fn for_level(level: CompressionLevel) -> Self {
        let (quality, (max_width, max_height)) = match level {
            CompressionLevel::Low => (LOW_QUALITY, LOW_MAX_DIMENSIONS),
            CompressionLevel::Medium => (MEDIUM_QUALITY, MEDIUM_MAX_DIMENSIONS),
            CompressionLevel::High => (HIGH_QUALITY, HIGH_MAX_DIMENSIONS),
        };

        Self {
            quality,
            max_width,
            max_height,
        }
    }
}

impl Default for CompressionProfile {
    fn default() -> Self {
        Self::for_level(CompressionLevel::Medium)
    }
}
