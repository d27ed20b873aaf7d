use crate::cli::Args;

use super::profile::CompressionProfile;

/// Runtime settings for a compression run.
///
/// Built once from the CLI arguments and passed by reference to every
/// component that needs it - no global state.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// How aggressively to recompress embedded images
    pub profile: CompressionProfile,
    /// Delete image resources entirely instead of recompressing them
    pub remove_images: bool,
}

impl Settings {
    pub fn from_args(args: &Args) -> Self {
        Self {
            profile: CompressionProfile::for_level(args.compression),
            remove_images: args.remove_images,
        }
    }
}
