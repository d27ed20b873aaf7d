pub mod compress;
pub mod filters;
pub mod recompress;
pub mod rewrite;
pub mod split;

pub use compress::{compress_document, CompressOutcome};
pub use filters::{decode_image, ImageData};
pub use recompress::{recompress, RecompressedImage};
pub use rewrite::{rewrite_page_images, RewriteStats};
pub use split::split_by_size;
