pub mod args;

pub use args::{Args, CompressionLevel};

/// Convert a byte count to a human readable string (e.g. "1.23MB").
pub fn format_file_size(size_bytes: u64) -> String {
    if size_bytes == 0 {
        return "0B".to_string();
    }

    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    let mut size = size_bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    format!("{:.2}{}", size, UNITS[unit])
}
