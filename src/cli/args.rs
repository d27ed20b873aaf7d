use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pdfshrink")]
#[command(
    author,
    version,
    about = "Reduce PDF file size by recompressing embedded images"
)]
pub struct Args {
    /// Input PDF file path
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output PDF file path (defaults to input with '_compressed' suffix)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Compression level
    #[arg(short = 'c', long, value_enum, default_value = "medium")]
    pub compression: CompressionLevel,

    /// Remove all images from the PDF instead of compressing them
    #[arg(short = 'r', long, alias = "ri")]
    pub remove_images: bool,

    /// Split output into chunks of the given size in MB
    #[arg(short = 's', long)]
    pub split_size: Option<f64>,

    /// Overwrite the output file if it exists
    #[arg(long)]
    pub overwrite: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Named compression aggressiveness level.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Default)]
pub enum CompressionLevel {
    /// Quality 70, images bounded to 1200x900
    Low,
    /// Quality 50, images bounded to 800x600
    #[default]
    Medium,
    /// Quality 20, images bounded to 400x300
    High,
}

impl CompressionLevel {
    /// Parse a level name, falling back to `Medium` for anything unrecognized.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "low" => CompressionLevel::Low,
            "high" => CompressionLevel::High,
            _ => CompressionLevel::Medium,
        }
    }
}

impl Args {
    /// Get the output path, defaulting to the input with a '_compressed'
    /// suffix ('_ri_compressed' when images are removed).
    pub fn output_path(&self) -> PathBuf {
        if let Some(ref output) = self.output {
            return output.clone();
        }

        let stem = self
            .input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());

        let suffix = if self.remove_images {
            "_ri_compressed"
        } else {
            "_compressed"
        };

        self.input.with_file_name(format!("{}{}.pdf", stem, suffix))
    }
}
