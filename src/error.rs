use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShrinkError {
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid split size: {0} MB (must be positive)")]
    InvalidSplitSize(f64),

    #[error("Input file not found: {0}")]
    InputNotFound(PathBuf),
}
