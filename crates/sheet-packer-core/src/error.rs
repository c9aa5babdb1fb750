use thiserror::Error;

#[derive(Debug, Error)]
pub enum SheetPackerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "image")]
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Invalid option: {0}")]
    InvalidOption(String),
    #[error("Invalid sprite #{index}: {width}x{height} (both sides must be positive)")]
    InvalidSprite { index: usize, width: u32, height: u32 },
    #[error("Sprites do not fit within {max_side}x{max_side}")]
    DoesNotFit { max_side: u32 },
    #[error("Packing was cancelled")]
    Cancelled,
    #[error("Time budget exhausted before any sheet fit every sprite")]
    TimedOut,
}

pub type Result<T> = std::result::Result<T, SheetPackerError>;
