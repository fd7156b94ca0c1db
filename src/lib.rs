//! JPEG/PNG to ASCII art conversion under a caller-imposed deadline.

pub mod config;
pub mod format;
pub mod glyph;
pub mod logging;
pub mod luminance;
pub mod pipeline;
pub mod resize;
pub mod service;

pub use config::{Config, ConfigError};
pub use format::{ImageKind, Limits};
pub use glyph::{Ramp, DEFAULT_RAMP};
pub use pipeline::{ConversionPipeline, ConversionRequest, ConversionResult, Stage, DEFAULT_SIZE};
pub use service::{ConvertParams, ConvertService, Response, Upload};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Decode error: {0}")]
    DecodeError(#[from] image::ImageError),
    #[error("Payload exceeds {limit} bytes")]
    PayloadTooLarge { limit: u64 },
    #[error("Image dimensions {width}x{height} exceed {limit}")]
    ImageTooLarge { width: u32, height: u32, limit: u32 },
    #[error("Deadline exceeded before {0}")]
    DeadlineExceeded(Stage),
}

pub type Result<T> = std::result::Result<T, ConversionError>;
