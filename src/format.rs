//! Format detection and bounded decoding of JPEG/PNG payloads.

use crate::{ConversionError, Result};
use image::codecs::jpeg::JpegDecoder;
use image::codecs::png::PngDecoder;
use image::error::{LimitError, LimitErrorKind};
use image::{DynamicImage, ImageDecoder, ImageError, ImageFormat};
use std::fmt;
use std::io::{Cursor, Read};
use std::path::Path;

/// Default payload ceiling: 8 MiB.
pub const DEFAULT_MAX_PAYLOAD_BYTES: u64 = 8 << 20;
/// Default ceiling for either pixel dimension.
pub const DEFAULT_MAX_DIMENSION: u32 = 5000;

/// Resource ceilings applied while decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum number of payload bytes read from the source.
    pub max_payload_bytes: u64,
    /// Maximum width or height of a decoded image.
    pub max_dimension: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            max_dimension: DEFAULT_MAX_DIMENSION,
        }
    }
}

/// The only container formats the decoder accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
}

impl ImageKind {
    /// Resolve a file name, bare extension or MIME type.
    pub fn from_hint(hint: &str) -> Option<Self> {
        let hint = hint.trim().to_ascii_lowercase();
        if let Some(format) = ImageFormat::from_mime_type(&hint) {
            return Self::from_format(format);
        }
        let ext = match Path::new(&hint).extension() {
            Some(ext) => ext.to_str()?.to_owned(),
            None => hint.trim_start_matches('.').to_owned(),
        };
        ImageFormat::from_extension(ext).and_then(Self::from_format)
    }

    /// Sniff the container from magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        image::guess_format(bytes).ok().and_then(Self::from_format)
    }

    fn from_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::Png => Some(Self::Png),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpeg",
            ImageKind::Png => "png",
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decode a JPEG or PNG payload.
///
/// The hint must name JPEG or PNG and agree with the sniffed content; the
/// decoder is chosen from the content, never from the hint alone. At most
/// `max_payload_bytes + 1` bytes are pulled from `source`, and header
/// dimensions are checked before any pixel data is decoded.
pub fn decode<R: Read>(source: R, hint: &str, limits: &Limits) -> Result<DynamicImage> {
    let declared = ImageKind::from_hint(hint).ok_or_else(|| {
        ConversionError::UnsupportedFormat(format!("'{}' is not jpeg or png", hint_label(hint)))
    })?;

    let bytes = read_bounded(source, limits.max_payload_bytes)?;

    let sniffed = ImageKind::sniff(&bytes).ok_or_else(|| {
        ConversionError::UnsupportedFormat("content is not a jpeg or png image".to_string())
    })?;
    if sniffed != declared {
        return Err(ConversionError::UnsupportedFormat(format!(
            "content is {sniffed} but was declared as {declared}"
        )));
    }

    let cursor = Cursor::new(bytes.as_slice());
    match sniffed {
        ImageKind::Jpeg => finish(JpegDecoder::new(cursor)?, limits),
        ImageKind::Png => finish(PngDecoder::new(cursor)?, limits),
    }
}

fn finish(decoder: impl ImageDecoder, limits: &Limits) -> Result<DynamicImage> {
    let (width, height) = decoder.dimensions();
    check_dimensions(width, height, limits)?;
    Ok(DynamicImage::from_decoder(decoder)?)
}

/// Reject grids that are empty or exceed the dimension ceiling.
pub fn check_dimensions(width: u32, height: u32, limits: &Limits) -> Result<()> {
    if width == 0 || height == 0 {
        let err = ImageError::Limits(LimitError::from_kind(LimitErrorKind::DimensionError));
        return Err(err.into());
    }
    if width > limits.max_dimension || height > limits.max_dimension {
        return Err(ConversionError::ImageTooLarge {
            width,
            height,
            limit: limits.max_dimension,
        });
    }
    Ok(())
}

fn read_bounded<R: Read>(source: R, cap: u64) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    source
        .take(cap.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(ImageError::IoError)?;
    if bytes.len() as u64 > cap {
        return Err(ConversionError::PayloadTooLarge { limit: cap });
    }
    Ok(bytes)
}

const MIME_TOP_LEVEL: &[&str] = &[
    "application", "audio", "font", "image", "message", "model", "multipart", "text", "video",
];

fn is_mime_type(hint: &str) -> bool {
    match hint.split_once('/') {
        Some((top, sub)) => {
            !sub.is_empty()
                && !sub.contains('/')
                && MIME_TOP_LEVEL.iter().any(|t| t.eq_ignore_ascii_case(top))
        }
        None => false,
    }
}

// Only the extension or MIME type is echoed back, never a full path.
fn hint_label(hint: &str) -> &str {
    let hint = hint.trim();
    if is_mime_type(hint) {
        return hint;
    }
    if hint.contains('/') {
        return Path::new(hint)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("");
    }
    match hint.rfind('.') {
        Some(dot) => &hint[dot..],
        None => hint,
    }
}
