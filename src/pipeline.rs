//! Conversion pipeline: validate, decode, resize, reduce, map.
//!
//! Deadline checks are cooperative and happen at two points only: before the
//! payload is read, and before the compute-heavy resize. A stage that has
//! already started runs to completion; the byte and dimension ceilings bound
//! how long that can take.

use crate::format::{self, Limits};
use crate::glyph::Ramp;
use crate::{luminance, resize, ConversionError, Result};
use image::GenericImageView;
use log::debug;
use std::fmt;
use std::io::Read;
use std::time::Instant;

/// Long-edge size used when the requested one is out of range.
pub const DEFAULT_SIZE: u32 = 100;
/// Largest accepted long-edge size.
pub const MAX_SIZE: u32 = 300;

/// Pipeline stages, in execution order, followed by the two terminal
/// failure states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    Decoding,
    Resizing,
    Reducing,
    Mapping,
    Done,
    /// The deadline passed between stages.
    Cancelled,
    Failed,
}

impl Stage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Done | Stage::Cancelled | Stage::Failed)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validating => "validating",
            Stage::Decoding => "decoding",
            Stage::Resizing => "resizing",
            Stage::Reducing => "reducing",
            Stage::Mapping => "mapping",
            Stage::Done => "done",
            Stage::Cancelled => "cancelled",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Caller-supplied conversion parameters, as received.
///
/// Out-of-range values are not errors: they fall back to defaults during
/// validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub size: i64,
    pub ramp: String,
}

impl Default for ConversionRequest {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE as i64,
            ramp: crate::DEFAULT_RAMP.to_string(),
        }
    }
}

impl ConversionRequest {
    pub fn new(size: i64, ramp: impl Into<String>) -> Self {
        Self { size, ramp: ramp.into() }
    }

    /// Resolve the effective long-edge size and ramp.
    pub fn validate(&self) -> (u32, Ramp) {
        let size = if (1..=MAX_SIZE as i64).contains(&self.size) {
            self.size as u32
        } else {
            debug!("size {} out of range, using {}", self.size, DEFAULT_SIZE);
            DEFAULT_SIZE
        };
        let ramp = Ramp::parse(&self.ramp).unwrap_or_else(|| {
            debug!(
                "ramp of {} characters rejected, using default",
                self.ramp.chars().count()
            );
            Ramp::default()
        });
        (size, ramp)
    }
}

/// Rendered text plus the grid dimensions it was produced from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    text: String,
    width: u32,
    height: u32,
}

impl ConversionResult {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for ConversionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Runs conversions against a fixed set of resource limits.
///
/// Holds no per-request state, so one instance can serve concurrent callers.
#[derive(Debug, Clone, Default)]
pub struct ConversionPipeline {
    limits: Limits,
}

impl ConversionPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Convert one payload to ASCII art.
    ///
    /// `hint` is the file name or MIME type the payload arrived with.
    /// Nothing is read from `source` if `deadline` has already passed.
    pub fn convert<R: Read>(
        &self,
        source: R,
        hint: &str,
        request: &ConversionRequest,
        deadline: Instant,
    ) -> Result<ConversionResult> {
        let result = self.run(source, hint, request, deadline);
        match &result {
            Err(ConversionError::DeadlineExceeded(next)) => {
                debug!("stage: {} before {next}", Stage::Cancelled);
            }
            Err(e) => debug!("stage: {} ({e})", Stage::Failed),
            Ok(_) => debug!("stage: {}", Stage::Done),
        }
        result
    }

    fn run<R: Read>(
        &self,
        source: R,
        hint: &str,
        request: &ConversionRequest,
        deadline: Instant,
    ) -> Result<ConversionResult> {
        debug!("stage: {}", Stage::Validating);
        let (size, ramp) = request.validate();

        check_deadline(deadline, Stage::Decoding)?;
        debug!("stage: {}", Stage::Decoding);
        let image = format::decode(source, hint, &self.limits)?;
        let (src_w, src_h) = image.dimensions();

        check_deadline(deadline, Stage::Resizing)?;
        debug!("stage: {} {}x{} -> long edge {}", Stage::Resizing, src_w, src_h, size);
        let resized = resize::resize(&image, size);
        drop(image);

        debug!("stage: {}", Stage::Reducing);
        let gray = luminance::reduce(&resized);
        let (width, height) = gray.dimensions();

        debug!("stage: {} {}x{}", Stage::Mapping, width, height);
        let text = ramp.render(&gray);

        Ok(ConversionResult { text, width, height })
    }
}

fn check_deadline(deadline: Instant, next: Stage) -> Result<()> {
    if Instant::now() >= deadline {
        return Err(ConversionError::DeadlineExceeded(next));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_defaults() {
        for size in [0, -5, 301, i64::MAX] {
            let (resolved, _) = ConversionRequest::new(size, "@.").validate();
            assert_eq!(resolved, DEFAULT_SIZE, "size {size}");
        }
        for size in [1, 100, 300] {
            let (resolved, _) = ConversionRequest::new(size, "@.").validate();
            assert_eq!(resolved as i64, size);
        }
    }

    #[test]
    fn test_ramp_defaults() {
        let (_, ramp) = ConversionRequest::new(10, "@").validate();
        assert_eq!(ramp, Ramp::default());
        let (_, ramp) = ConversionRequest::new(10, "x".repeat(33)).validate();
        assert_eq!(ramp, Ramp::default());
        let (_, ramp) = ConversionRequest::new(10, "ab").validate();
        assert_eq!(ramp.chars(), &['a', 'b']);
    }

    #[test]
    fn test_expired_deadline_reads_nothing() {
        struct Untouched(usize);
        impl Read for Untouched {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                self.0 += 1;
                Ok(0)
            }
        }

        let mut source = Untouched(0);
        let deadline = Instant::now();
        let err = ConversionPipeline::new()
            .convert(&mut source, "a.png", &ConversionRequest::default(), deadline)
            .unwrap_err();
        assert!(matches!(err, ConversionError::DeadlineExceeded(Stage::Decoding)));
        assert_eq!(source.0, 0);
    }

    #[test]
    fn test_terminal_stages() {
        for stage in [Stage::Done, Stage::Cancelled, Stage::Failed] {
            assert!(stage.is_terminal(), "{stage}");
        }
        for stage in [Stage::Validating, Stage::Decoding, Stage::Resizing, Stage::Reducing, Stage::Mapping] {
            assert!(!stage.is_terminal(), "{stage}");
        }
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::Decoding.to_string(), "decoding");
        assert_eq!(Stage::Cancelled.to_string(), "cancelled");
        assert_eq!(Stage::Failed.to_string(), "failed");
        assert_eq!(
            ConversionError::DeadlineExceeded(Stage::Resizing).to_string(),
            "Deadline exceeded before resizing"
        );
    }
}
