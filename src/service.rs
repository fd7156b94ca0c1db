//! Request handling around the conversion pipeline.
//!
//! Transport-agnostic: takes an uploaded payload plus a JSON parameter blob
//! and returns a status code with a JSON body, the way an HTTP route would.

use crate::config::{Config, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::format::ImageKind;
use crate::pipeline::{ConversionPipeline, ConversionRequest};
use crate::{ConversionError, DEFAULT_RAMP, DEFAULT_SIZE};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::Read;
use std::time::{Duration, Instant};

/// JSON parameter blob: `{"size": 100, "charSet": "@%#*+=-:. "}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertParams {
    #[serde(default = "default_size")]
    pub size: i64,
    #[serde(default = "default_char_set", rename = "charSet")]
    pub char_set: String,
}

fn default_size() -> i64 {
    DEFAULT_SIZE as i64
}

fn default_char_set() -> String {
    DEFAULT_RAMP.to_string()
}

impl Default for ConvertParams {
    fn default() -> Self {
        Self {
            size: default_size(),
            char_set: default_char_set(),
        }
    }
}

impl From<ConvertParams> for ConversionRequest {
    fn from(params: ConvertParams) -> Self {
        ConversionRequest::new(params.size, params.char_set)
    }
}

/// An uploaded file. The body is read lazily by the decoder.
pub struct Upload<R> {
    pub file_name: String,
    pub content_type: Option<String>,
    pub body: R,
}

impl<R: Read> Upload<R> {
    pub fn new(file_name: impl Into<String>, body: R) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            body,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Declared MIME type when it names JPEG or PNG, file name otherwise.
    ///
    /// Generic types such as `application/octet-stream` defer to the name.
    fn hint(&self) -> &str {
        match self.content_type.as_deref() {
            Some(content_type) if ImageKind::from_hint(content_type).is_some() => content_type,
            _ => &self.file_name,
        }
    }
}

/// Status code plus JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: Value,
}

impl Response {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": message.into() }),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn ascii(&self) -> Option<&str> {
        self.body.get("ascii").and_then(Value::as_str)
    }

    pub fn error_message(&self) -> Option<&str> {
        self.body.get("error").and_then(Value::as_str)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.body)
    }
}

/// Status code for a pipeline failure.
pub fn status_for(err: &ConversionError) -> u16 {
    match err {
        ConversionError::UnsupportedFormat(_) => 415,
        ConversionError::DecodeError(_) => 400,
        ConversionError::PayloadTooLarge { .. } => 413,
        ConversionError::ImageTooLarge { .. } => 422,
        ConversionError::DeadlineExceeded(_) => 504,
    }
}

pub struct ConvertService {
    pipeline: ConversionPipeline,
    timeout: Duration,
}

impl Default for ConvertService {
    fn default() -> Self {
        Self::new(
            ConversionPipeline::new(),
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }
}

impl ConvertService {
    pub fn new(pipeline: ConversionPipeline, timeout: Duration) -> Self {
        Self { pipeline, timeout }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            ConversionPipeline::new().with_limits(config.limits()),
            config.request_timeout(),
        )
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Handle one conversion request.
    ///
    /// The request timeout starts when this is called and becomes the
    /// pipeline deadline.
    pub fn handle<R: Read>(&self, upload: Option<Upload<R>>, params: &str) -> Response {
        let deadline = Instant::now() + self.timeout;

        let Some(upload) = upload else {
            return Response::error(400, "File upload required");
        };

        let params: ConvertParams = match serde_json::from_str(params) {
            Ok(params) => params,
            Err(e) => return Response::error(400, format!("Invalid JSON format: {e}")),
        };

        let hint = upload.hint().to_string();
        let request = ConversionRequest::from(params);
        match self.pipeline.convert(upload.body, &hint, &request, deadline) {
            Ok(result) => {
                info!(
                    "converted {} to {}x{} characters",
                    upload.file_name,
                    result.width(),
                    result.height()
                );
                Response::ok(json!({ "ascii": result.into_string() }))
            }
            Err(ConversionError::DeadlineExceeded(stage)) => {
                warn!("{}: timed out before {stage}", upload.file_name);
                Response::error(504, "Processing timeout")
            }
            Err(e) => {
                warn!("{}: {e}", upload.file_name);
                Response::error(status_for(&e), e.to_string())
            }
        }
    }

    pub fn about(&self) -> Response {
        Response::ok(json!({
            "about": "Converts JPEG and PNG images to ASCII art",
            "tip": "For the algorithm to work more correctly, contrasting images are required.",
        }))
    }
}
