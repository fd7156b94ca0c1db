//! picascii CLI - Convert JPEG/PNG images to ASCII art

use clap::Parser;
use log::debug;
use picascii::logging::LogSink;
use picascii::{Config, ConfigError, ConvertParams, ConvertService, Response, Upload, DEFAULT_RAMP};
use rayon::prelude::*;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Parser)]
#[command(name = "picascii", about = "Convert JPEG/PNG images to ASCII art")]
struct Args {
    /// Input image files
    #[arg(required_unless_present = "about")]
    inputs: Vec<PathBuf>,
    /// Target size of the longer image edge, in characters (1-300)
    #[arg(short, long, default_value_t = 100, allow_negative_numbers = true)]
    size: i64,
    /// Character ramp, darkest first (2-32 characters)
    #[arg(short, long, default_value = DEFAULT_RAMP)]
    charset: String,
    /// Configuration file (default: ./picascii.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Per-image timeout in seconds, overrides the configuration
    #[arg(long)]
    timeout: Option<u64>,
    /// Print the JSON response envelope instead of raw text
    #[arg(long)]
    json: bool,
    /// Print service information and exit
    #[arg(long)]
    about: bool,
}

#[derive(Error, Debug)]
enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Logger error: {0}")]
    Logger(#[from] log::SetLoggerError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{failed} of {total} conversions failed")]
    Failed { failed: usize, total: usize },
}

fn main() -> Result<(), CliError> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(timeout) = args.timeout {
        config.service.request_timeout_secs = timeout;
    }
    config.validate()?;

    let sink = LogSink::open(config.log.file.as_deref())?;
    sink.install(&config.log.level)?;

    let service = ConvertService::from_config(&config);
    if args.about {
        println!("{}", service.about().to_json()?);
        return Ok(());
    }

    let params = serde_json::to_string(&ConvertParams {
        size: args.size,
        char_set: args.charset,
    })?;
    debug!("params: {params}");

    // One independent request per input; output keeps input order.
    let responses: Vec<Response> = args
        .inputs
        .par_iter()
        .map(|path| convert_file(&service, path, &params))
        .collect();

    let mut failed = 0;
    for (path, response) in args.inputs.iter().zip(&responses) {
        if args.json {
            println!("{}", response.to_json()?);
        } else if let Some(ascii) = response.ascii() {
            print!("{ascii}");
        }
        if !response.is_success() {
            failed += 1;
            if !args.json {
                eprintln!(
                    "{}: {}",
                    path.display(),
                    response.error_message().unwrap_or("conversion failed")
                );
            }
        }
    }

    if failed > 0 {
        return Err(CliError::Failed {
            failed,
            total: responses.len(),
        });
    }
    Ok(())
}

fn convert_file(service: &ConvertService, path: &Path, params: &str) -> Response {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    match File::open(path) {
        Ok(file) => service.handle(Some(Upload::new(file_name, BufReader::new(file))), params),
        Err(e) => {
            log::warn!("{}: {e}", path.display());
            Response::error(400, format!("Failed to open {file_name}: {e}"))
        }
    }
}
