//! Process log sink: stderr, optionally teed into an append-mode log file.
//!
//! The sink is owned by the front end. The conversion core only speaks to the
//! `log` facade and never touches the file.

use env_logger::{Builder, Env, Target, WriteStyle};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Scoped handle on the log destination. Flushes and syncs the file on drop.
#[derive(Debug)]
pub struct LogSink {
    file: Option<Arc<Mutex<File>>>,
}

impl LogSink {
    /// Open the sink, creating the log file if needed.
    pub fn open(path: Option<&Path>) -> io::Result<Self> {
        let file = match path {
            Some(path) => {
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                Some(Arc::new(Mutex::new(file)))
            }
            None => None,
        };
        Ok(Self { file })
    }

    pub fn has_file(&self) -> bool {
        self.file.is_some()
    }

    /// A writer that copies everything to stderr and the log file.
    pub fn writer(&self) -> TeeWriter {
        TeeWriter {
            file: self.file.clone(),
        }
    }

    /// Install `env_logger` writing through this sink.
    ///
    /// `RUST_LOG` takes precedence over `level`.
    pub fn install(&self, level: &str) -> Result<(), log::SetLoggerError> {
        Builder::from_env(Env::default().default_filter_or(level))
            .target(Target::Pipe(Box::new(self.writer())))
            .write_style(WriteStyle::Never)
            .try_init()
    }
}

impl Drop for LogSink {
    fn drop(&mut self) {
        if let Some(file) = &self.file {
            if let Ok(mut file) = file.lock() {
                let _ = file.flush();
                let _ = file.sync_data();
            }
        }
    }
}

pub struct TeeWriter {
    file: Option<Arc<Mutex<File>>>,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        if let Some(file) = &self.file {
            file.lock()
                .map_err(|_| io::Error::other("log file lock poisoned"))?
                .write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        if let Some(file) = &self.file {
            file.lock()
                .map_err(|_| io::Error::other("log file lock poisoned"))?
                .flush()?;
        }
        Ok(())
    }
}
