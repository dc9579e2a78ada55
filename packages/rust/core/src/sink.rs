//! Completion sinks: where finished jobs are published after materialization.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use hotdogjobs_shared::{HotdogError, Job, Result};

/// Receives every job the finalizer has written to the store.
pub trait CompletionSink: Send {
    /// Publish one finished job.
    fn publish(&mut self, job: &Job) -> Result<()>;

    /// Flush buffered output. Called once when the pipeline drains.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Discards everything.
pub struct NullSink;

impl CompletionSink for NullSink {
    fn publish(&mut self, _job: &Job) -> Result<()> {
        Ok(())
    }
}

/// Logs every finished job as a single JSON record.
pub struct LogSink;

impl CompletionSink for LogSink {
    fn publish(&mut self, job: &Job) -> Result<()> {
        let record = serde_json::to_string(job)?;
        info!(target: "hotdogjobs::output", %record, "output");
        Ok(())
    }
}

/// Appends one JSON record per line to a file. Each record is flushed as
/// soon as it is published.
pub struct JsonLinesSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl JsonLinesSink {
    /// Open `path` for appending, creating it and its parent directory if needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| HotdogError::io(parent, e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| HotdogError::io(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }
}

impl CompletionSink for JsonLinesSink {
    fn publish(&mut self, job: &Job) -> Result<()> {
        serde_json::to_writer(&mut self.writer, job)?;
        self.writer
            .write_all(b"\n")
            .and_then(|()| self.writer.flush())
            .map_err(|e| HotdogError::io(&self.path, e))
    }

    fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| HotdogError::io(&self.path, e))
    }
}

/// Publishes to several sinks in order. Every sink is attempted; the first
/// error is returned.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Box<dyn CompletionSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl CompletionSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl CompletionSink for FanoutSink {
    fn publish(&mut self, job: &Job) -> Result<()> {
        let mut first_err = None;
        for sink in &mut self.sinks {
            if let Err(e) = sink.publish(job) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    fn flush(&mut self) -> Result<()> {
        let mut first_err = None;
        for sink in &mut self.sinks {
            if let Err(e) = sink.flush() {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}
