//! Log sinks for periodic dashboard snapshots.

use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::debug;

/// An appendable, clearable named log target. `clear` replaces the stored
/// content wholesale; `close` releases the sink, after which further writes
/// are no-ops.
pub trait LogSink: Send {
    fn clear(&mut self, content: &str) -> std::io::Result<()>;
    fn close(&mut self) -> std::io::Result<()>;
}

/// File-backed sink. Each `clear` truncates and rewrites the file so it
/// always holds the latest snapshot.
pub struct FileSink {
    path: PathBuf,
    file: Option<File>,
}

impl FileSink {
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        debug!("Opened results log at {}", path.display());
        Ok(Self {
            path,
            file: Some(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSink for FileSink {
    fn clear(&mut self, content: &str) -> std::io::Result<()> {
        if let Some(file) = self.file.as_mut() {
            file.seek(SeekFrom::Start(0))?;
            file.set_len(0)?;
            file.write_all(content.as_bytes())?;
            file.flush()?;
        }
        Ok(())
    }

    fn close(&mut self) -> std::io::Result<()> {
        if let Some(file) = self.file.take() {
            file.sync_all()?;
        }
        Ok(())
    }
}

/// Default results file name derived from the process start time.
pub fn default_log_name(started: DateTime<Local>) -> String {
    format!("results-{}-summary.html", started.format("%Y%m%d-%H%M%S"))
}
