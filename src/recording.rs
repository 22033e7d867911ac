//! # Recording Module
//!
//! Logs every control tick to JSONL files with rotation.
//!
//! This module handles:
//! - Formatting each tick (timestamp, episode, frame, action, events) as one JSON line
//! - Starting a new file after `max_records_per_file` records
//! - Retaining only the newest `max_files_to_keep` files
//!
//! Files are named `episode_<UTC timestamp>_<sequence>.jsonl`, so name order
//! is creation order.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::RecordingConfig;
use crate::error::Result;
use crate::teleop::{Action, TeleopEvents};

/// Prefix of recording file names.
const FILE_PREFIX: &str = "episode_";

/// Extension of recording file names.
const FILE_EXTENSION: &str = "jsonl";

/// One control tick.
#[derive(Debug, Serialize)]
pub struct TickRecord<'a> {
    pub timestamp: DateTime<Utc>,
    pub episode: u64,
    pub frame: u64,
    pub action: &'a Action,
    pub events: TeleopEvents,
}

/// Rotating JSONL writer for [`TickRecord`]s.
#[derive(Debug)]
pub struct EpisodeRecorder {
    dir: PathBuf,
    max_records_per_file: usize,
    max_files_to_keep: usize,
    writer: Option<BufWriter<File>>,
    current_path: Option<PathBuf>,
    records_in_file: usize,
    files_opened: u64,
}

impl EpisodeRecorder {
    /// Creates a recorder writing into `config.log_dir`, creating it if needed.
    ///
    /// No file is opened until the first record.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the directory cannot be created.
    pub fn new(config: &RecordingConfig) -> Result<Self> {
        fs::create_dir_all(&config.log_dir)?;
        info!("Recording ticks to {}", config.log_dir);

        Ok(Self {
            dir: PathBuf::from(&config.log_dir),
            max_records_per_file: config.max_records_per_file.max(1),
            max_files_to_keep: config.max_files_to_keep.max(1),
            writer: None,
            current_path: None,
            records_in_file: 0,
            files_opened: 0,
        })
    }

    /// Path of the file currently being written, if any.
    #[must_use]
    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    /// Appends one record, rotating files as needed.
    ///
    /// # Errors
    ///
    /// Returns `Io` or `Recording` if the record cannot be written.
    pub fn record(&mut self, record: &TickRecord<'_>) -> Result<()> {
        if self.writer.is_none() || self.records_in_file >= self.max_records_per_file {
            self.rotate()?;
        }

        if let Some(writer) = self.writer.as_mut() {
            serde_json::to_writer(&mut *writer, record)?;
            writer.write_all(b"\n")?;
            self.records_in_file += 1;
        }
        Ok(())
    }

    /// Flushes buffered records to disk.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the flush fails.
    pub fn flush(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    /// Closes the current file and opens the next one.
    fn rotate(&mut self) -> Result<()> {
        self.flush()?;

        let name = format!(
            "{}{}_{:04}.{}",
            FILE_PREFIX,
            Utc::now().format("%Y%m%dT%H%M%S%.6f"),
            self.files_opened,
            FILE_EXTENSION
        );
        let path = self.dir.join(name);
        let file = File::create(&path)?;
        debug!("Opened recording file {}", path.display());

        self.writer = Some(BufWriter::new(file));
        self.current_path = Some(path);
        self.records_in_file = 0;
        self.files_opened += 1;

        self.prune()
    }

    /// Deletes the oldest recording files beyond `max_files_to_keep`.
    fn prune(&self) -> Result<()> {
        let mut files: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_recording_file(path))
            .collect();

        if files.len() <= self.max_files_to_keep {
            return Ok(());
        }

        files.sort();
        let excess = files.len() - self.max_files_to_keep;
        for path in files.into_iter().take(excess) {
            match fs::remove_file(&path) {
                Ok(()) => debug!("Removed old recording file {}", path.display()),
                Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
            }
        }
        Ok(())
    }
}

impl Drop for EpisodeRecorder {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            warn!("Failed to flush recording on close: {}", e);
        }
    }
}

fn is_recording_file(path: &Path) -> bool {
    let name_ok = path
        .file_name()
        .map(|name| name.to_string_lossy().starts_with(FILE_PREFIX))
        .unwrap_or(false);
    let ext_ok = path
        .extension()
        .map(|ext| ext == FILE_EXTENSION)
        .unwrap_or(false);
    name_ok && ext_ok
}
