//! Session transcript writer
//!
//! One file per session, named after the client endpoint, one record per line.

use log::info;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::common::{ListenerError, Result};
use crate::config::{LogMode, LOG_SUFFIX};

/// Append-only line writer for one session
#[derive(Debug)]
pub struct SessionLogger {
    path: PathBuf,
    file: File,
    lines: u64,
}

impl SessionLogger {
    /// File name used for a client endpoint
    ///
    /// Every character that is not an ASCII letter or digit becomes a dash:
    /// `10.0.0.7` gives `10-0-0-7.out`.
    pub fn artifact_name(endpoint: &str) -> String {
        let mut name: String = endpoint
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect();
        name.push_str(LOG_SUFFIX);
        name
    }

    /// Open the transcript for `endpoint` inside `dir`
    ///
    /// # Errors
    ///
    /// `ListenerError::Persistence` when the file cannot be created.
    pub async fn create(dir: &Path, endpoint: &str, mode: LogMode) -> Result<Self> {
        let path = dir.join(Self::artifact_name(endpoint));

        let mut options = OpenOptions::new();
        options.create(true);
        match mode {
            LogMode::Overwrite => options.write(true).truncate(true),
            LogMode::Append => options.append(true),
        };

        let file = options.open(&path).await.map_err(|source| ListenerError::Persistence {
            path: path.clone(),
            source,
        })?;

        info!("Logging session output to {} ({})", path.display(), mode);

        Ok(Self { path, file, lines: 0 })
    }

    /// Write `line` plus a newline and flush
    ///
    /// # Errors
    ///
    /// `ListenerError::Persistence`; the session cannot continue after it.
    pub async fn append(&mut self, line: &str) -> Result<()> {
        let mut record = Vec::with_capacity(line.len() + 1);
        record.extend_from_slice(line.as_bytes());
        record.push(b'\n');

        self.write_record(&record).await.map_err(|source| ListenerError::Persistence {
            path: self.path.clone(),
            source,
        })?;
        self.lines += 1;

        Ok(())
    }

    async fn write_record(&mut self, record: &[u8]) -> io::Result<()> {
        self.file.write_all(record).await?;
        self.file.flush().await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records written by this logger (earlier runs not counted)
    pub fn lines_written(&self) -> u64 {
        self.lines
    }
}
