//! Append-only transcript log.
//!
//! Every command utterance is recorded as one JSON line with a timestamp, the
//! raw transcript, and the classification it produced. The log is opened in
//! append mode on every write so concurrent runs and crashes never truncate
//! history.

use crate::intent::ClassificationResult;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Serialize)]
struct TranscriptEntry<'a> {
    unix_time: u64,
    transcript: &'a str,
    #[serde(flatten)]
    classified: &'a ClassificationResult,
}

pub struct TranscriptLog {
    path: PathBuf,
}

impl TranscriptLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Default location under the user's data directory.
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hark")
            .join("transcript.jsonl")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one utterance record. Creates the parent directory on first
    /// use.
    pub fn append(&self, transcript: &str, classified: &ClassificationResult) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let entry = TranscriptEntry {
            unix_time: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
            transcript,
            classified,
        };
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }
}
