use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::record::Record;
use crate::reference::ReferenceSet;

/// Single-writer, append-only match log. Each match is written as the
/// record's lines joined by newlines, followed by one blank line, in a
/// single write so appends are all-or-nothing per record.
#[derive(Debug)]
pub struct MatchWriter {
    file: File,
    path: PathBuf,
    tag: String,
    matches_written: u64,
}

impl MatchWriter {
    pub async fn open(path: &Path, tag: impl Into<String>) -> Result<Self> {
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .await?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
            tag: tag.into(),
            matches_written: 0,
        })
    }

    /// Check one completed record against the reference set; persist it on a
    /// hit. Untagged records and non-members are a no-op. Returns whether a
    /// match was written.
    pub async fn process(&mut self, record: &Record, set: &ReferenceSet) -> Result<bool> {
        let Some(key) = record.tagged_key(&self.tag) else {
            return Ok(false);
        };
        if !set.contains(key) {
            return Ok(false);
        }

        let mut block = record.lines.join("\n");
        block.push_str("\n\n");
        self.file.write_all(block.as_bytes()).await?;
        self.file.flush().await?;

        self.matches_written += 1;
        tracing::info!(key, path = %self.path.display(), "match persisted");
        Ok(true)
    }

    pub fn matches_written(&self) -> u64 {
        self.matches_written
    }
}
