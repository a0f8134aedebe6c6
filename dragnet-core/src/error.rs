use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DragnetError {
    /// Fatal at startup: the run cannot begin without a usable reference file.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed UTF-8 mid-line. The read pass is aborted; the cursor stays
    /// on the last fully decoded line and the bytes are retried next poll.
    #[error("invalid utf-8 in {path} at byte offset {offset}")]
    Decode { path: PathBuf, offset: u64 },

    #[error("producer termination failed: {0}")]
    Process(String),
}

pub type Result<T> = std::result::Result<T, DragnetError>;
