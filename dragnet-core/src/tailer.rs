//! Incremental tailing of the producer's output file.
//!
//! One `Tailer` drives one cycle end to end: wait for the output file,
//! read newly appended bytes, segment them into records, match each record,
//! terminate the producer once the file hits the size cap, then drain
//! until writes stop. A single task owns the cursor and the partial-record
//! accumulator; every record is fully matched before the next is parsed.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{DragnetError, Result};
use crate::matcher::MatchWriter;
use crate::record::RecordParser;
use crate::reference::ReferenceSet;

/// Cycle state machine. `Terminating` exists only for the instant between
/// requesting producer termination and starting the drain clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    AwaitingFile,
    Tailing,
    Terminating,
    Draining,
    Done,
}

/// What one cycle produced. `total_records` is supervisor-owned state,
/// passed in and handed back accumulated; the tailer never keeps it between
/// cycles.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CycleSummary {
    pub cycle_records: u64,
    pub cycle_matches: u64,
    pub total_records: u64,
}

/// Per-poll progress snapshot for an optional display callback.
#[derive(Debug, Clone, Copy)]
pub struct Progress {
    pub cycle_records: u64,
    pub total_records: u64,
    pub file_size: u64,
}

/// The tailer's handle on the producer lifecycle. The real implementation
/// lives on [`crate::supervisor::ProducerHandle`]; tests substitute a mock
/// to observe termination requests.
#[async_trait]
pub trait ProducerControl: Send {
    async fn terminate(&mut self) -> Result<()>;
}

/// Read everything appended past `from`. The caller advances its cursor
/// only past bytes it actually consumed.
pub async fn read_new_bytes(path: &Path, from: u64) -> std::io::Result<Vec<u8>> {
    let mut file = tokio::fs::File::open(path).await?;
    file.seek(std::io::SeekFrom::Start(from)).await?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf).await?;
    Ok(buf)
}

/// Result of decoding one chunk of newly read bytes. Bytes after the last
/// newline are left unconsumed and retried once the newline arrives; a
/// UTF-8 failure stops the pass with `consumed` covering only the lines
/// decoded before it.
#[derive(Debug)]
pub struct LinePass {
    pub lines: Vec<String>,
    pub consumed: u64,
    pub error: Option<DragnetError>,
}

pub fn decode_complete_lines(path: &Path, base_offset: u64, buf: &[u8]) -> LinePass {
    let Some(last_nl) = buf.iter().rposition(|&b| b == b'\n') else {
        return LinePass {
            lines: Vec::new(),
            consumed: 0,
            error: None,
        };
    };

    let mut lines = Vec::new();
    let mut consumed = 0usize;
    let mut error = None;

    for raw in buf[..=last_nl].split_inclusive(|&b| b == b'\n') {
        let line = raw.strip_suffix(b"\n").unwrap_or(raw);
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        match std::str::from_utf8(line) {
            Ok(text) => {
                lines.push(text.to_string());
                consumed += raw.len();
            }
            Err(_) => {
                error = Some(DragnetError::Decode {
                    path: path.to_path_buf(),
                    offset: base_offset + consumed as u64,
                });
                break;
            }
        }
    }

    LinePass {
        lines,
        consumed: consumed as u64,
        error,
    }
}

pub struct Tailer {
    output_path: PathBuf,
    max_size_bytes: u64,
    poll_interval: Duration,
    drain_timeout: Duration,
    record_tag: String,
    record_lines: usize,
    progress: Option<Box<dyn FnMut(Progress) + Send>>,
    shutdown: Option<Arc<AtomicBool>>,
}

impl Tailer {
    pub fn new(config: &Config) -> Self {
        Self {
            output_path: config.output_path.clone(),
            max_size_bytes: config.max_size_bytes,
            poll_interval: config.poll_interval,
            drain_timeout: config.drain_timeout,
            record_tag: config.record_tag.clone(),
            record_lines: config.record_lines,
            progress: None,
            shutdown: None,
        }
    }

    /// Install a per-poll progress callback (used by the CLI display).
    pub fn with_progress(mut self, callback: impl FnMut(Progress) + Send + 'static) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Install a cooperative shutdown flag. It is checked only between poll
    /// iterations, so a raised flag never leaves a read pass half done.
    pub fn with_shutdown(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown = Some(flag);
        self
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Drive one cycle to `Done`. All per-cycle errors are contained here:
    /// size-query and read failures mean "no new data this poll", decode
    /// failures abort the read pass and are retried, and a failed
    /// termination request is logged but never loses drained records.
    pub async fn run_cycle(
        &mut self,
        writer: &mut MatchWriter,
        set: &ReferenceSet,
        producer: &mut dyn ProducerControl,
        total_records: u64,
    ) -> CycleSummary {
        let mut state = CycleState::AwaitingFile;
        let mut cursor: u64 = 0;
        let mut parser = RecordParser::new(self.record_tag.clone(), self.record_lines);
        let mut cycle_records: u64 = 0;
        let mut cycle_matches: u64 = 0;
        let mut total_records = total_records;
        let mut last_size: u64 = 0;
        let mut drain_start = Instant::now();

        info!(path = %self.output_path.display(), "cycle started; awaiting output file");
        while state == CycleState::AwaitingFile {
            if self.shutdown_requested() {
                info!("shutdown requested; abandoning wait for output file");
                return CycleSummary {
                    cycle_records,
                    cycle_matches,
                    total_records,
                };
            }
            if tokio::fs::metadata(&self.output_path).await.is_ok() {
                state = CycleState::Tailing;
                info!("output file present; tailing");
            } else {
                sleep(self.poll_interval).await;
            }
        }

        loop {
            if self.shutdown_requested() {
                info!("shutdown requested; ending cycle between polls");
                break;
            }

            // Transient failures count as no new data and are retried.
            let size = match tokio::fs::metadata(&self.output_path).await {
                Ok(meta) => meta.len(),
                Err(err) => {
                    debug!(error = %err, "size query failed; treating as no data");
                    0
                }
            };

            if size > cursor {
                match read_new_bytes(&self.output_path, cursor).await {
                    Ok(buf) => {
                        let pass = decode_complete_lines(&self.output_path, cursor, &buf);

                        let mut completed = Vec::new();
                        for line in pass.lines {
                            parser.push_line(line, &mut completed);
                        }
                        for record in &completed {
                            match writer.process(record, set).await {
                                Ok(true) => cycle_matches += 1,
                                Ok(false) => {}
                                Err(err) => warn!(error = %err, "match append failed"),
                            }
                            cycle_records += 1;
                            total_records += 1;
                        }
                        cursor += pass.consumed;

                        if let Some(err) = pass.error {
                            warn!(error = %err, "aborting read pass; retrying next poll");
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, offset = cursor, "read failed; retrying next poll");
                    }
                }
            }

            if let Some(callback) = self.progress.as_mut() {
                callback(Progress {
                    cycle_records,
                    total_records,
                    file_size: size,
                });
            }

            if state == CycleState::Tailing && size >= self.max_size_bytes {
                info!(
                    size,
                    max_size = self.max_size_bytes,
                    "size threshold reached; requesting producer termination"
                );
                if let Err(err) = producer.terminate().await {
                    warn!(error = %err, "producer termination reported failure");
                }
                state = CycleState::Terminating;
            }

            if state == CycleState::Terminating {
                state = CycleState::Draining;
                drain_start = Instant::now();
            } else if state == CycleState::Draining && size > last_size {
                // The producer is still flushing; restart the drain clock.
                drain_start = Instant::now();
            }
            last_size = last_size.max(size);

            if state == CycleState::Draining && drain_start.elapsed() >= self.drain_timeout {
                if let Some(record) = parser.take_partial() {
                    match writer.process(&record, set).await {
                        Ok(true) => cycle_matches += 1,
                        Ok(false) => {}
                        Err(err) => warn!(error = %err, "match append failed"),
                    }
                    cycle_records += 1;
                    total_records += 1;
                }
                state = CycleState::Done;
            }

            if state == CycleState::Done {
                break;
            }
            sleep(self.poll_interval).await;
        }

        info!(cycle_records, cycle_matches, total_records, "cycle complete");
        CycleSummary {
            cycle_records,
            cycle_matches,
            total_records,
        }
    }
}
