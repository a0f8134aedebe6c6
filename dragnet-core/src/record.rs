//! Record segmentation.
//!
//! Inputs:
//! - decoded lines from the output stream, in arrival order
//!
//! Output:
//! - completed Records, pushed into a caller-supplied Vec
//!
//! A record is complete when it reaches the nominal line count, or when a
//! new tagged line arrives while a shorter record is still pending — the
//! pending record is force-completed with whatever lines it has and the
//! tagged line starts the next one. Producer output is not always exactly
//! three lines; this tolerates that.

/// One extracted unit: the tagged first line plus its opaque payload lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub lines: Vec<String>,
}

impl Record {
    /// The key carried by line 0, if line 0 starts with `tag`. The key is
    /// everything after the first `:`, trimmed.
    pub fn tagged_key(&self, tag: &str) -> Option<&str> {
        let first = self.lines.first()?.trim();
        if !first.starts_with(tag) {
            return None;
        }
        let (_, value) = first.split_once(':')?;
        Some(value.trim())
    }
}

/// Stateful accumulator turning a line stream into Records. One instance
/// per cycle; a fresh cycle gets a fresh parser alongside a fresh cursor.
#[derive(Debug)]
pub struct RecordParser {
    tag: String,
    max_lines: usize,
    partial: Vec<String>,
}

impl RecordParser {
    pub fn new(tag: impl Into<String>, max_lines: usize) -> Self {
        Self {
            tag: tag.into(),
            // A record always holds at least the line that started it.
            max_lines: max_lines.max(1),
            partial: Vec::new(),
        }
    }

    /// Feed one line; completed records are appended to `out` in stream order.
    pub fn push_line(&mut self, line: String, out: &mut Vec<Record>) {
        if line.starts_with(&self.tag) && !self.partial.is_empty() {
            out.push(Record {
                lines: std::mem::take(&mut self.partial),
            });
        }
        self.partial.push(line);
        if self.partial.len() >= self.max_lines {
            out.push(Record {
                lines: std::mem::take(&mut self.partial),
            });
        }
    }

    pub fn has_partial(&self) -> bool {
        !self.partial.is_empty()
    }

    /// Force-complete the pending partial, if any. Called at drain end so a
    /// trailing 1- or 2-line record is still matched.
    pub fn take_partial(&mut self) -> Option<Record> {
        if self.partial.is_empty() {
            None
        } else {
            Some(Record {
                lines: std::mem::take(&mut self.partial),
            })
        }
    }
}
