use std::io::{self, Write};

use dragnet_core::Progress;

const BAR_LEN: usize = 30;

/// Three in-place status lines: cycle count, file progress against the size
/// cap, lifetime total. Rewritten every poll with an ANSI cursor-up, so the
/// console shows a live view instead of a scrolling log.
pub struct StatusDisplay {
    max_size: u64,
    first_update: bool,
}

impl StatusDisplay {
    pub fn new(max_size: u64) -> Self {
        Self {
            max_size,
            first_update: true,
        }
    }

    pub fn update(&mut self, progress: &Progress) {
        let percent = if self.max_size == 0 {
            100.0
        } else {
            (progress.file_size as f64 / self.max_size as f64 * 100.0).min(100.0)
        };
        let filled = ((BAR_LEN as f64 * percent / 100.0) as usize).min(BAR_LEN);
        let bar = format!("{}{}", "=".repeat(filled), "-".repeat(BAR_LEN - filled));

        let mut out = io::stdout().lock();
        if !self.first_update {
            let _ = write!(out, "\x1b[3F\x1b[K");
        }
        self.first_update = false;
        let _ = write!(
            out,
            "Cycle records:  {}\nFile progress:  |{}| {:6.2}%\nTotal records:  {}\n",
            progress.cycle_records, bar, percent, progress.total_records
        );
        let _ = out.flush();
    }
}
