use std::path::PathBuf;
use std::time::Duration;

/// All tunables for one dragnet run. Defaults: a 10 MiB cycle cap,
/// 100 ms polls, a 5 s drain window.
#[derive(Debug, Clone)]
pub struct Config {
    /// File the producer appends to. Deleted at the end of every cycle.
    pub output_path: PathBuf,
    /// Reference key list, one key per line.
    pub reference_path: PathBuf,
    /// Append-only match log.
    pub match_path: PathBuf,

    /// Once the output file reaches this size, the producer is terminated
    /// and the cycle drains.
    pub max_size_bytes: u64,
    /// Sleep between size polls.
    pub poll_interval: Duration,
    /// After termination, how long with zero new bytes before the cycle ends.
    pub drain_timeout: Duration,
    /// Pause between cycles.
    pub restart_delay: Duration,

    /// Prefix that marks the first line of a record.
    pub record_tag: String,
    /// Nominal record length in lines. A new tagged line force-completes a
    /// shorter pending record, so this is an upper bound, not a guarantee.
    pub record_lines: usize,

    /// Producer executable and its arguments.
    pub producer_command: String,
    pub producer_args: Vec<String>,
    /// Name of the worker process the producer may spawn, force-killed at
    /// termination. `None` disables the by-name kill.
    pub worker_name: Option<String>,
    /// Bounded wait for graceful producer shutdown before the forced kill.
    pub terminate_grace: Duration,
}

pub const DEFAULT_RECORD_TAG: &str = "PubAddress:";

impl Default for Config {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("result.txt"),
            reference_path: PathBuf::from("addresses_list.txt"),
            match_path: PathBuf::from("match.txt"),
            max_size_bytes: 10 * 1024 * 1024,
            poll_interval: Duration::from_millis(100),
            drain_timeout: Duration::from_secs(5),
            restart_delay: Duration::from_secs(1),
            record_tag: DEFAULT_RECORD_TAG.to_string(),
            record_lines: 3,
            producer_command: "vanitysearch".to_string(),
            producer_args: Vec::new(),
            worker_name: Some("vanitysearch".to_string()),
            terminate_grace: Duration::from_secs(5),
        }
    }
}
