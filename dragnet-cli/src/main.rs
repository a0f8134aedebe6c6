mod display;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use dragnet_core::config::DEFAULT_RECORD_TAG;
use dragnet_core::{Config, MatchWriter, ProducerSupervisor, ReferenceSet, Tailer};
use tracing::{info, warn};

use display::StatusDisplay;

#[derive(Parser, Debug)]
#[command(
    name = "dragnet",
    version,
    about = "Supervises a producer process and harvests matching records from its output file."
)]
struct Args {
    /// Output file the producer appends to
    #[arg(long, default_value = "result.txt")]
    output: PathBuf,

    /// Reference key list, one key per line
    #[arg(long, default_value = "addresses_list.txt")]
    addresses: PathBuf,

    /// Append-only match log
    #[arg(long = "matches", default_value = "match.txt")]
    match_log: PathBuf,

    /// Output-file size (bytes) that ends a cycle
    #[arg(long, default_value_t = 10 * 1024 * 1024)]
    max_size: u64,

    /// Milliseconds between file polls
    #[arg(long, default_value_t = 100)]
    poll_interval_ms: u64,

    /// Seconds without new bytes, after termination, before a cycle ends
    #[arg(long, default_value_t = 5)]
    drain_timeout_secs: u64,

    /// Seconds to pause between cycles
    #[arg(long, default_value_t = 1)]
    restart_delay_secs: u64,

    /// Producer executable
    #[arg(long, default_value = "vanitysearch")]
    producer: String,

    /// Argument passed to the producer (repeatable)
    #[arg(long = "producer-arg")]
    producer_args: Vec<String>,

    /// Worker process name to force-kill at termination
    /// (defaults to the producer executable's file name)
    #[arg(long)]
    worker_name: Option<String>,

    /// Nominal record length in lines
    #[arg(long, default_value_t = 3)]
    record_lines: usize,

    /// Prefix marking the first line of a record
    #[arg(long, default_value = DEFAULT_RECORD_TAG)]
    record_tag: String,
}

impl Args {
    fn into_config(self) -> Config {
        let worker_name = self.worker_name.clone().or_else(|| {
            Path::new(&self.producer)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
        });
        Config {
            output_path: self.output,
            reference_path: self.addresses,
            match_path: self.match_log,
            max_size_bytes: self.max_size,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            drain_timeout: Duration::from_secs(self.drain_timeout_secs),
            restart_delay: Duration::from_secs(self.restart_delay_secs),
            record_tag: self.record_tag,
            record_lines: self.record_lines,
            producer_command: self.producer,
            producer_args: self.producer_args,
            worker_name,
            ..Config::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    let config = Args::parse().into_config();
    run(config).await
}

/// Cycle orchestration: start producer, tail to DONE, terminate, delete the
/// output file, pause, repeat. Ctrl-C raises a flag the tailer observes
/// between poll iterations, so no read pass is cut short; the current
/// producer is always terminated before the process exits.
async fn run(config: Config) -> anyhow::Result<()> {
    let set = ReferenceSet::load(&config.reference_path).context("loading reference set")?;
    let mut writer = MatchWriter::open(&config.match_path, config.record_tag.clone())
        .await
        .context("opening match log")?;
    let supervisor = ProducerSupervisor::new(&config);

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received; finishing current poll");
                shutdown.store(true, Ordering::SeqCst);
            }
        });
    }

    let mut total_records: u64 = 0;

    while !shutdown.load(Ordering::SeqCst) {
        let mut handle = supervisor.spawn()?;

        let summary = {
            let mut tailer = Tailer::new(&config)
                .with_progress({
                    let mut status = StatusDisplay::new(config.max_size_bytes);
                    move |p| status.update(&p)
                })
                .with_shutdown(shutdown.clone());
            tailer
                .run_cycle(&mut writer, &set, &mut handle, total_records)
                .await
        };
        total_records = summary.total_records;

        // Terminate if the cycle ended without hitting the size cap.
        if let Err(err) = handle.terminate().await {
            warn!(error = %err, "producer termination failed");
        }

        if shutdown.load(Ordering::SeqCst) {
            info!("producer terminated; exiting");
            break;
        }

        if let Err(err) = tokio::fs::remove_file(&config.output_path).await {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(error = %err, path = %config.output_path.display(), "could not delete output file");
            }
        }

        let summary_json = serde_json::to_string(&summary).unwrap_or_default();
        info!(summary = %summary_json, "cycle finished; restarting");

        tokio::time::sleep(config.restart_delay).await;
    }

    Ok(())
}
