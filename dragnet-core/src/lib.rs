pub mod config;
pub mod error;
pub mod matcher;
pub mod record;
pub mod reference;
pub mod supervisor;
pub mod tailer;

// Re-export the types a caller needs to drive a cycle end to end.
pub use config::Config;
pub use error::{DragnetError, Result};
pub use matcher::MatchWriter;
pub use record::{Record, RecordParser};
pub use reference::ReferenceSet;
pub use supervisor::{ProducerHandle, ProducerSupervisor};
pub use tailer::{CycleState, CycleSummary, ProducerControl, Progress, Tailer};
