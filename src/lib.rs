// lib.rs - reconchain library surface (the binary in main.rs is a thin CLI over it)

pub mod artifacts;
pub mod config;
pub mod logger;
pub mod metrics;
pub mod pipeline;
pub mod runner;
pub mod stages;
pub mod tools;
pub mod wordlists;

pub use config::{ScanConfig, WordlistKind};
pub use logger::RunLog;
pub use metrics::{RunSummary, StageReport, StageStatus};
pub use pipeline::{Pipeline, PipelineOptions};
pub use runner::{CommandOutcome, CommandRunner, RunError};
pub use stages::Stage;
