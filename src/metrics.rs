use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::artifacts::ArtifactSummary;
use crate::stages::Stage;

/// How a stage ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum StageStatus {
    /// Excluded by `--only`
    NotRun,
    /// Tool exited 0 without printing anything
    Empty,
    Completed,
    Failed(String),
}

impl StageStatus {
    pub fn label(&self) -> &'static str {
        match self {
            StageStatus::NotRun => "not run",
            StageStatus::Empty => "empty",
            StageStatus::Completed => "completed",
            StageStatus::Failed(_) => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub stage: String,
    pub tool: String,
    pub command: Vec<String>,
    #[serde(flatten)]
    pub status: StageStatus,
    pub duration_seconds: f64,
    /// Raw stdout length, whitespace included; an `Empty` stage may report a few bytes
    pub stdout_bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<ArtifactSummary>,
}

impl StageReport {
    pub fn not_run(stage: Stage, command: Vec<String>) -> Self {
        Self {
            stage: stage.name().to_string(),
            tool: stage.tool().to_string(),
            command,
            status: StageStatus::NotRun,
            duration_seconds: 0.0,
            stdout_bytes: 0,
            artifact: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InstalledTool {
    pub tool: String,
    pub action: String,
}

/// Everything one pipeline run did
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub target: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_seconds: f64,
    pub tools: Vec<InstalledTool>,
    pub missing_wordlists: Vec<String>,
    pub stages: Vec<StageReport>,
}

impl RunSummary {
    pub fn new(target: String) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            target,
            start_time: Utc::now(),
            end_time: None,
            duration_seconds: 0.0,
            tools: Vec::new(),
            missing_wordlists: Vec::new(),
            stages: Vec::new(),
        }
    }

    pub fn finalize(&mut self) {
        let end = Utc::now();
        self.duration_seconds = (end - self.start_time).num_milliseconds() as f64 / 1000.0;
        self.end_time = Some(end);
    }

    pub fn count(&self, label: &str) -> usize {
        self.stages.iter().filter(|s| s.status.label() == label).count()
    }

    pub fn failed(&self) -> usize {
        self.count("failed")
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
