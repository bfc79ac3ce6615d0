// pipeline.rs - Straight-line orchestration: install -> wordlists -> stages
// Purpose: Run every selected stage once, in fixed order, never branching on
//          what an earlier stage produced

use anyhow::{Context, Result};
use colored::*;
use std::time::Instant;

use crate::artifacts::inspect_artifact;
use crate::config::ScanConfig;
use crate::logger::RunLog;
use crate::metrics::{InstalledTool, RunSummary, StageReport, StageStatus};
use crate::runner::{CommandOutcome, CommandRunner};
use crate::stages::{Stage, StageInput};
use crate::tools::install_tools;
use crate::wordlists::check_wordlists;

#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub skip_install: bool,
    /// Restrict the run to these stages (empty = all)
    pub only: Vec<Stage>,
    /// Hide per-command spinners
    pub quiet: bool,
    /// Write run_summary.json next to the artifacts
    pub write_summary: bool,
}

impl PipelineOptions {
    pub fn selects(&self, stage: Stage) -> bool {
        self.only.is_empty() || self.only.contains(&stage)
    }
}

pub struct Pipeline {
    config: ScanConfig,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(config: ScanConfig, options: PipelineOptions) -> Self {
        Self { config, options }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub async fn run(&self) -> Result<RunSummary> {
        let config = &self.config;
        let mut summary = RunSummary::new(config.target.clone());

        config.ensure_dirs()?;
        println!("{}", format!("[*] Target: {}", config.target).cyan());
        println!("{}", format!("[*] Output directory: {}/", config.output_dir.display()).cyan());
        println!("{}", format!("[*] Run ID: {}", summary.run_id).cyan());

        if self.options.skip_install {
            println!("{}", "[*] Skipping tool installation (--skip-install)".dimmed());
        } else {
            print_section("TOOL INSTALLATION");
            let report = install_tools(config)
                .await
                .context("Tool installation failed; aborting run")?;
            println!(
                "{}",
                format!("[+] Tools ready ({} installed, {} already present)", report.performed(), report.skipped()).green()
            );
            summary.tools = report
                .actions
                .iter()
                .map(|(tool, action)| InstalledTool {
                    tool: tool.clone(),
                    action: action.to_string(),
                })
                .collect();
        }

        summary.missing_wordlists = check_wordlists(config)
            .iter()
            .map(|m| m.path.display().to_string())
            .collect();

        let log = RunLog::open(config.log_file())?;
        let runner = CommandRunner::new(log, config.search_path.clone(), config.stage_timeout)
            .with_spinner(!self.options.quiet);

        for (index, stage) in Stage::ALL.iter().copied().enumerate() {
            let report = if self.options.selects(stage) {
                print_section(&format!("STAGE {}: {}", index + 1, stage.title()));
                self.run_one(stage, &runner).await
            } else {
                StageReport::not_run(stage, stage.command(config))
            };
            summary.stages.push(report);
        }

        summary.finalize();

        if self.options.write_summary {
            let path = config.summary_file();
            summary
                .save_to_file(&path)
                .with_context(|| format!("Failed to write run summary: {}", path.display()))?;
            println!("{}", format!("[+] Run summary saved to: {}", path.display()).green());
        }

        print_run_summary(&summary, config);
        Ok(summary)
    }

    async fn run_one(&self, stage: Stage, runner: &CommandRunner) -> StageReport {
        let config = &self.config;

        for input in stage.missing_inputs(config) {
            let warning = match input {
                StageInput::Wordlist(kind, path) => {
                    format!("[!] {}: {} wordlist not found ({})", stage, kind.key(), path.display())
                }
                StageInput::Artifact(producer, path) => {
                    format!("[!] {}: input from {} not found ({})", stage, producer, path.display())
                }
                StageInput::Checkout(name, path) => {
                    format!("[!] {}: {} checkout not found ({})", stage, name, path.display())
                }
            };
            println!("{}", warning.yellow());
        }

        let command = stage.command(config);
        println!("{}", format!("[*] Running {}...", stage.tool()).cyan());

        let started = Instant::now();
        let outcome = runner.execute(&command).await;
        let duration_seconds = started.elapsed().as_secs_f64();

        let (status, stdout_bytes) = match outcome {
            CommandOutcome::Succeeded { ref stdout, .. } if stdout.trim().is_empty() => (StageStatus::Empty, stdout.len()),
            CommandOutcome::Succeeded { ref stdout, .. } => (StageStatus::Completed, stdout.len()),
            CommandOutcome::Failed(ref err) => (StageStatus::Failed(err.to_string()), 0),
        };

        let output_path = stage.output_path(config);
        match status {
            StageStatus::Failed(ref err) => {
                println!("{}", format!("[!] {} failed: {}", stage, err).yellow());
            }
            _ => {
                println!("{}", format!("[+] {} finished, results: {}", stage, output_path.display()).green());
            }
        }

        StageReport {
            stage: stage.name().to_string(),
            tool: stage.tool().to_string(),
            command,
            status,
            duration_seconds,
            stdout_bytes,
            artifact: Some(inspect_artifact(&output_path)),
        }
    }
}

fn print_section(title: &str) {
    println!("\n{}", "═══════════════════════════════════════════════════════════════".yellow().bold());
    println!("{}", format!("  {}", title).yellow().bold());
    println!("{}", "═══════════════════════════════════════════════════════════════".yellow().bold());
}

/// Print final run summary
fn print_run_summary(summary: &RunSummary, config: &ScanConfig) {
    println!("\n{}", "═══════════════════════════════════════════════════════════════".green().bold());
    println!("{}", format!("  RUN COMPLETED: {}", summary.target).green().bold());
    println!("{}", "═══════════════════════════════════════════════════════════════".green().bold());

    for report in &summary.stages {
        let records = report
            .artifact
            .as_ref()
            .filter(|a| a.exists)
            .map(|a| format!("{} record(s)", a.records))
            .unwrap_or_else(|| "no artifact".to_string());
        let label = match report.status {
            StageStatus::Completed => report.status.label().green(),
            StageStatus::Empty => report.status.label().cyan(),
            StageStatus::NotRun => report.status.label().dimmed(),
            StageStatus::Failed(_) => report.status.label().red(),
        };
        println!("  {:<16} {:<10} {:>8.1}s  {}", report.stage, label, report.duration_seconds, records.dimmed());
    }

    if !summary.missing_wordlists.is_empty() {
        println!("{}", format!("  Missing wordlists: {}", summary.missing_wordlists.len()).yellow());
    }
    println!("{}", format!("  Duration: {:.2}s", summary.duration_seconds).cyan());
    println!("{}", "═══════════════════════════════════════════════════════════════".green().bold());
    println!(
        "\n{}",
        format!("[+] Scan Complete. Check results in the {}/ folder.", config.output_dir.display())
            .green()
            .bold()
    );
}
