// logger.rs - Append-only run log (results/log.txt)

use anyhow::{Context, Result};
use chrono::Local;
use colored::*;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Timestamped log file; every line is `[YYYY-MM-DD HH:MM:SS] message`
#[derive(Debug)]
pub struct RunLog {
    path: PathBuf,
    written: AtomicUsize,
}

impl RunLog {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
            }
        }
        Ok(Self {
            path,
            written: AtomicUsize::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lines appended by this handle since it was opened
    pub fn written(&self) -> usize {
        self.written.load(Ordering::SeqCst)
    }

    pub fn log(&self, message: &str) -> Result<()> {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open log file: {}", self.path.display()))?;
        writeln!(file, "[{}] {}", timestamp, message)
            .with_context(|| format!("Failed to write log file: {}", self.path.display()))?;
        self.written.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Log, but only warn on the console if the file cannot be written
    pub fn log_or_warn(&self, message: &str) {
        if let Err(e) = self.log(message) {
            eprintln!("{}", format!("[!] Could not write run log: {:#}", e).yellow());
        }
    }

    /// Messages currently in the file, timestamps stripped
    pub fn entries(&self) -> Result<Vec<String>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read log file: {}", self.path.display()))?;
        Ok(content.lines().map(|line| strip_timestamp(line).to_string()).collect())
    }
}

fn strip_timestamp(line: &str) -> &str {
    match line.strip_prefix('[').and_then(|rest| rest.split_once("] ")) {
        Some((_, message)) => message,
        None => line,
    }
}
