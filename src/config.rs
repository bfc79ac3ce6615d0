// config.rs - Run configuration for reconchain
// Purpose: Target, directory layout and wordlist names shared by every stage

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_TARGET: &str = "example.com";
pub const DEFAULT_OUTPUT_DIR: &str = "./results";
pub const DEFAULT_WORDLIST_DIR: &str = "./wordlists";
pub const DEFAULT_TOOLS_DIR: &str = "./tools";
pub const LOG_FILE_NAME: &str = "log.txt";
pub const SUMMARY_FILE_NAME: &str = "run_summary.json";

lazy_static! {
    // Letters, digits, dots and hyphens, no leading/trailing punctuation, optional :port
    static ref RE_HOST: Regex =
        Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9.-]*[A-Za-z0-9])?(?::[0-9]{1,5})?$").unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════
// WORDLISTS
// ═══════════════════════════════════════════════════════════════════════════

/// Wordlists expected under the wordlist directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WordlistKind {
    Subdomains,
    Directories,
    Params,
    ApiFuzz,
    JwtSecrets,
}

impl WordlistKind {
    pub const ALL: [WordlistKind; 5] = [
        WordlistKind::Subdomains,
        WordlistKind::Directories,
        WordlistKind::Params,
        WordlistKind::ApiFuzz,
        WordlistKind::JwtSecrets,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            WordlistKind::Subdomains => "subdomains",
            WordlistKind::Directories => "directories",
            WordlistKind::Params => "params",
            WordlistKind::ApiFuzz => "api_fuzz",
            WordlistKind::JwtSecrets => "jwt_secrets",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            WordlistKind::Subdomains => "subdomains.txt",
            WordlistKind::Directories => "directories.txt",
            WordlistKind::Params => "params.txt",
            WordlistKind::ApiFuzz => "api_fuzz.txt",
            WordlistKind::JwtSecrets => "jwt_secrets.txt",
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// SCAN CONFIG
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TargetError {
    #[error("target is empty")]
    Empty,
    #[error("target contains whitespace: {0:?}")]
    Whitespace(String),
    #[error("target must be a bare hostname, got {0:?}")]
    NotAHost(String),
}

/// Immutable settings for one run
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub target: String,
    pub output_dir: PathBuf,
    pub wordlist_dir: PathBuf,
    pub tools_dir: PathBuf,
    /// PATH used to locate and spawn tools (None = inherit the process PATH)
    pub search_path: Option<OsString>,
    /// Per-command time limit (None = wait for the tool to exit)
    pub stage_timeout: Option<Duration>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET)
    }
}

impl ScanConfig {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            wordlist_dir: PathBuf::from(DEFAULT_WORDLIST_DIR),
            tools_dir: PathBuf::from(DEFAULT_TOOLS_DIR),
            search_path: None,
            stage_timeout: None,
        }
    }

    /// Lay every directory out under `base`
    pub fn rooted_at(target: impl Into<String>, base: &Path) -> Self {
        Self {
            output_dir: base.join("results"),
            wordlist_dir: base.join("wordlists"),
            tools_dir: base.join("tools"),
            ..Self::new(target)
        }
    }

    /// Normalise the target in place and reject anything that is not a hostname
    pub fn validate(&mut self) -> Result<(), TargetError> {
        self.target = normalize_target(&self.target)?;
        Ok(())
    }

    pub fn log_file(&self) -> PathBuf {
        self.output_dir.join(LOG_FILE_NAME)
    }

    pub fn summary_file(&self) -> PathBuf {
        self.output_dir.join(SUMMARY_FILE_NAME)
    }

    pub fn output_file(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }

    pub fn wordlist_file(&self, kind: WordlistKind) -> PathBuf {
        self.wordlist_dir.join(kind.file_name())
    }

    pub fn tool_checkout(&self, name: &str) -> PathBuf {
        self.tools_dir.join(name)
    }

    /// Create output, wordlist and tools directories (no-op when present)
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.output_dir, &self.wordlist_dir, &self.tools_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        Ok(())
    }
}

/// Accepts `host[:port]`, `https://host[:port]` or `https://host[:port]/` and returns `host[:port]`.
/// Option-like strings, userinfo, queries and fragments are rejected: the value lands
/// verbatim in tool argv and in `https://{target}/...` URLs.
pub fn normalize_target(raw: &str) -> Result<String, TargetError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TargetError::Empty);
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err(TargetError::Whitespace(trimmed.to_string()));
    }

    let host = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed)
        .trim_end_matches('/');

    if !RE_HOST.is_match(host) {
        return Err(TargetError::NotAHost(trimmed.to_string()));
    }

    Ok(host.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_layout() {
        let config = ScanConfig::default();
        assert_eq!(config.target, "example.com");
        assert_eq!(config.log_file(), PathBuf::from("./results/log.txt"));
        assert_eq!(
            config.wordlist_file(WordlistKind::ApiFuzz),
            PathBuf::from("./wordlists/api_fuzz.txt")
        );
        assert_eq!(config.tool_checkout("graphqlmap"), PathBuf::from("./tools/graphqlmap"));
    }

    #[test]
    fn test_normalize_target() {
        assert_eq!(normalize_target("example.com").unwrap(), "example.com");
        assert_eq!(normalize_target("https://example.com/").unwrap(), "example.com");
        assert_eq!(normalize_target("http://sub.example.com").unwrap(), "sub.example.com");
        assert_eq!(normalize_target("  "), Err(TargetError::Empty));
        assert!(matches!(normalize_target("exa mple.com"), Err(TargetError::Whitespace(_))));
        assert!(matches!(normalize_target("https://example.com/path"), Err(TargetError::NotAHost(_))));
        assert!(matches!(normalize_target("ftp://example.com"), Err(TargetError::NotAHost(_))));
        assert_eq!(normalize_target("example.com:8443").unwrap(), "example.com:8443");
        assert_eq!(normalize_target("https://10.0.0.5:8080/").unwrap(), "10.0.0.5:8080");
    }

    #[test]
    fn test_normalize_target_rejects_argv_and_url_injection() {
        for raw in [
            "-all",
            "--help",
            "example.com?x=1",
            "example.com#frag",
            "user@evil.com",
            "https://user@evil.com/",
            "example.com:",
            "example.com:port",
            ".example.com",
            "example.com-",
            "exa_mple.com",
        ] {
            assert!(
                matches!(normalize_target(raw), Err(TargetError::NotAHost(_))),
                "{:?} should be rejected",
                raw
            );
        }
    }

    #[test]
    fn test_ensure_dirs_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let config = ScanConfig::rooted_at("example.com", tmp.path());
        config.ensure_dirs().unwrap();
        config.ensure_dirs().unwrap();
        assert!(config.output_dir.is_dir());
        assert!(config.wordlist_dir.is_dir());
        assert!(config.tools_dir.is_dir());
    }
}
