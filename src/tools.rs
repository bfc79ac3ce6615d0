// tools.rs - External tool registry, discovery and installation
// Purpose: Make sure every binary the pipeline shells out to is present,
//          installing from the distro repo or cloning from source when not

use colored::*;
use lazy_static::lazy_static;
use regex::Regex;
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

use crate::config::ScanConfig;

/// Where a missing tool comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolSource {
    /// Distro package, installed with `sudo apt install -y`
    Package(&'static str),
    /// Source repository, cloned into the tools directory
    Repository(&'static str),
}

#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: &'static str,
    pub binary: &'static str,
    pub description: &'static str,
    pub source: ToolSource,
}

/// Get list of all required tools
pub fn tool_registry() -> Vec<ToolInfo> {
    vec![
        ToolInfo {
            name: "subfinder",
            binary: "subfinder",
            description: "Passive subdomain discovery",
            source: ToolSource::Package("subfinder"),
        },
        ToolInfo {
            name: "httpx",
            binary: "httpx",
            description: "HTTP probing and validation",
            source: ToolSource::Package("httpx"),
        },
        ToolInfo {
            name: "nuclei",
            binary: "nuclei",
            description: "Template-based vulnerability scanner",
            source: ToolSource::Package("nuclei"),
        },
        ToolInfo {
            name: "ffuf",
            binary: "ffuf",
            description: "Web fuzzer (directories, API routes, parameters)",
            source: ToolSource::Package("ffuf"),
        },
        ToolInfo {
            name: "jwt_tool",
            binary: "jwt_tool",
            description: "JWT testing toolkit",
            source: ToolSource::Repository("https://github.com/ticarpi/jwt_tool"),
        },
        ToolInfo {
            name: "graphqlmap",
            binary: "graphqlmap",
            description: "GraphQL endpoint exploitation",
            source: ToolSource::Repository("https://github.com/swisskyrepo/GraphQLmap"),
        },
        ToolInfo {
            name: "interactsh",
            binary: "interactsh-client",
            description: "Out-of-band interaction listener",
            source: ToolSource::Repository("https://github.com/projectdiscovery/interactsh"),
        },
        ToolInfo {
            name: "dalfox",
            binary: "dalfox",
            description: "XSS scanner",
            source: ToolSource::Repository("https://github.com/hahwul/dalfox"),
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
// DISCOVERY
// ═══════════════════════════════════════════════════════════════════════════

/// Search for a binary on `search_path` (or the process PATH) and return its full path
pub fn discover_tool_path(binary: &str, search_path: Option<&OsStr>) -> Option<PathBuf> {
    match search_path {
        Some(path) => {
            let cwd = std::env::current_dir().ok()?;
            which::which_in(binary, Some(path), cwd).ok()
        }
        None => which::which(binary).ok(),
    }
}

lazy_static! {
    static ref RE_ANSI: Regex = Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").unwrap();
}

/// Strip ANSI escape codes from a string
pub fn strip_ansi_codes(s: &str) -> String {
    RE_ANSI.replace_all(s, "").into_owned()
}

/// Get tool version by running it with --version, then -version
pub async fn get_tool_version(binary: &Path) -> Option<String> {
    for flag in ["--version", "-version"] {
        let Ok(output) = Command::new(binary)
            .arg(flag)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
        else {
            continue;
        };
        if !output.status.success() {
            continue;
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let text = if !stdout.trim().is_empty() { stdout } else { stderr };
        if let Some(line) = text.lines().next() {
            let clean = strip_ansi_codes(line.trim());
            if !clean.is_empty() {
                return Some(clean);
            }
        }
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
// INSTALLATION
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallAction {
    AlreadyInstalled(PathBuf),
    AlreadyCloned(PathBuf),
    GitClone { url: String, dest: PathBuf },
    AptInstall { package: String },
}

impl InstallAction {
    pub fn is_noop(&self) -> bool {
        matches!(self, InstallAction::AlreadyInstalled(_) | InstallAction::AlreadyCloned(_))
    }

    /// Command line that performs the action, if any
    pub fn command(&self) -> Option<Vec<String>> {
        match self {
            InstallAction::AlreadyInstalled(_) | InstallAction::AlreadyCloned(_) => None,
            InstallAction::GitClone { url, dest } => Some(vec![
                "git".to_string(),
                "clone".to_string(),
                url.clone(),
                dest.to_string_lossy().into_owned(),
            ]),
            InstallAction::AptInstall { package } => Some(vec![
                "sudo".to_string(),
                "apt".to_string(),
                "install".to_string(),
                "-y".to_string(),
                package.clone(),
            ]),
        }
    }
}

impl fmt::Display for InstallAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallAction::AlreadyInstalled(path) => write!(f, "already installed ({})", path.display()),
            InstallAction::AlreadyCloned(path) => write!(f, "already cloned ({})", path.display()),
            InstallAction::GitClone { url, dest } => write!(f, "clone {} -> {}", url, dest.display()),
            InstallAction::AptInstall { package } => write!(f, "apt install {}", package),
        }
    }
}

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("Failed to install {tool}: '{command}' returned non-zero exit status {status}")]
    CommandFailed {
        tool: String,
        command: String,
        status: String,
    },

    #[error("Failed to install {tool}: could not run '{command}': {source}")]
    Spawn {
        tool: String,
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// What `install_tools` did for each registry entry, in registry order
#[derive(Debug, Default, Clone)]
pub struct InstallReport {
    pub actions: Vec<(String, InstallAction)>,
}

impl InstallReport {
    pub fn performed(&self) -> usize {
        self.actions.iter().filter(|(_, action)| !action.is_noop()).count()
    }

    pub fn skipped(&self) -> usize {
        self.actions.len() - self.performed()
    }
}

/// Decide what, if anything, has to happen for `tool`
pub fn plan_install(tool: &ToolInfo, config: &ScanConfig) -> InstallAction {
    if let Some(path) = discover_tool_path(tool.binary, config.search_path.as_deref()) {
        return InstallAction::AlreadyInstalled(path);
    }
    match tool.source {
        ToolSource::Repository(url) => {
            let dest = config.tool_checkout(tool.name);
            if dest.exists() {
                InstallAction::AlreadyCloned(dest)
            } else {
                InstallAction::GitClone {
                    url: url.to_string(),
                    dest,
                }
            }
        }
        ToolSource::Package(package) => InstallAction::AptInstall {
            package: package.to_string(),
        },
    }
}

/// Install every missing tool; the first failing install aborts the run
pub async fn install_tools(config: &ScanConfig) -> Result<InstallReport, InstallError> {
    let mut report = InstallReport::default();

    for tool in tool_registry() {
        let action = plan_install(&tool, config);

        if let Some(command) = action.command() {
            println!("{}", format!("📦 Installing {} ({})...", tool.name, action).cyan().bold());
            run_install_command(&tool, &command, config).await?;
            let origin = match tool.source {
                ToolSource::Package(_) => "from distro repo",
                ToolSource::Repository(_) => "from source",
            };
            println!("{}", format!("   ✓ Installed {} {}", tool.name, origin).green());
        } else {
            println!("{}", format!("⏭️  {} - {}, skipping", tool.name, action).dimmed());
        }

        report.actions.push((tool.name.to_string(), action));
    }

    Ok(report)
}

async fn run_install_command(
    tool: &ToolInfo,
    command: &[String],
    config: &ScanConfig,
) -> Result<(), InstallError> {
    let rendered = command.join(" ");
    let spawn_error = |source| InstallError::Spawn {
        tool: tool.name.to_string(),
        command: rendered.clone(),
        source,
    };

    let (program, args) = command
        .split_first()
        .ok_or_else(|| spawn_error(std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command")))?;

    let resolved = discover_tool_path(program, config.search_path.as_deref())
        .ok_or_else(|| spawn_error(std::io::Error::new(std::io::ErrorKind::NotFound, format!("{} not found", program))))?;

    let mut cmd = Command::new(resolved);
    cmd.args(args);
    if let Some(ref path) = config.search_path {
        cmd.env("PATH", path);
    }

    let status = cmd.status().await.map_err(spawn_error)?;
    if status.success() {
        Ok(())
    } else {
        Err(InstallError::CommandFailed {
            tool: tool.name.to_string(),
            command: rendered.clone(),
            status: status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "(terminated by signal)".to_string()),
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// STATUS
// ═══════════════════════════════════════════════════════════════════════════

/// Where a registry tool stands right now
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolStatus {
    Installed { path: PathBuf, version: Option<String> },
    /// Checkout present in the tools directory but no binary on PATH
    Cloned(PathBuf),
    /// What `install_tools` would do about it
    Missing(InstallAction),
}

/// Classify every registry tool, querying versions of the installed ones
pub async fn tool_statuses(config: &ScanConfig) -> Vec<(ToolInfo, ToolStatus)> {
    let mut statuses = Vec::new();
    for tool in tool_registry() {
        let status = match plan_install(&tool, config) {
            InstallAction::AlreadyInstalled(path) => {
                let version = get_tool_version(&path).await;
                ToolStatus::Installed { path, version }
            }
            InstallAction::AlreadyCloned(path) => ToolStatus::Cloned(path),
            action => ToolStatus::Missing(action),
        };
        statuses.push((tool, status));
    }
    statuses
}

/// Check and display status of all tools
pub async fn check_tools_status(config: &ScanConfig) -> usize {
    println!("{}", "╔══════════════════════════════════════════════════════════════════════════════╗".cyan().bold());
    println!("{}", "║                         RECONCHAIN - TOOL STATUS                             ║".cyan().bold());
    println!("{}", "╚══════════════════════════════════════════════════════════════════════════════╝".cyan().bold());
    println!();

    let mut missing = 0;
    for (tool, status) in tool_statuses(config).await {
        match status {
            ToolStatus::Installed { path, version } => {
                let version = version.unwrap_or_else(|| "version unknown".to_string());
                println!("{} {:<12} {}", "✓".green().bold(), tool.name.green(), version.dimmed());
                println!("    {}", path.display().to_string().dimmed());
            }
            ToolStatus::Cloned(path) => {
                println!("{} {:<12} {}", "◐".yellow().bold(), tool.name.yellow(), "cloned, not on PATH".dimmed());
                println!("    {}", path.display().to_string().dimmed());
            }
            ToolStatus::Missing(action) => {
                missing += 1;
                println!("{} {:<12} {}", "✗".red().bold(), tool.name.red(), tool.description.dimmed());
                println!("    {}", format!("would {}", action).dimmed());
            }
        }
    }

    println!();
    if missing == 0 {
        println!("{}", "[+] All tools available.".green().bold());
    } else {
        println!("{}", format!("[!] {} tool(s) missing. Run with --install-tools.", missing).yellow().bold());
    }
    missing
}
