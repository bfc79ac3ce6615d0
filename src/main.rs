// main.rs - reconchain - Sequential recon & attack pipeline over external tools
// Purpose: Install the toolchain, check wordlists, then drive subfinder, httpx,
//          ffuf, jwt_tool, GraphQLmap and interactsh against a single target
// License: MIT

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::path::PathBuf;
use std::time::Duration;

use reconchain::config::{
    DEFAULT_OUTPUT_DIR, DEFAULT_TARGET, DEFAULT_TOOLS_DIR, DEFAULT_WORDLIST_DIR, ScanConfig,
};
use reconchain::pipeline::{Pipeline, PipelineOptions};
use reconchain::stages::Stage;
use reconchain::tools::{check_tools_status, install_tools};

/// reconchain - Sequential Recon & Attack Pipeline
#[derive(Parser, Debug)]
#[command(
    name = "reconchain",
    version,
    about = "Install recon tooling and run a fixed recon/attack pipeline against one target",
    long_about = r#"
╔═══════════════════════════════════════════════════════════════════════════════╗
║                  RECONCHAIN - Sequential Recon & Attack Pipeline               ║
╚═══════════════════════════════════════════════════════════════════════════════╝

Stages run one after another, each shelling out to one external tool:

   1. subdomain_enum   subfinder           -> results/subdomains.json
   2. web_probe        httpx               -> results/web_alive.json
   3. dir_fuzz         ffuf                -> results/dirs.json
   4. api_fuzz         ffuf                -> results/api.json
   5. param_fuzz       ffuf                -> results/params.json
   6. jwt_attack       jwt_tool            -> results/jwt_results.json
   7. graphql_attack   GraphQLmap          -> results/graphql.json
   8. ssrf_attack      interactsh-client   -> results/ssrf.json

Every command and every failure is appended to results/log.txt.
A failing stage is logged and the pipeline moves on to the next one.

EXAMPLES:

  Full run with defaults (installs missing tools first):
    reconchain -d example.com

  Tools already present, only fuzzing stages:
    reconchain -d example.com --skip-install --only dir_fuzz --only api_fuzz

  Check which tools are installed:
    reconchain --check-tools
"#
)]
struct Args {
    // ═══════════════════════════════════════════════════════════════════════════
    // TARGET OPTIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Target domain (e.g., example.com)
    #[arg(short, long, value_name = "DOMAIN", default_value = DEFAULT_TARGET, help_heading = "Target Options")]
    domain: String,

    // ═══════════════════════════════════════════════════════════════════════════
    // DIRECTORY LAYOUT
    // ═══════════════════════════════════════════════════════════════════════════

    /// Directory receiving tool outputs and log.txt
    #[arg(long, value_name = "DIR", default_value = DEFAULT_OUTPUT_DIR, help_heading = "Directories")]
    output_dir: PathBuf,

    /// Directory holding the fuzzing wordlists
    #[arg(long, value_name = "DIR", default_value = DEFAULT_WORDLIST_DIR, help_heading = "Directories")]
    wordlist_dir: PathBuf,

    /// Directory source-installed tools are cloned into
    #[arg(long, value_name = "DIR", default_value = DEFAULT_TOOLS_DIR, help_heading = "Directories")]
    tools_dir: PathBuf,

    // ═══════════════════════════════════════════════════════════════════════════
    // PIPELINE OPTIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Run only these stages (repeatable)
    #[arg(long, value_enum, value_name = "STAGE", help_heading = "Pipeline")]
    only: Vec<Stage>,

    /// Kill a tool that runs longer than this many seconds
    #[arg(long, default_value = "0", value_name = "SECONDS", help_heading = "Pipeline",
          help = "Per-command time limit in seconds (0 = wait for the tool to exit)")]
    stage_timeout: u64,

    /// List stages with their command lines and exit
    #[arg(long, help_heading = "Pipeline")]
    list_stages: bool,

    // ═══════════════════════════════════════════════════════════════════════════
    // OUTPUT OPTIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Write run_summary.json next to the stage outputs
    #[arg(long, help_heading = "Output")]
    json: bool,

    /// Hide progress spinners
    #[arg(short, long, help_heading = "Output")]
    quiet: bool,

    // ═══════════════════════════════════════════════════════════════════════════
    // TOOL MANAGEMENT OPTIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Do not install missing tools before the pipeline
    #[arg(long, help_heading = "Tool Management")]
    skip_install: bool,

    /// Install missing tools and exit
    #[arg(long, help_heading = "Tool Management")]
    install_tools: bool,

    /// Check which tools are installed and exit
    #[arg(long, help_heading = "Tool Management")]
    check_tools: bool,
}

impl Args {
    fn scan_config(&self) -> Result<ScanConfig> {
        let mut config = ScanConfig::new(self.domain.clone());
        config.output_dir = self.output_dir.clone();
        config.wordlist_dir = self.wordlist_dir.clone();
        config.tools_dir = self.tools_dir.clone();
        config.stage_timeout = (self.stage_timeout > 0).then(|| Duration::from_secs(self.stage_timeout));
        config
            .validate()
            .with_context(|| format!("Invalid target: {}", self.domain))?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.scan_config()?;

    print_banner();

    if args.check_tools {
        check_tools_status(&config).await;
        return Ok(());
    }

    if args.install_tools {
        config.ensure_dirs()?;
        let report = install_tools(&config).await?;
        println!(
            "{}",
            format!("[+] {} installed, {} already present", report.performed(), report.skipped()).green().bold()
        );
        return Ok(());
    }

    if args.list_stages {
        list_stages(&config);
        return Ok(());
    }

    let options = PipelineOptions {
        skip_install: args.skip_install,
        only: args.only.clone(),
        quiet: args.quiet,
        write_summary: args.json,
    };

    Pipeline::new(config, options).run().await?;
    Ok(())
}

fn list_stages(config: &ScanConfig) {
    for (index, stage) in Stage::ALL.iter().enumerate() {
        println!("{}", format!("{}. {} ({})", index + 1, stage.name(), stage.title()).cyan().bold());
        println!("   {}", stage.command(config).join(" ").dimmed());
    }
}

fn print_banner() {
    println!("{}", "═══════════════════════════════════════════════════════════════".cyan().bold());
    println!("{}", "  ┏━┓┏━╸┏━╸┏━┓┏┓╻┏━╸╻ ╻┏━┓╻┏┓╻".cyan().bold());
    println!("{}", "  ┣┳┛┣╸ ┃  ┃ ┃┃┗┫┃  ┣━┫┣━┫┃┃┗┫".cyan().bold());
    println!("{}", "  ╹┗╸┗━╸┗━╸┗━┛╹ ╹┗━╸╹ ╹╹ ╹╹╹ ╹".cyan().bold());
    println!("{}", "═══════════════════════════════════════════════════════════════".cyan().bold());
    println!("{}", format!("  reconchain v{} - Sequential Recon & Attack Pipeline", env!("CARGO_PKG_VERSION")).white().bold());
    println!("{}", "  Only run against targets you are authorized to test".white());
    println!("{}", "═══════════════════════════════════════════════════════════════\n".cyan().bold());
}
