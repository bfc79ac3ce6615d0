//! End-to-end pipeline runs against stub tools placed on a private PATH
#![cfg(unix)]

use std::ffi::OsString;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use reconchain::config::{ScanConfig, WordlistKind};
use reconchain::pipeline::{Pipeline, PipelineOptions};
use reconchain::runner::CommandRunner;
use reconchain::stages::{self, Stage};
use reconchain::tools::{InstallAction, install_tools};
use reconchain::StageStatus;

/// Writes `{}` into the file named by the last argument, like `-o <file>`
const WRITES_OUTPUT: &str = r#"for last; do :; done
echo '{"stub":true}' > "$last""#;

const STAGE_TOOLS: [&str; 6] = ["subfinder", "httpx", "ffuf", "jwt_tool", "python3", "interactsh-client"];
const PACKAGE_TOOLS: [&str; 4] = ["subfinder", "httpx", "nuclei", "ffuf"];
const REPO_BINARIES: [&str; 4] = ["jwt_tool", "graphqlmap", "interactsh-client", "dalfox"];

struct Workspace {
    _tmp: tempfile::TempDir,
    bin: PathBuf,
    config: ScanConfig,
}

impl Workspace {
    fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let bin = tmp.path().join("bin");
        fs::create_dir_all(&bin).unwrap();

        let mut config = ScanConfig::rooted_at("example.com", tmp.path());
        let mut path = OsString::from(bin.as_os_str());
        path.push(":/usr/bin:/bin");
        config.search_path = Some(path);
        config.ensure_dirs().unwrap();

        Self { _tmp: tmp, bin, config }
    }

    fn stub(&self, name: &str, body: &str) {
        let path = self.bin.join(name);
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn with_wordlists(self) -> Self {
        for kind in WordlistKind::ALL {
            fs::write(self.config.wordlist_file(kind), "admin\nlogin\n").unwrap();
        }
        self
    }

    fn with_stage_tools(self) -> Self {
        for tool in STAGE_TOOLS {
            self.stub(tool, WRITES_OUTPUT);
        }
        self
    }

    fn log_entries(&self) -> Vec<String> {
        reconchain::RunLog::open(self.config.log_file())
            .unwrap()
            .entries()
            .unwrap()
    }
}

fn skip_install() -> PipelineOptions {
    PipelineOptions {
        skip_install: true,
        quiet: true,
        ..Default::default()
    }
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn full_run_with_successful_tools() {
    let ws = Workspace::new().with_wordlists().with_stage_tools();

    let summary = Pipeline::new(ws.config.clone(), skip_install()).run().await.unwrap();

    let entries = ws.log_entries();
    assert_eq!(entries.len(), 8, "log: {:#?}", entries);
    for (entry, stage) in entries.iter().zip(Stage::ALL) {
        assert_eq!(entry, &format!("Running: {}", stage.command(&ws.config).join(" ")));
    }

    let mut expected: Vec<String> = Stage::ALL.iter().map(|s| s.output_file().to_string()).collect();
    expected.push("log.txt".to_string());
    expected.sort();
    assert_eq!(file_names(&ws.config.output_dir), expected);

    assert_eq!(summary.stages.len(), 8);
    for report in &summary.stages {
        assert_eq!(report.status, StageStatus::Empty, "{}", report.stage);
        let artifact = report.artifact.as_ref().unwrap();
        assert!(artifact.exists);
        assert_eq!(artifact.records, 1);
    }
    assert!(summary.missing_wordlists.is_empty());
}

#[tokio::test]
async fn failing_tool_is_logged_and_pipeline_continues() {
    let ws = Workspace::new().with_wordlists().with_stage_tools();
    ws.stub("ffuf", "echo 'ffuf: connection refused' >&2\nexit 1");

    let summary = Pipeline::new(ws.config.clone(), skip_install()).run().await.unwrap();

    let entries = ws.log_entries();
    let running = entries.iter().filter(|e| e.starts_with("Running: ")).count();
    let errors: Vec<_> = entries.iter().filter(|e| e.starts_with("Error: ")).collect();
    assert_eq!(running, 8);
    assert_eq!(errors.len(), 3);
    assert!(errors.iter().all(|e| e.contains("returned non-zero exit status 1")));

    let status_of = |stage: Stage| {
        summary
            .stages
            .iter()
            .find(|r| r.stage == stage.name())
            .map(|r| r.status.clone())
            .unwrap()
    };
    assert!(matches!(status_of(Stage::DirFuzz), StageStatus::Failed(_)));
    assert!(matches!(status_of(Stage::ParamFuzz), StageStatus::Failed(_)));
    assert_eq!(status_of(Stage::JwtAttack), StageStatus::Empty);
    assert_eq!(status_of(Stage::SsrfProbe), StageStatus::Empty);
    assert_eq!(summary.failed(), 3);
}

/// Dispatch to the per-stage function rather than `run_stage`
async fn call_stage_function(stage: Stage, runner: &CommandRunner, config: &ScanConfig) -> String {
    match stage {
        Stage::SubdomainEnum => stages::subdomain_enum(runner, config).await,
        Stage::WebProbe => stages::web_probe(runner, config).await,
        Stage::DirFuzz => stages::dir_fuzz(runner, config).await,
        Stage::ApiFuzz => stages::api_fuzz(runner, config).await,
        Stage::ParamFuzz => stages::param_fuzz(runner, config).await,
        Stage::JwtAttack => stages::jwt_attack(runner, config).await,
        Stage::GraphqlAttack => stages::graphql_attack(runner, config).await,
        Stage::SsrfProbe => stages::ssrf_attack(runner, config).await,
    }
}

#[tokio::test]
async fn every_stage_function_logs_once_and_returns_stdout() {
    let ws = Workspace::new().with_wordlists();
    for tool in STAGE_TOOLS {
        ws.stub(tool, &format!("echo {}", tool));
    }

    let runner = CommandRunner::new(
        reconchain::RunLog::open(ws.config.log_file()).unwrap(),
        ws.config.search_path.clone(),
        None,
    );

    for (index, stage) in Stage::ALL.into_iter().enumerate() {
        let out = call_stage_function(stage, &runner, &ws.config).await;
        assert_eq!(out, format!("{}\n", stage.tool()), "{}", stage);

        let entries = ws.log_entries();
        assert_eq!(entries.len(), index + 1, "{}", stage);
        assert_eq!(
            entries[index],
            format!("Running: {}", stage.command(&ws.config).join(" "))
        );
    }
}

#[tokio::test]
async fn every_stage_function_returns_empty_and_logs_error_on_failure() {
    let ws = Workspace::new().with_wordlists();
    for tool in STAGE_TOOLS {
        ws.stub(tool, "echo partial\nexit 1");
    }

    let runner = CommandRunner::new(
        reconchain::RunLog::open(ws.config.log_file()).unwrap(),
        ws.config.search_path.clone(),
        None,
    );

    for (index, stage) in Stage::ALL.into_iter().enumerate() {
        assert_eq!(call_stage_function(stage, &runner, &ws.config).await, "", "{}", stage);

        let entries = ws.log_entries();
        assert_eq!(entries.len(), 2 * (index + 1), "{}", stage);
        let rendered = stage.command(&ws.config).join(" ");
        assert_eq!(entries[2 * index], format!("Running: {}", rendered));
        assert_eq!(
            entries[2 * index + 1],
            format!("Error: Command '{}' returned non-zero exit status 1", rendered)
        );
    }
}

#[tokio::test]
async fn whitespace_only_stdout_is_empty_with_raw_byte_count() {
    let ws = Workspace::new().with_wordlists();
    ws.stub("jwt_tool", "echo '   '");
    let options = PipelineOptions {
        only: vec![Stage::JwtAttack],
        ..skip_install()
    };

    let summary = Pipeline::new(ws.config.clone(), options).run().await.unwrap();

    let report = &summary.stages[5];
    assert_eq!(report.stage, "jwt_attack");
    assert_eq!(report.status, StageStatus::Empty);
    assert_eq!(report.stdout_bytes, 4);
}

#[tokio::test]
async fn stage_functions_return_stdout_or_empty() {
    use reconchain::stages::{dir_fuzz, subdomain_enum};

    let ws = Workspace::new().with_wordlists();
    ws.stub("subfinder", "echo a.example.com");
    ws.stub("ffuf", "exit 2");

    let log = reconchain::RunLog::open(ws.config.log_file()).unwrap();
    let runner = CommandRunner::new(log, ws.config.search_path.clone(), None);

    assert_eq!(subdomain_enum(&runner, &ws.config).await, "a.example.com\n");
    assert_eq!(dir_fuzz(&runner, &ws.config).await, "");

    let entries = ws.log_entries();
    assert_eq!(entries.len(), 3);
    assert!(entries[0].starts_with("Running: subfinder -d example.com"));
    assert!(entries[1].starts_with("Running: ffuf -w"));
    assert!(entries[2].starts_with("Error: "));
}

#[tokio::test]
async fn only_runs_selected_stages() {
    let ws = Workspace::new().with_wordlists().with_stage_tools();
    let options = PipelineOptions {
        only: vec![Stage::JwtAttack],
        write_summary: true,
        ..skip_install()
    };

    let summary = Pipeline::new(ws.config.clone(), options).run().await.unwrap();

    assert_eq!(ws.log_entries().len(), 1);
    assert_eq!(summary.count("not run"), 7);
    assert!(ws.config.output_file("jwt_results.json").exists());
    assert!(!ws.config.output_file("subdomains.json").exists());

    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(ws.config.summary_file()).unwrap()).unwrap();
    assert_eq!(saved["stages"].as_array().unwrap().len(), 8);
    assert_eq!(saved["stages"][5]["stage"], "jwt_attack");
    assert_eq!(saved["stages"][5]["status"], "empty");
}

#[tokio::test]
async fn missing_wordlist_does_not_block_run() {
    let ws = Workspace::new().with_wordlists().with_stage_tools();
    fs::remove_file(ws.config.wordlist_file(WordlistKind::Directories)).unwrap();

    let summary = Pipeline::new(ws.config.clone(), skip_install()).run().await.unwrap();

    assert_eq!(summary.missing_wordlists.len(), 1);
    assert!(summary.missing_wordlists[0].ends_with("directories.txt"));
    assert_eq!(summary.stages.len(), 8);
}

#[tokio::test]
async fn install_skips_tools_already_on_path() {
    let ws = Workspace::new();
    for binary in PACKAGE_TOOLS.iter().chain(REPO_BINARIES.iter()) {
        ws.stub(binary, "exit 0");
    }
    ws.stub("sudo", "exit 99");
    ws.stub("git", "exit 99");

    let report = install_tools(&ws.config).await.unwrap();
    assert_eq!(report.actions.len(), 8);
    assert_eq!(report.performed(), 0);
    assert!(
        report
            .actions
            .iter()
            .all(|(_, action)| matches!(action, InstallAction::AlreadyInstalled(_)))
    );
}

#[tokio::test]
async fn install_clones_once_then_is_idempotent() {
    let ws = Workspace::new();
    for binary in PACKAGE_TOOLS {
        ws.stub(binary, "exit 0");
    }
    ws.stub("git", "for last; do :; done\nmkdir -p \"$last\"");
    ws.stub("sudo", "exit 99");

    let first = install_tools(&ws.config).await.unwrap();
    assert_eq!(first.performed(), 4);
    for name in ["jwt_tool", "graphqlmap", "interactsh", "dalfox"] {
        assert!(ws.config.tool_checkout(name).is_dir(), "{} not cloned", name);
    }

    // git now fails: a second clone attempt would abort the run
    ws.stub("git", "exit 128");
    let second = install_tools(&ws.config).await.unwrap();
    assert_eq!(second.performed(), 0);
    assert!(
        second
            .actions
            .iter()
            .filter(|(name, _)| name == "dalfox")
            .all(|(_, action)| matches!(action, InstallAction::AlreadyCloned(_)))
    );
}

#[tokio::test]
async fn failed_install_aborts_before_any_stage() {
    let ws = Workspace::new().with_wordlists().with_stage_tools();
    ws.stub("sudo", "exit 100");

    let options = PipelineOptions {
        quiet: true,
        ..Default::default()
    };
    let err = Pipeline::new(ws.config.clone(), options).run().await.unwrap_err();

    assert!(format!("{:#}", err).contains("nuclei"));
    assert!(!ws.config.log_file().exists());
}
