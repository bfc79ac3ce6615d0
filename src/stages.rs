// stages.rs - The eight recon/attack stages and their fixed command lines
// Purpose: Declarative stage table (tool, arguments, input and output artifacts)
//          plus one thin function per stage that hands the command to the runner

use clap::ValueEnum;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::{ScanConfig, WordlistKind};
use crate::runner::CommandRunner;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum)]
pub enum Stage {
    #[value(name = "subdomain_enum")]
    SubdomainEnum,
    #[value(name = "web_probe")]
    WebProbe,
    #[value(name = "dir_fuzz")]
    DirFuzz,
    #[value(name = "api_fuzz")]
    ApiFuzz,
    #[value(name = "param_fuzz")]
    ParamFuzz,
    #[value(name = "jwt_attack")]
    JwtAttack,
    #[value(name = "graphql_attack")]
    GraphqlAttack,
    #[value(name = "ssrf_attack")]
    SsrfProbe,
}

/// Something a stage reads before it runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageInput {
    Wordlist(WordlistKind, PathBuf),
    /// Artifact written by an earlier stage
    Artifact(Stage, PathBuf),
    /// Script inside a cloned tool checkout
    Checkout(&'static str, PathBuf),
}

impl StageInput {
    pub fn path(&self) -> &Path {
        match self {
            StageInput::Wordlist(_, path) | StageInput::Artifact(_, path) | StageInput::Checkout(_, path) => path,
        }
    }
}

impl Stage {
    /// Execution order
    pub const ALL: [Stage; 8] = [
        Stage::SubdomainEnum,
        Stage::WebProbe,
        Stage::DirFuzz,
        Stage::ApiFuzz,
        Stage::ParamFuzz,
        Stage::JwtAttack,
        Stage::GraphqlAttack,
        Stage::SsrfProbe,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::SubdomainEnum => "subdomain_enum",
            Stage::WebProbe => "web_probe",
            Stage::DirFuzz => "dir_fuzz",
            Stage::ApiFuzz => "api_fuzz",
            Stage::ParamFuzz => "param_fuzz",
            Stage::JwtAttack => "jwt_attack",
            Stage::GraphqlAttack => "graphql_attack",
            Stage::SsrfProbe => "ssrf_attack",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Stage::SubdomainEnum => "SUBDOMAIN ENUMERATION",
            Stage::WebProbe => "WEB PROBING",
            Stage::DirFuzz => "DIRECTORY BRUTE-FORCE",
            Stage::ApiFuzz => "API FUZZING",
            Stage::ParamFuzz => "PARAMETER DISCOVERY",
            Stage::JwtAttack => "JWT SECRET BRUTE-FORCE",
            Stage::GraphqlAttack => "GRAPHQL EXPLOITATION",
            Stage::SsrfProbe => "SSRF OUT-OF-BAND LISTENER",
        }
    }

    /// Binary the stage shells out to (first element of the command line)
    pub fn tool(&self) -> &'static str {
        match self {
            Stage::SubdomainEnum => "subfinder",
            Stage::WebProbe => "httpx",
            Stage::DirFuzz | Stage::ApiFuzz | Stage::ParamFuzz => "ffuf",
            Stage::JwtAttack => "jwt_tool",
            Stage::GraphqlAttack => "python3",
            Stage::SsrfProbe => "interactsh-client",
        }
    }

    pub fn output_file(&self) -> &'static str {
        match self {
            Stage::SubdomainEnum => "subdomains.json",
            Stage::WebProbe => "web_alive.json",
            Stage::DirFuzz => "dirs.json",
            Stage::ApiFuzz => "api.json",
            Stage::ParamFuzz => "params.json",
            Stage::JwtAttack => "jwt_results.json",
            Stage::GraphqlAttack => "graphql.json",
            Stage::SsrfProbe => "ssrf.json",
        }
    }

    pub fn output_path(&self, config: &ScanConfig) -> PathBuf {
        config.output_file(self.output_file())
    }

    pub fn inputs(&self, config: &ScanConfig) -> Vec<StageInput> {
        let wordlist = |kind| StageInput::Wordlist(kind, config.wordlist_file(kind));
        match self {
            Stage::SubdomainEnum | Stage::JwtAttack | Stage::SsrfProbe => Vec::new(),
            Stage::WebProbe => vec![StageInput::Artifact(
                Stage::SubdomainEnum,
                Stage::SubdomainEnum.output_path(config),
            )],
            Stage::DirFuzz => vec![wordlist(WordlistKind::Directories)],
            Stage::ApiFuzz => vec![wordlist(WordlistKind::ApiFuzz)],
            Stage::ParamFuzz => vec![wordlist(WordlistKind::Params)],
            Stage::GraphqlAttack => vec![StageInput::Checkout("graphqlmap", graphqlmap_script(config))],
        }
    }

    /// Inputs that do not exist on disk right now
    pub fn missing_inputs(&self, config: &ScanConfig) -> Vec<StageInput> {
        self.inputs(config)
            .into_iter()
            .filter(|input| !input.path().exists())
            .collect()
    }

    pub fn command(&self, config: &ScanConfig) -> Vec<String> {
        let target = &config.target;
        let out = path_arg(self.output_path(config));
        let wordlist = |kind| path_arg(config.wordlist_file(kind));

        match self {
            Stage::SubdomainEnum => vec![
                "subfinder".into(), "-d".into(), target.clone(), "-all".into(), "-oJ".into(), out,
            ],
            Stage::WebProbe => vec![
                "httpx".into(),
                "-l".into(),
                path_arg(Stage::SubdomainEnum.output_path(config)),
                "-status-code".into(),
                "-title".into(),
                "-tech-detect".into(),
                "-oJ".into(),
                out,
            ],
            Stage::DirFuzz => vec![
                "ffuf".into(),
                "-w".into(),
                wordlist(WordlistKind::Directories),
                "-u".into(),
                format!("https://{}/FUZZ", target),
                "-recursion".into(),
                "-fc".into(),
                "403,404".into(),
                "-mc".into(),
                "200,301,302".into(),
                "-o".into(),
                out,
            ],
            Stage::ApiFuzz => vec![
                "ffuf".into(),
                "-w".into(),
                wordlist(WordlistKind::ApiFuzz),
                "-u".into(),
                format!("https://{}/api/FUZZ", target),
                "-recursion".into(),
                "-fc".into(),
                "403,404".into(),
                "-mc".into(),
                "200,201,202,301,302".into(),
                "-o".into(),
                out,
            ],
            Stage::ParamFuzz => vec![
                "ffuf".into(),
                "-w".into(),
                wordlist(WordlistKind::Params),
                "-u".into(),
                format!("https://{}/?FUZZ=1", target),
                "-mc".into(),
                "200,302".into(),
                "-o".into(),
                out,
            ],
            Stage::JwtAttack => vec![
                "jwt_tool".into(), "-t".into(), format!("https://{}", target), "-brute".into(), "-o".into(), out,
            ],
            Stage::GraphqlAttack => vec![
                "python3".into(),
                path_arg(graphqlmap_script(config)),
                "-u".into(),
                format!("https://{}/graphql", target),
                "--json".into(),
                out,
            ],
            Stage::SsrfProbe => vec!["interactsh-client".into(), "-json".into(), "-o".into(), out],
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn graphqlmap_script(config: &ScanConfig) -> PathBuf {
    config.tool_checkout("graphqlmap").join("graphqlmap.py")
}

fn path_arg(path: PathBuf) -> String {
    path.to_string_lossy().into_owned()
}

// ═══════════════════════════════════════════════════════════════════════════
// STAGE FUNCTIONS
// ═══════════════════════════════════════════════════════════════════════════

pub async fn run_stage(stage: Stage, runner: &CommandRunner, config: &ScanConfig) -> String {
    runner.run(&stage.command(config)).await
}

/// Subdomain enumeration
pub async fn subdomain_enum(runner: &CommandRunner, config: &ScanConfig) -> String {
    run_stage(Stage::SubdomainEnum, runner, config).await
}

/// Web probing
pub async fn web_probe(runner: &CommandRunner, config: &ScanConfig) -> String {
    run_stage(Stage::WebProbe, runner, config).await
}

/// Directory brute-force
pub async fn dir_fuzz(runner: &CommandRunner, config: &ScanConfig) -> String {
    run_stage(Stage::DirFuzz, runner, config).await
}

/// API fuzzing
pub async fn api_fuzz(runner: &CommandRunner, config: &ScanConfig) -> String {
    run_stage(Stage::ApiFuzz, runner, config).await
}

/// Parameter discovery
pub async fn param_fuzz(runner: &CommandRunner, config: &ScanConfig) -> String {
    run_stage(Stage::ParamFuzz, runner, config).await
}

/// JWT token brute-force
pub async fn jwt_attack(runner: &CommandRunner, config: &ScanConfig) -> String {
    run_stage(Stage::JwtAttack, runner, config).await
}

/// GraphQL exploitation
pub async fn graphql_attack(runner: &CommandRunner, config: &ScanConfig) -> String {
    run_stage(Stage::GraphqlAttack, runner, config).await
}

/// SSRF testing
pub async fn ssrf_attack(runner: &CommandRunner, config: &ScanConfig) -> String {
    run_stage(Stage::SsrfProbe, runner, config).await
}
