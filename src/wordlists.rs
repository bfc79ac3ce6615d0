// wordlists.rs - Wordlist presence check (warn only, never blocks the run)

use colored::*;
use std::path::PathBuf;

use crate::config::{ScanConfig, WordlistKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingWordlist {
    pub kind: WordlistKind,
    pub path: PathBuf,
}

impl MissingWordlist {
    pub fn warning(&self) -> String {
        format!("[!] Missing {} wordlist: {}", self.kind.key(), self.path.display())
    }
}

/// Missing wordlists in declaration order, without printing anything
pub fn missing_wordlists(config: &ScanConfig) -> Vec<MissingWordlist> {
    WordlistKind::ALL
        .iter()
        .map(|&kind| MissingWordlist {
            kind,
            path: config.wordlist_file(kind),
        })
        .filter(|entry| !entry.path.exists())
        .collect()
}

/// Print one warning per missing wordlist and return them
pub fn check_wordlists(config: &ScanConfig) -> Vec<MissingWordlist> {
    let missing = missing_wordlists(config);
    for entry in &missing {
        println!("{}", entry.warning().yellow());
    }
    missing
}
