// artifacts.rs - Lightweight inspection of the JSON files tools leave behind
// Purpose: Report size and record count per stage artifact; contents are never
//          fed back into the pipeline

use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ArtifactSummary {
    pub path: PathBuf,
    pub exists: bool,
    pub bytes: u64,
    pub records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
}

impl ArtifactSummary {
    fn absent(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            exists: false,
            bytes: 0,
            records: 0,
            parse_error: None,
        }
    }
}

/// Inspect a JSON document or JSON Lines file
pub fn inspect_artifact(path: &Path) -> ArtifactSummary {
    let mut summary = ArtifactSummary::absent(path);

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return summary,
        Err(e) => {
            summary.exists = path.exists();
            summary.parse_error = Some(e.to_string());
            return summary;
        }
    };

    summary.exists = true;
    summary.bytes = content.len() as u64;

    match count_records(&content) {
        Ok(records) => summary.records = records,
        Err(e) => summary.parse_error = Some(e),
    }
    summary
}

/// Number of findings in `content`
///
/// A whole-file document wins over line splitting, so pretty-printed JSON is
/// read as one value. Arrays count their elements, ffuf-style objects count
/// their `results` array, and anything else counts once.
pub fn count_records(content: &str) -> Result<usize, String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(records_in(&value));
    }

    let mut records = 0;
    for (index, line) in trimmed.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        serde_json::from_str::<Value>(line).map_err(|e| format!("line {}: {}", index + 1, e))?;
        records += 1;
    }
    Ok(records)
}

fn records_in(value: &Value) -> usize {
    match value {
        Value::Array(items) => items.len(),
        Value::Object(map) => match map.get("results") {
            Some(Value::Array(items)) => items.len(),
            _ => 1,
        },
        Value::Null => 0,
        _ => 1,
    }
}
