use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Activity log entry (JSONL)
// ---------------------------------------------------------------------------

/// A single line in `~/.ragboard/activity.jsonl`.
///
/// One entry per backend request the runtime executed, written after the
/// request resolved. Read back by the reporter for `ragboard activity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub timestamp: String,
    /// Operation name, e.g. `"list_runs"` or `"auto_tune"`.
    pub operation: String,
    /// Identifier the request was about (run id, question prefix), or empty.
    #[serde(default)]
    pub target: String,
    pub success: bool,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

impl ActivityEntry {
    /// Build an entry stamped with the current time.
    pub fn now(
        operation: &str,
        target: &str,
        latency_ms: u64,
        error: Option<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            operation: operation.to_string(),
            target: target.to_string(),
            success: error.is_none(),
            latency_ms,
            error,
        }
    }
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Append an entry to the activity log. Best-effort: failures are ignored.
pub fn log_activity(entry: &ActivityEntry) {
    let _ = append_entry(entry);
}

fn append_entry(entry: &ActivityEntry) -> Result<()> {
    let Some(path) = activity_log_path() else {
        return Ok(());
    };

    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(entry)?;
    writeln!(file, "{json}")?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Read all entries. Malformed lines are skipped; a missing file yields an
/// empty vec.
pub fn read_all_entries() -> Vec<ActivityEntry> {
    let Some(path) = activity_log_path() else {
        return Vec::new();
    };

    let Ok(file) = fs::File::open(path) else {
        return Vec::new();
    };

    BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .filter_map(|line| serde_json::from_str::<ActivityEntry>(&line).ok())
        .collect()
}

/// Read entries from the last `days` days, or all entries for `None`.
pub fn read_entries_since_days(days: Option<u32>) -> Vec<ActivityEntry> {
    let entries = read_all_entries();

    let Some(days) = days else {
        return entries;
    };

    let cutoff = (Utc::now() - chrono::Duration::days(i64::from(days))).to_rfc3339();

    entries
        .into_iter()
        .filter(|e| e.timestamp >= cutoff)
        .collect()
}

/// Path of the activity log file.
pub fn activity_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".ragboard").join("activity.jsonl"))
}
