//! Aggregation over the activity log for `ragboard activity`.

use std::collections::HashMap;

use crate::activity::logger::{self, ActivityEntry};

/// Per-operation summary.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationStat {
    pub operation: String,
    pub count: usize,
    pub failures: usize,
    pub avg_latency_ms: f64,
    pub max_latency_ms: u64,
    /// Most recent error message, if any request failed.
    pub last_error: Option<String>,
}

impl OperationStat {
    /// Failure percentage, 0.0 when there were no requests.
    pub fn failure_pct(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            (self.failures as f64 / self.count as f64) * 100.0
        }
    }
}

/// Summarize the activity log, optionally limited to the last `days` days.
pub fn compute_operation_stats(days: Option<u32>) -> Vec<OperationStat> {
    let entries = logger::read_entries_since_days(days);
    build_operation_stats(&entries)
}

/// Group entries by operation. Sorted by request count, busiest first.
fn build_operation_stats(entries: &[ActivityEntry]) -> Vec<OperationStat> {
    let mut groups: HashMap<&str, Vec<&ActivityEntry>> = HashMap::new();
    for entry in entries {
        groups.entry(entry.operation.as_str()).or_default().push(entry);
    }

    let mut stats: Vec<OperationStat> = groups
        .into_iter()
        .map(|(operation, group)| {
            let count = group.len();
            let failures = group.iter().filter(|e| !e.success).count();
            let total_latency: u64 = group.iter().map(|e| e.latency_ms).sum();
            let max_latency_ms = group.iter().map(|e| e.latency_ms).max().unwrap_or(0);
            let last_error = group
                .iter()
                .filter_map(|e| e.error.as_ref().map(|err| (&e.timestamp, err)))
                .max_by(|a, b| a.0.cmp(b.0))
                .map(|(_, err)| err.clone());

            OperationStat {
                operation: operation.to_string(),
                count,
                failures,
                avg_latency_ms: if count == 0 {
                    0.0
                } else {
                    total_latency as f64 / count as f64
                },
                max_latency_ms,
                last_error,
            }
        })
        .collect();

    stats.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.operation.cmp(&b.operation)));
    stats
}
