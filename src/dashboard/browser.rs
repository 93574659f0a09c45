//! Eval run browser: the run list of the configured evaluation set.
//!
//! Runs get a serial number from their creation order (oldest is `0001`)
//! and are displayed newest first. Serials stay attached to the run, not to
//! its display position.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::api::{ApiError, EvalRun};

use super::effects::{ListScope, Request, Sequencer};
use super::format::serial_label;

/// One run as listed by the browser.
#[derive(Debug, Clone, PartialEq)]
pub struct BrowserEntry {
    /// 1-based position in ascending creation order.
    pub serial: u32,
    pub run: EvalRun,
}

impl BrowserEntry {
    pub fn serial_label(&self) -> String {
        serial_label(self.serial)
    }
}

/// Outcome of offering a list response to a list store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOutcome {
    Loaded,
    Failed,
    Stale,
}

#[derive(Debug, Clone, Default)]
pub struct EvalRunBrowser {
    entries: Vec<BrowserEntry>,
    loaded: bool,
    seq: Sequencer,
    error: Option<String>,
    notice: Option<String>,
}

impl EvalRunBrowser {
    /// Entries, newest first.
    pub fn entries(&self) -> &[BrowserEntry] {
        &self.entries
    }

    pub fn find(&self, eval_run_id: &str) -> Option<&BrowserEntry> {
        self.entries
            .iter()
            .find(|entry| entry.run.eval_run_id == eval_run_id)
    }

    pub fn newest(&self) -> Option<&EvalRun> {
        self.entries.first().map(|entry| &entry.run)
    }

    pub fn is_loading(&self) -> bool {
        self.seq.is_pending()
    }

    /// A list has loaded successfully and it had no runs.
    pub fn is_empty_state(&self) -> bool {
        self.loaded && self.entries.is_empty()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn set_error(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
    }

    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    pub fn clear_messages(&mut self) {
        self.error = None;
        self.notice = None;
    }

    /// Start a list reload. The current list stays visible meanwhile.
    pub fn begin_load(&mut self, eval_set_id: &str) -> Request {
        self.error = None;
        Request::ListRuns {
            scope: ListScope::Browser,
            seq: self.seq.next(),
            eval_set_id: eval_set_id.to_string(),
        }
    }

    /// Offer a list response. Failures keep the previously loaded list.
    pub fn apply_list(&mut self, seq: u64, result: Result<Vec<EvalRun>, ApiError>) -> ListOutcome {
        if !self.seq.accept(seq) {
            return ListOutcome::Stale;
        }
        match result {
            Ok(runs) => {
                self.entries = assign_serials(runs);
                self.loaded = true;
                ListOutcome::Loaded
            }
            Err(e) => {
                self.error = Some(format!("Failed to load eval runs: {e}"));
                ListOutcome::Failed
            }
        }
    }
}

/// Number runs by ascending creation time and return them newest first.
///
/// Runs with a missing or unparseable `created_at` count as oldest; ties
/// keep the backend's order.
pub fn assign_serials(runs: Vec<EvalRun>) -> Vec<BrowserEntry> {
    let mut keyed: Vec<(Option<DateTime<Utc>>, EvalRun)> = runs
        .into_iter()
        .map(|run| (parse_created_at(run.created_at.as_deref()), run))
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));

    let mut entries: Vec<BrowserEntry> = keyed
        .into_iter()
        .enumerate()
        .map(|(i, (_, run))| BrowserEntry {
            serial: u32::try_from(i + 1).unwrap_or(u32::MAX),
            run,
        })
        .collect();
    entries.reverse();
    entries
}

/// Parse RFC 3339 timestamps as well as the naive ISO forms Python emits.
pub fn parse_created_at(created_at: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = created_at?.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(id: &str, created_at: Option<&str>) -> EvalRun {
        EvalRun {
            created_at: created_at.map(str::to_string),
            ..EvalRun::placeholder(id)
        }
    }

    #[test]
    fn serials_follow_creation_order_and_display_is_newest_first() {
        let runs = vec![
            run("mid", Some("2026-03-02T09:00:00Z")),
            run("new", Some("2026-03-03T09:00:00Z")),
            run("old", Some("2026-03-01T09:00:00Z")),
        ];

        let entries = assign_serials(runs);
        let order: Vec<(&str, String)> = entries
            .iter()
            .map(|e| (e.run.eval_run_id.as_str(), e.serial_label()))
            .collect();

        assert_eq!(
            order,
            vec![
                ("new", "0003".to_string()),
                ("mid", "0002".to_string()),
                ("old", "0001".to_string()),
            ]
        );
    }

    #[test]
    fn mixed_timestamp_formats_compare_by_instant() {
        let runs = vec![
            run("naive", Some("2026-03-02T10:00:00.123456")),
            run("offset", Some("2026-03-02T11:30:00+02:00")),
        ];
        // 11:30+02:00 is 09:30Z, earlier than the naive 10:00 (read as UTC).
        let entries = assign_serials(runs);
        assert_eq!(entries[0].run.eval_run_id, "naive");
        assert_eq!(entries[0].serial, 2);
        assert_eq!(entries[1].serial, 1);
    }

    #[test]
    fn undated_runs_count_as_oldest() {
        let runs = vec![run("dated", Some("2026-01-01 00:00:00")), run("undated", None)];
        let entries = assign_serials(runs);
        assert_eq!(entries[1].run.eval_run_id, "undated");
        assert_eq!(entries[1].serial, 1);
    }

    #[test]
    fn failed_reload_keeps_previous_list() {
        let mut browser = EvalRunBrowser::default();
        let Request::ListRuns { seq, .. } = browser.begin_load("set") else {
            panic!("expected list request");
        };
        browser.apply_list(seq, Ok(vec![run("a", None)]));

        let Request::ListRuns { seq, .. } = browser.begin_load("set") else {
            panic!("expected list request");
        };
        let outcome = browser.apply_list(seq, Err(ApiError::Network("refused".to_string())));

        assert_eq!(outcome, ListOutcome::Failed);
        assert_eq!(browser.entries().len(), 1);
        assert!(browser.error().unwrap().contains("refused"));
        assert!(!browser.is_empty_state());
    }

    #[test]
    fn out_of_order_list_responses_keep_the_newest() {
        let mut browser = EvalRunBrowser::default();
        let Request::ListRuns { seq: first, .. } = browser.begin_load("set") else {
            panic!("expected list request");
        };
        let Request::ListRuns { seq: second, .. } = browser.begin_load("set") else {
            panic!("expected list request");
        };

        assert_eq!(
            browser.apply_list(second, Ok(vec![run("a", None), run("b", None)])),
            ListOutcome::Loaded
        );
        assert_eq!(
            browser.apply_list(first, Ok(vec![run("a", None)])),
            ListOutcome::Stale
        );
        assert_eq!(browser.entries().len(), 2);
    }

    #[test]
    fn empty_state_only_after_successful_empty_load() {
        let mut browser = EvalRunBrowser::default();
        assert!(!browser.is_empty_state());
        let Request::ListRuns { seq, .. } = browser.begin_load("set") else {
            panic!("expected list request");
        };
        assert!(browser.is_loading());
        browser.apply_list(seq, Ok(Vec::new()));
        assert!(browser.is_empty_state());
        assert!(!browser.is_loading());
        assert!(browser.newest().is_none());
    }
}
