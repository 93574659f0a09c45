//! Tab selection. Owns no domain state; activating a tab only names the
//! reloads the composite should issue.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tab {
    #[default]
    SystemOverview,
    LiveQuery,
    EvalViewer,
    ConfigLeaderboard,
    AgentAnalysis,
    AutoTuneExplorer,
    Insights,
}

impl Tab {
    pub const ALL: [Tab; 7] = [
        Tab::SystemOverview,
        Tab::LiveQuery,
        Tab::EvalViewer,
        Tab::ConfigLeaderboard,
        Tab::AgentAnalysis,
        Tab::AutoTuneExplorer,
        Tab::Insights,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Tab::SystemOverview => "system-overview",
            Tab::LiveQuery => "live-query",
            Tab::EvalViewer => "eval-viewer",
            Tab::ConfigLeaderboard => "config-leaderboard",
            Tab::AgentAnalysis => "agent-analysis",
            Tab::AutoTuneExplorer => "auto-tune-explorer",
            Tab::Insights => "insights",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Tab::SystemOverview => "System Overview",
            Tab::LiveQuery => "Live Query",
            Tab::EvalViewer => "Eval Viewer",
            Tab::ConfigLeaderboard => "Config Leaderboard",
            Tab::AgentAnalysis => "Agent Analysis",
            Tab::AutoTuneExplorer => "Auto-Tune Explorer",
            Tab::Insights => "Insights",
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Tab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tab::ALL
            .into_iter()
            .find(|tab| tab.slug() == s)
            .ok_or_else(|| format!("unknown tab: {s}"))
    }
}

/// Data a tab needs fresh every time it becomes active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reload {
    EvalRuns,
    Configs,
    AutoTuneHistory,
}

#[derive(Debug, Clone, Default)]
pub struct ViewRouter {
    active: Tab,
}

impl ViewRouter {
    pub fn active(&self) -> Tab {
        self.active
    }

    /// Switch to `tab`. Re-activating the current tab reloads again.
    pub fn activate(&mut self, tab: Tab) -> Vec<Reload> {
        self.active = tab;
        match tab {
            Tab::EvalViewer => vec![Reload::EvalRuns],
            Tab::ConfigLeaderboard | Tab::AgentAnalysis => vec![Reload::Configs],
            Tab::AutoTuneExplorer => vec![Reload::Configs, Reload::AutoTuneHistory],
            Tab::SystemOverview | Tab::LiveQuery | Tab::Insights => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activation_names_the_reloads() {
        let mut router = ViewRouter::default();
        assert_eq!(router.activate(Tab::EvalViewer), vec![Reload::EvalRuns]);
        assert_eq!(router.activate(Tab::AgentAnalysis), vec![Reload::Configs]);
        assert_eq!(
            router.activate(Tab::AutoTuneExplorer),
            vec![Reload::Configs, Reload::AutoTuneHistory]
        );
        assert!(router.activate(Tab::Insights).is_empty());
        assert_eq!(router.active(), Tab::Insights);
    }

    #[test]
    fn reactivation_reloads_again() {
        let mut router = ViewRouter::default();
        router.activate(Tab::ConfigLeaderboard);
        assert_eq!(router.activate(Tab::ConfigLeaderboard), vec![Reload::Configs]);
    }

    #[test]
    fn slugs_round_trip_through_serde_and_from_str() {
        for tab in Tab::ALL {
            let json = serde_json::to_string(&tab).unwrap();
            assert_eq!(json, format!("\"{}\"", tab.slug()));
            assert_eq!(tab.slug().parse::<Tab>().unwrap(), tab);
        }
        assert!("settings".parse::<Tab>().is_err());
    }
}
