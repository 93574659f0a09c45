/// Configuration schema and defaults for ragboard.
///
/// Defines the TOML-serializable configuration structure with the sections
/// `[backend]`, `[defaults]`, `[web]` and `[logging]`. Every field has a
/// built-in default; users only set what they want to override.
use serde::{Deserialize, Serialize};

/// Backend URL used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Demo workspace the dashboard queries and tunes.
pub const DEFAULT_WORKSPACE_ID: &str = "1ddc59b8-50b1-4907-9cb9-f12e413300f5";

/// Shared evaluation set every eval run in the dashboard belongs to.
pub const DEFAULT_EVAL_SET_ID: &str = "a1b2c3d4-e5f6-7890-abcd-ef1234567890";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level ragboard configuration.
///
/// Maps directly to `~/.ragboard/config.toml` and `.ragboard.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagboardConfig {
    pub backend: BackendConfig,
    pub defaults: DefaultsConfig,
    pub web: WebConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [backend]
// ---------------------------------------------------------------------------

/// Where the evaluation backend lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Backend HTTP base URL. Trailing slashes are stripped by the client.
    pub base_url: String,
    /// Per-request timeout in milliseconds. Unset means no client timeout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: None,
        }
    }
}

// ---------------------------------------------------------------------------
// [defaults]
// ---------------------------------------------------------------------------

/// Fixed identifiers and knobs sent along with backend requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub workspace_id: String,
    pub eval_set_id: String,
    /// Iteration cap for auto-tune runs.
    pub max_iterations: u32,
    /// Number of contexts retrieved for live queries.
    pub top_k: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            workspace_id: DEFAULT_WORKSPACE_ID.to_string(),
            eval_set_id: DEFAULT_EVAL_SET_ID.to_string(),
            max_iterations: 3,
            top_k: 5,
        }
    }
}

// ---------------------------------------------------------------------------
// [web]
// ---------------------------------------------------------------------------

/// Embedded dashboard server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub addr: String,
    pub open_browser: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:9747".to_string(),
            open_browser: true,
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Activity log settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Master switch for `~/.ragboard/activity.jsonl`.
    pub enabled: bool,
    /// Record one line per backend request.
    pub log_api_calls: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_api_calls: true,
        }
    }
}

impl RagboardConfig {
    /// Annotated default config written by `ragboard config init`.
    pub fn default_toml() -> String {
        format!(
            r#"# ragboard configuration
#
# Precedence (later wins): built-in defaults, ~/.ragboard/config.toml,
# ./.ragboard.toml, RAGBOARD_* environment variables.

[backend]
base_url = "{DEFAULT_BASE_URL}"
# Per-request timeout. Leave unset: auto-tune runs can take many minutes.
# timeout_ms = 600000

[defaults]
workspace_id = "{DEFAULT_WORKSPACE_ID}"
eval_set_id = "{DEFAULT_EVAL_SET_ID}"
max_iterations = 3
top_k = 5

[web]
addr = "127.0.0.1:9747"
open_browser = true

[logging]
enabled = true
log_api_calls = true
"#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_toml_parses_to_defaults() {
        let parsed: RagboardConfig = toml::from_str(&RagboardConfig::default_toml()).unwrap();
        assert_eq!(parsed, RagboardConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let parsed: RagboardConfig = toml::from_str(
            r#"
[backend]
base_url = "http://tuner:9000"
"#,
        )
        .unwrap();
        assert_eq!(parsed.backend.base_url, "http://tuner:9000");
        assert_eq!(parsed.backend.timeout_ms, None);
        assert_eq!(parsed.defaults.max_iterations, 3);
        assert!(parsed.logging.enabled);
    }

    #[test]
    fn timeout_is_omitted_when_unset() {
        let text = toml::to_string_pretty(&RagboardConfig::default()).unwrap();
        assert!(!text.contains("timeout_ms"));
    }
}
