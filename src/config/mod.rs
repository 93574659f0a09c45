/// Configuration system for ragboard.
///
/// Layered hierarchy, later layers override earlier ones key by key:
///
/// 1. **Built-in defaults**: [`schema::RagboardConfig::default()`]
/// 2. **User global config**: `~/.ragboard/config.toml`
/// 3. **Project local config**: `.ragboard.toml` in the current directory
/// 4. **Environment variables**: `RAGBOARD_*` overrides
///
/// Malformed files are skipped so a typo never locks the user out of the
/// dashboard.
pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub use schema::RagboardConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
pub fn load() -> RagboardConfig {
    let mut config = load_files(&[global_config_path(), project_config_path()]);
    apply_env_overrides(&mut config);
    config
}

/// Merge the given TOML files, in order, over the built-in defaults.
fn load_files(paths: &[Option<PathBuf>]) -> RagboardConfig {
    let Ok(mut merged) = toml::Value::try_from(RagboardConfig::default()) else {
        return RagboardConfig::default();
    };

    for path in paths {
        if let Some(layer) = load_toml_value(path.as_ref()) {
            merge_values(&mut merged, layer);
        }
    }

    merged.try_into().unwrap_or_default()
}

/// Read a TOML file as a raw value tree. `None` if missing or malformed.
fn load_toml_value(path: Option<&PathBuf>) -> Option<toml::Value> {
    let content = fs::read_to_string(path?).ok()?;
    let value: toml::Value = toml::from_str(&content).ok()?;
    // Only accept files that also decode as a config, so a bad type in one
    // key doesn't poison the merged result.
    value.clone().try_into::<RagboardConfig>().ok()?;
    Some(value)
}

/// Deep-merge `overlay` into `base`: tables merge recursively, every other
/// value present in the overlay replaces the base value.
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Path to the user global config: `~/.ragboard/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".ragboard").join("config.toml"))
}

/// Path to the project local config: `.ragboard.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".ragboard.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `RAGBOARD_API_URL`: backend base URL
/// - `RAGBOARD_TIMEOUT_MS`: per-request timeout (`0` or `none` clears it)
/// - `RAGBOARD_WORKSPACE_ID`: workspace used for queries and auto-tune
/// - `RAGBOARD_EVAL_SET_ID`: evaluation set shown by the dashboard
/// - `RAGBOARD_MAX_ITERATIONS`: auto-tune iteration cap
/// - `RAGBOARD_LOGGING`: activity log switch (`1`/`true`/`yes`/`on`)
fn apply_env_overrides(config: &mut RagboardConfig) {
    if let Ok(val) = std::env::var("RAGBOARD_API_URL")
        && !val.is_empty()
    {
        config.backend.base_url = val;
    }
    if let Ok(val) = std::env::var("RAGBOARD_TIMEOUT_MS") {
        match val.to_ascii_lowercase().as_str() {
            "" | "0" | "none" => config.backend.timeout_ms = None,
            other => {
                if let Ok(ms) = other.parse::<u64>() {
                    config.backend.timeout_ms = Some(ms);
                }
            }
        }
    }
    if let Ok(val) = std::env::var("RAGBOARD_WORKSPACE_ID")
        && !val.is_empty()
    {
        config.defaults.workspace_id = val;
    }
    if let Ok(val) = std::env::var("RAGBOARD_EVAL_SET_ID")
        && !val.is_empty()
    {
        config.defaults.eval_set_id = val;
    }
    if let Ok(val) = std::env::var("RAGBOARD_MAX_ITERATIONS")
        && let Ok(n) = val.parse::<u32>()
    {
        config.defaults.max_iterations = n;
    }
    if let Ok(val) = std::env::var("RAGBOARD_LOGGING") {
        config.logging.enabled = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.ragboard/config.toml`.
///
/// Refuses to overwrite an existing file unless `force` is set.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.ragboard/ directory")?;
    }

    fs::write(&path, RagboardConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single dotted key (e.g. `backend.base_url`) in the global config.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let mut root: toml::Value = if path.exists() {
        let content = fs::read_to_string(&path).context("failed to read config file")?;
        toml::from_str(&content).context("failed to parse config as TOML value")?
    } else {
        toml::Value::try_from(RagboardConfig::default())
            .context("failed to serialize default config")?
    };

    set_toml_value(&mut root, key, value)?;

    // Refuse to write something the loader would ignore.
    root.clone()
        .try_into::<RagboardConfig>()
        .with_context(|| format!("invalid value for '{key}': '{value}'"))?;

    let output = toml::to_string_pretty(&root).context("failed to serialize updated config")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, output).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
///
/// The type of an existing value is preserved; a key that doesn't exist yet
/// (such as the optional `backend.timeout_ms`) is stored as an integer when
/// it parses as one, otherwise as a string.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').filter(|p| !p.is_empty()).collect();
    let Some((leaf, sections)) = parts.split_last() else {
        anyhow::bail!("empty config key");
    };

    let mut current = root;
    for &part in sections {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let table = current.as_table_mut().with_context(|| {
        format!(
            "expected table at '{}'",
            key.rsplit_once('.').map(|(s, _)| s).unwrap_or("")
        )
    })?;

    let new_value = match table.get(*leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::Float(_)) => {
            let f: f64 = raw_value
                .parse()
                .with_context(|| format!("expected float for '{key}', got '{raw_value}'"))?;
            toml::Value::Float(f)
        }
        Some(_) => toml::Value::String(raw_value.to_string()),
        None => match raw_value.parse::<i64>() {
            Ok(n) => toml::Value::Integer(n),
            Err(_) => toml::Value::String(raw_value.to_string()),
        },
    };

    table.insert((*leaf).to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ragboard-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn later_layers_override_individual_keys() {
        let global = write_temp(
            "global.toml",
            r#"
[backend]
base_url = "http://global:8000"

[defaults]
max_iterations = 5
"#,
        );
        let project = write_temp(
            "project.toml",
            r#"
[backend]
base_url = "http://project:8000"
"#,
        );

        let config = load_files(&[Some(global), Some(project)]);
        assert_eq!(config.backend.base_url, "http://project:8000");
        assert_eq!(config.defaults.max_iterations, 5);
        assert_eq!(config.defaults.top_k, 5);
    }

    #[test]
    fn malformed_layer_is_skipped() {
        let broken = write_temp("broken.toml", "[backend\nbase_url = ");
        let wrong_type = write_temp("wrong.toml", "[defaults]\nmax_iterations = \"many\"\n");

        let config = load_files(&[Some(broken), Some(wrong_type), None]);
        assert_eq!(config, RagboardConfig::default());
    }

    #[test]
    fn is_truthy_accepts_variants() {
        for yes in ["1", "true", "TRUE", "yes", "on"] {
            assert!(is_truthy(yes), "{yes}");
        }
        for no in ["0", "false", "no", "off", ""] {
            assert!(!is_truthy(no), "{no}");
        }
    }

    #[test]
    fn set_toml_value_preserves_types() {
        let mut root = toml::Value::try_from(RagboardConfig::default()).unwrap();
        set_toml_value(&mut root, "defaults.max_iterations", "7").unwrap();
        set_toml_value(&mut root, "logging.enabled", "off").unwrap();
        set_toml_value(&mut root, "backend.base_url", "http://x:1").unwrap();

        let config: RagboardConfig = root.try_into().unwrap();
        assert_eq!(config.defaults.max_iterations, 7);
        assert!(!config.logging.enabled);
        assert_eq!(config.backend.base_url, "http://x:1");
    }

    #[test]
    fn set_toml_value_adds_optional_timeout_as_integer() {
        let mut root = toml::Value::try_from(RagboardConfig::default()).unwrap();
        set_toml_value(&mut root, "backend.timeout_ms", "120000").unwrap();

        let config: RagboardConfig = root.try_into().unwrap();
        assert_eq!(config.backend.timeout_ms, Some(120_000));
    }

    #[test]
    fn set_toml_value_rejects_bad_integer_and_unknown_section() {
        let mut root = toml::Value::try_from(RagboardConfig::default()).unwrap();
        assert!(set_toml_value(&mut root, "defaults.top_k", "lots").is_err());
        assert!(set_toml_value(&mut root, "nonexistent.key", "value").is_err());
        assert!(set_toml_value(&mut root, "", "value").is_err());
    }

    #[test]
    fn show_effective_config_round_trips() {
        let toml_str = show_effective_config().unwrap();
        let _: RagboardConfig = toml::from_str(&toml_str).unwrap();
    }
}
