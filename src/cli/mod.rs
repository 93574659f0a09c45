//! CLI command implementations.
//!
//! Every dashboard subcommand builds a fresh [`Dashboard`] and [`Runtime`],
//! performs the actions a user would click through in the web UI, waits
//! until no request is in flight and prints the resulting view:
//! - `ragboard runs` / `detail <ID>`: eval run browser
//! - `ragboard leaderboard`: configs ranked by overall score
//! - `ragboard analyze [--run ID]`: agent analysis of one run
//! - `ragboard auto-tune` / `history`: tuning loop and its past runs
//! - `ragboard query <TEXT>`: live query
//! - `ragboard submit --config <ID>`: start a new eval run
//! - `ragboard activity`: request log summary
//! - `ragboard config show|init|set|reset`: configuration management

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use colored::Colorize;

use crate::activity::logger;
use crate::activity::reporter::{self, OperationStat};
use crate::api::ApiClient;
use crate::config::{self, schema::RagboardConfig};
use crate::dashboard::router::Tab;
use crate::dashboard::view::{
    AnalysisView, AutoTuneRunView, AutoTuneView, DetailView, LiveQueryView, RunRow,
};
use crate::dashboard::{Action, Dashboard, DashboardSettings};
use crate::runtime::Runtime;
use crate::web;

/// How often `auto-tune` reports that it is still waiting.
const STATUS_INTERVAL: Duration = Duration::from_secs(30);

/// Output format for list-style commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

// ---------------------------------------------------------------------------
// Runtime plumbing
// ---------------------------------------------------------------------------

/// Dashboard runtime wired to the configured backend.
pub fn build_runtime(cfg: &RagboardConfig) -> Runtime<ApiClient> {
    let client = ApiClient::from_config(&cfg.backend);
    let dashboard = Dashboard::new(DashboardSettings::from(&cfg.defaults));
    Runtime::new(Arc::new(client), dashboard)
        .with_activity_log(cfg.logging.enabled && cfg.logging.log_api_calls)
}

/// Perform `actions` in order, letting each settle before the next.
fn drive(runtime: &mut Runtime<ApiClient>, actions: Vec<Action>) {
    for action in actions {
        runtime.dispatch(action);
        runtime.wait_idle();
    }
}

fn fail_on(error: Option<&str>) -> Result<()> {
    match error {
        Some(message) => bail!("{message}"),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// ragboard runs / detail
// ---------------------------------------------------------------------------

/// List eval runs of the configured evaluation set, newest first.
pub fn run_runs(cfg: &RagboardConfig, format: OutputFormat) -> Result<()> {
    let mut runtime = build_runtime(cfg);
    drive(&mut runtime, vec![Action::ActivateTab(Tab::EvalViewer)]);

    let view = runtime.dashboard().view().eval_viewer;
    fail_on(view.error.as_deref())?;

    if let Some(message) = &view.empty_message {
        println!("{}", message.yellow());
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view.runs)?),
        OutputFormat::Csv => print_runs_csv(&view.runs),
        OutputFormat::Table => {
            println!("{}", "Eval Runs".bold().cyan());
            println!("{}", "=".repeat(96));
            print_runs_table(&view.runs);
        }
    }
    Ok(())
}

/// Show per-question results of one eval run.
pub fn run_detail(cfg: &RagboardConfig, eval_run_id: &str, format: OutputFormat) -> Result<()> {
    let mut runtime = build_runtime(cfg);
    drive(
        &mut runtime,
        vec![Action::SelectEvalRun {
            eval_run_id: eval_run_id.to_string(),
        }],
    );

    let view = runtime.dashboard().view().eval_viewer;
    fail_on(view.error.as_deref())?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view.detail)?),
        OutputFormat::Csv => print_detail_csv(&view.detail),
        OutputFormat::Table => print_detail_table(&view.detail),
    }
    Ok(())
}

fn print_runs_table(rows: &[RunRow]) {
    println!(
        "  {:<6} {:<28} {:<17} {:<10} {:>8} {:>8} {:>8} {:>8}",
        "#", "Config", "Origin", "Status", "Overall", "Relev.", "Faith.", "Compl."
    );
    println!("  {}", "-".repeat(94));
    for (i, row) in rows.iter().enumerate() {
        let line = format!(
            "  {:<6} {:<28} {:<17} {:<10} {:>8} {:>8} {:>8} {:>8}",
            row.serial.as_deref().unwrap_or("-"),
            truncate(&row.config_name, 28),
            row.origin,
            truncate(row.status.as_deref().unwrap_or("-"), 10),
            row.overall,
            row.relevance,
            row.faithfulness,
            row.completeness,
        );
        if row.selected {
            println!("{}", line.bold());
        } else if i % 2 == 0 {
            println!("{line}");
        } else {
            println!("{}", line.dimmed());
        }
    }
}

fn print_runs_csv(rows: &[RunRow]) {
    println!("serial,eval_run_id,config_name,origin,created_at,status,overall,relevance,faithfulness,completeness");
    for row in rows {
        println!(
            "{},{},{},{},{},{},{},{},{},{}",
            row.serial.as_deref().unwrap_or(""),
            row.eval_run_id,
            csv_field(&row.config_name),
            row.origin,
            row.created_at.as_deref().unwrap_or(""),
            row.status.as_deref().unwrap_or(""),
            row.overall,
            row.relevance,
            row.faithfulness,
            row.completeness,
        );
    }
}

fn print_detail_table(detail: &DetailView) {
    if let Some(message) = &detail.message {
        println!("{}", message.yellow());
        return;
    }
    println!(
        "{} {}",
        detail.config_name.as_deref().unwrap_or("").bold().cyan(),
        format!(
            "on {} ({})",
            detail.eval_set_name.as_deref().unwrap_or("?"),
            detail.status.as_deref().unwrap_or("unknown")
        )
        .dimmed()
    );
    println!("{}", "=".repeat(60));
    for metric in &detail.summary_metrics {
        println!("  {:<28} {:>10}", metric.name.bold(), metric.value);
    }
    println!();

    for (i, row) in detail.results.iter().enumerate() {
        println!("{} {}", format!("Q{}", i + 1).bold().cyan(), row.question);
        println!("   {} {}", "Answer:".bold(), row.answer);
        println!(
            "   overall {}  relevance {}  faithfulness {}  completeness {}",
            colorize_score(&row.overall),
            colorize_score(&row.relevance),
            colorize_score(&row.faithfulness),
            colorize_score(&row.completeness),
        );
        if !row.judge_explanation.is_empty() {
            println!("   {}", row.judge_explanation.dimmed());
        }
    }
}

fn print_detail_csv(detail: &DetailView) {
    println!("question,overall,relevance,faithfulness,completeness");
    for row in &detail.results {
        println!(
            "{},{},{},{},{}",
            csv_field(&row.question),
            row.overall,
            row.relevance,
            row.faithfulness,
            row.completeness,
        );
    }
}

// ---------------------------------------------------------------------------
// ragboard leaderboard
// ---------------------------------------------------------------------------

/// Rank every run of the evaluation set by overall score.
pub fn run_leaderboard(cfg: &RagboardConfig, format: OutputFormat) -> Result<()> {
    let mut runtime = build_runtime(cfg);
    drive(&mut runtime, vec![Action::ActivateTab(Tab::ConfigLeaderboard)]);

    let view = runtime.dashboard().view().leaderboard;
    fail_on(view.error.as_deref())?;

    if let Some(message) = &view.empty_message {
        println!("{}", message.yellow());
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view.rows)?),
        OutputFormat::Csv => print_runs_csv(&view.rows),
        OutputFormat::Table => {
            println!("{}", "Config Leaderboard".bold().cyan());
            println!("{}", "=".repeat(96));
            print_runs_table(&view.rows);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// ragboard analyze
// ---------------------------------------------------------------------------

/// Ask the agent to analyze one run (default: the newest).
pub fn run_analyze(cfg: &RagboardConfig, run: Option<&str>, format: OutputFormat) -> Result<()> {
    let mut runtime = build_runtime(cfg);
    let mut actions = vec![Action::ActivateTab(Tab::AgentAnalysis)];
    if let Some(id) = run {
        actions.push(Action::ChooseAnalysisTarget {
            eval_run_id: id.to_string(),
        });
    }
    actions.push(Action::RunAnalysis);
    drive(&mut runtime, actions);

    let view = runtime.dashboard().view();
    if view.analysis.result.is_none() {
        // A failed config list explains an empty-prerequisite error better.
        fail_on(
            view.leaderboard
                .error
                .as_deref()
                .or(view.analysis.error.as_deref())
                .or(view.global_error.as_deref()),
        )?;
    }

    match format {
        OutputFormat::Json | OutputFormat::Csv => {
            println!("{}", serde_json::to_string_pretty(&view.analysis)?)
        }
        OutputFormat::Table => print_analysis(&view.analysis),
    }
    Ok(())
}

fn print_analysis(view: &AnalysisView) {
    let Some(result) = &view.result else {
        println!("{}", "No analysis result.".yellow());
        return;
    };
    println!(
        "{} {}",
        "Agent Analysis".bold().cyan(),
        view.target.as_deref().unwrap_or("").dimmed()
    );
    println!("{}", "=".repeat(60));
    println!("  {} {}", "Best config:".bold(), result.best_config_name);
    for section in &result.sections {
        println!();
        println!("{}", section.title.bold());
        match section.empty_message {
            Some(placeholder) => println!("  {}", placeholder.dimmed()),
            None => {
                for item in &section.items {
                    println!("  • {item}");
                }
            }
        }
    }
    if let Some(reasoning) = &result.reasoning {
        println!();
        println!("{}", "Reasoning".bold());
        println!("  {}", reasoning.dimmed());
    }
}

// ---------------------------------------------------------------------------
// ragboard auto-tune / history
// ---------------------------------------------------------------------------

/// Run the tuning loop and wait for it to finish.
pub fn run_auto_tune(
    cfg: &RagboardConfig,
    max_iterations: Option<u32>,
    format: OutputFormat,
) -> Result<()> {
    let mut runtime = build_runtime(cfg);
    runtime.dispatch(Action::StartAutoTune { max_iterations });
    if format == OutputFormat::Table
        && let Some(status) = runtime.dashboard().autotune().status()
    {
        println!("{}", status.yellow());
    }
    let started = Instant::now();
    while !runtime.is_idle() {
        if !runtime.wait_next(Some(STATUS_INTERVAL)) && format == OutputFormat::Table {
            let line = format!("  still running ({}s)", started.elapsed().as_secs());
            println!("{}", line.dimmed());
        }
    }

    let view = runtime.dashboard().view().auto_tune;
    fail_on(view.error.as_deref())?;

    match format {
        OutputFormat::Json | OutputFormat::Csv => {
            println!("{}", serde_json::to_string_pretty(&view.result)?)
        }
        OutputFormat::Table => {
            if let Some(status) = &view.status {
                println!("{}", status.green().bold());
            }
            if let Some(result) = &view.result {
                print_tune_run(result);
            }
        }
    }
    Ok(())
}

/// List past auto-tune runs, optionally expanding one of them.
pub fn run_history(cfg: &RagboardConfig, index: Option<usize>, format: OutputFormat) -> Result<()> {
    let mut runtime = build_runtime(cfg);
    let mut actions = vec![Action::ActivateTab(Tab::AutoTuneExplorer)];
    if let Some(index) = index {
        actions.push(Action::SelectAutoTuneRun { index });
    }
    drive(&mut runtime, actions);

    let view = runtime.dashboard().view();
    fail_on(view.auto_tune.history_error.as_deref())?;
    if let Some(index) = index
        && view.auto_tune.selected_index != Some(index)
    {
        bail!(
            "no auto tune run at index {index} ({} available)",
            view.auto_tune.history.len()
        );
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view.auto_tune.history)?),
        OutputFormat::Csv => print_history_csv(&view.auto_tune),
        OutputFormat::Table => print_history_table(&view.auto_tune, index.is_some()),
    }
    Ok(())
}

fn print_tune_run(run: &AutoTuneRunView) {
    println!(
        "  {} {} → {}  ({})",
        "Score:".bold(),
        run.starting_score,
        colorize_score(&run.final_score),
        run.iterations
    );
    if let Some(reason) = &run.reason_stopped {
        println!("  {} {}", "Stopped:".bold(), reason.dimmed());
    }
    println!("  {:>4}  {:<36} {:>8} {:>8}", "#", "Config", "Overall", "Delta");
    println!("  {}", "-".repeat(60));
    for it in &run.history {
        println!(
            "  {:>4}  {:<36} {:>8} {:>8}",
            it.iteration,
            truncate(&it.pipeline_config_name, 36),
            it.avg_overall,
            it.improvement
        );
    }
}

fn print_history_table(view: &AutoTuneView, expand_selected: bool) {
    if let Some(message) = &view.history_empty_message {
        println!("{}", message.yellow());
        return;
    }
    println!("{}", "Auto-Tune History".bold().cyan());
    println!("{}", "=".repeat(60));
    for (i, run) in view.history.iter().enumerate() {
        let line = format!(
            "  [{i}] {:<26} {} → {}  {}",
            run.created_at.as_deref().unwrap_or("-"),
            run.starting_score,
            run.final_score,
            run.iterations
        );
        if view.selected_index == Some(i) {
            println!("{}", line.bold());
        } else {
            println!("{line}");
        }
    }
    if expand_selected
        && let Some(run) = view.selected_index.and_then(|i| view.history.get(i))
    {
        println!();
        print_tune_run(run);
    }
}

fn print_history_csv(view: &AutoTuneView) {
    println!("index,created_at,starting_score,final_score,iterations,reason_stopped");
    for (i, run) in view.history.iter().enumerate() {
        println!(
            "{},{},{},{},{},{}",
            i,
            run.created_at.as_deref().unwrap_or(""),
            run.starting_score,
            run.final_score,
            run.history.len(),
            csv_field(run.reason_stopped.as_deref().unwrap_or("")),
        );
    }
}

// ---------------------------------------------------------------------------
// ragboard query / submit
// ---------------------------------------------------------------------------

/// Ask the RAG pipeline one question.
pub fn run_query(
    cfg: &RagboardConfig,
    question: &str,
    top_k: Option<u32>,
    format: OutputFormat,
) -> Result<()> {
    let mut runtime = build_runtime(cfg);
    drive(
        &mut runtime,
        vec![Action::SubmitQuery {
            question: question.to_string(),
            top_k,
        }],
    );

    let view = runtime.dashboard().view().live_query;
    fail_on(view.error.as_deref())?;

    match format {
        OutputFormat::Json | OutputFormat::Csv => {
            println!("{}", serde_json::to_string_pretty(&view)?)
        }
        OutputFormat::Table => print_query(&view),
    }
    Ok(())
}

fn print_query(view: &LiveQueryView) {
    println!("{}", "Answer".bold().cyan());
    println!("{}", view.answer.as_deref().unwrap_or(""));
    if let Some(latency) = &view.latency_ms {
        println!("{}", format!("{latency} ms").dimmed());
    }
    if !view.contexts.is_empty() {
        println!();
        println!("{}", format!("Contexts ({})", view.contexts.len()).bold());
        for (i, ctx) in view.contexts.iter().enumerate() {
            let text = ctx
                .get("text")
                .and_then(|t| t.as_str())
                .map(str::to_string)
                .or_else(|| ctx.as_str().map(str::to_string))
                .unwrap_or_else(|| ctx.to_string());
            println!("  {} {}", format!("[{}]", i + 1).dimmed(), truncate(&text, 160));
        }
    }
}

/// Start a new eval run for a pipeline config.
pub fn run_submit(cfg: &RagboardConfig, pipeline_config_id: &str) -> Result<()> {
    let mut runtime = build_runtime(cfg);
    drive(
        &mut runtime,
        vec![Action::SubmitEvalRun {
            pipeline_config_id: pipeline_config_id.to_string(),
        }],
    );

    let view = runtime.dashboard().view().eval_viewer;
    fail_on(view.error.as_deref())?;
    if let Some(notice) = &view.notice {
        println!("{} {}", "✓".green().bold(), notice);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// ragboard web
// ---------------------------------------------------------------------------

/// Serve the web dashboard until interrupted.
pub fn run_web(cfg: &RagboardConfig, addr: Option<&str>, no_open: bool) -> Result<()> {
    let runtime = build_runtime(cfg);
    let addr = addr.unwrap_or(&cfg.web.addr);
    println!(
        "{} {}",
        "Backend:".dimmed(),
        cfg.backend.base_url.trim_end_matches('/')
    );
    web::serve(runtime, addr, cfg.web.open_browser && !no_open)
}

// ---------------------------------------------------------------------------
// ragboard activity
// ---------------------------------------------------------------------------

/// Summarize backend requests from the activity log.
pub fn run_activity(format: OutputFormat, days: Option<u32>) -> Result<()> {
    let stats = reporter::compute_operation_stats(days);

    if stats.is_empty() {
        let hint = match logger::activity_log_path() {
            Some(path) => format!("No activity recorded yet ({}).", path.display()),
            None => "No activity recorded yet.".to_string(),
        };
        println!("{}", hint.yellow());
        return Ok(());
    }

    match format {
        OutputFormat::Json => print_activity_json(&stats)?,
        OutputFormat::Csv => print_activity_csv(&stats),
        OutputFormat::Table => print_activity_table(&stats, days),
    }
    Ok(())
}

fn print_activity_table(stats: &[OperationStat], days: Option<u32>) {
    let title = match days {
        Some(days) => format!("Backend Activity: Last {days} Days"),
        None => "Backend Activity".to_string(),
    };
    println!("{}", title.bold().cyan());
    println!("{}", "=".repeat(70));
    println!(
        "  {:<20} {:>7} {:>9} {:>12} {:>12}",
        "Operation", "Count", "Failed", "Avg ms", "Max ms"
    );
    println!("  {}", "-".repeat(68));
    for stat in stats {
        let failed = format!("{:.0}%", stat.failure_pct());
        let failed = if stat.failures > 0 {
            failed.red()
        } else {
            failed.green()
        };
        println!(
            "  {:<20} {:>7} {:>9} {:>12.0} {:>12}",
            stat.operation, stat.count, failed, stat.avg_latency_ms, stat.max_latency_ms
        );
        if let Some(error) = &stat.last_error {
            println!("    {} {}", "last error:".dimmed(), truncate(error, 60).dimmed());
        }
    }
}

fn print_activity_json(stats: &[OperationStat]) -> Result<()> {
    let value = serde_json::json!(
        stats
            .iter()
            .map(|s| serde_json::json!({
                "operation": s.operation,
                "count": s.count,
                "failures": s.failures,
                "failure_pct": s.failure_pct(),
                "avg_latency_ms": s.avg_latency_ms,
                "max_latency_ms": s.max_latency_ms,
                "last_error": s.last_error,
            }))
            .collect::<Vec<_>>()
    );
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn print_activity_csv(stats: &[OperationStat]) {
    println!("operation,count,failures,avg_latency_ms,max_latency_ms");
    for s in stats {
        println!(
            "{},{},{},{:.1},{}",
            s.operation, s.count, s.failures, s.avg_latency_ms, s.max_latency_ms
        );
    }
}

// ---------------------------------------------------------------------------
// ragboard config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective ragboard Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source("~/.ragboard/config.toml", global_exists);
    print_source(".ragboard.toml", project_exists);
    println!(
        "  {} {}",
        "·".dimmed(),
        "RAGBOARD_* environment variables".dimmed()
    );

    Ok(())
}

fn print_source(name: &str, exists: bool) {
    if exists {
        println!("  {} {}", "✓".green(), name.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
    }
}

/// Initialize a default config file at `~/.ragboard/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    println!("  {}", "Edit the file to point ragboard at your backend.".dimmed());
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Truncate a string to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

/// Quote a CSV field when it contains a separator, quote or newline.
fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Color a formatted score: green from 0.80, yellow from 0.50, red below.
fn colorize_score(score: &str) -> colored::ColoredString {
    match score.parse::<f64>() {
        Ok(v) if v >= 0.8 => score.green(),
        Ok(v) if v >= 0.5 => score.yellow(),
        Ok(_) => score.red(),
        Err(_) => score.dimmed(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 5), "hell…");
        assert_eq!(truncate("ab", 2), "ab");
        assert_eq!(truncate("ééééé", 3), "éé…");
    }

    #[test]
    fn test_csv_field_quotes_when_needed() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!(OutputFormat::from_str_opt(None), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str_opt(Some("json")), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str_opt(Some("csv")), OutputFormat::Csv);
        assert_eq!(
            OutputFormat::from_str_opt(Some("unknown")),
            OutputFormat::Table
        );
    }
}
