use anyhow::Result;
use clap::{Parser, Subcommand};

use ragboard::cli::{self, OutputFormat};
use ragboard::config;

#[derive(Debug, Parser)]
#[command(name = "ragboard")]
#[command(about = "Dashboard for a RAG evaluation and auto-tune backend")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List eval runs of the configured evaluation set, newest first
    Runs {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show per-question judge results of one eval run
    Detail {
        /// The eval run id
        eval_run_id: String,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Rank configs by overall judge score
    Leaderboard {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Ask the agent to analyze an eval run (default: the newest)
    Analyze {
        /// Eval run to analyze
        #[arg(long)]
        run: Option<String>,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Run the auto-tune loop and wait until it finishes
    AutoTune {
        /// Iteration cap (default from config)
        #[arg(long)]
        max_iterations: Option<u32>,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Browse past auto-tune runs
    History {
        /// Expand the run at this position
        #[arg(long)]
        index: Option<usize>,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Ask the RAG pipeline a question
    Query {
        /// The question
        #[arg(trailing_var_arg = true, required = true)]
        question: Vec<String>,
        /// Number of contexts to retrieve (default from config)
        #[arg(long)]
        top_k: Option<u32>,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Start a new eval run for a pipeline config
    Submit {
        /// Pipeline config id
        #[arg(long = "config")]
        pipeline_config_id: String,
    },
    /// Serve the web dashboard
    Web {
        /// Listen address (default from config)
        #[arg(long)]
        addr: Option<String>,
        /// Do not open a browser
        #[arg(long)]
        no_open: bool,
    },
    /// Summarize backend requests from the activity log
    Activity {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
        /// Only include the last N days of data
        #[arg(long)]
        days: Option<u32>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write a default config to ~/.ragboard/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a value, e.g. `backend.base_url http://eval:8000`
    Set { key: String, value: String },
    /// Reset ~/.ragboard/config.toml to defaults
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();
    let fmt = |format: &str| OutputFormat::from_str_opt(Some(format));

    match app.command {
        Commands::Runs { format } => cli::run_runs(&config::load(), fmt(&format)),
        Commands::Detail {
            eval_run_id,
            format,
        } => cli::run_detail(&config::load(), &eval_run_id, fmt(&format)),
        Commands::Leaderboard { format } => cli::run_leaderboard(&config::load(), fmt(&format)),
        Commands::Analyze { run, format } => {
            cli::run_analyze(&config::load(), run.as_deref(), fmt(&format))
        }
        Commands::AutoTune {
            max_iterations,
            format,
        } => cli::run_auto_tune(&config::load(), max_iterations, fmt(&format)),
        Commands::History { index, format } => {
            cli::run_history(&config::load(), index, fmt(&format))
        }
        Commands::Query {
            question,
            top_k,
            format,
        } => {
            let question = question.join(" ");
            cli::run_query(&config::load(), &question, top_k, fmt(&format))
        }
        Commands::Submit { pipeline_config_id } => {
            cli::run_submit(&config::load(), &pipeline_config_id)
        }
        Commands::Web { addr, no_open } => cli::run_web(&config::load(), addr.as_deref(), no_open),
        Commands::Activity { format, days } => cli::run_activity(fmt(&format), days),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
