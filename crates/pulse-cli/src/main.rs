mod cmd_cleanup;
mod cmd_cutoff;
mod cmd_query;
mod cmd_report;
mod cmd_status;
mod config;
mod input;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pulse", version, about = "Status-change aggregation and query engine")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a period report from an event log
    Report {
        /// JSON file with an array of raw status-change events
        #[arg(long)]
        input: PathBuf,
        /// Trailing window in weeks (default period when nothing else given)
        #[arg(long, conflicts_with_all = ["month", "from"])]
        weeks: Option<u32>,
        /// Calendar month (1-12); requires --year
        #[arg(long, requires = "year")]
        month: Option<u8>,
        /// Year for --month
        #[arg(long)]
        year: Option<i32>,
        /// Custom range start (YYYY-MM-DD); requires --to
        #[arg(long, requires = "to")]
        from: Option<String>,
        /// Custom range end (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
        /// Output the full report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Compute the retention cutoff date
    Cutoff {
        /// Reference date (YYYY-MM-DD, defaults to today UTC)
        #[arg(long)]
        date: Option<String>,
        /// Retention window in months (overrides config)
        #[arg(long)]
        months: Option<u32>,
    },
    /// Evaluate a structured query intent against an event log
    Query {
        /// JSON file with an array of raw status-change events
        #[arg(long)]
        input: PathBuf,
        /// Structured intent as JSON (e.g. '{"kind":"platform_is","platform":"iOS"}')
        #[arg(long)]
        intent: String,
        /// Conversation key for follow-up refinement
        #[arg(long, default_value = "cli")]
        conversation: String,
        /// Conversation context file persisted between invocations
        #[arg(long)]
        context: Option<PathBuf>,
        /// Output matches as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Plan (and optionally execute) retention cleanup
    Cleanup {
        /// JSON file with an array of raw status-change events
        #[arg(long)]
        input: PathBuf,
        /// Reference date (YYYY-MM-DD, defaults to today UTC)
        #[arg(long)]
        date: Option<String>,
        /// Actually archive expired records (default is dry-run)
        #[arg(long)]
        execute: bool,
    },
    /// Liveness check: echo configuration and input reachability
    Status {
        /// Optional event log to probe
        #[arg(long)]
        input: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config::PulseConfig::load()?;

    match cli.cmd {
        Command::Report {
            input,
            weeks,
            month,
            year,
            from,
            to,
            json,
        } => cmd_report::run(&cmd_report::ReportParams {
            input: &input,
            weeks,
            month,
            year,
            from: from.as_deref(),
            to: to.as_deref(),
            json,
            config: &config,
        }),
        Command::Cutoff { date, months } => cmd_cutoff::run(date.as_deref(), months, &config),
        Command::Query {
            input,
            intent,
            conversation,
            context,
            json,
        } => cmd_query::run(
            &input,
            &intent,
            &conversation,
            context.as_deref(),
            json,
            &config,
        ),
        Command::Cleanup {
            input,
            date,
            execute,
        } => cmd_cleanup::run(&input, date.as_deref(), execute, &config),
        Command::Status { input } => cmd_status::run(input.as_deref(), &config),
    }
}
