use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use phasely_core::time::parse_iso_date;
use tracing_subscriber::EnvFilter;

mod advice_cmd;
mod config;
mod cycle_cmd;
mod state;
mod store;
mod task_cmd;

use crate::config::ConfigCommand;
use crate::cycle_cmd::CycleCommand;
use crate::store::JsonStore;
use crate::task_cmd::TaskCommand;

#[derive(Parser, Debug)]
#[command(name = "phasely", version, about = "Phase-aware personal task scheduler")]
struct Cli {
    /// Treat this date as today (YYYY-MM-DD). Defaults to today in the configured timezone.
    #[arg(long, global = true)]
    today: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log and inspect periods
    Cycle {
        #[command(subcommand)]
        command: CycleCommand,
    },

    /// Phase of a date, or an outlook of upcoming phases
    Phase {
        /// Date to look up (default: today)
        #[arg(long)]
        date: Option<String>,

        /// Show the next N days as phase periods instead
        #[arg(long)]
        days: Option<u32>,
    },

    /// Add, list and complete tasks
    Task {
        #[command(subcommand)]
        command: TaskCommand,
    },

    /// Overload, energy-mismatch and underused-window warnings for the next 30 days
    Warnings,

    /// Re-optimize auto-scheduled tasks against the latest cycle data
    Reschedule {
        /// Apply the suggestions for these task ids (prefixes accepted)
        #[arg(long, num_args = 1..)]
        accept: Vec<String>,

        /// Apply every suggestion
        #[arg(long, default_value_t = false)]
        all: bool,
    },

    /// Suggest tasks to pull forward into idle ovulation windows
    PullForward,

    /// Manage ~/.phasely/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("phasely=info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_today(flag: Option<&str>) -> Result<NaiveDate> {
    match flag {
        Some(s) => parse_iso_date(s),
        None => config::load_config()?.today(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Config { command } => config::run(command).await,
        command => run(command, cli.today.as_deref()).await,
    }
}

async fn run(command: Command, today_flag: Option<&str>) -> Result<()> {
    let today = resolve_today(today_flag)?;
    let store = JsonStore::open()?;

    match command {
        Command::Cycle { command } => cycle_cmd::run(&store, command, today).await,
        Command::Phase { date, days } => cycle_cmd::phase(&store, date, days, today).await,
        Command::Task { command } => task_cmd::run(&store, command, today).await,
        Command::Warnings => advice_cmd::warnings(&store, today).await,
        Command::Reschedule { accept, all } => {
            advice_cmd::reschedule(&store, &accept, all, today).await
        }
        Command::PullForward => advice_cmd::pull_forward(&store, today).await,
        Command::Config { command } => config::run(command).await,
    }
}
