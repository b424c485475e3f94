//! FleetLedger CLI - fleet income tracking in your terminal

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{analytics, driver, entry, expense, import, init, vehicle};

/// FleetLedger - fleet income tracking in your terminal
#[derive(Parser)]
#[command(name = "fl", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory and sign in a local user
    Init {
        /// User id to sign in as
        #[arg(long)]
        user: String,
        /// Role to grant that user (admin, manager, driver)
        #[arg(long, default_value = "admin")]
        role: String,
    },

    /// Import daily entries from a CSV file
    Import {
        /// Path to CSV file
        file: PathBuf,
        /// Parse and report without writing anything
        #[arg(long)]
        preview: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show fleet financial analytics
    Analytics {
        /// Time window
        #[arg(long, value_enum, default_value_t = analytics::Window::All)]
        window: analytics::Window,
        /// Restrict to one driver id
        #[arg(long)]
        driver: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage drivers
    Driver {
        #[command(subcommand)]
        command: driver::DriverCommands,
    },

    /// Manage vehicles
    Vehicle {
        #[command(subcommand)]
        command: vehicle::VehicleCommands,
    },

    /// Record and list expenses
    Expense {
        #[command(subcommand)]
        command: expense::ExpenseCommands,
    },

    /// Record and list daily entries
    Entry {
        #[command(subcommand)]
        command: entry::EntryCommands,
    },
}

/// Structured logs go to stderr; `FLEETLEDGER_LOG` sets the filter
fn init_logging() {
    let filter = EnvFilter::try_from_env("FLEETLEDGER_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { user, role } => init::run(&user, &role),
        Commands::Import { file, preview, json } => import::run(&file, preview, json).await,
        Commands::Analytics { window, driver, json } => analytics::run(window, driver, json).await,
        Commands::Driver { command } => driver::run(command).await,
        Commands::Vehicle { command } => vehicle::run(command).await,
        Commands::Expense { command } => expense::run(command).await,
        Commands::Entry { command } => entry::run(command).await,
    }
}
