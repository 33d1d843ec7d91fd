//! Inbound CLI - goods receiving against the ERP from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Show how a scanned code is split
//! inbound parse 200000066/10
//!
//! # Interactive receiving session (barcode scanner as keyboard)
//! inbound receive
//!
//! # List received lines of an order and confirm them
//! inbound received 500123 --origin sales --confirm-all
//! ```
//!
//! # Commands
//!
//! - `parse` - Split a scan into order and line (offline)
//! - `receive` - Interactive receiving session
//! - `received` - List or confirm received lines

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use inbound_core::Origin;
use inbound_receiving::config::{LogFormat, ReceivingConfig};
use inbound_receiving::telemetry;

mod commands;
mod render;

#[derive(Parser)]
#[command(name = "inbound")]
#[command(author, version, about = "Inbound goods receiving")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a scanned code into order and line
    Parse {
        /// Scanned or typed code, e.g. `200000066/10`
        scan: String,
    },
    /// Start an interactive receiving session
    Receive,
    /// List received lines of an order
    Received {
        /// Order number
        order: String,

        /// Origin of the order (`purchase`, `sales`, `transfer`,
        /// `transfer_manual`, `production`)
        #[arg(short, long)]
        origin: Origin,

        /// Confirm all listed lines
        #[arg(long)]
        confirm_all: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    telemetry::init_tracing(LogFormat::from_env());

    let result = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    if let Commands::Parse { scan } = &cli.command {
        return commands::parse::run(scan);
    }

    let config = ReceivingConfig::from_env()?;
    let _sentry_guard = telemetry::init_sentry(&config);

    match cli.command {
        Commands::Parse { .. } => Ok(()),
        Commands::Receive => commands::receive::run(&config).await,
        Commands::Received {
            order,
            origin,
            confirm_all,
        } => commands::received::run(&config, &order, origin, confirm_all).await,
    }
}
