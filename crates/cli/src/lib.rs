pub mod commands;

use billgate_core::BillingMonth;
use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "billgate",
    about = "Billgate operator CLI",
    long_about = "Inspect billgate configuration and probe the bill-payment backend.",
    after_help = "Examples:\n  billgate config\n  billgate smoke --subscriber 5551234567 --month 2024-03"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Authenticate against the backend and run read-only bill queries")]
    Smoke {
        #[arg(long, help = "Subscriber number to query")]
        subscriber: String,
        #[arg(long, value_parser = parse_month, help = "Billing month in YYYY-MM form")]
        month: BillingMonth,
    },
}

fn parse_month(raw: &str) -> Result<BillingMonth, String> {
    BillingMonth::parse(raw).ok_or_else(|| format!("`{raw}` is not a YYYY-MM month"))
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => commands::config::run(),
        Command::Smoke { subscriber, month } => commands::smoke::run(&subscriber, &month),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
