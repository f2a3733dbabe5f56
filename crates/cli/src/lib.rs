pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "snapbill",
    about = "SnapBill operator CLI",
    long_about = "Operate SnapBill storage, configuration inspection, readiness checks, and sales reporting.",
    after_help = "Examples:\n  snapbill doctor --json\n  snapbill config\n  snapbill dashboard --owner shop-1 --days 7"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, language provider readiness, and DB connectivity")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Print the rolling-window sales summary for one shop as JSON")]
    Dashboard {
        #[arg(long, help = "Owner (shop) identifier")]
        owner: String,
        #[arg(
            long,
            value_parser = clap::value_parser!(u32).range(1..=365),
            help = "Window length in days (defaults to assistant.analytics_window_days)"
        )]
        days: Option<u32>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Dashboard { owner, days } => commands::dashboard::run(&owner, days),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
