pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "shopwright",
    about = "Shopwright operator CLI",
    long_about = "Operate Shopwright migrations, config inspection, readiness checks, and the \
                  offline checkout demo.",
    after_help = "Examples:\n  shopwright doctor --json\n  shopwright config\n  shopwright demo"
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
    #[command(about = "Validate config, payment key readiness, and database connectivity")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Run a scripted shopping conversation against an offline checkout worker")]
    Demo,
    #[command(about = "Fetch and print the demo store's product catalog")]
    Products,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Demo => commands::demo::run(),
        Command::Products => commands::products::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
