pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use boxoffice_core::config::{AppConfig, LoadOptions, LogFormat};
use clap::{Parser, Subcommand};
use tracing::Level;

#[derive(Debug, Parser)]
#[command(
    name = "boxoffice",
    about = "Boxoffice booking turn CLI",
    long_about = "Answer single booking turns, inspect the movie catalog, and review effective configuration.",
    after_help = "Examples:\n  boxoffice turn --file turn.json\n  cat turn.json | boxoffice turn\n  boxoffice catalog\n  boxoffice config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Answer one turn request (JSON from --file or stdin) and print the response")]
    Turn {
        #[arg(long, help = "Read the turn request from this file instead of stdin")]
        file: Option<PathBuf>,
    },
    #[command(about = "Fetch the configured catalog and print entries with the carried lookup")]
    Catalog,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct LogSettings {
    level: Level,
    format: LogFormat,
}

/// Falls back to quiet compact output when the config cannot be loaded; the
/// command itself reports that failure.
fn log_settings(config: Option<&AppConfig>) -> LogSettings {
    match config {
        Some(config) => LogSettings {
            level: config.logging.level.parse::<Level>().unwrap_or(Level::WARN),
            format: config.logging.format,
        },
        None => LogSettings { level: Level::WARN, format: LogFormat::Compact },
    }
}

/// Logs go to stderr so command output on stdout stays machine-readable.
fn init_logging() {
    let config = AppConfig::load(LoadOptions::default()).ok();
    let settings = log_settings(config.as_ref());
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(settings.level)
        .with_writer(std::io::stderr);

    let _ = match settings.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Command::Turn { file } => commands::turn::run(file.as_deref()),
        Command::Catalog => commands::catalog::run(),
        Command::Config => {
            commands::CommandResult { exit_code: commands::EXIT_OK, output: commands::config::run() }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
