pub mod commands;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use velocity_core::config::{AppConfig, LoadOptions, LogFormat, LoggingConfig};

use crate::commands::{session::SessionAction, widget::WidgetArgs, TargetArgs};

#[derive(Debug, Parser)]
#[command(
    name = "velocity",
    about = "Review velocity widget CLI",
    long_about = "Fetch business reputation metrics, generate AI review summaries, and manage the local cache.",
    after_help = "Examples:\n  velocity widget b1\n  velocity widget \"Snow Family Dentistry\" --tier client --analyze\n  velocity analyze b2\n  velocity config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Load metrics (and cached analysis) for one business")]
    Widget(WidgetArgs),
    #[command(about = "Regenerate the AI review analysis for one business")]
    Analyze(TargetArgs),
    #[command(about = "Discard every cached record, analysis, and saved session")]
    ClearCache,
    #[command(about = "List Business Profile locations reachable with an access token")]
    Locations {
        #[arg(long, help = "OAuth access token for the Business Profile APIs")]
        token: String,
    },
    #[command(about = "Inspect or end the saved session")]
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    // A broken config is reported by the command itself; logging just stays off.
    if let Ok(config) = AppConfig::load(LoadOptions::default()) {
        if let Err(error) = init_logging(&config.logging) {
            eprintln!("logging disabled: {error:#}");
        }
    }

    let result = match cli.command {
        Command::Widget(args) => commands::widget::run(args),
        Command::Analyze(args) => commands::analyze::run(args),
        Command::ClearCache => commands::clear_cache::run(),
        Command::Locations { token } => commands::locations::run(&token),
        Command::Session { action } => commands::session::run(action),
        Command::Config => commands::config::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Install the global subscriber. `RUST_LOG` wins over `logging.level`.
/// Events go to stderr so stdout carries only command payloads.
fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&logging.level)
            .with_context(|| format!("invalid log level `{}`", logging.level))?,
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    let installed = match logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|error| anyhow!("failed to install tracing subscriber: {error}"))
}
