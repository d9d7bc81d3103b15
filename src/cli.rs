//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};
use cookie_backport::output::OutputConfig;

use crate::commands;

/// Cookie Backport - Import commits from generated projects into their
/// Cookiecutter template
#[derive(Parser, Debug)]
#[command(name = "cookie-backport")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace) [default: warn, or RUST_LOG]
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Import commits from a generated project into the template
    Import(commands::import::ImportArgs),

    /// Import pull requests from a GitHub project into its template
    #[command(name = "import-pr")]
    ImportPr(commands::import_pr::ImportPrArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(self.log_level.as_deref());

        let output = OutputConfig::from_env_and_flag(&self.color);
        output.apply();

        match self.command {
            Commands::Import(args) => commands::import::execute(args, &output),
            Commands::ImportPr(args) => commands::import_pr::execute(args, &output),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

/// Log to stderr. An explicit `--log-level` wins over `RUST_LOG`.
fn init_logging(level: Option<&str>) {
    let mut builder = match level {
        Some(level) => {
            let mut builder = env_logger::Builder::new();
            builder.parse_filters(level);
            builder
        }
        None => env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")),
    };
    builder.format_timestamp(None).format_target(false);
    // A second initialisation only happens in tests.
    let _ = builder.try_init();
}
