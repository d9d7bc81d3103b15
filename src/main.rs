//! # Cookie Backport CLI
//!
//! This is the binary entry point for the `cookie-backport` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Executing the appropriate command based on the parsed arguments.
//! - Translating errors into user-friendly output and the documented exit
//!   codes (see [`cookie_backport::exit_codes`]).
//!
//! The core application logic is defined in the `lib.rs` library crate, ensuring
//! that the binary is a thin wrapper around the reusable library functionality.

mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;
use cookie_backport::error::Error;
use cookie_backport::exit_codes;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    match cli.execute() {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(error) => {
            eprintln!("Error: {error:#}");
            let code = error
                .downcast_ref::<Error>()
                .map_or(exit_codes::ERROR, Error::exit_code);
            ExitCode::from(code as u8)
        }
    }
}
