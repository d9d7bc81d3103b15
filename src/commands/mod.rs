//! # CLI Command Implementations
//!
//! Each subcommand of the `cookie-backport` tool lives in its own file with:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args`, calls into the
//!   `cookie_backport` library and prints the results.

pub mod completions;
pub mod import;
pub mod import_pr;
