//! # Cookie Backport Library
//!
//! This library imports commits from a project generated by a Cookiecutter
//! template back into the template itself. Literal variable values are turned
//! back into `{{cookiecutter.<name>}}` tags, Jinja syntax that already existed
//! in the project is escaped, and every path is moved under the template's
//! root directory. History is preserved commit by commit.
//!
//! ## Quick Example
//!
//! ```
//! use cookie_backport::rewrite::ContentRewriter;
//! use cookie_backport::variables::VariableTable;
//!
//! let table = VariableTable::from_pairs([("project_name", "hypermodern-python")]).unwrap();
//! let rewriter = ContentRewriter::new(&table);
//!
//! let output = rewriter.rewrite(b"# hypermodern-python");
//! assert_eq!(output, b"# {{cookiecutter.project_name}}".to_vec());
//!
//! let output = rewriter.rewrite(b"${{ matrix.os }}");
//! assert_eq!(output, br#"${{"{{"}} matrix.os {{"}}"}}"#.to_vec());
//! ```
//!
//! ## Core Concepts
//!
//! - **Configuration (`config`)**: typed views of `.cookiecutter.json` (the
//!   values recorded when the project was generated) and `cookiecutter.json`
//!   (the names the template declares).
//! - **Variable Table (`variables`)**: the ordered substitution table built
//!   from both artifacts.
//! - **Escaping (`escape`)** and **Rewriting (`rewrite`, `path`)**: the
//!   reverse transform for blob content and paths.
//! - **Object Store (`git`, `filesystem`)**: reading and writing blobs, trees
//!   and commits without shelling out.
//! - **Phases (`phases`)**: selection, commit rewriting and import onto the
//!   destination branch.
//! - **Pull Requests (`pr`)**: importing pull requests between hosted
//!   repositories on top of the pipeline.
//!
//! ## Execution Flow
//!
//! The main entry point is `phases::orchestrator::import`, which executes:
//!
//! 1.  **Discovery**: locate the template directory and load both JSON
//!     artifacts into a variable table.
//! 2.  **Selection**: resolve the requested commits in the source repository.
//! 3.  **Rewrite**: rewrite every selected commit into a scratch object store.
//! 4.  **Import**: transfer the rewritten objects into the destination and
//!     cherry-pick them one by one onto the destination branch.

pub mod cache;
pub mod config;
pub mod defaults;
pub mod error;
pub mod escape;
pub mod filesystem;
pub mod git;
pub mod output;
pub mod path;
pub mod phases;
pub mod pr;
pub mod repository;
pub mod rewrite;
pub mod suggestions;
pub mod variables;

#[cfg(test)]
mod rewrite_proptest;

/// Process exit codes used by the command-line tool.
pub mod exit_codes {
    /// The command completed successfully.
    pub const SUCCESS: i32 = 0;
    /// A configuration, selection, rewrite, or remote error occurred.
    pub const ERROR: i32 = 1;
    /// Invalid command-line usage (reported by clap).
    pub const USAGE: i32 = 2;
    /// A commit could not be applied cleanly; the destination is left
    /// mid cherry-pick for manual resolution.
    pub const CONFLICT: i32 = 3;
}
