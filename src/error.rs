//! # Error Handling
//!
//! This module defines the centralized error type for `cookie-backport`. It
//! uses the `thiserror` library to build a single `Error` enum covering every
//! failure mode of the import pipeline, with contextual fields so the operator
//! can tell what failed and where.
//!
//! ## Taxonomy
//!
//! - **`Configuration`**: the recorded values or the template declaration are
//!   missing or malformed. Never retried.
//! - **`Selection`**: the requested commits or branches do not resolve. Never
//!   retried.
//! - **`Rewrite`**: a commit could not be turned into a valid tree (path
//!   collision, undecodable names). Aborts the rest of that selection.
//! - **`Conflict`**: a rewritten commit could not be applied cleanly. Already
//!   integrated commits stay integrated and the conflicted state is left in
//!   the working tree.
//! - **`Remote`**: a hosting API call failed. Transient failures are retried
//!   by the caller with bounded backoff before this surfaces.
//!
//! Wrapped library errors (`git2`, I/O, JSON, URL, semver) get their own
//! variants via `#[from]` so `?` works throughout the crate.

use thiserror::Error;

/// Main error type for cookie-backport operations
#[derive(Error, Debug)]
pub enum Error {
    /// Required variable or value artifacts are missing or malformed.
    #[error("Configuration error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Configuration {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// The requested commit or branch selection does not resolve.
    #[error("Selection error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Selection {
        message: String,
        /// Optional hint for how to fix the selection
        hint: Option<String>,
    },

    /// Rewriting a commit produced an invalid tree.
    #[error("Rewrite error in commit {commit}: {message}")]
    Rewrite { commit: String, message: String },

    /// A rewritten commit could not be applied onto the destination branch.
    ///
    /// The destination is left mid cherry-pick so the conflict can be
    /// resolved with `git cherry-pick --continue` or undone with `--abort`.
    #[error(
        "Conflict while applying {source_commit} (rewritten as {rewritten}) onto {branch} at {destination}: {}\n  hint: resolve the conflicts and run 'git cherry-pick --continue', or 'git cherry-pick --abort'",
        paths.join(", ")
    )]
    Conflict {
        source_commit: String,
        rewritten: String,
        branch: String,
        destination: String,
        paths: Vec<String>,
    },

    /// The destination repository cannot accept an import right now.
    #[error("Destination error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Destination {
        message: String,
        hint: Option<String>,
    },

    /// A hosting API call failed.
    #[error("Remote operation failed: {operation} - {message} (after {attempts} attempt(s))")]
    Remote {
        operation: String,
        message: String,
        /// HTTP status of the response, when there was one
        status: Option<u16>,
        /// Whether retrying the call may succeed
        transient: bool,
        attempts: u32,
    },

    /// An error occurred while executing a git command.
    #[error("Git command failed: git {command} - {stderr}")]
    GitCommand { command: String, stderr: String },

    /// An error from the git object database, wrapped from `git2::Error`.
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON parsing error, wrapped from `serde_json::Error`.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// A semantic versioning parsing error, wrapped from `semver::Error`.
    #[error("Semver parsing error: {0}")]
    Semver(#[from] semver::Error),
}

impl Error {
    /// Shorthand for a configuration error without a hint.
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
            hint: None,
        }
    }

    /// Shorthand for a selection error without a hint.
    pub fn selection(message: impl Into<String>) -> Self {
        Error::Selection {
            message: message.into(),
            hint: None,
        }
    }

    /// Whether the operation that produced this error may succeed if retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Remote { transient: true, .. })
    }

    /// Whether a hosting API call answered 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Remote { status: Some(404), .. })
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Conflict { .. } => crate::exit_codes::CONFLICT,
            _ => crate::exit_codes::ERROR,
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
