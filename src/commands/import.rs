//! Import command implementation
//!
//! Runs the import pipeline from a generated project into the template
//! repository in the current (or `--directory`) directory:
//! 1. Discovery of the template directory and the variable table
//! 2. Selection of the commits to import
//! 3. Rewriting into a scratch object store
//! 4. Cherry-picking the rewritten commits onto the destination branch

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use cookie_backport::git::short_id;
use cookie_backport::output::OutputConfig;
use cookie_backport::phases::{self, Destination, ImportOptions, ImportReport, SelectionSpec};
use cookie_backport::suggestions;
use cookie_backport::variables::VariableFilter;

/// Arguments for the import command
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Path to the generated project to import from
    #[arg(value_name = "REPOSITORY")]
    pub source: PathBuf,

    /// Commits or ranges to import (default: HEAD, or the branch with --branch)
    #[arg(value_name = "COMMITS")]
    pub commits: Vec<String>,

    /// Import the commits of this branch that are not on the upstream
    #[arg(short, long, value_name = "BRANCH")]
    pub branch: Option<String>,

    /// Upstream for --branch [default: init.defaultBranch, or master]
    #[arg(long, value_name = "BRANCH")]
    pub upstream: Option<String>,

    /// Create the branch named by --branch in the template
    #[arg(long)]
    pub create: bool,

    /// Create a branch with this name in the template
    #[arg(long, value_name = "NAME")]
    pub create_branch: Option<String>,

    /// Path to the template repository (defaults to current directory)
    #[arg(short = 'C', long, value_name = "PATH")]
    pub directory: Option<PathBuf>,

    /// Only substitute this variable (repeatable)
    #[arg(short, long = "include-variable", value_name = "NAME")]
    pub include_variable: Vec<String>,

    /// Never substitute this variable (repeatable)
    #[arg(short, long = "exclude-variable", value_name = "NAME")]
    pub exclude_variable: Vec<String>,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl ImportArgs {
    fn destination(&self) -> Result<Destination> {
        match (self.create, &self.create_branch, &self.branch) {
            (true, Some(_), _) => Err(suggestions::create_flags_exclusive()),
            (true, None, None) => Err(suggestions::create_requires_branch()),
            (true, None, Some(branch)) => Ok(Destination::Create(branch.clone())),
            (false, Some(name), _) => Ok(Destination::Create(name.clone())),
            (false, None, _) => Ok(Destination::Current),
        }
    }

    fn options(&self) -> Result<ImportOptions> {
        let destination = match &self.directory {
            Some(directory) => directory.clone(),
            None => std::env::current_dir().context("Failed to get current directory")?,
        };

        let mut options = ImportOptions::new(&self.source, destination);
        options.selection = SelectionSpec {
            revisions: self.commits.clone(),
            branch: self.branch.clone(),
            upstream: self.upstream.clone(),
        };
        options.target = self.destination()?;
        options.filter = VariableFilter {
            include: self.include_variable.clone(),
            exclude: self.exclude_variable.clone(),
        };
        options.progress = !self.quiet && console::Term::stderr().is_term();
        Ok(options)
    }
}

/// Execute the import command
pub fn execute(args: ImportArgs, output: &OutputConfig) -> Result<()> {
    let options = args.options()?;
    let report = phases::import(&options)?;

    if !args.quiet {
        print_report(&options, &report, output);
    }

    Ok(())
}

fn print_report(options: &ImportOptions, report: &ImportReport, output: &OutputConfig) {
    let source = git2::Repository::open(&options.source).ok();
    let summary = |id: git2::Oid| -> String {
        source
            .as_ref()
            .and_then(|repo| repo.find_commit(id).ok())
            .and_then(|commit| commit.summary().map(str::to_string))
            .unwrap_or_default()
    };

    for commit in &report.commits {
        let line = match commit.integrated {
            Some(integrated) => output.imported(
                &short_id(commit.source),
                &short_id(integrated),
                &summary(commit.source),
            ),
            None => output.skipped(&short_id(commit.source), &summary(commit.source)),
        };
        println!("{line}");
    }
}
