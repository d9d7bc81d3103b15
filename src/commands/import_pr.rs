//! Import-pr command implementation
//!
//! Imports pull requests of a GitHub project into its template repository,
//! which is found through the `_template` key of the project's
//! `.cookiecutter.json`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use cookie_backport::defaults::{default_cache_root, token_file, CACHE_ENV};
use cookie_backport::output::OutputConfig;
use cookie_backport::pr::{
    self, CredentialProvider, FileTokenStore, GhCli, PullRequestOptions, PullRequestSelection,
};
use cookie_backport::repository::RepositoryManager;
use cookie_backport::suggestions;

/// Arguments for the import-pr command
#[derive(Args, Debug)]
pub struct ImportPrArgs {
    /// Pull request numbers or head branches to import
    #[arg(value_name = "PULL_REQUEST")]
    pub pull_requests: Vec<String>,

    /// GitHub project as OWNER/NAME or NAME [default: from the current repository's remotes]
    #[arg(short = 'R', long, value_name = "REPOSITORY")]
    pub repository: Option<String>,

    /// Import pull requests opened by this user
    #[arg(short, long, value_name = "LOGIN")]
    pub user: Option<String>,

    /// Import all open pull requests
    #[arg(short, long)]
    pub all: bool,

    /// Update template pull requests that were already imported
    #[arg(short, long)]
    pub force: bool,

    /// Continue with the remaining pull requests after a failure
    #[arg(long)]
    pub keep_going: bool,

    /// GitHub token [default: GITHUB_TOKEN, or the stored token]
    #[arg(long, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Remove the stored GitHub token and exit
    #[arg(long)]
    pub forget_token: bool,

    /// Never prompt for a token
    #[arg(long)]
    pub no_prompt: bool,

    /// Cache root directory
    #[arg(long, value_name = "PATH", env = CACHE_ENV)]
    pub cache_root: Option<PathBuf>,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl ImportPrArgs {
    fn selection(&self) -> Result<PullRequestSelection> {
        if self.all && !self.pull_requests.is_empty() {
            return Err(suggestions::all_with_pull_requests());
        }
        if !self.all && self.user.is_none() && self.pull_requests.is_empty() {
            return Err(suggestions::no_pull_requests_selected());
        }
        Ok(PullRequestSelection {
            specs: self.pull_requests.clone(),
            user: self.user.clone(),
        })
    }
}

/// Execute the import-pr command
pub fn execute(args: ImportPrArgs, output: &OutputConfig) -> Result<()> {
    let cache_root = args.cache_root.clone().unwrap_or_else(default_cache_root);
    let store = FileTokenStore::new(token_file(&cache_root));

    if args.forget_token {
        CredentialProvider::new(&store).forget()?;
        if !args.quiet {
            println!("Removed {}", store.path().display());
        }
        return Ok(());
    }

    let selection = args.selection()?;
    pr::check_git_version()?;

    let interactive = !args.no_prompt && console::Term::stderr().is_term();
    let token = CredentialProvider::new(&store)
        .with_token(args.token.clone())
        .interactive(interactive)
        .token()?;

    let api = GhCli::new(token);
    let manager = RepositoryManager::new(cache_root);
    let cwd = std::env::current_dir().context("Failed to get current directory")?;

    let options = PullRequestOptions {
        repository: args.repository.clone(),
        selection,
        force: args.force,
        keep_going: args.keep_going,
        progress: !args.quiet && console::Term::stderr().is_term(),
    };

    let results = pr::import_pull_requests(&options, &api, &manager, &cwd)?;

    let mut failures = 0;
    for result in &results {
        match &result.outcome {
            Ok(outcome) => {
                if !args.quiet {
                    let template_pull = outcome.template_pull();
                    println!(
                        "#{} {} {}",
                        result.pull.number,
                        result.pull.title,
                        output.pull_request(
                            outcome.action(),
                            template_pull.number,
                            &template_pull.html_url
                        )
                    );
                }
            }
            Err(error) => {
                failures += 1;
                eprintln!("#{} {}: {error}", result.pull.number, result.pull.title);
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {} pull request(s) failed", results.len());
    }

    Ok(())
}
