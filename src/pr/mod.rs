//! # Pull Request Import
//!
//! Imports pull requests from a hosted project into its hosted Cookiecutter
//! template. For each selected pull request the project branch is imported
//! into the template on `cookie-backport/<branch>`, pushed, and a pull request
//! with the same title, body and labels is opened on the template.
//!
//! Pull requests are processed one at a time. Each runs in its own worktree,
//! so a conflict on one does not affect the next.

pub mod credentials;
pub mod hosting;
pub mod importer;
pub mod retry;

use std::path::Path;

use log::{debug, warn};
use semver::Version;

use crate::config::load_recorded_values;
use crate::error::{Error, Result};
use crate::repository::RepositoryManager;
pub use credentials::{CredentialProvider, FileTokenStore, MemoryTokenStore, TokenStore};
pub use hosting::{GhCli, HostedRepository, HostingApi, PullRequest, PullRequestContent};
pub use importer::{Importer, LoadedRepository, Outcome};
pub use retry::Backoff;

/// Oldest git with `git worktree remove`.
pub const MINIMUM_GIT_VERSION: Version = Version::new(2, 17, 0);

/// Which pull requests to import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullRequestSelection {
    /// Pull request numbers or head branch names. Empty means all open.
    pub specs: Vec<String>,
    /// Only pull requests opened by this user.
    pub user: Option<String>,
}

/// Options for [`import_pull_requests`].
#[derive(Debug, Clone, Default)]
pub struct PullRequestOptions {
    /// Project as `owner/name` or `name`; discovered from the current
    /// repository's remotes when absent.
    pub repository: Option<String>,
    pub selection: PullRequestSelection,
    /// Update template pull requests that already exist.
    pub force: bool,
    /// Continue with the remaining pull requests after a failure.
    pub keep_going: bool,
    pub progress: bool,
}

/// Result for one project pull request.
#[derive(Debug)]
pub struct PullRequestResult {
    pub pull: PullRequest,
    pub outcome: Result<Outcome>,
}

/// Import the selected pull requests of a project into its template.
///
/// Without `keep_going` the first failure is returned immediately. With it,
/// every selected pull request is attempted and failures are reported in the
/// returned results.
pub fn import_pull_requests(
    options: &PullRequestOptions,
    api: &dyn HostingApi,
    manager: &RepositoryManager,
    discover_from: &Path,
) -> Result<Vec<PullRequestResult>> {
    let project_name = match &options.repository {
        Some(name) if name.contains('/') => name.clone(),
        Some(name) => format!("{}/{}", api.me()?, name),
        None => project_name_from_remotes(discover_from)?,
    };

    debug!("Loading project {}", project_name);
    let project = LoadedRepository::load(&project_name, api, manager)?;

    let template_name = template_name(&project)?;
    debug!("Loading template {}", template_name);
    let template = LoadedRepository::load(&template_name, api, manager)?;

    let pulls = list_pull_requests(api, &project.hosted, &options.selection)?;
    if pulls.is_empty() {
        warn!("No matching pull requests in {}", project.hosted.full_name);
    }

    let importer =
        Importer::new(&project, &template, api, manager).with_progress(options.progress);

    let mut results = Vec::with_capacity(pulls.len());
    for pull in pulls {
        let outcome = match importer.import(&pull, options.force) {
            Err(error) if !options.keep_going => return Err(error),
            Err(error) => {
                warn!("#{} failed: {}", pull.number, error);
                Err(error)
            }
            ok => ok,
        };
        results.push(PullRequestResult { pull, outcome });
    }

    Ok(results)
}

/// Resolve the selection against the project's pull requests.
///
/// A spec that parses as a number names a pull request; anything else is the
/// head branch of an open pull request in the project itself.
pub fn list_pull_requests(
    api: &dyn HostingApi,
    project: &HostedRepository,
    selection: &PullRequestSelection,
) -> Result<Vec<PullRequest>> {
    let pulls = if selection.specs.is_empty() {
        api.pull_requests(project)?
    } else {
        let mut pulls = Vec::with_capacity(selection.specs.len());
        for spec in &selection.specs {
            let pull = match spec.trim_start_matches('#').parse::<u64>() {
                Ok(number) => api.pull_request(project, number)?,
                Err(_) => api
                    .pull_request_by_head(project, &format!("{}:{spec}", project.owner))?
                    .ok_or_else(|| Error::Selection {
                        message: format!("pull request '{spec}' not found"),
                        hint: Some(format!(
                            "no open pull request in {} has the head branch '{spec}'",
                            project.full_name
                        )),
                    })?,
            };
            pulls.push(pull);
        }
        pulls
    };

    Ok(pulls
        .into_iter()
        .filter(|pull| selection.user.as_deref().is_none_or(|user| pull.user == user))
        .collect())
}

/// Extract `owner/name` from a GitHub repository URL.
///
/// Understands the `gh:` abbreviation used by Cookiecutter, SSH remotes
/// (`git@github.com:owner/name.git`) and HTTPS URLs.
pub fn parse_repository_name(url: &str) -> Option<String> {
    for prefix in ["gh:", "git@github.com:"] {
        if let Some(path) = url.strip_prefix(prefix) {
            return Some(path.strip_suffix(".git").unwrap_or(path).to_string());
        }
    }

    let parsed = url::Url::parse(url).ok()?;
    if parsed.host_str() != Some("github.com") {
        return None;
    }
    let path = parsed.path().trim_start_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    (!path.is_empty()).then(|| path.to_string())
}

/// The project name from the first GitHub remote of the repository at `path`.
pub fn project_name_from_remotes(path: &Path) -> Result<String> {
    let not_found = || Error::Configuration {
        message: "project not found".to_string(),
        hint: Some(
            "run inside a clone of a GitHub repository, or pass --repository".to_string(),
        ),
    };

    let repo = git2::Repository::discover(path).map_err(|_| not_found())?;
    let remotes = repo.remotes()?;
    for name in remotes.iter().flatten() {
        let remote = repo.find_remote(name)?;
        if let Some(full_name) = remote.url().and_then(parse_repository_name) {
            debug!("Project {} from remote '{}'", full_name, name);
            return Ok(full_name);
        }
    }

    Err(not_found())
}

/// The template name from the `_template` key the project was generated with.
pub fn template_name(project: &LoadedRepository) -> Result<String> {
    let not_found = |detail: String| Error::Configuration {
        message: format!(
            "project template for {} not found: {detail}",
            project.hosted.full_name
        ),
        hint: Some(
            "the project's .cookiecutter.json must name a GitHub repository under \"_template\""
                .to_string(),
        ),
    };

    let mirror = git2::Repository::open_bare(&project.mirror)?;
    let head = mirror.head()?.peel_to_commit()?.id();
    let values = load_recorded_values(&mirror, Some(head))?;
    let source = values
        .template_source()
        .ok_or_else(|| not_found("no \"_template\" key".to_string()))?;

    parse_repository_name(source)
        .ok_or_else(|| not_found(format!("'{source}' is not a GitHub repository")))
}

/// Fail unless the installed git is at least [`MINIMUM_GIT_VERSION`].
pub fn check_git_version() -> Result<Version> {
    let version = crate::git::git_version()?;
    ensure_git_version(&version)?;
    Ok(version)
}

fn ensure_git_version(version: &Version) -> Result<()> {
    if *version < MINIMUM_GIT_VERSION {
        return Err(Error::Configuration {
            message: format!("git {version} is too old"),
            hint: Some(format!("install git {MINIMUM_GIT_VERSION} or newer")),
        });
    }
    Ok(())
}
