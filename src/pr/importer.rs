//! Import of a single pull request from a project into its template.

use std::path::PathBuf;

use log::{debug, info};

use super::hosting::{HostedRepository, HostingApi, PullRequest, PullRequestContent};
use crate::defaults::BRANCH_PREFIX;
use crate::error::Result;
use crate::phases::{self, Destination, ImportOptions, SelectionSpec};
use crate::repository::RepositoryManager;

/// A hosted repository together with its local mirror clone.
#[derive(Debug, Clone)]
pub struct LoadedRepository {
    pub hosted: HostedRepository,
    pub mirror: PathBuf,
}

impl LoadedRepository {
    /// Look up `full_name` and bring its mirror clone up to date.
    pub fn load(
        full_name: &str,
        api: &dyn HostingApi,
        manager: &RepositoryManager,
    ) -> Result<Self> {
        let hosted = api.repository(full_name)?;
        let mirror = manager.fetch_mirror(&hosted.clone_url)?;
        Ok(Self { hosted, mirror })
    }
}

/// What happened to a project pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A template pull request was opened.
    Created(PullRequest),
    /// The existing template pull request was force-updated.
    Updated(PullRequest),
    /// A template pull request exists and `force` was not given.
    AlreadyImported(PullRequest),
}

impl Outcome {
    /// The template pull request.
    pub fn template_pull(&self) -> &PullRequest {
        match self {
            Outcome::Created(pull) | Outcome::Updated(pull) | Outcome::AlreadyImported(pull) => {
                pull
            }
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            Outcome::Created(_) => "created",
            Outcome::Updated(_) => "updated",
            Outcome::AlreadyImported(_) => "already imported as",
        }
    }
}

/// Imports project pull requests into the template, one at a time.
pub struct Importer<'a> {
    project: &'a LoadedRepository,
    template: &'a LoadedRepository,
    api: &'a dyn HostingApi,
    manager: &'a RepositoryManager,
    progress: bool,
}

impl<'a> Importer<'a> {
    pub fn new(
        project: &'a LoadedRepository,
        template: &'a LoadedRepository,
        api: &'a dyn HostingApi,
        manager: &'a RepositoryManager,
    ) -> Self {
        Self {
            project,
            template,
            api,
            manager,
            progress: false,
        }
    }

    /// Show a progress bar while rewriting.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Name of the template branch a project branch is imported on.
    pub fn template_branch(project_branch: &str) -> String {
        format!("{BRANCH_PREFIX}{project_branch}")
    }

    /// Import `pull`, opening or (with `force`) updating the template pull
    /// request.
    ///
    /// Nothing is pushed unless the commits applied cleanly.
    pub fn import(&self, pull: &PullRequest, force: bool) -> Result<Outcome> {
        let branch = Self::template_branch(&pull.branch);
        let head = format!("{}:{}", self.template.hosted.owner, branch);
        let existing = self.api.pull_request_by_head(&self.template.hosted, &head)?;

        if let Some(existing) = existing.as_ref().filter(|_| !force) {
            debug!(
                "#{} is already imported as #{}",
                pull.number, existing.number
            );
            return Ok(Outcome::AlreadyImported(existing.clone()));
        }

        {
            let worktree = self.manager.worktree(&self.template.mirror, &branch, "HEAD")?;

            let mut options = ImportOptions::new(&self.project.mirror, worktree.path());
            options.selection =
                SelectionSpec::branch(&pull.branch, &self.project.hosted.default_branch);
            options.target = Destination::Current;
            options.progress = self.progress;

            let report = phases::import(&options)?;
            info!(
                "#{}: {} commit(s) imported on '{}'",
                pull.number,
                report.integrated().count(),
                report.branch
            );
        }

        self.manager.push(
            &self.template.mirror,
            &self.api.push_url(&self.template.hosted),
            &branch,
            force,
        )?;

        let content = PullRequestContent::from(pull);
        match existing {
            None => self
                .api
                .create_pull_request(&self.template.hosted, &head, &content)
                .map(Outcome::Created),
            Some(existing) => self
                .api
                .update_pull_request(&self.template.hosted, existing.number, &content)
                .map(Outcome::Updated),
        }
    }
}
