//! Phase 4: Import
//!
//! Makes the rewritten commits reachable from the destination repository and
//! applies them one at a time onto the destination branch, like a series of
//! `git cherry-pick` invocations.
//!
//! Each commit is an independent step. The branch ref is advanced with a
//! compare-and-swap after every successful pick, so a conflict on commit *k*
//! leaves commits *1..k-1* integrated. The conflicted pick is left exactly as
//! `git cherry-pick` would leave it: conflict markers in the working tree,
//! conflicted entries in the index, `CHERRY_PICK_HEAD` and `MERGE_MSG` in the
//! git directory.

use git2::build::CheckoutBuilder;
use git2::{
    BranchType, CherrypickOptions, ErrorCode, ObjectType, Oid, Repository, RepositoryState,
    Status, StatusOptions,
};
use log::{debug, info, warn};

use crate::error::{Error, Result};
use crate::git::{display_path, short_id, transfer_objects, ObjectStore};
use crate::phases::rewrite::RewrittenCommit;

/// Which branch of the destination receives the imported commits.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Destination {
    /// The branch currently checked out.
    #[default]
    Current,
    /// A new branch created at `HEAD`; fails if it already exists.
    Create(String),
    /// An existing branch, created at `HEAD` when missing.
    Switch(String),
}

/// One selected commit and what became of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportedCommit {
    pub source: Oid,
    pub rewritten: Oid,
    /// The commit written on the destination branch, or `None` when the pick
    /// changed nothing and was skipped.
    pub integrated: Option<Oid>,
}

/// Result of a successful import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    /// Destination branch the commits were applied to.
    pub branch: String,
    pub commits: Vec<ImportedCommit>,
}

impl ImportReport {
    /// Commits written on the destination branch.
    pub fn integrated(&self) -> impl Iterator<Item = &ImportedCommit> {
        self.commits.iter().filter(|c| c.integrated.is_some())
    }

    /// Commits skipped because they changed nothing.
    pub fn skipped(&self) -> impl Iterator<Item = &ImportedCommit> {
        self.commits.iter().filter(|c| c.integrated.is_none())
    }
}

fn destination_error(message: impl Into<String>, hint: Option<&str>) -> Error {
    Error::Destination {
        message: message.into(),
        hint: hint.map(str::to_string),
    }
}

/// Check that `repo` can receive an import without losing anything.
///
/// The repository must have a working tree and a born `HEAD`, no operation
/// (merge, rebase, cherry-pick) may be in progress, and tracked files must be
/// unmodified. Untracked files are allowed.
pub fn check_destination(repo: &Repository) -> Result<()> {
    let location = display_path(repo);

    if repo.is_bare() {
        return Err(destination_error(
            format!("{} is a bare repository", location.display()),
            Some("import into a clone with a working tree"),
        ));
    }

    match repo.head() {
        Ok(_) => {}
        Err(e) if e.code() == ErrorCode::UnbornBranch => {
            return Err(destination_error(
                format!("{} has no commits yet", location.display()),
                Some("commit the template before importing into it"),
            ))
        }
        Err(e) => return Err(e.into()),
    }

    let state = repo.state();
    if state != RepositoryState::Clean {
        return Err(destination_error(
            format!("an operation is in progress in {} ({state:?})", location.display()),
            Some("finish it, or abort it (for example 'git cherry-pick --abort')"),
        ));
    }

    let mut options = StatusOptions::new();
    options.include_untracked(false).include_ignored(false);
    let statuses = repo.statuses(Some(&mut options))?;
    let dirty: Vec<String> = statuses
        .iter()
        .filter(|entry| entry.status() != Status::CURRENT)
        .filter_map(|entry| entry.path().map(str::to_string))
        .collect();

    if !dirty.is_empty() {
        return Err(destination_error(
            format!(
                "{} has uncommitted changes: {}",
                location.display(),
                dirty.join(", ")
            ),
            Some("commit or stash your changes first"),
        ));
    }

    Ok(())
}

/// Check out the destination branch, creating it if requested.
///
/// Returns the branch name.
pub fn prepare_branch(repo: &Repository, destination: &Destination) -> Result<String> {
    match destination {
        Destination::Current => {
            let head = repo.head()?;
            if !head.is_branch() {
                return Err(destination_error(
                    "HEAD is detached",
                    Some("check out a branch, or pass --create-branch"),
                ));
            }
            Ok(head.shorthand().unwrap_or("HEAD").to_string())
        }
        Destination::Create(name) => {
            if repo.find_branch(name, BranchType::Local).is_ok() {
                return Err(destination_error(
                    format!("branch '{name}' already exists"),
                    Some("choose another name, or drop --create to import onto it"),
                ));
            }
            create_at_head(repo, name)?;
            Ok(name.clone())
        }
        Destination::Switch(name) => match repo.find_branch(name, BranchType::Local) {
            Ok(branch) => {
                let reference = branch.into_reference();
                let refname = reference
                    .name()
                    .ok_or_else(|| destination_error(format!("invalid branch name '{name}'"), None))?
                    .to_string();
                let target = reference.peel(ObjectType::Commit)?;
                let mut checkout = CheckoutBuilder::new();
                checkout.safe();
                repo.checkout_tree(&target, Some(&mut checkout))?;
                repo.set_head(&refname)?;
                debug!("Switched to branch '{}'", name);
                Ok(name.clone())
            }
            Err(e) if e.code() == ErrorCode::NotFound => {
                create_at_head(repo, name)?;
                Ok(name.clone())
            }
            Err(e) => Err(e.into()),
        },
    }
}

fn create_at_head(repo: &Repository, name: &str) -> Result<()> {
    let head = repo.head()?.peel_to_commit()?;
    let branch = repo.branch(name, &head, false)?;
    let refname = branch
        .get()
        .name()
        .ok_or_else(|| destination_error(format!("invalid branch name '{name}'"), None))?
        .to_string();
    // Same commit as HEAD: the index and working tree already match.
    repo.set_head(&refname)?;
    debug!("Created branch '{}' at {}", name, short_id(head.id()));
    Ok(())
}

/// Copy the rewritten history from `scratch` into `repo`.
pub fn transfer(scratch: &dyn ObjectStore, repo: &Repository, commits: &[RewrittenCommit]) -> Result<usize> {
    let mut copied = 0;
    for commit in commits {
        copied += transfer_objects(scratch, repo, commit.rewritten)?;
    }
    debug!("Transferred {} object(s) into the destination", copied);
    Ok(copied)
}

/// Apply `commits` in order onto the branch checked out in `repo`.
pub fn apply(repo: &Repository, branch: &str, commits: &[RewrittenCommit]) -> Result<ImportReport> {
    let mut report = ImportReport {
        branch: branch.to_string(),
        commits: Vec::with_capacity(commits.len()),
    };

    for commit in commits {
        let integrated = apply_one(repo, branch, commit)?;
        report.commits.push(ImportedCommit {
            source: commit.source,
            rewritten: commit.rewritten,
            integrated,
        });
    }

    Ok(report)
}

fn apply_one(repo: &Repository, branch: &str, commit: &RewrittenCommit) -> Result<Option<Oid>> {
    let head = repo.head()?;
    let refname = head
        .name()
        .ok_or_else(|| destination_error("HEAD does not point at a valid branch", None))?
        .to_string();
    let tip = head.peel_to_commit()?;
    let picked = repo.find_commit(commit.rewritten)?;

    let mut checkout = CheckoutBuilder::new();
    checkout.safe().allow_conflicts(true).conflict_style_merge(true);
    let mut options = CherrypickOptions::new();
    if picked.parent_count() > 1 {
        options.mainline(1);
    }
    options.checkout_builder(checkout);
    repo.cherrypick(&picked, Some(&mut options))?;

    let mut index = repo.index()?;
    if index.has_conflicts() {
        let mut paths = Vec::new();
        for conflict in index.conflicts()? {
            let conflict = conflict?;
            if let Some(entry) = conflict.our.or(conflict.their).or(conflict.ancestor) {
                paths.push(String::from_utf8_lossy(&entry.path).into_owned());
            }
        }
        return Err(Error::Conflict {
            source_commit: short_id(commit.source),
            rewritten: short_id(commit.rewritten),
            branch: branch.to_string(),
            destination: short_id(tip.id()),
            paths,
        });
    }

    let summary = picked.summary().unwrap_or_default().to_string();
    let tree_id = index.write_tree()?;
    if tree_id == tip.tree_id() {
        repo.cleanup_state()?;
        warn!(
            "Skipping {} ({}): it changes nothing on '{}'",
            short_id(commit.source),
            summary,
            branch
        );
        return Ok(None);
    }

    let tree = repo.find_tree(tree_id)?;
    let committer = repo
        .signature()
        .unwrap_or_else(|_| picked.committer().to_owned());
    let message = match picked.message_raw() {
        Some(message) => message.to_string(),
        None => String::from_utf8_lossy(picked.message_raw_bytes()).into_owned(),
    };

    let new_id = repo.commit(None, &picked.author(), &committer, &message, &tree, &[&tip])?;
    repo.update_ref(
        &refname,
        new_id,
        Some(tip.id()),
        &format!("cherry-pick: {summary}"),
    )?;
    repo.cleanup_state()?;

    info!(
        "Imported {} as {} on '{}': {}",
        short_id(commit.source),
        short_id(new_id),
        branch,
        summary
    );
    Ok(Some(new_id))
}
