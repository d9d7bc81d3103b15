//! Phase 2: Selection
//!
//! Resolves what the operator asked for into an ordered list of source
//! commits. Revisions are accepted in the forms understood by
//! `git rev-parse`: single commits (`HEAD~2`, `v1.0`, a hash) and ranges
//! (`a..b`, `a...b`). A branch contributes the range `upstream..branch`.
//!
//! Ranges expand oldest first in topological order. Single revisions are taken
//! as they are, without walking their history.

use git2::{Oid, Repository, RevparseMode, Sort};
use log::debug;

use crate::error::{Error, Result};
use crate::git::short_id;

/// What to import, as given on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSpec {
    /// Commits or ranges, in the order given.
    pub revisions: Vec<String>,
    /// Branch to import; contributes `upstream..branch`.
    pub branch: Option<String>,
    /// Upstream for `branch`; defaults to the configured default branch.
    pub upstream: Option<String>,
}

impl SelectionSpec {
    /// Select a branch against an upstream.
    pub fn branch(branch: impl Into<String>, upstream: impl Into<String>) -> Self {
        Self {
            revisions: Vec::new(),
            branch: Some(branch.into()),
            upstream: Some(upstream.into()),
        }
    }

    /// Select explicit revisions.
    pub fn revisions<I, S>(revisions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            revisions: revisions.into_iter().map(Into::into).collect(),
            branch: None,
            upstream: None,
        }
    }
}

/// The resolved selection: source commits in application order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub commits: Vec<Oid>,
    /// The branch the selection was made from, if any.
    pub branch: Option<String>,
}

impl Selection {
    /// The newest selected commit, whose tree supplies the recorded values.
    pub fn newest(&self) -> Option<Oid> {
        self.commits.last().copied()
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }
}

/// Resolve `spec` against the source repository.
pub fn resolve(source: &Repository, spec: &SelectionSpec) -> Result<Selection> {
    let mut commits = Vec::new();

    if let Some(branch) = &spec.branch {
        let upstream = spec
            .upstream
            .clone()
            .unwrap_or_else(crate::defaults::default_upstream);
        commits.extend(expand(source, &format!("{upstream}..{branch}"))?);
    }

    for revision in &spec.revisions {
        commits.extend(expand(source, revision)?);
    }

    if spec.branch.is_none() && spec.revisions.is_empty() {
        commits.extend(expand(source, "HEAD")?);
    }

    let mut seen = std::collections::HashSet::new();
    commits.retain(|id| seen.insert(*id));

    if commits.is_empty() {
        return Err(Error::Selection {
            message: "the requested selection contains no commits".to_string(),
            hint: spec.branch.as_ref().map(|branch| {
                format!("'{branch}' has no commits that are not already on its upstream")
            }),
        });
    }

    debug!(
        "Selected {} commit(s): {}",
        commits.len(),
        commits
            .iter()
            .map(|id| short_id(*id))
            .collect::<Vec<_>>()
            .join(" ")
    );

    Ok(Selection {
        commits,
        branch: spec.branch.clone(),
    })
}

/// Expand one revision argument into commits, oldest first.
fn expand(source: &Repository, revision: &str) -> Result<Vec<Oid>> {
    let unresolved = |e: git2::Error| Error::Selection {
        message: format!("revision '{revision}' does not resolve: {}", e.message()),
        hint: Some(format!(
            "check that '{revision}' exists in {}",
            crate::git::display_path(source).display()
        )),
    };

    let spec = source.revparse(revision).map_err(unresolved)?;

    if spec.mode().contains(RevparseMode::SINGLE) {
        let object = spec.from().ok_or_else(|| Error::selection(format!(
            "revision '{revision}' does not name an object"
        )))?;
        let commit = object.peel_to_commit().map_err(unresolved)?;
        return Ok(vec![commit.id()]);
    }

    let (from, to) = match (spec.from(), spec.to()) {
        (Some(from), Some(to)) => (
            from.peel_to_commit().map_err(unresolved)?.id(),
            to.peel_to_commit().map_err(unresolved)?.id(),
        ),
        _ => {
            return Err(Error::selection(format!(
                "range '{revision}' needs both ends"
            )))
        }
    };

    let mut walk = source.revwalk()?;
    walk.set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)?;
    walk.push(to)?;

    if spec.mode().contains(RevparseMode::MERGE_BASE) {
        // a...b: commits on either side, but not on both.
        walk.push(from)?;
        if let Ok(base) = source.merge_base(from, to) {
            walk.hide(base)?;
        }
    } else {
        walk.hide(from)?;
    }

    Ok(walk.collect::<std::result::Result<Vec<_>, _>>()?)
}
