//! Phase 3: Rewrite
//!
//! Rewrites each selected commit into template form and writes the result to
//! a separate object store, leaving the source repository untouched.
//!
//! For every commit the whole tree is rewritten: blob contents through
//! [`ContentRewriter`], paths through [`PathRewriter`]. Blobs and trees are
//! memoized, so content shared between commits is only processed once.
//! Author, committer and message are copied verbatim. Because objects are
//! content-addressed, rewriting the same commit with the same table always
//! produces the same commit id.
//!
//! Parents are rewritten too. A parent that is part of the selection maps to
//! its rewritten counterpart. Any other parent becomes a parentless boundary
//! commit carrying its rewritten tree, so the first selected commit applies as
//! the diff it originally introduced.

use std::collections::HashMap;

use git2::Oid;
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;

use crate::cache::RewriteCache;
use crate::error::{Error, Result};
use crate::filesystem::{Entry, TreeSnapshot};
use crate::git::{short_id, CommitRecord, ObjectStore, MODE_GITLINK};
use crate::path::PathRewriter;
use crate::rewrite::ContentRewriter;
use crate::variables::VariableTable;

/// A selected commit and its rewritten counterpart in the scratch store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewrittenCommit {
    pub source: Oid,
    pub rewritten: Oid,
}

/// Rewrites commits from `source` into `target`.
pub struct CommitRewriter<'a> {
    source: &'a dyn ObjectStore,
    target: &'a dyn ObjectStore,
    content: ContentRewriter<'a>,
    paths: PathRewriter<'a>,
    blobs: RewriteCache,
    trees: HashMap<Oid, Oid>,
    commits: HashMap<Oid, Oid>,
    progress: Option<ProgressBar>,
}

impl<'a> CommitRewriter<'a> {
    pub fn new(
        source: &'a dyn ObjectStore,
        target: &'a dyn ObjectStore,
        table: &'a VariableTable,
        template_directory: &str,
    ) -> Self {
        Self {
            source,
            target,
            content: ContentRewriter::new(table),
            paths: PathRewriter::new(table, template_directory),
            blobs: RewriteCache::new(),
            trees: HashMap::new(),
            commits: HashMap::new(),
            progress: None,
        }
    }

    /// Report progress on a terminal progress bar.
    pub fn with_progress(mut self, total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::with_template("{spinner} Rewriting commits [{bar:30}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        self.progress = Some(bar);
        self
    }

    /// Rewrite `commits` in order.
    ///
    /// Parents must come before their children for the history between
    /// selected commits to be kept; otherwise a parent is treated as a
    /// boundary.
    pub fn rewrite_all(&mut self, commits: &[Oid]) -> Result<Vec<RewrittenCommit>> {
        let mut rewritten = Vec::with_capacity(commits.len());

        for &id in commits {
            let new_id = self.rewrite_commit(id)?;
            self.commits.insert(id, new_id);
            rewritten.push(RewrittenCommit {
                source: id,
                rewritten: new_id,
            });

            if let Some(bar) = &self.progress {
                bar.set_message(short_id(id));
                bar.inc(1);
            }
        }

        if let Some(bar) = self.progress.take() {
            bar.finish_and_clear();
        }

        debug!(
            "Rewrote {} commit(s), {} blob(s), {} cached blob hit(s)",
            rewritten.len(),
            self.blobs.len(),
            self.blobs.hits()
        );

        Ok(rewritten)
    }

    fn rewrite_commit(&mut self, id: Oid) -> Result<Oid> {
        let commit = self.source.read_commit(id)?;
        let tree = self.rewrite_tree(commit.tree).map_err(|e| in_commit(e, id))?;

        let mut parents = Vec::with_capacity(commit.parents.len());
        for parent in &commit.parents {
            let parent = match self.commits.get(parent) {
                Some(rewritten) => *rewritten,
                None => self.rewrite_boundary(*parent)?,
            };
            parents.push(parent);
        }

        let new_id = self.target.write_commit(&CommitRecord {
            tree,
            parents,
            ..commit
        })?;
        debug!("Rewrote {} as {}", short_id(id), short_id(new_id));
        Ok(new_id)
    }

    /// Rewrite a parent outside the selection as a parentless commit.
    fn rewrite_boundary(&mut self, id: Oid) -> Result<Oid> {
        let commit = self.source.read_commit(id)?;
        let tree = self.rewrite_tree(commit.tree).map_err(|e| in_commit(e, id))?;
        let new_id = self.target.write_commit(&CommitRecord {
            tree,
            parents: Vec::new(),
            ..commit
        })?;
        debug!("Rewrote boundary {} as {}", short_id(id), short_id(new_id));
        self.commits.insert(id, new_id);
        Ok(new_id)
    }

    fn rewrite_tree(&mut self, id: Oid) -> Result<Oid> {
        if let Some(rewritten) = self.trees.get(&id) {
            return Ok(*rewritten);
        }

        let snapshot = TreeSnapshot::load(self.source, id)?;
        let mut rewritten = TreeSnapshot::new();

        for (path, entry) in snapshot.files() {
            let new_entry = Entry {
                mode: entry.mode,
                id: self.rewrite_blob(entry)?,
            };
            let new_path = self.paths.rewrite(path);
            rewritten.insert(new_path, new_entry).map_err(|e| match e {
                Error::Rewrite { commit, message } => Error::Rewrite {
                    commit,
                    message: format!("{message} (rewriting '{path}')"),
                },
                other => other,
            })?;
        }

        let new_id = rewritten.write(self.target)?;
        self.trees.insert(id, new_id);
        Ok(new_id)
    }

    fn rewrite_blob(&self, entry: &Entry) -> Result<Oid> {
        // Submodule commits live in another repository.
        if entry.mode == MODE_GITLINK {
            return Ok(entry.id);
        }

        self.blobs.get_or_process(entry.id, || {
            let data = self.source.read_blob(entry.id)?;
            self.target.write_blob(&self.content.rewrite(&data))
        })
    }
}

/// Attach the commit being rewritten to a rewrite error.
fn in_commit(error: Error, id: Oid) -> Error {
    match error {
        Error::Rewrite { message, .. } => Error::Rewrite {
            commit: short_id(id),
            message,
        },
        other => other,
    }
}
