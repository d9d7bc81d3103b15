//! # Repository Management
//!
//! This module provides the `RepositoryManager`, which keeps local mirror
//! clones of hosted repositories and hands out temporary worktrees on them.
//! Pull request imports run the import pipeline in such a worktree, then push
//! the result back.
//!
//! ## Design
//!
//! Repository management is split across two traits so that each side can be
//! replaced in tests:
//!
//! - **`GitOperations`**: the git actions (mirror clone, fetch, worktrees,
//!   push). `DefaultGitOperations` runs the system `git` command.
//!
//! - **`CacheOperations`**: where clones live on disk. `DefaultCacheOperations`
//!   stores each mirror under the cache root, at a path derived from a
//!   SHA-256 digest of its URL.

use std::path::{Path, PathBuf};

use log::{debug, warn};
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::path::encode_path_component;

/// Trait for git operations - allows mocking in tests
pub trait GitOperations: Send + Sync {
    /// Clone `url` as a bare mirror into `target_dir`.
    fn clone_mirror(&self, url: &str, target_dir: &Path) -> Result<()>;

    /// Fetch every remote of the mirror at `repo_dir`.
    fn update_remote(&self, repo_dir: &Path) -> Result<()>;

    /// Add a worktree at `path` on `branch`, reset to `base`.
    fn add_worktree(&self, repo_dir: &Path, path: &Path, branch: &str, base: &str) -> Result<()>;

    /// Remove the worktree at `path`, discarding local changes.
    fn remove_worktree(&self, repo_dir: &Path, path: &Path) -> Result<()>;

    /// Push `refspec` from `repo_dir` to `remote`.
    fn push(&self, repo_dir: &Path, remote: &str, refspec: &str, force: bool) -> Result<()>;
}

/// A trait that defines where cached clones live.
pub trait CacheOperations: Send + Sync {
    /// Check if a cached repository exists
    fn exists(&self, cache_path: &Path) -> bool;

    /// Get the cache path for a repository
    fn get_cache_path(&self, url: &str) -> PathBuf;
}

/// The default implementation of `GitOperations`, which uses the system's
/// `git` command to perform real Git operations.
pub struct DefaultGitOperations;

impl GitOperations for DefaultGitOperations {
    fn clone_mirror(&self, url: &str, target_dir: &Path) -> Result<()> {
        crate::git::clone_mirror(url, target_dir)
    }

    fn update_remote(&self, repo_dir: &Path) -> Result<()> {
        crate::git::update_remote(repo_dir)
    }

    fn add_worktree(&self, repo_dir: &Path, path: &Path, branch: &str, base: &str) -> Result<()> {
        crate::git::add_worktree(repo_dir, path, branch, base, true)
    }

    fn remove_worktree(&self, repo_dir: &Path, path: &Path) -> Result<()> {
        crate::git::remove_worktree(repo_dir, path)
    }

    fn push(&self, repo_dir: &Path, remote: &str, refspec: &str, force: bool) -> Result<()> {
        crate::git::push(repo_dir, remote, refspec, force)
    }
}

/// The default implementation of `CacheOperations`, which keeps clones under
/// `<cache_root>/repositories`.
pub struct DefaultCacheOperations {
    cache_root: PathBuf,
}

impl DefaultCacheOperations {
    pub fn new(cache_root: PathBuf) -> Self {
        Self { cache_root }
    }
}

impl CacheOperations for DefaultCacheOperations {
    fn exists(&self, cache_path: &Path) -> bool {
        cache_path.exists() && cache_path.is_dir()
    }

    fn get_cache_path(&self, url: &str) -> PathBuf {
        url_to_cache_path(&self.cache_root, url)
    }
}

/// Cache location of the mirror clone of `url`.
///
/// The digest is split after two characters to keep directories small.
pub fn url_to_cache_path(cache_root: &Path, url: &str) -> PathBuf {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    cache_root
        .join("repositories")
        .join(&digest[..2])
        .join(&digest[2..])
        .join("repo.git")
}

/// The main entry point for managing repositories.
pub struct RepositoryManager {
    git_ops: Box<dyn GitOperations>,
    cache_ops: Box<dyn CacheOperations>,
}

impl RepositoryManager {
    /// Creates a new `RepositoryManager` with the default Git and cache
    /// operations, using the specified `cache_root` for the on-disk cache.
    pub fn new(cache_root: PathBuf) -> Self {
        Self {
            git_ops: Box::new(DefaultGitOperations),
            cache_ops: Box::new(DefaultCacheOperations::new(cache_root)),
        }
    }

    /// Creates a `RepositoryManager` with custom `GitOperations` and
    /// `CacheOperations` implementations.
    pub fn with_operations(
        git_ops: Box<dyn GitOperations>,
        cache_ops: Box<dyn CacheOperations>,
    ) -> Self {
        Self { git_ops, cache_ops }
    }

    /// Returns an up-to-date mirror clone of `url`.
    ///
    /// Clones into the cache on first use; afterwards the existing mirror is
    /// refreshed with `git remote update`.
    pub fn fetch_mirror(&self, url: &str) -> Result<PathBuf> {
        let cache_path = self.cache_ops.get_cache_path(url);

        if self.cache_ops.exists(&cache_path) {
            debug!("Updating mirror {}", cache_path.display());
            self.git_ops.update_remote(&cache_path)?;
        } else {
            debug!("Cloning {} into {}", url, cache_path.display());
            self.git_ops.clone_mirror(url, &cache_path)?;
        }

        Ok(cache_path)
    }

    /// Checks if a repository is present in the on-disk cache.
    pub fn is_cached(&self, url: &str) -> bool {
        let cache_path = self.cache_ops.get_cache_path(url);
        self.cache_ops.exists(&cache_path)
    }

    /// Adds a worktree of the mirror at `repo_dir` on `branch`, starting at
    /// `base`. An existing branch of that name is reset.
    ///
    /// The worktree is removed when the returned guard is dropped.
    pub fn worktree(&self, repo_dir: &Path, branch: &str, base: &str) -> Result<Worktree<'_>> {
        let parent = repo_dir.parent().unwrap_or(repo_dir);
        let path = parent.join("worktrees").join(encode_path_component(branch));

        if path.exists() {
            // Left behind by an interrupted run.
            warn!("Removing stale worktree {}", path.display());
            self.git_ops.remove_worktree(repo_dir, &path)?;
        }

        self.git_ops.add_worktree(repo_dir, &path, branch, base)?;
        Ok(Worktree {
            git_ops: self.git_ops.as_ref(),
            repo_dir: repo_dir.to_path_buf(),
            path,
        })
    }

    /// Push `refspec` from the mirror at `repo_dir`.
    pub fn push(&self, repo_dir: &Path, remote: &str, refspec: &str, force: bool) -> Result<()> {
        self.git_ops.push(repo_dir, remote, refspec, force)
    }
}

/// A temporary worktree, removed on drop.
pub struct Worktree<'a> {
    git_ops: &'a dyn GitOperations,
    repo_dir: PathBuf,
    path: PathBuf,
}

impl Worktree<'_> {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for Worktree<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.git_ops.remove_worktree(&self.repo_dir, &self.path) {
            warn!("Failed to remove worktree {}: {}", self.path.display(), e);
        }
    }
}
