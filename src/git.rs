//! Git access: the object store used by the rewrite pipeline, and thin
//! wrappers around the `git` command for transport and worktree management.
//!
//! Rewriting and importing never shell out. Blobs, trees and commits are read
//! and written through [`ObjectStore`], which is implemented for
//! `git2::Repository`. Cloning, fetching, pushing and worktrees use the system
//! `git` command, which picks up SSH keys, credential helpers and any
//! authentication configured in `~/.gitconfig`.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

use git2::{ObjectType, Oid, Signature};
use log::debug;
use regex::Regex;
use semver::Version;

use crate::error::{Error, Result};

/// File mode of a subdirectory entry.
pub const MODE_TREE: i32 = 0o040000;
/// File mode of a submodule entry.
pub const MODE_GITLINK: i32 = 0o160000;

/// One entry of a tree object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeItem {
    pub name: String,
    pub mode: i32,
    pub id: Oid,
}

impl TreeItem {
    pub fn is_tree(&self) -> bool {
        self.mode == MODE_TREE
    }

    pub fn is_gitlink(&self) -> bool {
        self.mode == MODE_GITLINK
    }
}

/// The fields of a commit object.
pub struct CommitRecord {
    pub tree: Oid,
    pub parents: Vec<Oid>,
    pub author: Signature<'static>,
    pub committer: Signature<'static>,
    pub message: String,
}

/// Content-addressed object storage.
///
/// Everything the rewrite pipeline needs from a repository: read and write
/// blobs, trees and commits, copy raw objects, and move refs atomically.
pub trait ObjectStore {
    fn read_blob(&self, id: Oid) -> Result<Vec<u8>>;

    fn read_tree(&self, id: Oid) -> Result<Vec<TreeItem>>;

    fn read_commit(&self, id: Oid) -> Result<CommitRecord>;

    fn write_blob(&self, data: &[u8]) -> Result<Oid>;

    fn write_tree(&self, items: &[TreeItem]) -> Result<Oid>;

    fn write_commit(&self, commit: &CommitRecord) -> Result<Oid>;

    fn contains(&self, id: Oid) -> Result<bool>;

    fn read_raw(&self, id: Oid) -> Result<(ObjectType, Vec<u8>)>;

    fn write_raw(&self, kind: ObjectType, data: &[u8]) -> Result<Oid>;

    /// Point `name` at `target`.
    ///
    /// With `expected`, the update only succeeds if the ref still points at
    /// that id (compare-and-swap). Without it, the ref must not exist yet.
    fn update_ref(&self, name: &str, target: Oid, expected: Option<Oid>, message: &str)
        -> Result<()>;
}

impl ObjectStore for git2::Repository {
    fn read_blob(&self, id: Oid) -> Result<Vec<u8>> {
        Ok(self.find_blob(id)?.content().to_vec())
    }

    fn read_tree(&self, id: Oid) -> Result<Vec<TreeItem>> {
        let tree = self.find_tree(id)?;
        tree.iter()
            .map(|entry| {
                let name = entry.name().ok_or_else(|| Error::Rewrite {
                    commit: id.to_string(),
                    message: format!(
                        "tree entry name is not valid UTF-8: {}",
                        String::from_utf8_lossy(entry.name_bytes())
                    ),
                })?;
                Ok(TreeItem {
                    name: name.to_string(),
                    mode: entry.filemode(),
                    id: entry.id(),
                })
            })
            .collect()
    }

    fn read_commit(&self, id: Oid) -> Result<CommitRecord> {
        let commit = self.find_commit(id)?;
        let message = commit.message_raw().ok_or_else(|| Error::Rewrite {
            commit: id.to_string(),
            message: "commit message is not valid UTF-8".to_string(),
        })?;

        let record = CommitRecord {
            tree: commit.tree_id(),
            parents: commit.parent_ids().collect(),
            author: commit.author().to_owned(),
            committer: commit.committer().to_owned(),
            message: message.to_string(),
        };
        Ok(record)
    }

    fn write_blob(&self, data: &[u8]) -> Result<Oid> {
        Ok(self.blob(data)?)
    }

    fn write_tree(&self, items: &[TreeItem]) -> Result<Oid> {
        let mut builder = self.treebuilder(None)?;
        for item in items {
            builder.insert(item.name.as_str(), item.id, item.mode)?;
        }
        Ok(builder.write()?)
    }

    fn write_commit(&self, commit: &CommitRecord) -> Result<Oid> {
        let tree = self.find_tree(commit.tree)?;
        let parents = commit
            .parents
            .iter()
            .map(|id| self.find_commit(*id))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let parents: Vec<&git2::Commit<'_>> = parents.iter().collect();

        Ok(self.commit(
            None,
            &commit.author,
            &commit.committer,
            &commit.message,
            &tree,
            &parents,
        )?)
    }

    fn contains(&self, id: Oid) -> Result<bool> {
        Ok(self.odb()?.exists(id))
    }

    fn read_raw(&self, id: Oid) -> Result<(ObjectType, Vec<u8>)> {
        let odb = self.odb()?;
        let object = odb.read(id)?;
        Ok((object.kind(), object.data().to_vec()))
    }

    fn write_raw(&self, kind: ObjectType, data: &[u8]) -> Result<Oid> {
        Ok(self.odb()?.write(kind, data)?)
    }

    fn update_ref(
        &self,
        name: &str,
        target: Oid,
        expected: Option<Oid>,
        message: &str,
    ) -> Result<()> {
        match expected {
            Some(current) => self.reference_matching(name, target, true, current, message)?,
            None => self.reference(name, target, false, message)?,
        };
        Ok(())
    }
}

/// Copy `id` and everything reachable from it from `source` into `target`.
///
/// Objects already present in `target` are not descended into. Submodule
/// commits are skipped, since they live in another repository.
pub fn transfer_objects(source: &dyn ObjectStore, target: &dyn ObjectStore, id: Oid) -> Result<usize> {
    let mut copied = 0;
    let mut pending = vec![id];

    while let Some(id) = pending.pop() {
        if target.contains(id)? {
            continue;
        }

        let (kind, data) = source.read_raw(id)?;
        match kind {
            ObjectType::Commit => {
                let commit = source.read_commit(id)?;
                pending.push(commit.tree);
                pending.extend(commit.parents);
            }
            ObjectType::Tree => {
                pending.extend(
                    source
                        .read_tree(id)?
                        .into_iter()
                        .filter(|item| !item.is_gitlink())
                        .map(|item| item.id),
                );
            }
            _ => {}
        }

        let written = target.write_raw(kind, &data)?;
        debug_assert_eq!(written, id);
        copied += 1;
    }

    Ok(copied)
}

/// Read the blob at `path` inside `tree`, if it exists and is a blob.
pub fn read_blob_at(
    repo: &git2::Repository,
    tree: &git2::Tree<'_>,
    path: &Path,
) -> Result<Option<Vec<u8>>> {
    let entry = match tree.get_path(path) {
        Ok(entry) => entry,
        Err(e) if e.code() == git2::ErrorCode::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    if entry.kind() != Some(ObjectType::Blob) {
        return Ok(None);
    }
    Ok(Some(repo.find_blob(entry.id())?.content().to_vec()))
}

/// The path a repository is best known by: its working tree, or the git dir
/// for bare repositories.
pub fn display_path(repo: &git2::Repository) -> PathBuf {
    repo.workdir()
        .unwrap_or_else(|| repo.path())
        .to_path_buf()
}

/// Abbreviated commit id for messages.
pub fn short_id(id: Oid) -> String {
    let mut text = id.to_string();
    text.truncate(7);
    text
}

/// Return the default branch for new repositories.
///
/// Reads `init.defaultBranch` from the user's git configuration and falls back
/// to `master`, like git itself.
pub fn default_branch() -> String {
    git2::Config::open_default()
        .and_then(|config| config.get_string("init.defaultBranch"))
        .unwrap_or_else(|_| "master".to_string())
}

/// Run `git` with `args` in `cwd`, returning stdout.
fn run_git(args: &[&str], cwd: Option<&Path>) -> Result<String> {
    let mut command = Command::new("git");
    command.args(args);
    if let Some(cwd) = cwd {
        command.current_dir(cwd);
    }

    debug!("Running git {}", redact(&args.join(" ")));

    let output = command.output().map_err(|e| Error::GitCommand {
        command: redact(&args.join(" ")),
        stderr: e.to_string(),
    })?;

    if !output.status.success() {
        return Err(Error::GitCommand {
            command: redact(&args.join(" ")),
            stderr: redact(String::from_utf8_lossy(&output.stderr).trim()),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Hide credentials embedded in URLs (`https://token@host/...`).
fn redact(text: &str) -> String {
    static CREDENTIALS: OnceLock<Regex> = OnceLock::new();
    let re = CREDENTIALS.get_or_init(|| {
        Regex::new(r"(https?://)[^@/\s]+@").expect("credential pattern is valid")
    });
    re.replace_all(text, "${1}***@").into_owned()
}

/// Clone a repository as a bare mirror
pub fn clone_mirror(url: &str, target_dir: &Path) -> Result<()> {
    if let Some(parent) = target_dir.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let target = target_dir.to_string_lossy();
    run_git(&["clone", "--mirror", url, &target], None).map_err(|e| match e {
        Error::GitCommand { command, stderr }
            if stderr.contains("Authentication failed")
                || stderr.contains("Permission denied")
                || stderr.contains("Could not read from remote repository") =>
        {
            Error::GitCommand {
                command,
                stderr: format!(
                    "{stderr}\nAuthentication failed. Make sure you have access to the repository."
                ),
            }
        }
        other => other,
    })?;
    Ok(())
}

/// Fetch all remotes of a mirror clone.
pub fn update_remote(repo_dir: &Path) -> Result<()> {
    run_git(&["remote", "update", "--prune"], Some(repo_dir))?;
    Ok(())
}

/// Add a worktree at `path` with `branch` starting at `base`.
///
/// With `force`, an existing branch of the same name is reset to `base`.
pub fn add_worktree(repo_dir: &Path, path: &Path, branch: &str, base: &str, force: bool) -> Result<()> {
    let path = path.to_string_lossy();
    let flag = if force { "-B" } else { "-b" };
    run_git(
        &["worktree", "add", &path, "--no-track", flag, branch, base],
        Some(repo_dir),
    )?;
    Ok(())
}

/// Remove the worktree at `path`, discarding any local changes in it.
pub fn remove_worktree(repo_dir: &Path, path: &Path) -> Result<()> {
    let path = path.to_string_lossy();
    run_git(&["worktree", "remove", "--force", &path], Some(repo_dir))?;
    Ok(())
}

/// Push `refspec` to `remote`.
///
/// `remote` is usually a URL, which has no remote-tracking refs to lease
/// against, so `force` overwrites unconditionally.
pub fn push(repo_dir: &Path, remote: &str, refspec: &str, force: bool) -> Result<()> {
    let mut args = vec!["push"];
    if force {
        args.push("--force");
    }
    args.extend([remote, refspec]);
    run_git(&args, Some(repo_dir))?;
    Ok(())
}

/// Return the version of the installed `git` command.
pub fn git_version() -> Result<Version> {
    let text = run_git(&["version"], None)?;
    parse_git_version(&text).ok_or_else(|| Error::GitCommand {
        command: "version".to_string(),
        stderr: format!("unrecognized version string: {}", text.trim()),
    })
}

/// Parse the output of `git version` into a semantic version
///
/// Accepts forms like `git version 2.39.2`, `2.37.1 (Apple Git-137.1)` and
/// `git version 2.41.0.windows.1`. A missing patch component reads as zero.
pub fn parse_git_version(text: &str) -> Option<Version> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let re = PATTERN.get_or_init(|| {
        Regex::new(r"(\d+)\.(\d+)(?:\.(\d+))?").expect("version pattern is valid")
    });

    let text = text.trim();
    let text = text.strip_prefix("git version ").unwrap_or(text);
    let captures = re.captures(text)?;
    let number = |i: usize| -> Option<u64> {
        captures
            .get(i)
            .map_or(Some(0), |m| m.as_str().parse().ok())
    };

    Some(Version::new(number(1)?, number(2)?, number(3)?))
}
