//! Shared test utilities for integration and E2E tests.
//!
//! Builds real git repositories in temporary directories: a generated
//! project (with `.cookiecutter.json`) and the template it was generated from
//! (with `cookiecutter.json` and the `{{cookiecutter.project_name}}`
//! directory).
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! let fixture = ImportFixture::new();
//! fixture.project.commit(&[("README.md", "# hypermodern-python")], "Update README");
//! ```

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use git2::{Oid, Repository, RepositoryInitOptions, Signature};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use super::{GitRepo, ImportFixture, PROJECT_VALUES, TEMPLATE_DECLARATION, TEMPLATE_ROOT};
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use predicates::prelude::*;
}

/// Template root directory.
pub const TEMPLATE_ROOT: &str = "{{cookiecutter.project_name}}";

/// `cookiecutter.json` of the template.
pub const TEMPLATE_DECLARATION: &str = r#"{
  "project_name": "hypermodern-python",
  "package_name": "{{ cookiecutter.project_name.replace('-', '_') }}",
  "author": "Jane Developer"
}
"#;

/// `.cookiecutter.json` of the generated project.
pub const PROJECT_VALUES: &str = r#"{
  "_template": "gh:owner/template",
  "project_name": "hypermodern-python",
  "package_name": "hypermodern_python",
  "author": "Jane Developer"
}
"#;

/// A non-bare repository in a temporary directory.
pub struct GitRepo {
    _dir: tempfile::TempDir,
    pub repo: Repository,
}

impl GitRepo {
    /// An empty repository on `main` with a configured identity.
    pub fn new() -> Self {
        let dir = tempfile::TempDir::new().expect("Failed to create temp directory");
        let mut options = RepositoryInitOptions::new();
        options.initial_head("main");
        let repo = Repository::init_opts(dir.path(), &options).expect("Failed to init repository");
        {
            let mut config = repo.config().unwrap();
            config.set_str("user.name", "Template Maintainer").unwrap();
            config.set_str("user.email", "maintainer@example.com").unwrap();
        }
        Self { _dir: dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.repo.workdir().expect("repository has a working tree")
    }

    /// Write `files` into the working tree and commit everything.
    pub fn commit(&self, files: &[(&str, &str)], message: &str) -> Oid {
        self.commit_as(files, message, "Jane Developer", "jane@example.com")
    }

    /// Like [`commit`](Self::commit) with an explicit author.
    pub fn commit_as(&self, files: &[(&str, &str)], message: &str, name: &str, email: &str) -> Oid {
        for (path, content) in files {
            self.write(path, content);
        }
        self.commit_all(message, name, email)
    }

    /// Write a file without committing it.
    pub fn write(&self, path: &str, content: &str) {
        self.write_bytes(path, content.as_bytes());
    }

    pub fn write_bytes(&self, path: &str, content: &[u8]) {
        let full = self.path().join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }

    /// Stage every change in the working tree (including deletions) and
    /// commit it on the current branch.
    pub fn commit_all(&self, message: &str, name: &str, email: &str) -> Oid {
        let mut index = self.repo.index().unwrap();
        index
            .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
            .unwrap();
        index.update_all(["*"].iter(), None).unwrap();
        index.write().unwrap();

        let tree = self.repo.find_tree(index.write_tree().unwrap()).unwrap();
        let signature = Signature::now(name, email).unwrap();
        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
        self.repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
            .unwrap()
    }

    /// Create `branch` at HEAD and check it out.
    pub fn checkout_new(&self, branch: &str) {
        let head = self.repo.head().unwrap().peel_to_commit().unwrap();
        self.repo.branch(branch, &head, false).unwrap();
        self.checkout(branch);
    }

    /// Check out an existing branch, discarding working tree changes.
    pub fn checkout(&self, branch: &str) {
        self.repo.set_head(&format!("refs/heads/{branch}")).unwrap();
        self.repo
            .checkout_head(Some(git2::build::CheckoutBuilder::new().force()))
            .unwrap();
    }

    pub fn head(&self) -> Oid {
        self.repo.head().unwrap().peel_to_commit().unwrap().id()
    }

    pub fn branch_tip(&self, branch: &str) -> Option<Oid> {
        self.repo
            .find_branch(branch, git2::BranchType::Local)
            .ok()
            .and_then(|b| b.get().target())
    }

    /// Content of `path` in the tree of `revision`.
    pub fn file_at(&self, revision: &str, path: &str) -> Option<String> {
        let commit = self.repo.revparse_single(revision).ok()?.peel_to_commit().ok()?;
        let entry = commit.tree().ok()?.get_path(Path::new(path)).ok()?;
        let blob = self.repo.find_blob(entry.id()).ok()?;
        Some(String::from_utf8_lossy(blob.content()).into_owned())
    }

    /// Content of `path` in the working tree.
    pub fn read(&self, path: &str) -> String {
        fs::read_to_string(self.path().join(path)).unwrap()
    }

    /// Number of commits reachable from HEAD.
    pub fn commit_count(&self) -> usize {
        let mut walk = self.repo.revwalk().unwrap();
        walk.push_head().unwrap();
        walk.count()
    }

    /// Create a bare clone with the `git` command, as a hosted copy.
    pub fn bare_clone(&self, target: &Path) -> PathBuf {
        let status = Command::new("git")
            .args(["clone", "--quiet", "--bare"])
            .arg(self.path())
            .arg(target)
            .status()
            .expect("git must be installed");
        assert!(status.success(), "git clone --bare failed");
        target.to_path_buf()
    }
}

impl Default for GitRepo {
    fn default() -> Self {
        Self::new()
    }
}

/// A generated project and its template, each with an initial commit.
pub struct ImportFixture {
    pub project: GitRepo,
    pub template: GitRepo,
}

impl ImportFixture {
    pub fn new() -> Self {
        let project = GitRepo::new();
        project.commit(
            &[
                (".cookiecutter.json", PROJECT_VALUES),
                ("README.md", "# hypermodern-python\n\nBy Jane Developer.\n"),
                ("src/hypermodern_python/__init__.py", "\"\"\"hypermodern-python.\"\"\"\n"),
            ],
            "Initial commit",
        );

        let template = GitRepo::new();
        template.commit_as(
            &[
                ("cookiecutter.json", TEMPLATE_DECLARATION),
                (
                    "{{cookiecutter.project_name}}/README.md",
                    "# {{cookiecutter.project_name}}\n\nBy {{cookiecutter.author}}.\n",
                ),
                (
                    "{{cookiecutter.project_name}}/src/{{cookiecutter.package_name}}/__init__.py",
                    "\"\"\"{{cookiecutter.project_name}}.\"\"\"\n",
                ),
            ],
            "Initial template",
            "Template Maintainer",
            "maintainer@example.com",
        );

        Self { project, template }
    }

    /// Template path of a project path.
    pub fn templated(path: &str) -> String {
        format!("{TEMPLATE_ROOT}/{path}")
    }
}

impl Default for ImportFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_has_both_repositories() {
        let fixture = ImportFixture::new();
        assert!(fixture.project.path().join(".cookiecutter.json").exists());
        assert!(fixture
            .template
            .file_at("HEAD", "cookiecutter.json")
            .is_some());
        assert_eq!(fixture.project.commit_count(), 1);
    }

    #[test]
    fn test_project_values_are_valid_json() {
        let values: serde_json::Value = serde_json::from_str(PROJECT_VALUES).unwrap();
        assert_eq!(values["project_name"], "hypermodern-python");
        serde_json::from_str::<serde_json::Value>(TEMPLATE_DECLARATION).unwrap();
    }
}
