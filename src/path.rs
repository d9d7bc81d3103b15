//! Path rewriting and path manipulation utilities

use crate::rewrite::ContentRewriter;
use crate::variables::VariableTable;

/// Rewrites project paths into template paths.
///
/// Cookiecutter renders path names too, so Jinja delimiters in the path are
/// escaped and variable values replaced with placeholders, as for content.
/// The result is moved under the template root directory (for example
/// `{{cookiecutter.project_name}}`).
#[derive(Debug, Clone)]
pub struct PathRewriter<'a> {
    rewriter: ContentRewriter<'a>,
    root: String,
}

impl<'a> PathRewriter<'a> {
    pub fn new(table: &'a VariableTable, root: impl Into<String>) -> Self {
        Self {
            rewriter: ContentRewriter::new(table),
            root: root.into(),
        }
    }

    /// The template root directory every path is moved under.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Whether `path` already lives under the template root.
    pub fn is_rooted(&self, path: &str) -> bool {
        path == self.root
            || path
                .strip_prefix(self.root.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Rewrite a `/`-separated repository path.
    ///
    /// Paths that are already rooted under the template directory are returned
    /// unchanged, so re-importing rewritten history never nests the root twice.
    pub fn rewrite(&self, path: &str) -> String {
        if self.is_rooted(path) {
            return path.to_string();
        }
        format!("{}/{}", self.root, self.rewriter.rewrite_str(path))
    }
}

/// Encode a ref or URL so it can be used as a single directory name
///
/// This converts characters that are problematic for filesystems
/// into safe alternatives.
pub fn encode_path_component(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            '/' | '\\' => '-',
            // Keep alphanumeric, dots, dashes, underscores as-is
            c if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' => c,
            // Replace other characters with underscores
            _ => '_',
        })
        .collect()
}

/// Check that a rewritten path is usable as a tree entry path.
///
/// Returns a description of the problem, if any.
pub fn validate_tree_path(path: &str) -> Option<String> {
    if path.is_empty() {
        return Some("empty path".to_string());
    }
    path.split('/').find_map(|component| match component {
        "" => Some(format!("empty component in '{path}'")),
        "." | ".." => Some(format!("relative component '{component}' in '{path}'")),
        ".git" => Some(format!("reserved component '.git' in '{path}'")),
        _ => None,
    })
}
