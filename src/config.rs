//! # Template and Instance Configuration
//!
//! Cookiecutter leaves two JSON artifacts behind that drive the reverse
//! transform:
//!
//! - **`cookiecutter.json`** at the root of the template repository declares
//!   the variables a template accepts, mapped to their defaults.
//! - **`.cookiecutter.json`** in the generated project records the literal
//!   values the project was generated with.
//!
//! Both are parsed into typed, order-preserving structures at load time so that
//! malformed files are rejected here rather than deep inside the pipeline.

use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::git;

/// File recording the values a project was generated with.
pub const RECORDED_VALUES_FILE: &str = ".cookiecutter.json";

/// File declaring the variables of a template.
pub const TEMPLATE_DECLARATION_FILE: &str = "cookiecutter.json";

/// Key under which Cookiecutter records the template location.
pub const TEMPLATE_SOURCE_KEY: &str = "_template";

/// Values recorded in `.cookiecutter.json`, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordedValues {
    entries: Map<String, Value>,
}

impl RecordedValues {
    /// Parse the contents of a `.cookiecutter.json` file.
    pub fn parse(text: &str) -> Result<Self> {
        let entries = parse_object(text, RECORDED_VALUES_FILE)?;
        Ok(Self { entries })
    }

    /// All recorded variable names, in file order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// The recorded value for `name`, if it was recorded as a string.
    pub fn string(&self, name: &str) -> Option<&str> {
        self.entries.get(name).and_then(Value::as_str)
    }

    /// Whether anything at all was recorded for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Location of the template this project was generated from.
    pub fn template_source(&self) -> Option<&str> {
        self.string(TEMPLATE_SOURCE_KEY)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Variable names declared in `cookiecutter.json`, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateDeclaration {
    names: Vec<String>,
}

impl TemplateDeclaration {
    /// Parse the contents of a `cookiecutter.json` file.
    pub fn parse(text: &str) -> Result<Self> {
        let entries = parse_object(text, TEMPLATE_DECLARATION_FILE)?;
        Ok(Self {
            names: entries.into_iter().map(|(name, _)| name).collect(),
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn declares(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}

fn parse_object(text: &str, file: &str) -> Result<Map<String, Value>> {
    let value: Value = serde_json::from_str(text).map_err(|e| Error::Configuration {
        message: format!("{file} is not valid JSON: {e}"),
        hint: None,
    })?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::Configuration {
            message: format!("{file} does not contain an object (found {})", kind(&other)),
            hint: Some(format!("{file} must map variable names to values")),
        }),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Load `.cookiecutter.json` from the source repository.
///
/// The file is read from the tree of `commit` when given, falling back to the
/// working tree. Its absence is a hard precondition failure.
pub fn load_recorded_values(
    repo: &git2::Repository,
    commit: Option<git2::Oid>,
) -> Result<RecordedValues> {
    if let Some(commit) = commit {
        let commit = repo.find_commit(commit)?;
        if let Some(data) = git::read_blob_at(repo, &commit.tree()?, Path::new(RECORDED_VALUES_FILE))? {
            return RecordedValues::parse(&decode(data, RECORDED_VALUES_FILE)?);
        }
    }

    if let Some(workdir) = repo.workdir() {
        let path = workdir.join(RECORDED_VALUES_FILE);
        if path.is_file() {
            let text = std::fs::read_to_string(&path)?;
            return RecordedValues::parse(&text);
        }
    }

    Err(Error::Configuration {
        message: format!(
            "{RECORDED_VALUES_FILE} not found in source repository {}",
            git::display_path(repo).display()
        ),
        hint: Some("the source must be a project generated by Cookiecutter".to_string()),
    })
}

/// Load `cookiecutter.json` from the `HEAD` tree of the template repository.
///
/// Returns `None` when the template does not carry a declaration file.
pub fn load_template_declaration(repo: &git2::Repository) -> Result<Option<TemplateDeclaration>> {
    let tree = repo.head()?.peel_to_tree()?;
    match git::read_blob_at(repo, &tree, Path::new(TEMPLATE_DECLARATION_FILE))? {
        Some(data) => Ok(Some(TemplateDeclaration::parse(&decode(
            data,
            TEMPLATE_DECLARATION_FILE,
        )?)?)),
        None => Ok(None),
    }
}

fn decode(data: Vec<u8>, file: &str) -> Result<String> {
    String::from_utf8(data).map_err(|_| Error::configuration(format!("{file} is not valid UTF-8")))
}
