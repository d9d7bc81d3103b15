//! Phase 1: Discovery
//!
//! Finds everything the rewrite needs to know before touching any commit:
//!
//! - the **template directory**, the top-level directory of the template
//!   repository whose name is itself a placeholder (for example
//!   `{{cookiecutter.project_name}}`). Every rewritten path is moved under it.
//! - the **variable table**, built from the template's `cookiecutter.json`
//!   and the project's `.cookiecutter.json`.

use git2::{Oid, Repository};
use log::{debug, info};

use crate::config::{self, RecordedValues};
use crate::error::{Error, Result};
use crate::git::ObjectStore;
use crate::variables::{VariableFilter, VariableTable};

/// Tokens that must all appear in the name of the template directory.
const TEMPLATE_DIRECTORY_TOKENS: [&str; 3] = ["{{", "cookiecutter", "}}"];

/// Whether `name` looks like a Cookiecutter template directory.
pub fn is_template_directory_name(name: &str) -> bool {
    TEMPLATE_DIRECTORY_TOKENS
        .iter()
        .all(|token| name.contains(token))
}

/// Locate the template directory in the `HEAD` tree of `template`.
///
/// When several top-level directories qualify, the first in tree order wins.
pub fn find_template_directory(template: &Repository) -> Result<String> {
    let head = template.head().map_err(|e| Error::Configuration {
        message: format!("cannot read HEAD of template repository: {}", e.message()),
        hint: None,
    })?;
    let tree = head.peel_to_tree()?;

    let directory = template
        .read_tree(tree.id())?
        .into_iter()
        .find(|item| item.is_tree() && is_template_directory_name(&item.name))
        .map(|item| item.name)
        .ok_or_else(|| Error::Configuration {
            message: "cannot find template directory".to_string(),
            hint: Some(
                "the destination must contain a top-level directory named like \
                 '{{cookiecutter.project_name}}'"
                    .to_string(),
            ),
        })?;

    debug!("Template directory: {}", directory);
    Ok(directory)
}

/// Build the variable table for an import.
///
/// Recorded values are read from `newest` (the last selected commit) in
/// `source`, falling back to its working tree. The template declaration is
/// read from the `HEAD` of `template`.
pub fn build_variable_table(
    source: &Repository,
    template: &Repository,
    newest: Option<Oid>,
    filter: &VariableFilter,
) -> Result<(VariableTable, RecordedValues)> {
    let recorded = config::load_recorded_values(source, newest)?;
    let declaration = config::load_template_declaration(template)?;

    if declaration.is_none() {
        debug!(
            "No {} in template, using every recorded value",
            config::TEMPLATE_DECLARATION_FILE
        );
    }

    let table = VariableTable::build(declaration.as_ref(), &recorded, filter)?;
    info!("Substituting {} template variable(s)", table.len());
    for variable in table.iter() {
        debug!("  {} = {:?}", variable.name, variable.value);
    }

    Ok((table, recorded))
}
