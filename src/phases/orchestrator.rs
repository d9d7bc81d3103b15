//! Orchestrator for the complete import operation
//!
//! This module coordinates all phases to provide a clean API for importing
//! commits from a generated project into its template.

use std::path::PathBuf;

use git2::Repository;
use log::{debug, info};

use super::import::{Destination, ImportReport};
use super::selection::SelectionSpec;
use super::{phase1, phase2, phase3, phase4};
use crate::error::{Error, Result};
use crate::git::display_path;
use crate::variables::VariableFilter;

/// Everything needed to run one import.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// The generated project the commits are taken from.
    pub source: PathBuf,
    /// The template repository the commits are applied to.
    pub destination: PathBuf,
    pub selection: SelectionSpec,
    pub target: Destination,
    pub filter: VariableFilter,
    /// Show a progress bar while rewriting.
    pub progress: bool,
}

impl ImportOptions {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            selection: SelectionSpec::default(),
            target: Destination::Current,
            filter: VariableFilter::default(),
            progress: false,
        }
    }
}

fn open(path: &std::path::Path, role: &str) -> Result<Repository> {
    Repository::open(path).map_err(|e| Error::Configuration {
        message: format!("cannot open {role} repository {}: {}", path.display(), e.message()),
        hint: None,
    })
}

/// Execute the complete import (Phases 1-4)
///
/// 1. Check the destination and locate its template directory
/// 2. Resolve the selection in the source repository
/// 3. Build the variable table and rewrite the selection into a scratch store
/// 4. Transfer the rewritten commits and apply them onto the destination
///
/// Nothing is written to the destination before phase 4.
pub fn import(options: &ImportOptions) -> Result<ImportReport> {
    let source = open(&options.source, "source")?;
    let destination = open(&options.destination, "destination")?;

    phase4::check_destination(&destination)?;
    let template_directory = phase1::find_template_directory(&destination)?;

    // Phase 2: Selection
    let selection = phase2::resolve(&source, &options.selection)?;

    // Phase 1 (continued): the table depends on the newest selected commit
    let (table, _) = phase1::build_variable_table(
        &source,
        &destination,
        selection.newest(),
        &options.filter,
    )?;

    // Phase 3: Rewrite into a scratch repository
    let scratch_dir = tempfile::Builder::new()
        .prefix("cookie-backport-")
        .tempdir()?;
    let scratch = Repository::init_bare(scratch_dir.path())?;
    debug!("Rewriting into {}", scratch_dir.path().display());

    let mut rewriter =
        phase3::CommitRewriter::new(&source, &scratch, &table, &template_directory);
    if options.progress {
        rewriter = rewriter.with_progress(selection.len());
    }
    let rewritten = rewriter.rewrite_all(&selection.commits)?;

    // Phase 4: Import
    let branch = phase4::prepare_branch(&destination, &options.target)?;
    phase4::transfer(&scratch, &destination, &rewritten)?;
    let report = phase4::apply(&destination, &branch, &rewritten)?;

    info!(
        "Imported {} of {} commit(s) from {} onto '{}' in {}",
        report.integrated().count(),
        report.commits.len(),
        display_path(&source).display(),
        report.branch,
        display_path(&destination).display()
    );

    Ok(report)
}
