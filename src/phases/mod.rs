//! Implementation of the phases of an import.
//!
//! ## Overview
//!
//! An import runs the following phases, each to completion before the next:
//! 1. Discovery - Locate the template directory and build the variable table
//! 2. Selection - Resolve the requested commits in the source repository
//! 3. Rewrite - Rewrite every selected commit into a scratch object store
//! 4. Import - Transfer the rewritten commits and apply them one by one onto
//!    the destination branch
//!
//! The destination repository is only written to in phase 4. Errors raised by
//! earlier phases leave it untouched.

pub mod discovery;
pub mod import;
pub mod orchestrator;
pub mod rewrite;
pub mod selection;

pub use discovery as phase1;
pub use import as phase4;
pub use rewrite as phase3;
pub use selection as phase2;

pub use import::{Destination, ImportReport, ImportedCommit};
pub use orchestrator::{import, ImportOptions};
pub use rewrite::RewrittenCommit;
pub use selection::{Selection, SelectionSpec};
