//! Default values for cookie-backport configuration.
//!
//! Locations and names used across commands live here so the CLI, the pull
//! request importer and the tests agree on them.

use std::path::{Path, PathBuf};

/// Environment variable overriding the mirror cache location.
pub const CACHE_ENV: &str = "COOKIE_BACKPORT_CACHE";

/// Environment variable holding a GitHub token.
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Prefix of the branches pull requests are imported on.
pub const BRANCH_PREFIX: &str = "cookie-backport/";

/// Returns the default cache root directory.
///
/// Uses the platform-appropriate cache directory:
/// - Linux: `~/.cache/cookie-backport` (XDG Base Directory)
/// - macOS: `~/Library/Caches/cookie-backport`
/// - Windows: `{FOLDERID_LocalAppData}\cookie-backport`
///
/// Falls back to `.cookie-backport-cache` in the current directory if the
/// platform cache directory cannot be determined.
///
/// This can be overridden by the `--cache-root` CLI flag or the
/// `COOKIE_BACKPORT_CACHE` environment variable.
pub fn default_cache_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cookie-backport-cache"))
        .join("cookie-backport")
}

/// Returns the file the GitHub token is stored in between runs.
pub fn token_file(cache_root: &Path) -> PathBuf {
    cache_root.join("token.json")
}

/// Branch that `--branch` imports are measured against when `--upstream` is
/// not given.
pub fn default_upstream() -> String {
    crate::git::default_branch()
}
