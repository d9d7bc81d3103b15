//! # Output Configuration
//!
//! Controls how import progress and results are printed: whether colors and
//! symbols are used, and how each kind of line is styled.
//!
//! The following environment variables and flags are respected:
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals

use std::env;

use console::style;

/// Output configuration for controlling colors and symbols.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and symbols should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// `color_flag` is the value of `--color`: "always", "never", or "auto".
    /// In auto mode, colors are disabled if `NO_COLOR` is set, `CLICOLOR=0`,
    /// `TERM=dumb`, or stdout is not a TTY (unless `CLICOLOR_FORCE=1`).
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        // The presence of the variable (even if empty) disables colors
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }

        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }

        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    /// Apply the configuration to the `console` crate globally.
    pub fn apply(&self) {
        console::set_colors_enabled(self.use_color);
        console::set_colors_enabled_stderr(self.use_color);
    }

    /// A line announcing a successfully imported commit.
    pub fn imported(&self, source: &str, imported: &str, summary: &str) -> String {
        let marker = emoji(self, "✓", "imported");
        format!(
            "{} {} -> {} {}",
            style(marker).green(),
            style(source).dim(),
            style(imported).yellow(),
            summary
        )
    }

    /// A line announcing a commit skipped because it changed nothing.
    pub fn skipped(&self, source: &str, summary: &str) -> String {
        let marker = emoji(self, "∅", "skipped");
        format!("{} {} {}", style(marker).yellow(), style(source).dim(), summary)
    }

    /// A line announcing a pull request result.
    pub fn pull_request(&self, action: &str, number: u64, url: &str) -> String {
        let marker = emoji(self, "⇡", "pr");
        format!("{} {} #{} {}", style(marker).cyan(), action, number, style(url).underlined())
    }

    /// Create a configuration with colors always enabled.
    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    /// Create a configuration with colors always disabled.
    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Returns the symbol when colors are enabled, the plain text otherwise.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_always() {
        let config = OutputConfig::from_env_and_flag("always");
        assert!(config.use_color);
    }

    #[test]
    fn test_color_never() {
        let config = OutputConfig::from_env_and_flag("never");
        assert!(!config.use_color);
    }

    #[test]
    fn test_emoji_helper_with_color() {
        let config = OutputConfig::with_color();
        assert_eq!(emoji(&config, "✓", "imported"), "✓");
    }

    #[test]
    fn test_emoji_helper_without_color() {
        let config = OutputConfig::without_color();
        assert_eq!(emoji(&config, "✓", "imported"), "imported");
    }

    #[test]
    fn test_plain_lines_contain_ids() {
        console::set_colors_enabled(false);
        let config = OutputConfig::without_color();
        let line = config.imported("1234567", "89abcdef", "Add example");
        assert_eq!(line, "imported 1234567 -> 89abcdef Add example");

        let line = config.skipped("1234567", "Touch nothing");
        assert_eq!(line, "skipped 1234567 Touch nothing");

        let line = config.pull_request("created", 12, "https://github.com/o/t/pull/12");
        assert_eq!(line, "pr created #12 https://github.com/o/t/pull/12");
    }
}
