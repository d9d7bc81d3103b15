//! # Error Suggestions
//!
//! This module provides helper functions for generating helpful error
//! messages with hints and suggestions. Following CLI recommendations,
//! errors should tell users what went wrong AND how to fix it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cookie_backport::suggestions;
//!
//! // Instead of:
//! anyhow::bail!("--create requires --branch");
//!
//! // Use:
//! return Err(suggestions::create_requires_branch());
//! ```

/// Generate an error for `--create` used without `--branch`.
pub fn create_requires_branch() -> anyhow::Error {
    anyhow::anyhow!(
        "--create requires --branch\n\n\
         hint: Use --branch <BRANCH> to select the branch to import\n\
         hint: Use --create-branch <NAME> to name the destination branch explicitly"
    )
}

/// Generate an error for `--create` combined with `--create-branch`.
pub fn create_flags_exclusive() -> anyhow::Error {
    anyhow::anyhow!(
        "--create and --create-branch are mutually exclusive\n\n\
         hint: --create is shorthand for --create-branch with the value of --branch"
    )
}

/// Generate an error for a pull request import without any selector.
pub fn no_pull_requests_selected() -> anyhow::Error {
    anyhow::anyhow!(
        "Please specify which pull requests to import\n\n\
         hint: Pass pull request numbers or branch names as arguments\n\
         hint: Use --user <LOGIN> to import pull requests opened by a user\n\
         hint: Use --all to import all open pull requests"
    )
}

/// Generate an error for `--all` combined with explicit pull requests.
pub fn all_with_pull_requests() -> anyhow::Error {
    anyhow::anyhow!(
        "Do not specify --all with individual pull requests\n\n\
         hint: Drop --all to import only the listed pull requests"
    )
}

/// Build a "did you mean" hint for an unknown name.
pub fn did_you_mean(input: &str, candidates: &[&str]) -> Option<String> {
    find_similar(input, candidates).map(|s| format!("Did you mean '{s}'?"))
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Calculate the Levenshtein edit distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    // Two rolling rows are enough for the distance itself.
    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0usize; b_chars.len() + 1];

    for (i, a_char) in a_chars.iter().enumerate() {
        current[0] = i + 1;
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_chars.len()]
}
