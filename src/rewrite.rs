//! Content rewriting: the reverse of rendering a template.
//!
//! Rewriting a blob happens in two stages:
//!
//! 1. [`escape::escape`] protects Jinja delimiters that were already present.
//! 2. Values claim their occurrences, longest value first across the whole
//!    buffer, equal lengths in declaration order. An occurrence overlapping an
//!    escape sequence or an earlier claim is left alone, so a shorter value
//!    never breaks up a longer one. Claimed ranges are then replaced by their
//!    placeholders in one pass; placeholder text is never searched.
//!
//! Values are matched byte for byte; they are data, never patterns.

use crate::escape;
use crate::variables::VariableTable;

/// Number of leading bytes inspected when deciding whether a blob is binary.
const BINARY_PROBE_LEN: usize = 8000;

/// Whether `data` looks like binary content (a NUL byte near the start).
pub fn is_binary(data: &[u8]) -> bool {
    data.iter().take(BINARY_PROBE_LEN).any(|&b| b == 0)
}

/// Rewrites blob content and path strings with a fixed variable table.
#[derive(Debug, Clone)]
pub struct ContentRewriter<'a> {
    table: &'a VariableTable,
}

impl<'a> ContentRewriter<'a> {
    pub fn new(table: &'a VariableTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &'a VariableTable {
        self.table
    }

    /// Rewrite a blob into template form.
    ///
    /// Binary blobs are returned unchanged.
    pub fn rewrite(&self, data: &[u8]) -> Vec<u8> {
        if is_binary(data) {
            return data.to_vec();
        }
        self.substitute(&escape::escape(data))
    }

    /// Replace variable values with placeholders, without escaping.
    ///
    /// Escape sequences already present in `data` are copied through intact.
    pub fn substitute(&self, data: &[u8]) -> Vec<u8> {
        if self.table.is_empty() {
            return data.to_vec();
        }

        let mut claimed = vec![false; data.len()];
        for range in escape::escape_sequences(data) {
            claimed[range].fill(true);
        }

        let mut matches = Vec::new();
        for variable in self.table.iter() {
            let value = variable.value.as_bytes();
            let mut from = 0;
            while let Some(start) = find(&data[from..], value).map(|at| from + at) {
                let end = start + value.len();
                if claimed[start..end].contains(&true) {
                    from = start + 1;
                    continue;
                }
                claimed[start..end].fill(true);
                matches.push((start, variable));
                from = end;
            }
        }
        matches.sort_by_key(|(start, _)| *start);

        let mut out = Vec::with_capacity(data.len());
        let mut index = 0;
        for (start, variable) in matches {
            out.extend_from_slice(&data[index..start]);
            // A bare brace would fuse with the placeholder's opening `{{`.
            if out.last() == Some(&b'{') {
                out.pop();
                escape::push_escaped(&mut out, escape::BRACE);
            }
            out.extend_from_slice(variable.placeholder.as_bytes());
            index = start + variable.value.len();
        }
        out.extend_from_slice(&data[index..]);

        out
    }

    /// Escape and substitute a path string. Paths are never treated as binary.
    pub fn rewrite_str(&self, text: &str) -> String {
        let bytes = self.substitute(&escape::escape(text.as_bytes()));
        // Escapes, placeholders and values are UTF-8 and inserted on byte
        // boundaries of `text`, so the output stays valid UTF-8.
        String::from_utf8(bytes).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
    }
}

/// Offset of the first occurrence of `needle` in `haystack`.
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    haystack.windows(needle.len()).position(|window| window == needle)
}
