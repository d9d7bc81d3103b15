//! Property-based tests for escaping and content rewriting.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use std::collections::BTreeSet;

    use crate::escape::{escape, escape_sequence_len, is_fully_escaped};
    use crate::rewrite::ContentRewriter;
    use crate::variables::VariableTable;
    use proptest::prelude::*;

    /// Text made of letters, whitespace and Jinja delimiter characters. No
    /// quotes, so escape sequences never occur in the input itself.
    fn jinja_text() -> impl Strategy<Value = String> {
        "[a-zA-Z {}%#\n]{0,64}"
    }

    /// Up to three distinct upper-case values, named `v0`, `v1`, ...
    fn table() -> impl Strategy<Value = VariableTable> {
        prop::collection::btree_set("[A-Z]{2,5}", 1..4).prop_map(|values: BTreeSet<String>| {
            VariableTable::from_pairs(
                values
                    .into_iter()
                    .enumerate()
                    .map(|(i, value)| (format!("v{i}"), value)),
            )
            .unwrap()
        })
    }

    /// Render template text the way Cookiecutter would: escape sequences
    /// yield their token, placeholders yield their value.
    fn render(template: &[u8], table: &VariableTable) -> Vec<u8> {
        let mut out = Vec::new();
        let mut index = 0;

        'scan: while index < template.len() {
            let rest = &template[index..];

            if let Some(len) = escape_sequence_len(rest) {
                out.extend_from_slice(&rest[3..len - 3]);
                index += len;
                continue;
            }

            for variable in table.iter() {
                if rest.starts_with(variable.placeholder.as_bytes()) {
                    out.extend_from_slice(variable.value.as_bytes());
                    index += variable.placeholder.len();
                    continue 'scan;
                }
            }

            out.push(rest[0]);
            index += 1;
        }

        out
    }

    // ============================================================================
    // escape property tests
    // ============================================================================

    proptest! {
        /// Property: escaping leaves no bare delimiter behind
        #[test]
        fn escape_output_is_fully_escaped(input in "[a-z {}%#\"]{0,64}") {
            prop_assert!(is_fully_escaped(&escape(input.as_bytes())));
        }

        /// Property: escaping twice is the same as escaping once
        #[test]
        fn escape_is_idempotent(input in "[a-z {}%#\"]{0,64}") {
            let once = escape(input.as_bytes());
            let twice = escape(&once);
            prop_assert_eq!(once, twice);
        }

        /// Property: text without delimiter characters is unchanged
        #[test]
        fn escape_preserves_plain_text(input in "[a-zA-Z0-9 .\n]{0,64}") {
            prop_assert_eq!(escape(input.as_bytes()), input.as_bytes().to_vec());
        }
    }

    // ============================================================================
    // ContentRewriter property tests
    // ============================================================================

    proptest! {
        /// Property: rendering the rewritten text gives back the original
        #[test]
        fn rewrite_renders_back_to_input(input in jinja_text(), table in table()) {
            let rewritten = ContentRewriter::new(&table).rewrite(input.as_bytes());
            prop_assert_eq!(render(&rewritten, &table), input.as_bytes().to_vec());
        }

        /// Property: no literal value survives rewriting
        #[test]
        fn rewrite_replaces_every_value(input in jinja_text(), table in table()) {
            let rewritten = ContentRewriter::new(&table).rewrite(input.as_bytes());
            let text = String::from_utf8(rewritten).unwrap();
            for variable in table.iter() {
                prop_assert!(
                    !text.contains(&variable.value),
                    "value {:?} survived in {:?}",
                    variable.value,
                    text
                );
            }
        }

        /// Property: the longest value is never broken up by a shorter one
        #[test]
        fn rewrite_keeps_longest_value_whole(
            prefix in jinja_text(),
            suffix in jinja_text(),
            table in table(),
        ) {
            let longest = table.iter().next().unwrap();
            let input = format!("{prefix}{}{suffix}", longest.value);
            let rewritten = ContentRewriter::new(&table).rewrite(input.as_bytes());
            let text = String::from_utf8(rewritten).unwrap();
            prop_assert!(
                text.contains(&longest.placeholder),
                "{:?} lost {:?} in {:?}",
                input,
                longest.value,
                text
            );
        }

        /// Property: rewriting is deterministic
        #[test]
        fn rewrite_is_deterministic(input in jinja_text(), table in table()) {
            let rewriter = ContentRewriter::new(&table);
            prop_assert_eq!(rewriter.rewrite(input.as_bytes()), rewriter.rewrite(input.as_bytes()));
        }

        /// Property: binary content passes through untouched
        #[test]
        fn rewrite_leaves_binary_alone(
            head in prop::collection::vec(any::<u8>(), 0..32),
            tail in prop::collection::vec(any::<u8>(), 0..32),
            table in table(),
        ) {
            let mut data = head;
            data.push(0);
            data.extend(tail);
            prop_assert_eq!(ContentRewriter::new(&table).rewrite(&data), data);
        }
    }
}
