//! Escaping of Jinja delimiters that already exist in project content.
//!
//! A generated project can legitimately contain Jinja syntax, for example a
//! GitHub Actions workflow using `${{ matrix.os }}`. Copied verbatim into the
//! template, Cookiecutter would try to render it. Every delimiter is therefore
//! wrapped in a string expression, so `{{` becomes `{{"{{"}}`, which renders
//! back to the original `{{`.
//!
//! Escaping is idempotent: an existing escape sequence is copied through as-is
//! rather than escaped a second time.
//!
//! A lone `{` directly in front of an escape sequence would fuse with its
//! opening `{{` into a new delimiter, so such a brace is escaped as `{{"{"}}`.

use std::ops::Range;

/// Special delimiters, in the order they are tried at a given position.
pub const TOKENS: [&[u8]; 6] = [b"{{", b"}}", b"{%", b"%}", b"{#", b"#}"];

/// A single opening brace, escaped only where it touches an escape sequence.
pub const BRACE: &[u8] = b"{";

const ESCAPE_OPEN: &[u8] = b"{{\"";
const ESCAPE_CLOSE: &[u8] = b"\"}}";

/// Write the escape sequence for `token` into `out`.
pub fn push_escaped(out: &mut Vec<u8>, token: &[u8]) {
    out.extend_from_slice(ESCAPE_OPEN);
    out.extend_from_slice(token);
    out.extend_from_slice(ESCAPE_CLOSE);
}

/// Length of the escape sequence starting at `input[0]`, if there is one.
pub fn escape_sequence_len(input: &[u8]) -> Option<usize> {
    let rest = input.strip_prefix(ESCAPE_OPEN)?;
    TOKENS.iter().chain([&BRACE]).find_map(|token| {
        rest.strip_prefix(*token)
            .filter(|tail| tail.starts_with(ESCAPE_CLOSE))
            .map(|_| ESCAPE_OPEN.len() + token.len() + ESCAPE_CLOSE.len())
    })
}

/// The special token starting at `input[0]`, if there is one.
fn token_at(input: &[u8]) -> Option<&'static [u8]> {
    TOKENS.iter().copied().find(|token| input.starts_with(token))
}

/// Escape every special token in `input` that is not already escaped.
pub fn escape(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut index = 0;

    while index < input.len() {
        let rest = &input[index..];

        if let Some(len) = escape_sequence_len(rest) {
            out.extend_from_slice(&rest[..len]);
            index += len;
        } else if let Some(token) = token_at(rest) {
            push_escaped(&mut out, token);
            index += token.len();
        } else if rest[0] == b'{' && starts_escaped(&rest[1..]) {
            push_escaped(&mut out, BRACE);
            index += 1;
        } else {
            out.push(rest[0]);
            index += 1;
        }
    }

    out
}

/// Whether escaping `input` emits an escape sequence at its very start.
fn starts_escaped(input: &[u8]) -> bool {
    escape_sequence_len(input).is_some() || token_at(input).is_some()
}

/// Byte ranges of the escape sequences in already escaped `input`.
pub fn escape_sequences(input: &[u8]) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut index = 0;

    while index < input.len() {
        match escape_sequence_len(&input[index..]) {
            Some(len) => {
                ranges.push(index..index + len);
                index += len;
            }
            None => index += 1,
        }
    }

    ranges
}

/// Whether every special token in `input` lies inside an escape sequence.
pub fn is_fully_escaped(input: &[u8]) -> bool {
    let mut index = 0;

    while index < input.len() {
        let rest = &input[index..];

        if let Some(len) = escape_sequence_len(rest) {
            index += len;
        } else if token_at(rest).is_some() {
            return false;
        } else {
            index += 1;
        }
    }

    true
}
