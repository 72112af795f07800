//! Splitting disguised text into code and non-code segments.

use regex::Regex;
use std::sync::LazyLock;

use super::code_block::{FENCE_CLOSE, FENCE_OPEN, RAW_CLOSE, RAW_OPEN};

static SENTINEL: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives = [FENCE_OPEN, FENCE_CLOSE, RAW_OPEN, RAW_CLOSE]
        .iter()
        .map(|sentinel| regex::escape(sentinel))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&alternatives).expect("valid sentinel regex")
});

/// Piece of disguised text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Text outside any disguised block; subject to conversion.
    Text(&'a str),
    /// Outermost disguised block, sentinels included; left untouched.
    Protected(&'a str),
}

/// Splits disguised text into alternating text and protected segments.
///
/// Nested sentinels belong to their outermost block. A closing sentinel
/// with nothing open is ordinary text. A block still open at the end of
/// input extends to the end.
pub fn split_segments(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut text_start = 0;
    let mut protected_start = 0;

    for sentinel in SENTINEL.find_iter(text) {
        let opens = matches!(sentinel.as_str(), FENCE_OPEN | RAW_OPEN);

        if opens {
            if depth == 0 {
                if sentinel.start() > text_start {
                    segments.push(Segment::Text(&text[text_start..sentinel.start()]));
                }
                protected_start = sentinel.start();
            }
            depth += 1;
        } else if depth > 0 {
            depth -= 1;
            if depth == 0 {
                segments.push(Segment::Protected(&text[protected_start..sentinel.end()]));
                text_start = sentinel.end();
            }
        }
    }

    if depth > 0 {
        segments.push(Segment::Protected(&text[protected_start..]));
    } else if text_start < text.len() {
        segments.push(Segment::Text(&text[text_start..]));
    }

    segments
}

/// Applies `convert` to every non-code segment, copying protected segments
/// through byte for byte.
///
/// # Errors
///
/// Returns the first error produced by `convert`
pub fn map_non_code<E>(
    text: &str,
    mut convert: impl FnMut(&str) -> Result<String, E>,
) -> Result<String, E> {
    let mut result = String::with_capacity(text.len());

    for segment in split_segments(text) {
        match segment {
            Segment::Text(plain) => result.push_str(&convert(plain)?),
            Segment::Protected(code) => result.push_str(code),
        }
    }

    Ok(result)
}
