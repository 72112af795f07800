//! Utility functions for the conversion passes.

use regex::{Captures, Regex};
use std::ops::Range;

/// Replaces every match of `re` in `text` with a fallible replacement.
///
/// Behaves like [`Regex::replace_all`] with a closure, except the first
/// error returned by `replace` aborts the pass and is handed back.
///
/// # Arguments
///
/// * `re`: Pattern to replace
/// * `text`: Input text
/// * `replace`: Produces the replacement for one match
///
/// # Errors
///
/// Returns the first error produced by `replace`
pub(crate) fn try_replace_all<E>(
    re: &Regex,
    text: &str,
    mut replace: impl FnMut(&Captures<'_>) -> Result<String, E>,
) -> Result<String, E> {
    let mut result = String::with_capacity(text.len());
    let mut last = 0;

    for caps in re.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        result.push_str(&text[last..whole.start()]);
        result.push_str(&replace(&caps)?);
        last = whole.end();
    }

    result.push_str(&text[last..]);
    Ok(result)
}

/// Whether `range` intersects any of `spans`.
pub(crate) fn overlaps_any(range: &Range<usize>, spans: &[Range<usize>]) -> bool {
    spans
        .iter()
        .any(|span| span.start < range.end && range.start < span.end)
}

/// Moves `ranges` of a text to where they land once `edits` are applied.
///
/// Each edit is an input range with the length of its replacement. A range
/// must lie between edits or coincide with the start of one.
pub(crate) fn shift_ranges<'r>(
    ranges: impl IntoIterator<Item = &'r Range<usize>>,
    edits: &[(Range<usize>, usize)],
) -> Vec<Range<usize>> {
    ranges
        .into_iter()
        .map(|range| {
            let (grown, shrunk) = edits
                .iter()
                .filter(|(edit, _)| edit.end <= range.start)
                .fold((0, 0), |(grown, shrunk), (edit, len)| {
                    (grown + len, shrunk + edit.len())
                });
            let start = range.start + grown - shrunk;
            start..start + range.len()
        })
        .collect()
}
