//! Line level passes over non-code text.

use regex::Regex;
use std::sync::LazyLock;

static TOC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[TOC\]\]\n+").expect("valid TOC regex"));

static HTTP_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(https?)://").expect("valid scheme regex"));

static DISGUISED_HTTP_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(https?):@@").expect("valid disguised scheme regex"));

/// A rewrite of text lying outside code blocks.
///
/// Headings, lists, font styles and the like are supplied by the caller as
/// transforms; they run after links have been converted. Any
/// `Fn(&str) -> String` is a transform.
pub trait InlineTransform {
    fn apply(&self, text: &str) -> String;
}

impl<F> InlineTransform for F
where
    F: Fn(&str) -> String,
{
    fn apply(&self, text: &str) -> String {
        self(text)
    }
}

/// Runs an inner transform with `http(s)://` disguised as `http(s):@@`.
///
/// Keeps URLs intact through transforms whose markers clash with them, such
/// as Trac's `//italic//`.
pub struct LinkGuard<T>(pub T);

impl<T: InlineTransform> InlineTransform for LinkGuard<T> {
    fn apply(&self, text: &str) -> String {
        let disguised = HTTP_SCHEME.replace_all(text, "${1}:@@");
        let transformed = self.0.apply(&disguised);
        DISGUISED_HTTP_SCHEME
            .replace_all(&transformed, "${1}://")
            .into_owned()
    }
}

/// Converts Windows and classic Mac line endings to `\n`.
pub fn normalize_eol(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Drops `[[TOC]]` macros; Gitea renders its own table of contents.
pub fn remove_toc(text: &str) -> String {
    TOC.replace_all(text, "").into_owned()
}
