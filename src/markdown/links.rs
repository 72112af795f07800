//! Conversion of Trac links to Markdown links.
//!
//! Runs in three phases, each handling one part of the syntax:
//!
//! 1. bracketed forms (`[[Image(...)]]`, `[[...]]`, `[...]`) are stripped of
//!    their brackets, leaving any link text in Markdown position;
//! 2. the bare Trac links are resolved and their URLs *marked* as
//!    `(@@url@@)` so nothing later mistakes them for Trac syntax;
//! 3. marks are turned into Markdown links or autolinks.
//!
//! The order is load-bearing: image parameters would be misread by the
//! generic bracket rules, and double bracket output is single bracket shaped.

use anyhow::{Context, Result};
use regex::{Captures, Regex};
use std::ops::Range;
use std::sync::LazyLock;

use super::references::{Grammar, LinkReference, Resolver};
use crate::util::{overlaps_any, shift_ranges, try_replace_all};

/// Separates debracketed links from trailing text until phase 3.
pub(crate) const ZERO_WIDTH_SPACE: &str = "\u{200B}";

static IMAGE_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\[\[Image\(([^,)]+)",
        r#"(?:, *link=([[:alnum:]\-._~:/?#@!$&'"(*+;%=]+))?[^\]]*\]\]"#,
    ))
    .expect("valid image link regex")
});

static DOUBLE_BRACKET_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[([[:alpha:]][^|\]]*)(?:\|([^\]]+))?\]\]").expect("valid double bracket regex")
});

// Image and double bracket links are already gone, so a leading '[' needs
// no exclusion here
static SINGLE_BRACKET_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([[:alpha:]][^ \]]*)(?: +([^\]]+))?\]").expect("valid single bracket regex")
});

static LOCAL_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[[:alnum:]\-._,]+\.[[:alpha:]]+$").expect("valid local file regex")
});

static MARKED_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(@@([^@]+(?:@[^@]+)*)@@\)").expect("valid marked link regex")
});

/// Wraps a resolved URL so later passes leave it alone.
///
/// Returns `None` if the URL itself contains the `@@` delimiter and so
/// cannot be marked unambiguously.
pub(crate) fn mark_link(url: &str) -> Option<String> {
    if url.is_empty() || url.contains("@@") || url.starts_with('@') || url.ends_with('@') {
        return None;
    }
    Some(format!("(@@{}@@)", url))
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Three phase Trac to Markdown link conversion for one document.
pub struct LinkConverter<'a> {
    resolver: Resolver<'a>,
}

impl<'a> LinkConverter<'a> {
    /// Creates converter resolving links through `resolver`.
    pub fn new(resolver: Resolver<'a>) -> Self {
        Self { resolver }
    }

    /// Converts every Trac link in `text` to Markdown.
    ///
    /// Links that cannot be resolved are logged and left as written.
    ///
    /// # Errors
    ///
    /// Returns error only if a side-effecting resolution (copying an
    /// `htdocs:` file) fails
    pub fn convert(&self, text: &str) -> Result<String> {
        let debracketed = self.normalize_brackets(text);
        let resolved = self.resolve_links(&debracketed)?;
        Ok(unmark_links(&resolved))
    }

    /// Phase 1: removes Trac bracketing, leaving links for phase 2.
    pub fn normalize_brackets(&self, text: &str) -> String {
        let out = IMAGE_LINK.replace_all(text, |caps: &Captures<'_>| {
            let image = caps.get(1).map_or("", |m| m.as_str());
            let image = self.local_image(image).unwrap_or_else(|| image.to_string());

            match caps.get(2) {
                Some(link) => format!("[![]{}]{}{}", image, link.as_str(), ZERO_WIDTH_SPACE),
                None => format!("![]{}{}", image, ZERO_WIDTH_SPACE),
            }
        });

        // Converting straight to Markdown here would leave "[text]" to be
        // misread as a single bracket link
        let out = DOUBLE_BRACKET_LINK.replace_all(&out, |caps: &Captures<'_>| {
            let link = &caps[1];
            match caps.get(2) {
                Some(text) => format!("[{} {}]", link, text.as_str()),
                None if link.eq_ignore_ascii_case("br") => caps[0].to_string(),
                None => format!("[{}]", link),
            }
        });

        SINGLE_BRACKET_LINK
            .replace_all(&out, |caps: &Captures<'_>| {
                let link = &caps[1];
                match caps.get(2) {
                    Some(text) => format!("[{}]{}{}", text.as_str(), link, ZERO_WIDTH_SPACE),
                    None if link.eq_ignore_ascii_case("br") => caps[0].to_string(),
                    None => format!("{}{}{}", ZERO_WIDTH_SPACE, link, ZERO_WIDTH_SPACE),
                }
            })
            .into_owned()
    }

    /// Resolves an image given as a bare filename to a marked attachment
    /// location.
    ///
    /// On a wiki page this is the attachment path relative to the wiki. On a
    /// ticket it is the issue attachment URL; when that cannot be found the
    /// filename itself is marked so the image syntax stays well formed.
    fn local_image(&self, image: &str) -> Option<String> {
        if !LOCAL_FILE.is_match(image) {
            return None;
        }

        let context = self.resolver.context();
        let location = match (context.wiki_page(), context.ticket_id()) {
            (Some(page), _) => self
                .resolver
                .destination
                .wiki_attachment_rel_path(page, image),
            (None, Some(ticket_id)) => match self.resolver.ticket_attachment(ticket_id, image) {
                Ok(url) => url,
                Err(err) => {
                    log::warn!("cannot resolve image \"{}\" on {}: {}", image, context, err);
                    image.to_string()
                }
            },
            (None, None) => image.to_string(),
        };

        mark_link(&location)
    }

    /// Phase 2: resolves unbracketed Trac links, marking their URLs.
    ///
    /// Grammars run in [`Grammar::ORDER`]. A match overlapping an existing
    /// mark, or the literal of a link that failed to resolve, is left alone
    /// so neither is reprocessed by a later grammar.
    ///
    /// # Errors
    ///
    /// Returns error if a side-effecting resolution fails
    pub fn resolve_links(&self, text: &str) -> Result<String> {
        let mut out = text.to_string();
        let mut kept: Vec<Range<usize>> = Vec::new();

        for grammar in Grammar::ORDER {
            let mut protected: Vec<Range<usize>> =
                MARKED_LINK.find_iter(&out).map(|m| m.range()).collect();
            protected.extend(kept.iter().cloned());

            let mut edits: Vec<(Range<usize>, usize)> = Vec::new();
            let mut failed: Vec<Range<usize>> = Vec::new();

            let replaced = try_replace_all(grammar.regex(), &out, |caps| {
                let Some(whole) = caps.get(0) else {
                    return Ok(String::new());
                };
                let literal = whole.as_str();

                let replacement = if overlaps_any(&whole.range(), &protected) {
                    literal.to_string()
                } else {
                    match self.resolve_match(grammar, caps, literal)? {
                        Some(mark) => mark,
                        None => {
                            failed.push(whole.range());
                            literal.to_string()
                        }
                    }
                };

                edits.push((whole.range(), replacement.len()));
                Ok::<_, anyhow::Error>(replacement)
            })?;

            kept = shift_ranges(kept.iter().chain(failed.iter()), &edits);
            out = replaced;
        }

        Ok(out)
    }

    /// Resolves one match to its marked replacement.
    ///
    /// Returns `None` when the link cannot be resolved or its URL cannot be
    /// marked; the literal then stays as written.
    fn resolve_match(
        &self,
        grammar: Grammar,
        caps: &Captures<'_>,
        literal: &str,
    ) -> Result<Option<String>> {
        let reference = LinkReference::from_captures(grammar, caps, self.resolver.context());

        match reference.resolve(&self.resolver) {
            Ok(url) => match mark_link(&url) {
                Some(mark) => {
                    log::debug!("resolved Trac link \"{}\" to {}", literal, url);
                    Ok(Some(format!("{}{}", reference.leading(), mark)))
                }
                None => {
                    log::warn!("cannot mark URL \"{}\" for Trac link \"{}\"", url, literal);
                    Ok(None)
                }
            },
            Err(err) if err.is_fatal() => Err(anyhow::Error::from(err))
                .with_context(|| format!("Failed to resolve Trac link \"{}\"", literal)),
            Err(err) => {
                log::warn!(
                    "cannot resolve Trac link \"{}\" on {}: {}",
                    literal,
                    self.resolver.context(),
                    err
                );
                Ok(None)
            }
        }
    }
}

/// Phase 3: turns marked URLs into Markdown and drops zero width spaces.
///
/// A mark straight after `]` completes a `[text](url)` link. Any other mark
/// becomes an autolink for HTTP(S) URLs and a `[url](url)` link otherwise.
pub fn unmark_links(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut last = 0;

    for caps in MARKED_LINK.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let url = &caps[1];
        result.push_str(&text[last..whole.start()]);

        if text[..whole.start()].ends_with(']') {
            result.push_str(&format!("({})", url));
        } else if is_http_url(url) {
            result.push_str(&format!("<{}>", url));
        } else {
            result.push_str(&format!("[{}]({})", url, url));
        }

        last = whole.end();
    }

    result.push_str(&text[last..]);
    result.replace(ZERO_WIDTH_SPACE, "")
}
