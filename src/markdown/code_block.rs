//! Trac `{{{ ... }}}` block parsing.
//!
//! Blocks are either rewritten to HTML (`#!div`, `#!comment`, `#!html`, ...)
//! or turned into disguised fences so that no later pass touches their
//! contents. The disguise is only lifted by [`undisguise_code_blocks`] once
//! every other conversion has run.

use regex::Regex;
use std::sync::LazyLock;

/// Opening sentinel of a disguised code block.
pub(crate) const FENCE_OPEN: &str = "{@{@{";
/// Closing sentinel of a disguised code block.
pub(crate) const FENCE_CLOSE: &str = "}@}@}";
/// Opening sentinel of a raw HTML block.
pub(crate) const RAW_OPEN: &str = "<@{@{@";
/// Closing sentinel of a raw HTML block.
pub(crate) const RAW_CLOSE: &str = "@}@}@>";

/// Processors Gitea can highlight, kept as fence language tags.
const CODE_LANGS: &[&str] = &["c", "c++", "ps1", "php", "py", "sh", "cpp", "pl"];

/// Trac processor names Gitea knows under another name.
const LANG_ALIASES: &[(&str, &str)] = &[("c++", "cpp")];

/// Block-level HTML tags. Their contents stay Markdown, so the tags are
/// separated from it by an empty line.
const HTML_TAGS: &[&str] = &["div", "td", "th", "tr", "table"];

static BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\{|\}\}\}").expect("valid block boundary regex"));

static PROCESSOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\A\s*#!(\w[^\n]*)?").expect("valid processor regex"));

static SINGLE_LINE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{@\{@\{([^\n]+?)\}@\}@\}").expect("valid single line fence regex")
});

/// Kind of block currently open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockFrame {
    /// Disguised code block, with or without a language.
    Plain,
    /// Block-level HTML element, by tag name.
    HtmlTag(String),
    /// HTML comment.
    Comment,
    /// Raw HTML passed through unconverted.
    RawHtml,
}

impl BlockFrame {
    /// Text replacing the `}}}` that closes this block.
    fn closer(&self) -> String {
        match self {
            BlockFrame::Plain => FENCE_CLOSE.to_string(),
            BlockFrame::HtmlTag(tag) => format!("\n</{}>", tag),
            BlockFrame::Comment => "-->".to_string(),
            BlockFrame::RawHtml => RAW_CLOSE.to_string(),
        }
    }
}

/// Text with code blocks disguised, plus any blocks left open at the end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisguisedText {
    text: String,
    unclosed: Vec<BlockFrame>,
}

impl DisguisedText {
    /// Disguised text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Consumes self, returning the disguised text.
    pub fn into_string(self) -> String {
        self.text
    }

    /// Blocks still open at end of input, outermost first.
    pub fn unclosed(&self) -> &[BlockFrame] {
        &self.unclosed
    }

    /// Whether every `{{{` found a matching `}}}`.
    pub fn is_balanced(&self) -> bool {
        self.unclosed.is_empty()
    }
}

/// Rewrites `{{{ ... }}}` blocks into disguised fences or HTML.
///
/// Scans boundaries strictly left to right keeping a stack of open blocks.
/// A `}}}` with nothing open is left as literal text. Unclosed blocks are
/// reported through [`DisguisedText::unclosed`]; the partial output is still
/// usable.
///
/// # Arguments
///
/// * `input`: Trac text with Unix line endings
///
/// # Returns
///
/// Disguised text and the blocks left open
pub fn disguise_code_blocks(input: &str) -> DisguisedText {
    let mut text = String::with_capacity(input.len());
    let mut stack: Vec<BlockFrame> = Vec::new();
    let mut rest = input;

    while let Some(boundary) = BOUNDARY.find(rest) {
        text.push_str(&rest[..boundary.start()]);
        let after = &rest[boundary.end()..];

        if boundary.as_str() == "{{{" {
            let (opening, frame, remaining) = open_block(after);
            text.push_str(&opening);
            stack.push(frame);
            rest = remaining;
        } else {
            match stack.pop() {
                Some(frame) => text.push_str(&frame.closer()),
                None => text.push_str("}}}"),
            }
            rest = after;
        }
    }

    text.push_str(rest);
    DisguisedText {
        text,
        unclosed: stack,
    }
}

/// Converts a block opening, given the text following its `{{{`.
///
/// Returns the replacement for the opening, the frame to push and the text
/// left to scan.
fn open_block(after: &str) -> (String, BlockFrame, &str) {
    let (processor, remaining) = match PROCESSOR.captures(after) {
        Some(caps) => {
            let consumed = caps.get(0).map_or(0, |m| m.end());
            let token = caps.get(1).map_or("", |m| m.as_str());
            (token, &after[consumed..])
        }
        None => ("", after),
    };

    // Commit hook messages carry a processor that has no rendering of its own
    let processor = if processor.starts_with("CommitTicketReference") {
        ""
    } else {
        processor
    };

    let trimmed = processor.trim();
    if let Some(lang) = CODE_LANGS.iter().find(|lang| **lang == trimmed) {
        let lang = LANG_ALIASES
            .iter()
            .find(|(trac, _)| trac == lang)
            .map_or(*lang, |(_, gitea)| *gitea);
        log::debug!("code block in language {}", lang);
        return (format!("{}{}", FENCE_OPEN, lang), BlockFrame::Plain, remaining);
    }

    if let Some(tag) = HTML_TAGS.iter().find(|tag| processor.starts_with(*tag)) {
        return (
            format!("<{}>\n", processor),
            BlockFrame::HtmlTag((*tag).to_string()),
            remaining,
        );
    }

    if processor.starts_with("comment") || processor.starts_with("htmlcomment") {
        return ("<!---".to_string(), BlockFrame::Comment, remaining);
    }

    if processor.starts_with("html") {
        return (RAW_OPEN.to_string(), BlockFrame::RawHtml, remaining);
    }

    let opening = if processor.is_empty() {
        FENCE_OPEN.to_string()
    } else {
        format!("{}#!{}", FENCE_OPEN, processor)
    };
    (opening, BlockFrame::Plain, remaining)
}

/// Replaces disguise sentinels with Markdown code syntax.
///
/// Single line blocks become inline code spans, remaining sentinels become
/// ```` ``` ```` fences and raw HTML sentinels are dropped.
pub fn undisguise_code_blocks(text: &str) -> String {
    SINGLE_LINE_FENCE
        .replace_all(text, "`${1}`")
        .replace(FENCE_OPEN, "```")
        .replace(FENCE_CLOSE, "```")
        .replace(RAW_OPEN, "")
        .replace(RAW_CLOSE, "")
}
