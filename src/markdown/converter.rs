//! Trac markup to Gitea Markdown conversion of whole documents.

use anyhow::{Context, Result};

use super::code_block::{disguise_code_blocks, undisguise_code_blocks};
use super::inline::{InlineTransform, normalize_eol, remove_toc};
use super::links::LinkConverter;
use super::references::Resolver;
use super::segments::map_non_code;
use crate::accessor::{DestinationAccessor, SourceAccessor};
use crate::document::{DocumentContext, TicketId};

/// Converts ticket and wiki text from Trac markup to Gitea Markdown.
///
/// Holds no per-document state: the same converter can be used for any
/// number of documents, and from several threads when the accessors allow.
pub struct Converter<'a> {
    source: &'a dyn SourceAccessor,
    destination: &'a dyn DestinationAccessor,
    transforms: Vec<Box<dyn InlineTransform + 'a>>,
}

impl<'a> Converter<'a> {
    /// Creates converter resolving links against the given accessors.
    ///
    /// # Arguments
    ///
    /// * `source`: Trac environment the text comes from
    /// * `destination`: Gitea instance the text is going to
    pub fn new(source: &'a dyn SourceAccessor, destination: &'a dyn DestinationAccessor) -> Self {
        Self {
            source,
            destination,
            transforms: Vec::new(),
        }
    }

    /// Appends a transform applied to non-code text after link conversion.
    ///
    /// Transforms run in the order they were added.
    pub fn with_transform(mut self, transform: impl InlineTransform + 'a) -> Self {
        self.transforms.push(Box::new(transform));
        self
    }

    /// Converts a ticket description or comment.
    ///
    /// # Errors
    ///
    /// Returns error only if copying a referenced file into the wiki fails;
    /// unresolvable links are logged and kept as written.
    pub fn convert_ticket_text(&self, ticket_id: TicketId, text: &str) -> Result<String> {
        self.convert(&DocumentContext::Ticket(ticket_id), text)
    }

    /// Converts a wiki page.
    ///
    /// # Errors
    ///
    /// Returns error only if copying a referenced file into the wiki fails;
    /// unresolvable links are logged and kept as written.
    pub fn convert_wiki_text(&self, page: &str, text: &str) -> Result<String> {
        self.convert(&DocumentContext::Wiki(page.to_string()), text)
    }

    /// Converts text belonging to `context`.
    ///
    /// # Errors
    ///
    /// Returns error only if copying a referenced file into the wiki fails
    pub fn convert(&self, context: &DocumentContext, text: &str) -> Result<String> {
        let text = normalize_eol(text);

        let disguised = disguise_code_blocks(&text);
        if !disguised.is_balanced() {
            log::error!(
                "{}: {} block(s) opened with {{{{{{ are never closed",
                context,
                disguised.unclosed().len()
            );
        }

        let links = LinkConverter::new(Resolver::new(self.source, self.destination, context));
        let converted = map_non_code(disguised.as_str(), |segment| {
            let mut out = remove_toc(segment);
            out = links.convert(&out)?;
            for transform in &self.transforms {
                out = transform.apply(&out);
            }
            Ok::<_, anyhow::Error>(out)
        })
        .with_context(|| format!("Failed to convert {}", context))?;

        Ok(undisguise_code_blocks(&converted))
    }
}
