//! Trac wiki markup to Gitea Markdown conversion.
//!
//! Code blocks are disguised first so that nothing inside them is touched,
//! then links and caller supplied transforms run over the remaining text,
//! and finally the disguised blocks become Markdown fences or inline code.

mod code_block;
mod converter;
mod inline;
mod links;
mod references;
mod segments;

pub use code_block::{BlockFrame, DisguisedText, disguise_code_blocks, undisguise_code_blocks};
pub use converter::Converter;
pub use inline::{InlineTransform, LinkGuard, normalize_eol, remove_toc};
pub use links::{LinkConverter, unmark_links};
pub use references::{DEFAULT_SOURCE_BRANCH, Grammar, LinkReference, Resolver};
pub use segments::{Segment, map_non_code, split_segments};
