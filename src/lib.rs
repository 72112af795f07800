//! Trac wiki markup to Gitea Markdown converter.

pub mod accessor;
mod config;
mod document;
mod error;
pub mod markdown;
mod util;

pub use accessor::{
    CommentStamp, DestinationAccessor, GiteaTarget, LookupTables, SourceAccessor, TracEnvironment,
};
pub use config::Config;
pub use document::{DocumentContext, TicketId};
pub use error::ResolveError;
pub use markdown::{Converter, InlineTransform, LinkGuard};
