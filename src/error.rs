//! Per-reference resolution failures.

use thiserror::Error;

use crate::document::TicketId;

/// Why a single Trac link could not be turned into a forge URL.
///
/// Every variant except [`ResolveError::Collaborator`] is recoverable: the
/// caller logs it and keeps the original link text. Collaborator failures
/// come from side-effecting calls and abort the enclosing conversion.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid number \"{value}\" in {field}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("no Gitea issue for ticket {0}")]
    IssueNotFound(TicketId),

    #[error("no recorded time for comment {comment} of ticket {ticket}")]
    CommentTimeNotFound { ticket: TicketId, comment: i64 },

    #[error("no Gitea comment at time {time} on issue {issue}")]
    CommentNotFound { issue: i64, time: i64 },

    #[error("no milestone named \"{0}\"")]
    MilestoneNotFound(String),

    #[error("no attachment \"{name}\" on issue {issue}")]
    AttachmentNotFound { issue: i64, name: String },

    #[error("reference needs a {0} context")]
    MissingContext(&'static str),

    #[error("lookup failed: {0:#}")]
    Lookup(anyhow::Error),

    #[error(transparent)]
    Collaborator(anyhow::Error),
}

impl ResolveError {
    /// Whether this failure must abort the conversion rather than degrade a
    /// single link.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ResolveError::Collaborator(_))
    }
}

/// Parses a numeric link field.
pub(crate) fn parse_number(field: &'static str, value: &str) -> Result<i64, ResolveError> {
    value.parse().map_err(|_| ResolveError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}
