//! Document context for a single conversion.

use std::fmt;

/// Trac ticket identifier.
pub type TicketId = i64;

/// Where the text being converted lives in Trac.
///
/// Link resolution depends on this: an unqualified `attachment:file.txt` or
/// `comment:3` is scoped to the current ticket, while an image filename on a
/// wiki page refers to that page's attachments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentContext {
    /// Ticket description or comment.
    Ticket(TicketId),
    /// Wiki page, identified by its Trac page name.
    Wiki(String),
}

impl DocumentContext {
    /// Ticket the document belongs to, if any.
    pub fn ticket_id(&self) -> Option<TicketId> {
        match self {
            DocumentContext::Ticket(id) => Some(*id),
            DocumentContext::Wiki(_) => None,
        }
    }

    /// Wiki page the document belongs to, if any.
    pub fn wiki_page(&self) -> Option<&str> {
        match self {
            DocumentContext::Ticket(_) => None,
            DocumentContext::Wiki(page) => Some(page),
        }
    }
}

impl fmt::Display for DocumentContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentContext::Ticket(id) => write!(f, "ticket #{}", id),
            DocumentContext::Wiki(page) => write!(f, "wiki page {}", page),
        }
    }
}
