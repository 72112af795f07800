//! Trac link grammars and their resolution to Gitea URLs.

use regex::{Captures, Regex};
use std::sync::LazyLock;

use crate::accessor::{DestinationAccessor, SourceAccessor};
use crate::document::{DocumentContext, TicketId};
use crate::error::{ResolveError, parse_number};

/// Branch assumed for `source:` links; Trac paths do not carry one.
pub const DEFAULT_SOURCE_BRANCH: &str = "master";

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid link regex")
}

static HTTP_LINK: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"https?://[[:alnum:]\-._~:/?#@!$&'"()*+,;%=]*[[:alnum:]]"#));

static HTDOCS_LINK: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"htdocs:([[:alnum:]\-._~:/?#@!$&'"()*+,;%=]+)"#));

static TICKET_COMMENT_LINK: LazyLock<Regex> =
    LazyLock::new(|| compile(r"comment:([[:digit:]]+)(?::ticket:([[:digit:]]+))?"));

static MILESTONE_LINK: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"milestone:([[:alnum:]\-._~:/?#@!$&'"()*+,;%=]+)"#));

// File names cannot contain ':' so the optional suffix is never swallowed
static ATTACHMENT_LINK: LazyLock<Regex> = LazyLock::new(|| {
    compile(concat!(
        r#"attachment:([[:alnum:]\-._~/?#@!$&'"()*+,;%=]+)"#,
        r"(?:(?::wiki:((?:[[:upper:]][[:lower:]]*)+))|(?::ticket:([[:digit:]]+)))?",
    ))
});

static CHANGESET_LINK: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"changeset:"([[:xdigit:]]+)/[^"]+""#));

static SOURCE_LINK: LazyLock<Regex> = LazyLock::new(|| compile(r#"source:"[^/]+/([^"]+)""#));

static TICKET_LINK: LazyLock<Regex> = LazyLock::new(|| compile(r"ticket:([[:digit:]]+)"));

static WIKI_LINK: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"wiki:([[:alnum:]:\-._&']*[[:alnum:]])(?:#([[:alnum:]?/:@\-._~!$&'*+,;=]+))?")
});

// Leading char: whitespace starts a word, a zero width space stands for a
// removed '[', and ']' ends the text of a debracketed link
static WIKI_CAMEL_CASE_LINK: LazyLock<Regex> = LazyLock::new(|| {
    compile(concat!(
        r"([[:space:]\x{200B}\]]|\A)((?:[[:upper:]][[:lower:]]+){2,})",
        r"(?:#([[:alnum:]?/:@\-._~!$&'()*+,;=]+))?",
    ))
});

/// Trac link syntaxes, in the order they must be recognised.
///
/// `ticket:` and `wiki:` also appear as suffixes of `comment:` and
/// `attachment:` links, so they come after those.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    Http,
    Htdocs,
    TicketComment,
    Milestone,
    Attachment,
    Changeset,
    Source,
    Ticket,
    Wiki,
    WikiCamelCase,
}

impl Grammar {
    /// All grammars in resolution order.
    pub const ORDER: [Grammar; 10] = [
        Grammar::Http,
        Grammar::Htdocs,
        Grammar::TicketComment,
        Grammar::Milestone,
        Grammar::Attachment,
        Grammar::Changeset,
        Grammar::Source,
        Grammar::Ticket,
        Grammar::Wiki,
        Grammar::WikiCamelCase,
    ];

    /// Pattern matching this grammar.
    pub fn regex(self) -> &'static Regex {
        match self {
            Grammar::Http => &HTTP_LINK,
            Grammar::Htdocs => &HTDOCS_LINK,
            Grammar::TicketComment => &TICKET_COMMENT_LINK,
            Grammar::Milestone => &MILESTONE_LINK,
            Grammar::Attachment => &ATTACHMENT_LINK,
            Grammar::Changeset => &CHANGESET_LINK,
            Grammar::Source => &SOURCE_LINK,
            Grammar::Ticket => &TICKET_LINK,
            Grammar::Wiki => &WIKI_LINK,
            Grammar::WikiCamelCase => &WIKI_CAMEL_CASE_LINK,
        }
    }
}

/// A recognised Trac link with its fields, borrowed from the text.
///
/// `None` for a ticket or page means "the document being converted".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkReference<'t> {
    Http {
        url: &'t str,
    },
    Htdocs {
        path: &'t str,
    },
    TicketComment {
        comment: &'t str,
        ticket: Option<&'t str>,
    },
    Milestone {
        name: &'t str,
    },
    TicketAttachment {
        file: &'t str,
        ticket: Option<&'t str>,
    },
    WikiAttachment {
        file: &'t str,
        page: Option<&'t str>,
    },
    Changeset {
        commit: &'t str,
    },
    Source {
        path: &'t str,
    },
    Ticket {
        id: &'t str,
    },
    Wiki {
        page: &'t str,
        anchor: Option<&'t str>,
    },
    WikiCamelCase {
        leading: &'t str,
        page: &'t str,
        anchor: Option<&'t str>,
    },
}

impl<'t> LinkReference<'t> {
    /// Builds a reference from a match of `grammar`.
    ///
    /// An `attachment:` link without an explicit `:ticket:` or `:wiki:`
    /// suffix belongs to the ticket or page being converted.
    pub fn from_captures(
        grammar: Grammar,
        caps: &Captures<'t>,
        context: &DocumentContext,
    ) -> Self {
        let group = |index: usize| caps.get(index).map(|m| m.as_str());
        let required = |index: usize| group(index).unwrap_or_default();

        match grammar {
            Grammar::Http => LinkReference::Http { url: required(0) },
            Grammar::Htdocs => LinkReference::Htdocs { path: required(1) },
            Grammar::TicketComment => LinkReference::TicketComment {
                comment: required(1),
                ticket: group(2),
            },
            Grammar::Milestone => LinkReference::Milestone { name: required(1) },
            Grammar::Attachment => {
                let file = required(1);
                match (group(2), group(3)) {
                    (_, Some(ticket)) => LinkReference::TicketAttachment {
                        file,
                        ticket: Some(ticket),
                    },
                    (Some(page), None) => LinkReference::WikiAttachment {
                        file,
                        page: Some(page),
                    },
                    (None, None) => match context {
                        DocumentContext::Ticket(_) => {
                            LinkReference::TicketAttachment { file, ticket: None }
                        }
                        DocumentContext::Wiki(_) => {
                            LinkReference::WikiAttachment { file, page: None }
                        }
                    },
                }
            }
            Grammar::Changeset => LinkReference::Changeset { commit: required(1) },
            Grammar::Source => LinkReference::Source { path: required(1) },
            Grammar::Ticket => LinkReference::Ticket { id: required(1) },
            Grammar::Wiki => LinkReference::Wiki {
                page: required(1),
                anchor: group(2),
            },
            Grammar::WikiCamelCase => LinkReference::WikiCamelCase {
                leading: required(1),
                page: required(2),
                anchor: group(3),
            },
        }
    }

    /// Text matched ahead of the link proper, kept unmarked in the output.
    pub fn leading(&self) -> &'t str {
        match self {
            LinkReference::WikiCamelCase { leading, .. } => leading,
            _ => "",
        }
    }

    /// Resolves the reference to the URL it should point at.
    ///
    /// # Errors
    ///
    /// Returns a recoverable [`ResolveError`] when a lookup misses or a
    /// field is invalid, and [`ResolveError::Collaborator`] when copying an
    /// `htdocs:` file fails.
    pub fn resolve(&self, resolver: &Resolver<'_>) -> Result<String, ResolveError> {
        match *self {
            LinkReference::Http { url } => Ok(url.to_string()),
            LinkReference::Htdocs { path } => resolver.htdocs(path),
            LinkReference::TicketComment { comment, ticket } => {
                resolver.ticket_comment(comment, ticket)
            }
            LinkReference::Milestone { name } => resolver.milestone(name),
            LinkReference::TicketAttachment { file, ticket } => {
                let ticket_id = resolver.ticket_or_current(ticket)?;
                resolver.ticket_attachment(ticket_id, file)
            }
            LinkReference::WikiAttachment { file, page } => {
                let page = match page {
                    Some(page) => page,
                    None => resolver
                        .context
                        .wiki_page()
                        .ok_or(ResolveError::MissingContext("wiki page"))?,
                };
                Ok(resolver.wiki_attachment(page, file))
            }
            LinkReference::Changeset { commit } => Ok(resolver.destination.commit_url(commit)),
            LinkReference::Source { path } => Ok(resolver
                .destination
                .source_url(DEFAULT_SOURCE_BRANCH, path)),
            LinkReference::Ticket { id } => {
                let ticket_id = parse_number("ticket id", id)?;
                let issue_id = resolver.issue(ticket_id)?;
                Ok(resolver.destination.issue_url(issue_id))
            }
            LinkReference::Wiki { page, anchor }
            | LinkReference::WikiCamelCase { page, anchor, .. } => {
                Ok(resolver.wiki_page(page, anchor))
            }
        }
    }
}

/// Resolution of references for one document.
pub struct Resolver<'a> {
    pub(crate) source: &'a dyn SourceAccessor,
    pub(crate) destination: &'a dyn DestinationAccessor,
    pub(crate) context: &'a DocumentContext,
}

impl<'a> Resolver<'a> {
    /// Creates resolver for a document.
    pub fn new(
        source: &'a dyn SourceAccessor,
        destination: &'a dyn DestinationAccessor,
        context: &'a DocumentContext,
    ) -> Self {
        Self {
            source,
            destination,
            context,
        }
    }

    /// Document the references appear in.
    pub fn context(&self) -> &DocumentContext {
        self.context
    }

    fn ticket_or_current(&self, ticket: Option<&str>) -> Result<TicketId, ResolveError> {
        match ticket {
            Some(id) => parse_number("ticket id", id),
            None => self
                .context
                .ticket_id()
                .ok_or(ResolveError::MissingContext("ticket")),
        }
    }

    fn issue(&self, ticket_id: TicketId) -> Result<i64, ResolveError> {
        self.destination
            .issue_id(ticket_id)
            .map_err(ResolveError::Lookup)?
            .ok_or(ResolveError::IssueNotFound(ticket_id))
    }

    fn htdocs(&self, path: &str) -> Result<String, ResolveError> {
        let trac_path = self.source.full_path("htdocs", path);
        let wiki_rel_path = self.destination.wiki_htdoc_rel_path(path);
        self.destination
            .copy_file_to_wiki(&trac_path, &wiki_rel_path)
            .map_err(ResolveError::Collaborator)?;
        Ok(self.destination.wiki_file_url(&wiki_rel_path))
    }

    fn ticket_comment(&self, comment: &str, ticket: Option<&str>) -> Result<String, ResolveError> {
        let comment_num = parse_number("comment number", comment)?;
        let ticket_id = self.ticket_or_current(ticket)?;
        let issue_id = self.issue(ticket_id)?;

        let time = self
            .source
            .ticket_comment_time(ticket_id, comment_num)
            .map_err(ResolveError::Lookup)?
            .filter(|time| *time != 0)
            .ok_or(ResolveError::CommentTimeNotFound {
                ticket: ticket_id,
                comment: comment_num,
            })?;

        // Several changes share a timestamp; plain comments have the lowest kind
        let mut stamps = self
            .destination
            .issue_comments_at(issue_id, time)
            .map_err(ResolveError::Lookup)?;
        stamps.sort_by_key(|stamp| (stamp.kind, stamp.id));
        let comment_id = stamps
            .first()
            .map(|stamp| stamp.id)
            .ok_or(ResolveError::CommentNotFound {
                issue: issue_id,
                time,
            })?;

        Ok(self.destination.issue_comment_url(issue_id, comment_id))
    }

    fn milestone(&self, name: &str) -> Result<String, ResolveError> {
        let milestone_id = self
            .destination
            .milestone_id(name)
            .map_err(ResolveError::Lookup)?
            .ok_or_else(|| ResolveError::MilestoneNotFound(name.to_string()))?;
        Ok(self.destination.milestone_url(milestone_id))
    }

    pub(crate) fn ticket_attachment(
        &self,
        ticket_id: TicketId,
        file: &str,
    ) -> Result<String, ResolveError> {
        let issue_id = self.issue(ticket_id)?;
        let uuid = self
            .destination
            .issue_attachment_uuid(issue_id, file)
            .map_err(ResolveError::Lookup)?
            .filter(|uuid| !uuid.is_empty())
            .ok_or_else(|| ResolveError::AttachmentNotFound {
                issue: issue_id,
                name: file.to_string(),
            })?;
        Ok(self.destination.issue_attachment_url(issue_id, &uuid))
    }

    fn wiki_attachment(&self, page: &str, file: &str) -> String {
        let rel_path = self.destination.wiki_attachment_rel_path(page, file);
        self.destination.wiki_file_url(&rel_path)
    }

    fn wiki_page(&self, page: &str, anchor: Option<&str>) -> String {
        let translated = self.destination.translate_wiki_page_name(page);
        match anchor {
            Some(anchor) => format!("{}#{}", translated, anchor),
            None => translated,
        }
    }
}
