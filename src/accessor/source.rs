//! Read access to the Trac environment.

use anyhow::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::LookupTables;
use crate::document::TicketId;

/// Read-only view of the Trac environment being migrated.
pub trait SourceAccessor {
    /// Full filesystem path of a resource in a Trac directory category
    /// (`htdocs`, `attachments`, ...).
    fn full_path(&self, category: &str, rel_path: &str) -> PathBuf;

    /// Unix timestamp at which comment `comment_num` was made on a ticket.
    ///
    /// Returns `Ok(None)` when Trac has no record of that comment.
    fn ticket_comment_time(&self, ticket_id: TicketId, comment_num: i64) -> Result<Option<i64>>;
}

/// Trac environment rooted at a directory on disk.
///
/// Comment timestamps come from the lookup tables rather than the Trac
/// database, so conversions can run against an exported snapshot.
#[derive(Debug, Clone)]
pub struct TracEnvironment {
    root: PathBuf,
    comment_times: HashMap<(TicketId, i64), i64>,
}

impl TracEnvironment {
    /// Creates environment for Trac root directory.
    ///
    /// # Arguments
    ///
    /// * `root`: Trac environment directory (the one holding `htdocs/`)
    /// * `tables`: Lookup tables providing recorded comment times
    pub fn new(root: impl AsRef<Path>, tables: &LookupTables) -> Self {
        let comment_times = tables
            .comment_time
            .iter()
            .map(|entry| ((entry.ticket, entry.comment), entry.time))
            .collect();

        Self {
            root: root.as_ref().to_path_buf(),
            comment_times,
        }
    }

    /// Trac environment directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SourceAccessor for TracEnvironment {
    fn full_path(&self, category: &str, rel_path: &str) -> PathBuf {
        self.root.join(category).join(rel_path)
    }

    fn ticket_comment_time(&self, ticket_id: TicketId, comment_num: i64) -> Result<Option<i64>> {
        Ok(self.comment_times.get(&(ticket_id, comment_num)).copied())
    }
}
