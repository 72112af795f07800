//! Lookup tables describing an earlier import into Gitea.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::document::TicketId;

/// Mapping of Trac ticket to Gitea issue number.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueEntry {
    pub ticket: TicketId,
    pub number: i64,
}

/// Gitea milestone id by name.
#[derive(Debug, Clone, Deserialize)]
pub struct MilestoneEntry {
    pub name: String,
    pub id: i64,
}

/// Gitea issue comment with its creation time and comment type.
#[derive(Debug, Clone, Deserialize)]
pub struct CommentEntry {
    pub issue: i64,
    pub time: i64,
    pub id: i64,
    #[serde(default)]
    pub kind: i64,
}

/// Gitea issue attachment.
#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentEntry {
    pub issue: i64,
    pub name: String,
    pub uuid: String,
}

/// Time at which a Trac ticket comment was recorded.
#[derive(Debug, Clone, Deserialize)]
pub struct CommentTimeEntry {
    pub ticket: TicketId,
    pub comment: i64,
    pub time: i64,
}

/// Everything the command line collaborators need to resolve links.
///
/// Loaded from TOML using arrays of tables:
///
/// ```toml
/// [[issue]]
/// ticket = 12
/// number = 40
///
/// [[comment_time]]
/// ticket = 12
/// comment = 3
/// time = 1600000000
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LookupTables {
    pub issue: Vec<IssueEntry>,
    pub milestone: Vec<MilestoneEntry>,
    pub comment: Vec<CommentEntry>,
    pub attachment: Vec<AttachmentEntry>,
    pub comment_time: Vec<CommentTimeEntry>,
}

impl LookupTables {
    /// Loads lookup tables from TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is not valid TOML for
    /// this layout.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read lookup tables: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse lookup tables: {}", path.display()))
    }
}
