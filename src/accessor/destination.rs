//! Read access and file store of the destination Gitea instance.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::LookupTables;
use crate::document::TicketId;

/// Gitea issue comment created at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentStamp {
    pub id: i64,
    /// Gitea comment type; plain comments are `0`.
    pub kind: i64,
}

/// Everything the converter needs to know about the Gitea side.
///
/// Lookups return `Ok(None)` (or an empty list) for a miss; `Err` is reserved
/// for the data source itself failing.
pub trait DestinationAccessor {
    /// Gitea issue number created for a Trac ticket.
    fn issue_id(&self, ticket_id: TicketId) -> Result<Option<i64>>;

    /// Comments created on an issue at exactly `created` (Unix seconds).
    fn issue_comments_at(&self, issue_id: i64, created: i64) -> Result<Vec<CommentStamp>>;

    fn issue_comment_url(&self, issue_id: i64, comment_id: i64) -> String;

    fn milestone_id(&self, name: &str) -> Result<Option<i64>>;

    fn milestone_url(&self, milestone_id: i64) -> String;

    /// Identifier of a named attachment on an issue.
    fn issue_attachment_uuid(&self, issue_id: i64, name: &str) -> Result<Option<String>>;

    fn issue_attachment_url(&self, issue_id: i64, uuid: &str) -> String;

    /// Path of a wiki page attachment, relative to the wiki repository.
    fn wiki_attachment_rel_path(&self, page: &str, file: &str) -> String;

    /// Path of a Trac htdocs file, relative to the wiki repository.
    fn wiki_htdoc_rel_path(&self, path: &str) -> String;

    /// Public URL of a file stored in the wiki repository.
    fn wiki_file_url(&self, rel_path: &str) -> String;

    /// Gitea wiki page name for a Trac wiki page name.
    fn translate_wiki_page_name(&self, page: &str) -> String;

    fn commit_url(&self, commit: &str) -> String;

    fn source_url(&self, branch: &str, path: &str) -> String;

    fn issue_url(&self, issue_id: i64) -> String;

    /// Copies a file into the wiki repository at `rel_path`.
    fn copy_file_to_wiki(&self, from: &Path, rel_path: &str) -> Result<()>;
}

/// Gitea repository addressed by URL, with a local wiki checkout.
#[derive(Debug, Clone)]
pub struct GiteaTarget {
    root_url: String,
    owner: String,
    repo: String,
    wiki_dir: PathBuf,
    tables: LookupTables,
}

impl GiteaTarget {
    /// Creates target for a repository.
    ///
    /// # Arguments
    ///
    /// * `root_url`: Gitea server root URL (trailing slash optional)
    /// * `owner`: User or organisation owning the repository
    /// * `repo`: Repository name
    /// * `wiki_dir`: Local checkout of the repository wiki
    /// * `tables`: Lookup tables for issues, comments, milestones and attachments
    pub fn new(
        root_url: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        wiki_dir: impl AsRef<Path>,
        tables: LookupTables,
    ) -> Self {
        let root_url: String = root_url.into();
        Self {
            root_url: root_url.trim_end_matches('/').to_string(),
            owner: owner.into(),
            repo: repo.into(),
            wiki_dir: wiki_dir.as_ref().to_path_buf(),
            tables,
        }
    }

    fn repo_url(&self) -> String {
        format!("{}/{}/{}", self.root_url, self.owner, self.repo)
    }
}

impl DestinationAccessor for GiteaTarget {
    fn issue_id(&self, ticket_id: TicketId) -> Result<Option<i64>> {
        Ok(self
            .tables
            .issue
            .iter()
            .find(|entry| entry.ticket == ticket_id)
            .map(|entry| entry.number))
    }

    fn issue_comments_at(&self, issue_id: i64, created: i64) -> Result<Vec<CommentStamp>> {
        Ok(self
            .tables
            .comment
            .iter()
            .filter(|entry| entry.issue == issue_id && entry.time == created)
            .map(|entry| CommentStamp {
                id: entry.id,
                kind: entry.kind,
            })
            .collect())
    }

    fn issue_comment_url(&self, issue_id: i64, comment_id: i64) -> String {
        format!(
            "{}/issues/{}#issuecomment-{}",
            self.repo_url(),
            issue_id,
            comment_id
        )
    }

    fn milestone_id(&self, name: &str) -> Result<Option<i64>> {
        Ok(self
            .tables
            .milestone
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.id))
    }

    fn milestone_url(&self, milestone_id: i64) -> String {
        format!("{}/milestone/{}", self.repo_url(), milestone_id)
    }

    fn issue_attachment_uuid(&self, issue_id: i64, name: &str) -> Result<Option<String>> {
        Ok(self
            .tables
            .attachment
            .iter()
            .find(|entry| entry.issue == issue_id && entry.name == name)
            .map(|entry| entry.uuid.clone()))
    }

    fn issue_attachment_url(&self, _issue_id: i64, uuid: &str) -> String {
        format!("{}/attachments/{}", self.root_url, uuid)
    }

    fn wiki_attachment_rel_path(&self, page: &str, file: &str) -> String {
        format!("attachments/{}/{}", page, file)
    }

    fn wiki_htdoc_rel_path(&self, path: &str) -> String {
        format!("htdocs/{}", path)
    }

    fn wiki_file_url(&self, rel_path: &str) -> String {
        format!("../../wiki/raw/{}", rel_path)
    }

    fn translate_wiki_page_name(&self, page: &str) -> String {
        match page {
            "WikiStart" => "Home".to_string(),
            _ => page.to_string(),
        }
    }

    fn commit_url(&self, commit: &str) -> String {
        format!("{}/commit/{}", self.repo_url(), commit)
    }

    fn source_url(&self, branch: &str, path: &str) -> String {
        format!("{}/src/branch/{}/{}", self.repo_url(), branch, path)
    }

    fn issue_url(&self, issue_id: i64) -> String {
        format!("{}/issues/{}", self.repo_url(), issue_id)
    }

    fn copy_file_to_wiki(&self, from: &Path, rel_path: &str) -> Result<()> {
        let target = self.wiki_dir.join(rel_path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create wiki directory {}", parent.display()))?;
        }

        fs::copy(from, &target).with_context(|| {
            format!(
                "Failed to copy {} to {}",
                from.display(),
                target.display()
            )
        })?;

        log::debug!("copied {} to wiki {}", from.display(), rel_path);
        Ok(())
    }
}
