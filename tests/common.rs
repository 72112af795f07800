//! Shared test utilities for integration tests.
//!
//! Provides in-memory Trac and Gitea accessors so conversions can be checked
//! without a Trac environment or a wiki checkout.

#![allow(dead_code)]

use anyhow::{Result, bail};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracdown::{CommentStamp, DestinationAccessor, SourceAccessor, TicketId};

/// Trac side with comment times held in memory.
#[derive(Debug, Default)]
pub struct FakeTrac {
    pub comment_times: HashMap<(TicketId, i64), i64>,
}

impl SourceAccessor for FakeTrac {
    fn full_path(&self, category: &str, rel_path: &str) -> PathBuf {
        Path::new("/trac").join(category).join(rel_path)
    }

    fn ticket_comment_time(&self, ticket_id: TicketId, comment_num: i64) -> Result<Option<i64>> {
        Ok(self.comment_times.get(&(ticket_id, comment_num)).copied())
    }
}

/// Gitea side with lookups held in memory, recording file copies.
#[derive(Debug, Default)]
pub struct FakeGitea {
    pub issues: HashMap<TicketId, i64>,
    pub comments: HashMap<(i64, i64), Vec<CommentStamp>>,
    pub milestones: HashMap<String, i64>,
    pub attachments: HashMap<(i64, String), String>,
    /// Copies made, as (source path, wiki relative path).
    pub copies: RefCell<Vec<(PathBuf, String)>>,
    /// Makes every copy fail.
    pub fail_copies: bool,
}

impl DestinationAccessor for FakeGitea {
    fn issue_id(&self, ticket_id: TicketId) -> Result<Option<i64>> {
        Ok(self.issues.get(&ticket_id).copied())
    }

    fn issue_comments_at(&self, issue_id: i64, created: i64) -> Result<Vec<CommentStamp>> {
        Ok(self
            .comments
            .get(&(issue_id, created))
            .cloned()
            .unwrap_or_default())
    }

    fn issue_comment_url(&self, issue_id: i64, comment_id: i64) -> String {
        format!("{}/issues/{}#issuecomment-{}", REPO_URL, issue_id, comment_id)
    }

    fn milestone_id(&self, name: &str) -> Result<Option<i64>> {
        Ok(self.milestones.get(name).copied())
    }

    fn milestone_url(&self, milestone_id: i64) -> String {
        format!("{}/milestone/{}", REPO_URL, milestone_id)
    }

    fn issue_attachment_uuid(&self, issue_id: i64, name: &str) -> Result<Option<String>> {
        Ok(self.attachments.get(&(issue_id, name.to_string())).cloned())
    }

    fn issue_attachment_url(&self, _issue_id: i64, uuid: &str) -> String {
        format!("https://git.example.com/attachments/{}", uuid)
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
        format!("{}/commit/{}", REPO_URL, commit)
    }

    fn source_url(&self, branch: &str, path: &str) -> String {
        format!("{}/src/branch/{}/{}", REPO_URL, branch, path)
    }

    fn issue_url(&self, issue_id: i64) -> String {
        format!("{}/issues/{}", REPO_URL, issue_id)
    }

    fn copy_file_to_wiki(&self, from: &Path, rel_path: &str) -> Result<()> {
        if self.fail_copies {
            bail!("Failed to copy {}", from.display());
        }
        self.copies
            .borrow_mut()
            .push((from.to_path_buf(), rel_path.to_string()));
        Ok(())
    }
}

pub const REPO_URL: &str = "https://git.example.com/acme/widget";

/// Trac side knowing comment 2 of ticket 1 was made at time 1000.
pub fn trac() -> FakeTrac {
    let mut trac = FakeTrac::default();
    trac.comment_times.insert((1, 2), 1000);
    trac.comment_times.insert((1, 3), 0);
    trac
}

/// Gitea side where ticket 1 became issue 11 and ticket 2 issue 12.
pub fn gitea() -> FakeGitea {
    let mut gitea = FakeGitea::default();
    gitea.issues.insert(1, 11);
    gitea.issues.insert(2, 12);
    gitea.comments.insert(
        (11, 1000),
        vec![
            CommentStamp { id: 31, kind: 4 },
            CommentStamp { id: 30, kind: 0 },
        ],
    );
    gitea.milestones.insert("1.0".to_string(), 3);
    gitea
        .attachments
        .insert((11, "log.txt".to_string()), "abc-123".to_string());
    gitea
        .attachments
        .insert((11, "shot.png".to_string()), "def-456".to_string());
    gitea
}
