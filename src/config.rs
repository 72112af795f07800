//! Command line configuration.

use anyhow::{Result, bail};
use clap::{ArgGroup, Parser};
use std::path::PathBuf;

use crate::document::{DocumentContext, TicketId};

/// Command line configuration for Tracdown.
#[derive(Debug, Clone, Parser)]
#[command(name = "tracdown", version, about, long_about = None)]
#[command(group(ArgGroup::new("document").required(true).args(["ticket", "wiki"])))]
pub struct Config {
    /// Trac markup file to convert
    pub input: PathBuf,

    /// Convert as the description or a comment of this ticket
    #[arg(long)]
    pub ticket: Option<TicketId>,

    /// Convert as this wiki page
    #[arg(long)]
    pub wiki: Option<String>,

    /// Output file (standard output when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Trac environment directory
    #[arg(long, default_value = ".")]
    pub trac_root: PathBuf,

    /// Local checkout of the Gitea wiki repository
    #[arg(long, default_value = "wiki")]
    pub wiki_dir: PathBuf,

    /// Gitea server root URL
    #[arg(long, default_value = "http://localhost:3000")]
    pub root_url: String,

    /// Gitea repository owner
    #[arg(long)]
    pub owner: String,

    /// Gitea repository name
    #[arg(long)]
    pub repo: String,

    /// TOML file with issue, milestone, comment and attachment lookups
    #[arg(long)]
    pub lookup: Option<PathBuf>,

    /// Log every resolved link
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parses configuration from command line arguments.
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Validates configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the input or lookup file does not exist, or the root
    /// URL is not HTTP(S).
    pub fn validate(&self) -> Result<()> {
        if !self.input.is_file() {
            bail!("Input file does not exist: {}", self.input.display());
        }

        if let Some(lookup) = self.lookup.as_ref().filter(|lookup| !lookup.is_file()) {
            bail!("Lookup file does not exist: {}", lookup.display());
        }

        if !(self.root_url.starts_with("http://") || self.root_url.starts_with("https://")) {
            bail!("Root URL must start with http:// or https://: {}", self.root_url);
        }

        Ok(())
    }

    /// Returns the document the input belongs to.
    ///
    /// # Errors
    ///
    /// Returns error if neither `--ticket` nor `--wiki` was given.
    pub fn context(&self) -> Result<DocumentContext> {
        match (self.ticket, &self.wiki) {
            (Some(ticket_id), _) => Ok(DocumentContext::Ticket(ticket_id)),
            (None, Some(page)) => Ok(DocumentContext::Wiki(page.clone())),
            (None, None) => bail!("Either --ticket or --wiki is required"),
        }
    }
}
