//! Commit data model and pure selection/filter logic.
//!
//! The core never talks to GitHub itself: an external collaborator hands it an
//! ordered (newest-first) list of [`Commit`] records for one repository, and
//! everything in this module is a pure transformation over that list.

pub mod filter;

pub use filter::{CommitFilter, filter_commits};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author (or committer) of a commit.
///
/// The commits API does not always carry a login for commit authors, so every
/// field is optional; [`CommitAuthor::display_name`] picks the best available.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitAuthor {
    /// Full name from the commit metadata.
    pub name: Option<String>,
    /// Email from the commit metadata.
    pub email: Option<String>,
    /// Account login, when the host resolved one.
    pub login: Option<String>,
}

impl CommitAuthor {
    /// Best human-readable name: `name`, then `login`, then `"Unknown"`.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.login.as_deref().filter(|s| !s.is_empty()))
            .unwrap_or("Unknown")
    }
}

/// One changed file inside a commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileChange {
    /// Path of the file relative to the repository root.
    pub filename: String,
    /// Change kind reported by the host: `added`, `removed`, `modified`, ...
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub additions: u32,
    #[serde(default)]
    pub deletions: u32,
}

/// Aggregate line statistics for a commit.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DiffStat {
    #[serde(default)]
    pub additions: u32,
    #[serde(default)]
    pub deletions: u32,
}

/// Immutable commit record as received from the source-control collaborator.
///
/// Identity is the `sha`; the core never mutates these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    /// Full commit hash.
    pub sha: String,
    /// Full commit message (subject + body).
    pub message: String,
    #[serde(default)]
    pub author: CommitAuthor,
    /// Author timestamp. `None` when the host record had no parseable date;
    /// such commits are rejected by date-bounded filtering.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Changed files, possibly truncated by the host for very large commits.
    #[serde(default)]
    pub files: Vec<FileChange>,
    #[serde(default)]
    pub stats: DiffStat,
    /// Link back to the commit on the host, if known.
    #[serde(default)]
    pub html_url: Option<String>,
}

impl Commit {
    /// Abbreviated hash used in prompts and article references.
    pub fn short_sha(&self) -> &str {
        self.sha.get(..8).unwrap_or(&self.sha)
    }

    /// First line of the commit message.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}
