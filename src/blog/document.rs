//! Blog document model and on-disk format.
//!
//! A stored document is a markdown file with a YAML frontmatter header:
//!
//! ```text
//! ---
//! title: Development Update - myrepo
//! repository: owner/myrepo
//! ...
//! ---
//!
//! <markdown body>
//! ```
//!
//! The index keeps one [`IndexEntry`] per file; `content_hash` is the
//! SHA-256 of the body and is what `validate` compares against.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{BloggerError, Result};

/// YAML frontmatter stored at the top of each document file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frontmatter {
    pub title: String,
    pub repository: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub provider: String,
    pub model: String,
    /// SHAs of the commits this article was generated from.
    #[serde(default)]
    pub source_commits: Vec<String>,
    #[serde(default)]
    pub word_count: usize,
}

/// A complete blog document: identity, metadata and markdown body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogDocument {
    pub id: String,
    #[serde(flatten)]
    pub meta: Frontmatter,
    pub body: String,
}

/// One index record, 1:1 with a stored document file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub title: String,
    pub repository: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub provider: String,
    /// Path relative to the storage root.
    pub path: String,
    /// SHA-256 hex of the document body.
    pub content_hash: String,
}

/// `owner/repo` 形式的仓库名转为文件系统安全的 slug
pub fn repo_slug(repository: &str) -> String {
    repository.replace(['/', '\\'], "_")
}

/// 文档 id：创建时间 + 仓库 slug，分配后不变
pub fn make_id(created_at: DateTime<Utc>, repository: &str) -> String {
    format!(
        "{}_{}",
        created_at.format("%Y%m%d_%H%M%S"),
        repo_slug(repository)
    )
}

/// 统计 Unicode 空白分隔的词数
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// SHA-256 hex digest of arbitrary text.
pub fn hash_content(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl BlogDocument {
    /// SHA-256 hex over the body only; metadata edits do not change it.
    pub fn content_hash(&self) -> String {
        hash_content(&self.body)
    }

    /// Serializes the document to its on-disk representation.
    pub fn render(&self) -> Result<String> {
        let yaml = serde_yaml_ng::to_string(&self.meta)
            .map_err(|e| BloggerError::Other(format!("Failed to serialize frontmatter: {}", e)))?;
        let mut out = format!("---\n{}---\n\n{}", yaml, self.body);
        if !out.ends_with('\n') {
            out.push('\n');
        }
        Ok(out)
    }

    /// Parses a document from its on-disk representation.
    ///
    /// `id` comes from the index (or the filename), not the file content.
    pub fn parse(id: &str, content: &str) -> Result<Self> {
        let rest = content.strip_prefix("---\n").ok_or_else(|| {
            BloggerError::InvalidInput(format!("document '{}': missing frontmatter delimiter", id))
        })?;

        let (yaml, body) = rest.split_once("\n---\n").ok_or_else(|| {
            BloggerError::InvalidInput(format!("document '{}': unterminated frontmatter block", id))
        })?;

        let meta: Frontmatter = serde_yaml_ng::from_str(yaml).map_err(|e| {
            BloggerError::InvalidInput(format!("document '{}': invalid frontmatter: {}", id, e))
        })?;

        let body = body.strip_prefix('\n').unwrap_or(body);

        Ok(Self {
            id: id.to_string(),
            meta,
            body: body.trim_end_matches('\n').to_string() + "\n",
        })
    }

    /// Builds the index record for this document.
    pub fn index_entry(&self, relative_path: &str) -> IndexEntry {
        IndexEntry {
            id: self.id.clone(),
            title: self.meta.title.clone(),
            repository: self.meta.repository.clone(),
            tags: self.meta.tags.clone(),
            created_at: self.meta.created_at,
            updated_at: self.meta.updated_at,
            provider: self.meta.provider.clone(),
            path: relative_path.to_string(),
            content_hash: self.content_hash(),
        }
    }
}
