//! 存储与索引引擎
//!
//! 布局：`<root>/<repo-slug>/<id>.md`，索引 `<root>/.blog_index.json`。
//!
//! 一致性规则：
//! - 每个 id 一把异步写锁（dashmap 注册表），同 id 写入串行化
//! - 文档与索引都先写临时文件再 rename，读者永远看不到半个文件
//! - 文件写成而索引写失败时回滚文件写入，返回 `IndexCorrupt`
//! - 索引可以从文件重建（`repair`），索引丢了数据不丢

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock};

use crate::constants::storage::{EXPORT_SEPARATOR, INDEX_FILE_NAME};
use crate::error::{BloggerError, Result, StorageError};

use super::document::{BlogDocument, IndexEntry, repo_slug};

/// Search criteria beyond the free-text query.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    pub repository: Option<String>,
    pub tags: Vec<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// One JSON array of full documents.
    Json,
    /// One markdown file: header, then each document separated by `---`.
    CombinedMarkdown,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "markdown" | "md" | "combined_markdown" => Ok(ExportFormat::CombinedMarkdown),
            _ => Err(format!("Unknown export format: '{}'", s)),
        }
    }
}

/// Read-only drift report produced by [`BlogStorage::validate`].
#[derive(Debug, Default, serde::Serialize)]
pub struct ValidationReport {
    /// `.md` files on disk with no index entry.
    pub orphan_files: Vec<String>,
    /// Index entries whose file is missing.
    pub orphan_index_entries: Vec<String>,
    /// Ids whose file content no longer matches the indexed hash.
    pub hash_mismatches: Vec<String>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.orphan_files.is_empty()
            && self.orphan_index_entries.is_empty()
            && self.hash_mismatches.is_empty()
    }

    pub fn total_issues(&self) -> usize {
        self.orphan_files.len() + self.orphan_index_entries.len() + self.hash_mismatches.len()
    }
}

/// Outcome of a [`BlogStorage::repair`] pass.
#[derive(Debug, Default, serde::Serialize)]
pub struct RepairReport {
    /// Index entries removed because their file is gone.
    pub removed_index_entries: Vec<String>,
    /// Orphan files re-admitted into the index.
    pub reindexed_files: Vec<String>,
    /// Hash mismatches are flagged, never silently resolved.
    pub flagged_hash_mismatches: Vec<String>,
    pub errors: Vec<String>,
}

/// Aggregate numbers for the `stats` command.
#[derive(Debug, serde::Serialize)]
pub struct StorageStats {
    pub total_entries: usize,
    pub total_size_bytes: u64,
    pub repositories: BTreeMap<String, usize>,
    pub providers: BTreeMap<String, usize>,
    pub storage_path: String,
}

/// Content-addressed document store with a JSON index.
pub struct BlogStorage {
    root: PathBuf,
    index: RwLock<BTreeMap<String, IndexEntry>>,
    /// 每个 id 一把写锁；锁本身按需创建，从不回收（条目数量级很小）
    write_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl BlogStorage {
    /// Opens (creating if needed) the store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;

        let index_path = root.join(INDEX_FILE_NAME);
        let index = if index_path.exists() {
            let content = std::fs::read_to_string(&index_path)?;
            serde_json::from_str::<BTreeMap<String, IndexEntry>>(&content).map_err(|e| {
                BloggerError::Storage(StorageError::IndexCorrupt(format!(
                    "cannot parse {}: {}",
                    index_path.display(),
                    e
                )))
            })?
        } else {
            BTreeMap::new()
        };

        tracing::debug!(
            "Opened blog storage at {} ({} entries)",
            root.display(),
            index.len()
        );

        Ok(Self {
            root,
            index: RwLock::new(index),
            write_locks: DashMap::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn write_lock_for(&self, id: &str) -> Arc<Mutex<()>> {
        self.write_locks
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// 文档相对路径：`<repo-slug>/<id>.md`
    fn relative_path(repository: &str, id: &str) -> String {
        format!("{}/{}.md", repo_slug(repository), id)
    }

    fn absolute_path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// 原子写入：同目录临时文件 + rename
    fn write_atomic(&self, path: &Path, content: &str) -> Result<()> {
        let dir = path
            .parent()
            .ok_or_else(|| BloggerError::Other(format!("no parent dir for {}", path.display())))?;
        std::fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| {
            BloggerError::Storage(StorageError::WriteFailed {
                path: path.display().to_string(),
                message: format!("cannot create temp file: {}", e),
            })
        })?;
        std::io::Write::write_all(&mut tmp, content.as_bytes()).map_err(|e| {
            BloggerError::Storage(StorageError::WriteFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            })
        })?;
        tmp.persist(path).map_err(|e| {
            BloggerError::Storage(StorageError::WriteFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            })
        })?;
        Ok(())
    }

    /// 持久化索引快照（临时文件 + rename）
    fn persist_index(&self, snapshot: &BTreeMap<String, IndexEntry>) -> Result<()> {
        let index_path = self.root.join(INDEX_FILE_NAME);
        let json = serde_json::to_string_pretty(snapshot)?;
        self.write_atomic(&index_path, &json)
            .map_err(|e| match e {
                BloggerError::Storage(StorageError::WriteFailed { message, .. }) => {
                    BloggerError::Storage(StorageError::IndexCorrupt(format!(
                        "index write failed: {}",
                        message
                    )))
                }
                other => other,
            })
    }

    /// Saves a document: file first, then index, with rollback.
    ///
    /// Concurrent saves for the same id serialize on the per-id lock; saves
    /// for different ids proceed in parallel. If the index write fails the
    /// file write is undone (previous bytes restored, or the new file
    /// removed) so the two never diverge.
    pub async fn save(&self, doc: &BlogDocument) -> Result<()> {
        let lock = self.write_lock_for(&doc.id);
        let _guard = lock.lock().await;

        let relative = Self::relative_path(&doc.meta.repository, &doc.id);
        let path = self.absolute_path(&relative);
        let rendered = doc.render()?;

        // 回滚需要旧内容
        let previous = if path.exists() {
            Some(std::fs::read_to_string(&path)?)
        } else {
            None
        };

        self.write_atomic(&path, &rendered)?;

        let entry = doc.index_entry(&relative);
        let mut index = self.index.write().await;
        let previous_entry = index.insert(doc.id.clone(), entry);

        if let Err(e) = self.persist_index(&index) {
            // 索引写失败：恢复文件和内存索引到写前状态
            match &previous {
                Some(bytes) => {
                    if let Err(restore_err) = self.write_atomic(&path, bytes) {
                        tracing::error!(
                            "Rollback of {} failed: {}",
                            path.display(),
                            restore_err
                        );
                    }
                }
                None => {
                    if let Err(remove_err) = std::fs::remove_file(&path) {
                        tracing::error!(
                            "Rollback removal of {} failed: {}",
                            path.display(),
                            remove_err
                        );
                    }
                }
            }
            match previous_entry {
                Some(old) => {
                    index.insert(doc.id.clone(), old);
                }
                None => {
                    index.remove(&doc.id);
                }
            }
            return Err(e);
        }

        tracing::info!("Saved blog entry {} -> {}", doc.id, path.display());
        Ok(())
    }

    /// Loads a document by id, verifying its content hash.
    pub async fn get(&self, id: &str) -> Result<BlogDocument> {
        let entry = {
            let index = self.index.read().await;
            index
                .get(id)
                .cloned()
                .ok_or_else(|| BloggerError::Storage(StorageError::NotFound(id.to_string())))?
        };

        let path = self.absolute_path(&entry.path);
        let content = std::fs::read_to_string(&path)
            .map_err(|_| BloggerError::Storage(StorageError::NotFound(id.to_string())))?;

        let doc = BlogDocument::parse(id, &content)?;

        let actual = doc.content_hash();
        if actual != entry.content_hash {
            return Err(BloggerError::Storage(StorageError::HashMismatch {
                id: id.to_string(),
                expected: entry.content_hash,
                actual,
            }));
        }

        Ok(doc)
    }

    /// Index entries, newest first, optionally filtered by repository.
    pub async fn list(&self, repository: Option<&str>, limit: Option<usize>) -> Vec<IndexEntry> {
        let index = self.index.read().await;
        let mut entries: Vec<IndexEntry> = index
            .values()
            .filter(|e| repository.is_none_or(|r| e.repository == r))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = limit {
            entries.truncate(limit);
        }
        entries
    }

    /// Case-insensitive search over title, tags, and (lazily) body.
    ///
    /// The index alone answers title/tag matches; the file is only read when
    /// those fail. Results come back newest first.
    pub async fn search(&self, query: &str, filter: &SearchFilter) -> Vec<IndexEntry> {
        let query = query.trim().to_lowercase();
        let index = self.index.read().await;

        let mut results: Vec<IndexEntry> = Vec::new();
        for entry in index.values() {
            if let Some(ref repo) = filter.repository
                && entry.repository != *repo
            {
                continue;
            }
            if !filter.tags.is_empty()
                && !filter.tags.iter().all(|t| {
                    entry
                        .tags
                        .iter()
                        .any(|et| et.eq_ignore_ascii_case(t))
                })
            {
                continue;
            }
            if let Some(from) = filter.date_from
                && entry.created_at < from
            {
                continue;
            }
            if let Some(to) = filter.date_to
                && entry.created_at > to
            {
                continue;
            }

            if query.is_empty() || self.matches_query(entry, &query) {
                results.push(entry.clone());
            }
        }

        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        results
    }

    fn matches_query(&self, entry: &IndexEntry, query_lower: &str) -> bool {
        if entry.title.to_lowercase().contains(query_lower) {
            return true;
        }
        if entry
            .tags
            .iter()
            .any(|t| t.to_lowercase().contains(query_lower))
        {
            return true;
        }
        // 标题和标签都不中才读正文
        let path = self.absolute_path(&entry.path);
        match std::fs::read_to_string(&path) {
            Ok(content) => content.to_lowercase().contains(query_lower),
            Err(e) => {
                tracing::warn!("Cannot read {} during search: {}", path.display(), e);
                false
            }
        }
    }

    /// Exports the named documents in the given order.
    pub async fn export(&self, ids: &[String], format: ExportFormat) -> Result<String> {
        let mut docs = Vec::with_capacity(ids.len());
        for id in ids {
            docs.push(self.get(id).await?);
        }

        match format {
            ExportFormat::Json => Ok(serde_json::to_string_pretty(&docs)?),
            ExportFormat::CombinedMarkdown => {
                let mut out = format!(
                    "# Blog Export\n\nExported on: {}\nTotal entries: {}",
                    Utc::now().format("%Y-%m-%d %H:%M:%S"),
                    docs.len()
                );
                for doc in &docs {
                    out.push_str(EXPORT_SEPARATOR);
                    out.push_str(&doc.render()?);
                }
                out.push('\n');
                Ok(out)
            }
        }
    }

    /// Removes a document's file and index entry together.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let lock = self.write_lock_for(id);
        let _guard = lock.lock().await;

        let mut index = self.index.write().await;
        let entry = index
            .remove(id)
            .ok_or_else(|| BloggerError::Storage(StorageError::NotFound(id.to_string())))?;

        let path = self.absolute_path(&entry.path);
        if path.exists()
            && let Err(e) = std::fs::remove_file(&path)
        {
            // 文件删不掉就把索引条目放回去，保持 1:1
            index.insert(id.to_string(), entry);
            return Err(BloggerError::Storage(StorageError::WriteFailed {
                path: path.display().to_string(),
                message: format!("cannot delete: {}", e),
            }));
        }

        if let Err(e) = self.persist_index(&index) {
            return Err(e);
        }

        tracing::info!("Deleted blog entry {}", id);
        Ok(())
    }

    /// Deletes all entries created before `cutoff`. Returns deleted ids.
    pub async fn prune(&self, cutoff: DateTime<Utc>) -> Result<Vec<String>> {
        let stale: Vec<String> = {
            let index = self.index.read().await;
            index
                .values()
                .filter(|e| e.created_at < cutoff)
                .map(|e| e.id.clone())
                .collect()
        };

        let mut deleted = Vec::new();
        for id in stale {
            match self.delete(&id).await {
                Ok(()) => deleted.push(id),
                Err(e) => tracing::warn!("Prune could not delete {}: {}", id, e),
            }
        }
        Ok(deleted)
    }

    /// 扫描磁盘上的所有 .md 文件（索引文件本身除外）
    fn scan_files(&self) -> Result<Vec<String>> {
        let mut files = Vec::new();
        if !self.root.exists() {
            return Ok(files);
        }
        for dir_entry in std::fs::read_dir(&self.root)? {
            let dir_entry = dir_entry?;
            let path = dir_entry.path();
            if path.is_dir() {
                for file in std::fs::read_dir(&path)? {
                    let file = file?.path();
                    if file.extension().is_some_and(|e| e == "md")
                        && let Ok(rel) = file.strip_prefix(&self.root)
                    {
                        files.push(rel.to_string_lossy().replace('\\', "/"));
                    }
                }
            }
        }
        Ok(files)
    }

    /// Read-only consistency scan between index and files.
    pub async fn validate(&self) -> Result<ValidationReport> {
        let index = self.index.read().await;
        let mut report = ValidationReport::default();

        let on_disk = self.scan_files()?;

        for entry in index.values() {
            let path = self.absolute_path(&entry.path);
            if !path.exists() {
                report.orphan_index_entries.push(entry.id.clone());
                continue;
            }
            match std::fs::read_to_string(&path) {
                Ok(content) => match BlogDocument::parse(&entry.id, &content) {
                    Ok(doc) => {
                        if doc.content_hash() != entry.content_hash {
                            report.hash_mismatches.push(entry.id.clone());
                        }
                    }
                    Err(_) => report.hash_mismatches.push(entry.id.clone()),
                },
                Err(_) => report.orphan_index_entries.push(entry.id.clone()),
            }
        }

        let indexed_paths: std::collections::HashSet<&str> =
            index.values().map(|e| e.path.as_str()).collect();
        for file in on_disk {
            if !indexed_paths.contains(file.as_str()) {
                report.orphan_files.push(file);
            }
        }

        Ok(report)
    }

    /// Resolves drift found by [`validate`](Self::validate).
    ///
    /// Orphan index entries are dropped; orphan files are re-indexed from
    /// their frontmatter (falling back to filename and mtime when the
    /// frontmatter is unreadable); hash mismatches are only reported back,
    /// deciding which side wins is up to the operator.
    pub async fn repair(&self) -> Result<RepairReport> {
        let validation = self.validate().await?;
        let mut report = RepairReport {
            flagged_hash_mismatches: validation.hash_mismatches,
            ..Default::default()
        };

        let mut index = self.index.write().await;

        for id in validation.orphan_index_entries {
            index.remove(&id);
            report.removed_index_entries.push(id);
        }

        for relative in validation.orphan_files {
            let path = self.absolute_path(&relative);
            let id = Path::new(&relative)
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| relative.clone());

            match std::fs::read_to_string(&path) {
                Ok(content) => match BlogDocument::parse(&id, &content) {
                    Ok(doc) => {
                        index.insert(id.clone(), doc.index_entry(&relative));
                        report.reindexed_files.push(relative);
                    }
                    Err(_) => match self.recover_entry_from_file(&id, &relative, &path) {
                        Ok(entry) => {
                            index.insert(id.clone(), entry);
                            report.reindexed_files.push(relative);
                        }
                        Err(e) => report
                            .errors
                            .push(format!("cannot re-index {}: {}", relative, e)),
                    },
                },
                Err(e) => report
                    .errors
                    .push(format!("cannot read {}: {}", relative, e)),
            }
        }

        self.persist_index(&index)?;
        Ok(report)
    }

    /// frontmatter 解析失败的孤儿文件：用文件名和 mtime 兜底建条目
    fn recover_entry_from_file(
        &self,
        id: &str,
        relative: &str,
        path: &Path,
    ) -> Result<IndexEntry> {
        let content = std::fs::read_to_string(path)?;
        let mtime: DateTime<Utc> = std::fs::metadata(path)?
            .modified()
            .map(DateTime::from)
            .unwrap_or_else(|_| Utc::now());
        let repository = Path::new(relative)
            .parent()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default();

        Ok(IndexEntry {
            id: id.to_string(),
            title: id.to_string(),
            repository,
            tags: Vec::new(),
            created_at: mtime,
            updated_at: mtime,
            provider: "unknown".to_string(),
            path: relative.to_string(),
            content_hash: super::document::hash_content(&content),
        })
    }

    /// Aggregate counts and sizes for the whole store.
    pub async fn stats(&self) -> StorageStats {
        let index = self.index.read().await;
        let mut repositories: BTreeMap<String, usize> = BTreeMap::new();
        let mut providers: BTreeMap<String, usize> = BTreeMap::new();
        let mut total_size_bytes = 0u64;

        for entry in index.values() {
            *repositories.entry(entry.repository.clone()).or_default() += 1;
            *providers.entry(entry.provider.clone()).or_default() += 1;
            let path = self.absolute_path(&entry.path);
            if let Ok(meta) = std::fs::metadata(&path) {
                total_size_bytes += meta.len();
            }
        }

        StorageStats {
            total_entries: index.len(),
            total_size_bytes,
            repositories,
            providers,
            storage_path: self.root.display().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blog::document::{Frontmatter, make_id};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn sample_doc(repository: &str, minute: u32, body: &str) -> BlogDocument {
        let ts = Utc.with_ymd_and_hms(2026, 3, 14, 9, minute, 0).unwrap();
        BlogDocument {
            id: make_id(ts, repository),
            meta: Frontmatter {
                title: format!("Update {}", minute),
                repository: repository.to_string(),
                tags: vec!["rust".to_string()],
                created_at: ts,
                updated_at: ts,
                provider: "openai".to_string(),
                model: "gpt-4o-mini".to_string(),
                source_commits: vec!["abc".to_string()],
                word_count: 3,
            },
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn test_save_get_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = BlogStorage::open(dir.path()).unwrap();

        let doc = sample_doc("owner/repo", 1, "Hello world.\n");
        storage.save(&doc).await.unwrap();

        let loaded = storage.get(&doc.id).await.unwrap();
        assert_eq!(loaded.body, doc.body);
        assert_eq!(loaded.meta.repository, "owner/repo");
    }

    #[tokio::test]
    async fn test_get_unknown_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let storage = BlogStorage::open(dir.path()).unwrap();

        let err = storage.get("nope").await.unwrap_err();
        assert!(matches!(
            err,
            BloggerError::Storage(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_removes_file_and_index() {
        let dir = tempfile::tempdir().unwrap();
        let storage = BlogStorage::open(dir.path()).unwrap();

        let doc = sample_doc("owner/repo", 2, "Bye.\n");
        storage.save(&doc).await.unwrap();
        storage.delete(&doc.id).await.unwrap();

        assert!(matches!(
            storage.get(&doc.id).await.unwrap_err(),
            BloggerError::Storage(StorageError::NotFound(_))
        ));
        let report = storage.validate().await.unwrap();
        assert!(report.is_clean(), "drift after delete: {:?}", report);
    }

    #[tokio::test]
    async fn test_list_newest_first_with_limit() {
        let dir = tempfile::tempdir().unwrap();
        let storage = BlogStorage::open(dir.path()).unwrap();

        for minute in [5, 15, 10] {
            storage
                .save(&sample_doc("owner/repo", minute, "Body.\n"))
                .await
                .unwrap();
        }

        let all = storage.list(None, None).await;
        let minutes: Vec<u32> = all
            .iter()
            .map(|e| e.created_at.format("%M").to_string().parse().unwrap())
            .collect();
        assert_eq!(minutes, vec![15, 10, 5]);

        let limited = storage.list(None, Some(2)).await;
        assert_eq!(limited.len(), 2);
    }

    #[tokio::test]
    async fn test_search_lazy_body_and_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let storage = BlogStorage::open(dir.path()).unwrap();

        storage
            .save(&sample_doc("owner/repo", 1, "We refactored the PARSER today.\n"))
            .await
            .unwrap();
        storage
            .save(&sample_doc("owner/other", 2, "Unrelated content.\n"))
            .await
            .unwrap();

        let hits = storage.search("parser", &SearchFilter::default()).await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].repository, "owner/repo");

        let filtered = storage
            .search(
                "",
                &SearchFilter {
                    repository: Some("owner/other".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert_eq!(filtered.len(), 1);
    }

    #[tokio::test]
    async fn test_index_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let doc = sample_doc("owner/repo", 3, "Persistent.\n");
        {
            let storage = BlogStorage::open(dir.path()).unwrap();
            storage.save(&doc).await.unwrap();
        }

        let reopened = BlogStorage::open(dir.path()).unwrap();
        let loaded = reopened.get(&doc.id).await.unwrap();
        assert_eq!(loaded.body, "Persistent.\n");
    }

    #[tokio::test]
    async fn test_hash_mismatch_detected_on_get() {
        let dir = tempfile::tempdir().unwrap();
        let storage = BlogStorage::open(dir.path()).unwrap();

        let doc = sample_doc("owner/repo", 4, "Original.\n");
        storage.save(&doc).await.unwrap();

        // 绕过存储层直接改文件，模拟外部篡改
        let path = dir
            .path()
            .join("owner_repo")
            .join(format!("{}.md", doc.id));
        let mut tampered = sample_doc("owner/repo", 4, "Tampered.\n");
        tampered.id = doc.id.clone();
        std::fs::write(&path, tampered.render().unwrap()).unwrap();

        let err = storage.get(&doc.id).await.unwrap_err();
        assert!(matches!(
            err,
            BloggerError::Storage(StorageError::HashMismatch { .. })
        ));

        let report = storage.validate().await.unwrap();
        assert_eq!(report.hash_mismatches, vec![doc.id.clone()]);
    }

    #[tokio::test]
    async fn test_validate_and_repair_orphans() {
        let dir = tempfile::tempdir().unwrap();
        let storage = BlogStorage::open(dir.path()).unwrap();

        let kept = sample_doc("owner/repo", 5, "Kept.\n");
        let lost = sample_doc("owner/repo", 6, "Lost.\n");
        storage.save(&kept).await.unwrap();
        storage.save(&lost).await.unwrap();

        // 文件丢失 -> 孤儿索引条目
        std::fs::remove_file(
            dir.path()
                .join("owner_repo")
                .join(format!("{}.md", lost.id)),
        )
        .unwrap();

        // 未入索引的文件 -> 孤儿文件
        let stray = sample_doc("owner/repo", 7, "Stray.\n");
        std::fs::write(
            dir.path()
                .join("owner_repo")
                .join(format!("{}.md", stray.id)),
            stray.render().unwrap(),
        )
        .unwrap();

        let report = storage.validate().await.unwrap();
        assert_eq!(report.orphan_index_entries, vec![lost.id.clone()]);
        assert_eq!(report.orphan_files.len(), 1);

        let repair = storage.repair().await.unwrap();
        assert_eq!(repair.removed_index_entries, vec![lost.id.clone()]);
        assert_eq!(repair.reindexed_files.len(), 1);

        let after = storage.validate().await.unwrap();
        assert!(after.is_clean(), "drift after repair: {:?}", after);
        assert!(storage.get(&stray.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_export_combined_markdown_order_and_separator() {
        let dir = tempfile::tempdir().unwrap();
        let storage = BlogStorage::open(dir.path()).unwrap();

        let a = sample_doc("owner/repo", 8, "First body.\n");
        let b = sample_doc("owner/repo", 9, "Second body.\n");
        storage.save(&a).await.unwrap();
        storage.save(&b).await.unwrap();

        // 导出顺序由调用方给定，与创建时间无关
        let ids = vec![b.id.clone(), a.id.clone()];
        let out = storage
            .export(&ids, ExportFormat::CombinedMarkdown)
            .await
            .unwrap();

        assert!(out.starts_with("# Blog Export"));
        assert!(out.contains(EXPORT_SEPARATOR));
        let pos_b = out.find("Second body.").unwrap();
        let pos_a = out.find("First body.").unwrap();
        assert!(pos_b < pos_a);
    }

    #[tokio::test]
    async fn test_export_json_is_full_documents() {
        let dir = tempfile::tempdir().unwrap();
        let storage = BlogStorage::open(dir.path()).unwrap();

        let doc = sample_doc("owner/repo", 10, "Json body.\n");
        storage.save(&doc).await.unwrap();

        let out = storage
            .export(&[doc.id.clone()], ExportFormat::Json)
            .await
            .unwrap();
        let parsed: Vec<BlogDocument> = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].body, "Json body.\n");
    }

    #[tokio::test]
    async fn test_prune_deletes_only_old_entries() {
        let dir = tempfile::tempdir().unwrap();
        let storage = BlogStorage::open(dir.path()).unwrap();

        let old = sample_doc("owner/repo", 11, "Old.\n");
        let newer = sample_doc("owner/repo", 30, "New.\n");
        storage.save(&old).await.unwrap();
        storage.save(&newer).await.unwrap();

        let cutoff = Utc.with_ymd_and_hms(2026, 3, 14, 9, 20, 0).unwrap();
        let deleted = storage.prune(cutoff).await.unwrap();
        assert_eq!(deleted, vec![old.id.clone()]);
        assert!(storage.get(&newer.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_stats_counts() {
        let dir = tempfile::tempdir().unwrap();
        let storage = BlogStorage::open(dir.path()).unwrap();

        storage
            .save(&sample_doc("owner/repo", 12, "A.\n"))
            .await
            .unwrap();
        storage
            .save(&sample_doc("owner/other", 13, "B.\n"))
            .await
            .unwrap();

        let stats = storage.stats().await;
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.repositories.len(), 2);
        assert_eq!(stats.providers.get("openai"), Some(&2));
        assert!(stats.total_size_bytes > 0);
    }

    #[tokio::test]
    async fn test_concurrent_saves_different_ids() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(BlogStorage::open(dir.path()).unwrap());

        let mut handles = Vec::new();
        for minute in 20..28 {
            let storage = storage.clone();
            handles.push(tokio::spawn(async move {
                storage
                    .save(&sample_doc("owner/repo", minute, "Concurrent.\n"))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let report = storage.validate().await.unwrap();
        assert!(report.is_clean());
        assert_eq!(storage.list(None, None).await.len(), 8);
    }
}
