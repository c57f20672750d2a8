//! 存储引擎一致性集成测试
//!
//! 覆盖：
//! - 保存/读取/删除全流程无索引漂移
//! - 重新打开后索引与文件一致
//! - 索引写入失败时文件写入回滚（文件与索引永不分叉）

use chrono::{TimeZone, Utc};
use devblogger_rs::blog::document::make_id;
use devblogger_rs::blog::{BlogDocument, BlogStorage, Frontmatter};
use devblogger_rs::error::{BloggerError, StorageError};

fn doc(repository: &str, minute: u32, body: &str) -> BlogDocument {
    let ts = Utc.with_ymd_and_hms(2026, 3, 14, 10, minute, 0).unwrap();
    BlogDocument {
        id: make_id(ts, repository),
        meta: Frontmatter {
            title: format!("Entry {}", minute),
            repository: repository.to_string(),
            tags: vec![],
            created_at: ts,
            updated_at: ts,
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            source_commits: vec![],
            word_count: 2,
        },
        body: body.to_string(),
    }
}

#[tokio::test]
async fn test_full_lifecycle_stays_consistent() {
    let dir = tempfile::tempdir().unwrap();
    let storage = BlogStorage::open(dir.path()).unwrap();

    let first = doc("owner/repo", 1, "First article.\n");
    let second = doc("owner/repo", 2, "Second article.\n");
    storage.save(&first).await.unwrap();
    storage.save(&second).await.unwrap();

    assert!(storage.validate().await.unwrap().is_clean());

    // 覆盖保存（编辑路径）
    let mut edited = storage.get(&first.id).await.unwrap();
    edited.body = "First article, revised.\n".to_string();
    storage.save(&edited).await.unwrap();

    let reloaded = storage.get(&first.id).await.unwrap();
    assert_eq!(reloaded.body, "First article, revised.\n");

    storage.delete(&second.id).await.unwrap();
    assert!(storage.validate().await.unwrap().is_clean());
    assert_eq!(storage.list(None, None).await.len(), 1);
}

#[tokio::test]
async fn test_reopen_preserves_entries() {
    let dir = tempfile::tempdir().unwrap();
    let entry = doc("owner/repo", 3, "Survives reopen.\n");
    {
        let storage = BlogStorage::open(dir.path()).unwrap();
        storage.save(&entry).await.unwrap();
    }

    let storage = BlogStorage::open(dir.path()).unwrap();
    let loaded = storage.get(&entry.id).await.unwrap();
    assert_eq!(loaded.body, "Survives reopen.\n");
    assert!(storage.validate().await.unwrap().is_clean());
}

#[tokio::test]
async fn test_corrupt_index_file_is_rejected_on_open() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".blog_index.json"), "{ not json").unwrap();

    match BlogStorage::open(dir.path()) {
        Ok(_) => panic!("corrupt index must be rejected"),
        Err(err) => assert!(matches!(
            err,
            BloggerError::Storage(StorageError::IndexCorrupt(_))
        )),
    }
}

/// 索引写入失败时，文件写入必须回滚。
///
/// 把索引路径换成同名目录让 rename 失败，模拟索引落盘故障。
#[cfg(unix)]
#[tokio::test]
async fn test_index_write_failure_rolls_back_file() {
    let dir = tempfile::tempdir().unwrap();
    let storage = BlogStorage::open(dir.path()).unwrap();

    let existing = doc("owner/repo", 4, "Existing.\n");
    storage.save(&existing).await.unwrap();

    // 用目录占住索引路径，后续 rename 必然失败
    let index_path = dir.path().join(".blog_index.json");
    std::fs::remove_file(&index_path).unwrap();
    std::fs::create_dir(&index_path).unwrap();

    let incoming = doc("owner/repo", 5, "Never lands.\n");
    let err = storage.save(&incoming).await.unwrap_err();
    assert!(matches!(
        err,
        BloggerError::Storage(StorageError::IndexCorrupt(_))
    ));

    // 文件写入已回滚，索引和磁盘保持一致
    let file_path = dir
        .path()
        .join("owner_repo")
        .join(format!("{}.md", incoming.id));
    assert!(!file_path.exists(), "rolled-back file should not exist");
    assert!(matches!(
        storage.get(&incoming.id).await.unwrap_err(),
        BloggerError::Storage(StorageError::NotFound(_))
    ));

    // 索引路径恢复后，原有条目依然可读
    std::fs::remove_dir(&index_path).unwrap();
    assert!(storage.get(&existing.id).await.is_ok());
}
