//! 生成流水线集成测试
//!
//! 用 mockito 模拟 provider HTTP 端点，跑通
//! 提交记录 -> 提示词 -> provider -> 规范化 -> 落盘 的完整链路。

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use devblogger_rs::blog::{BlogGenerator, BlogStorage, GenerationRequest};
use devblogger_rs::commit::{Commit, CommitAuthor, DiffStat};
use devblogger_rs::config::{AppConfig, ProviderConfig};
use devblogger_rs::error::BloggerError;
use devblogger_rs::llm::{GenerateOptions, ProviderManager};

fn sample_commit(sha: &str, message: &str) -> Commit {
    Commit {
        sha: sha.to_string(),
        message: message.to_string(),
        author: CommitAuthor {
            name: Some("Alice".to_string()),
            email: None,
            login: None,
        },
        timestamp: Some(Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap()),
        files: vec![],
        stats: DiffStat::default(),
        html_url: None,
    }
}

fn openai_config(endpoint: &str) -> ProviderConfig {
    ProviderConfig {
        endpoint: Some(endpoint.to_string()),
        api_key: Some("sk-test".to_string()),
        model: "gpt-4o-mini".to_string(),
        ..Default::default()
    }
}

fn app_config(providers: HashMap<String, ProviderConfig>, fallbacks: Vec<String>) -> AppConfig {
    let mut config = AppConfig::default();
    config.llm.active_provider = "openai".to_string();
    config.llm.fallback_providers = fallbacks;
    config.llm.providers = providers;
    config.network.max_retries = 1;
    config.network.retry_delay_ms = 1;
    config.network.max_retry_delay_ms = 5;
    config
}

fn build_stack(config: &AppConfig, dir: &std::path::Path) -> (Arc<BlogStorage>, BlogGenerator) {
    let manager = Arc::new(ProviderManager::from_config(config).unwrap());
    let storage = Arc::new(BlogStorage::open(dir).unwrap());
    let generator = BlogGenerator::new(manager, storage.clone(), None);
    (storage, generator)
}

fn request(commits: Vec<Commit>) -> GenerationRequest {
    GenerationRequest {
        repository: "owner/repo".to_string(),
        commits,
        prompt_template: None,
        provider: None,
        tags: vec!["weekly".to_string()],
        options: GenerateOptions::default(),
    }
}

#[tokio::test]
async fn test_generate_persists_normalized_article() {
    let mut server = mockito::Server::new_async().await;
    let body = serde_json::json!({
        "choices": [{"message": {"content":
            "```markdown\n# A Big Week\n\nWe shipped the parser.\n\n\n\nAnd fixed bugs.\n```"
        }}],
        "model": "gpt-4o-mini",
        "usage": {"total_tokens": 99}
    });
    // 提示词里仓库名在头部、提交数据在块中
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_body(mockito::Matcher::AllOf(vec![
            mockito::Matcher::Regex("Repository: owner/repo".to_string()),
            mockito::Matcher::Regex("feat: parser rewrite".to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .expect(1)
        .create_async()
        .await;

    let mut providers = HashMap::new();
    providers.insert("openai".to_string(), openai_config(&server.url()));
    let config = app_config(providers, vec![]);

    let dir = tempfile::tempdir().unwrap();
    let (storage, generator) = build_stack(&config, dir.path());

    let commits = vec![sample_commit("0123456789abcdef", "feat: parser rewrite")];
    let doc = generator.generate(&request(commits), None, None).await.unwrap();

    mock.assert_async().await;

    // 围栏去除、空行压缩、标题来自首个标题行
    assert_eq!(doc.meta.title, "A Big Week");
    assert!(!doc.body.contains("```"));
    assert!(!doc.body.contains("\n\n\n"));

    // 提交引用附录
    assert!(doc.body.contains("## Commit Details"));
    assert!(doc.body.contains("**01234567** by Alice"));

    // 元数据与索引
    assert_eq!(doc.meta.provider, "openai");
    assert_eq!(doc.meta.source_commits, vec!["0123456789abcdef".to_string()]);
    assert_eq!(doc.meta.tags, vec!["weekly".to_string()]);
    assert!(doc.meta.word_count > 0);

    let stored = storage.get(&doc.id).await.unwrap();
    assert_eq!(stored.body, doc.body);
    assert!(storage.validate().await.unwrap().is_clean());
}

#[tokio::test]
async fn test_empty_selection_never_calls_provider() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .expect(0)
        .create_async()
        .await;

    let mut providers = HashMap::new();
    providers.insert("openai".to_string(), openai_config(&server.url()));
    let config = app_config(providers, vec![]);

    let dir = tempfile::tempdir().unwrap();
    let (storage, generator) = build_stack(&config, dir.path());

    let err = generator.generate(&request(vec![]), None, None).await.unwrap_err();
    assert!(matches!(err, BloggerError::EmptySelection));

    mock.assert_async().await;
    assert!(storage.list(None, None).await.is_empty());
}

#[tokio::test]
async fn test_fallback_provider_completes_generation() {
    // 主 provider 持续 5xx，fallback 的 ollama 成功
    let mut failing = mockito::Server::new_async().await;
    let failing_mock = failing
        .mock("POST", "/v1/chat/completions")
        .with_status(503)
        .with_body("overloaded")
        .expect(2) // max_retries = 1 -> 两次调用
        .create_async()
        .await;

    let mut backup = mockito::Server::new_async().await;
    let backup_mock = backup
        .mock("POST", "/api/generate")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            serde_json::json!({
                "response": "# Fallback Article\n\nStill got written.",
                "model": "llama3.2",
                "eval_count": 20,
                "prompt_eval_count": 10
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let mut providers = HashMap::new();
    providers.insert("openai".to_string(), openai_config(&failing.url()));
    providers.insert(
        "ollama".to_string(),
        ProviderConfig {
            endpoint: Some(backup.url()),
            model: "llama3.2".to_string(),
            ..Default::default()
        },
    );
    let config = app_config(providers, vec!["ollama".to_string()]);

    let dir = tempfile::tempdir().unwrap();
    let (storage, generator) = build_stack(&config, dir.path());

    let commits = vec![sample_commit("abcdef0123456789", "fix: retry budget")];
    let doc = generator.generate(&request(commits), None, None).await.unwrap();

    failing_mock.assert_async().await;
    backup_mock.assert_async().await;

    assert_eq!(doc.meta.provider, "ollama");
    assert_eq!(doc.meta.title, "Fallback Article");
    assert!(storage.get(&doc.id).await.is_ok());
}

#[tokio::test]
async fn test_regenerate_keeps_identity() {
    let mut server = mockito::Server::new_async().await;
    let make_body = |title: &str| {
        serde_json::json!({
            "choices": [{"message": {"content": format!("# {}\n\nBody text.", title)}}],
            "model": "gpt-4o-mini"
        })
        .to_string()
    };
    let first = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(make_body("Original Title"))
        .expect(1)
        .create_async()
        .await;

    let mut providers = HashMap::new();
    providers.insert("openai".to_string(), openai_config(&server.url()));
    let config = app_config(providers, vec![]);

    let dir = tempfile::tempdir().unwrap();
    let (storage, generator) = build_stack(&config, dir.path());

    let commits = vec![sample_commit("0123456789abcdef", "feat: first pass")];
    let doc = generator.generate(&request(commits.clone()), None, None).await.unwrap();
    first.assert_async().await;

    let second = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(make_body("Rewritten Title"))
        .expect(1)
        .create_async()
        .await;

    let redone = generator
        .regenerate(&doc.id, &request(commits), None, None)
        .await
        .unwrap();
    second.assert_async().await;

    assert_eq!(redone.id, doc.id);
    assert_eq!(redone.meta.created_at, doc.meta.created_at);
    assert!(redone.meta.updated_at >= doc.meta.updated_at);
    assert_eq!(redone.meta.title, "Rewritten Title");

    // 仍然只有一个条目
    assert_eq!(storage.list(None, None).await.len(), 1);
}
