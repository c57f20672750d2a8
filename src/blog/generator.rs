//! 生成引擎：提交记录 -> 提示词 -> AI -> 规范化 -> 落盘
//!
//! 流水线阶段固定为 Pending → Prompting → AwaitingProvider → Normalizing →
//! {Persisted | Failed}；阶段切换之间检查取消令牌，AwaitingProvider 期间
//! 不持有任何存储锁。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;

use crate::commit::Commit;
use crate::error::{BloggerError, Result};
use crate::llm::prompt::{DEFAULT_BLOG_PROMPT, build_blog_prompt, format_timestamp};
use crate::llm::{GenerateOptions, ProgressReporter, ProviderManager};

use super::document::{BlogDocument, Frontmatter, count_words, make_id};
use super::storage::BlogStorage;

/// Pipeline phase, mostly for progress text and debug logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationPhase {
    Pending,
    Prompting,
    AwaitingProvider,
    Normalizing,
    Persisted,
    Failed,
}

impl GenerationPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationPhase::Pending => "pending",
            GenerationPhase::Prompting => "prompting",
            GenerationPhase::AwaitingProvider => "awaiting provider",
            GenerationPhase::Normalizing => "normalizing",
            GenerationPhase::Persisted => "persisted",
            GenerationPhase::Failed => "failed",
        }
    }
}

/// Cooperative cancellation flag, checked between pipeline phases.
///
/// Cancelling does not abort an in-flight provider call; its response is
/// discarded once the phase boundary is reached.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Everything one generation run needs.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// `owner/name` of the repository the commits came from.
    pub repository: String,
    /// Already filtered and ordered (newest first) commit selection.
    pub commits: Vec<Commit>,
    /// Overrides the configured prompt template for this run only.
    pub prompt_template: Option<String>,
    /// Pin a specific provider; disables automatic fallback.
    pub provider: Option<String>,
    pub tags: Vec<String>,
    pub options: GenerateOptions,
}

/// Drives commit records through prompting, the provider manager,
/// normalization and persistence.
pub struct BlogGenerator {
    manager: Arc<ProviderManager>,
    storage: Arc<BlogStorage>,
    default_prompt: Option<String>,
}

impl BlogGenerator {
    pub fn new(
        manager: Arc<ProviderManager>,
        storage: Arc<BlogStorage>,
        default_prompt: Option<String>,
    ) -> Self {
        Self {
            manager,
            storage,
            default_prompt,
        }
    }

    fn prompt_template<'a>(&'a self, request: &'a GenerationRequest) -> &'a str {
        request
            .prompt_template
            .as_deref()
            .or(self.default_prompt.as_deref())
            .unwrap_or(DEFAULT_BLOG_PROMPT)
    }

    fn check_cancelled(cancel: Option<&CancelToken>) -> Result<()> {
        if cancel.is_some_and(|c| c.is_cancelled()) {
            return Err(BloggerError::Cancelled);
        }
        Ok(())
    }

    /// Runs the full pipeline and returns the persisted document.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        progress: Option<&dyn ProgressReporter>,
        cancel: Option<&CancelToken>,
    ) -> Result<BlogDocument> {
        self.run(request, None, progress, cancel).await
    }

    /// Re-runs the pipeline for an existing entry.
    ///
    /// The id, repository and created_at of the stored entry are kept;
    /// updated_at is bumped and the content hash recomputed.
    pub async fn regenerate(
        &self,
        id: &str,
        request: &GenerationRequest,
        progress: Option<&dyn ProgressReporter>,
        cancel: Option<&CancelToken>,
    ) -> Result<BlogDocument> {
        let existing = self.storage.get(id).await?;
        let mut request = request.clone();
        request.repository = existing.meta.repository.clone();
        self.run(&request, Some(existing), progress, cancel).await
    }

    async fn run(
        &self,
        request: &GenerationRequest,
        existing: Option<BlogDocument>,
        progress: Option<&dyn ProgressReporter>,
        cancel: Option<&CancelToken>,
    ) -> Result<BlogDocument> {
        let mut phase = GenerationPhase::Pending;
        tracing::debug!("Generation phase: {}", phase.as_str());

        // Prompting
        phase = GenerationPhase::Prompting;
        tracing::debug!("Generation phase: {}", phase.as_str());
        Self::check_cancelled(cancel)?;
        if request.commits.is_empty() {
            return Err(BloggerError::EmptySelection);
        }
        let prompt = build_blog_prompt(
            self.prompt_template(request),
            &request.commits,
            &request.repository,
        );

        // AwaitingProvider
        phase = GenerationPhase::AwaitingProvider;
        tracing::debug!("Generation phase: {}", phase.as_str());
        Self::check_cancelled(cancel)?;
        let response = self
            .manager
            .generate(
                &prompt,
                &request.options,
                request.provider.as_deref(),
                progress,
            )
            .await
            .inspect_err(|_| {
                tracing::debug!("Generation phase: {}", GenerationPhase::Failed.as_str());
            })?;

        // Normalizing
        phase = GenerationPhase::Normalizing;
        tracing::debug!("Generation phase: {}", phase.as_str());
        Self::check_cancelled(cancel)?;
        let normalized = normalize_article(&response.text);
        if normalized.is_empty() {
            return Err(BloggerError::EmptyOutput);
        }
        let title = derive_title(&normalized, &request.repository);
        let body = append_commit_details(&normalized, &request.commits);

        let now = Utc::now();
        let doc = match existing {
            Some(prev) => BlogDocument {
                id: prev.id,
                meta: Frontmatter {
                    title,
                    repository: prev.meta.repository,
                    tags: if request.tags.is_empty() {
                        prev.meta.tags
                    } else {
                        request.tags.clone()
                    },
                    created_at: prev.meta.created_at,
                    updated_at: now,
                    provider: response.provider.clone(),
                    model: response.model.clone(),
                    source_commits: request.commits.iter().map(|c| c.sha.clone()).collect(),
                    word_count: count_words(&body),
                },
                body,
            },
            None => BlogDocument {
                id: make_id(now, &request.repository),
                meta: Frontmatter {
                    title,
                    repository: request.repository.clone(),
                    tags: request.tags.clone(),
                    created_at: now,
                    updated_at: now,
                    provider: response.provider.clone(),
                    model: response.model.clone(),
                    source_commits: request.commits.iter().map(|c| c.sha.clone()).collect(),
                    word_count: count_words(&body),
                },
                body,
            },
        };

        // Persisted
        self.storage.save(&doc).await?;
        phase = GenerationPhase::Persisted;
        tracing::debug!("Generation phase: {} ({})", phase.as_str(), doc.id);
        Ok(doc)
    }
}

/// Strips a full-response code fence and collapses excess blank lines.
///
/// Some models wrap the whole article in ```markdown fences; unwrap only
/// when the fence spans the entire response.
pub fn normalize_article(raw: &str) -> String {
    let mut text = raw.trim().to_string();

    if text.starts_with("```") && text.ends_with("```") && text.len() > 6 {
        let without_close = &text[..text.len() - 3];
        if let Some(first_newline) = without_close.find('\n') {
            let fence_line = &without_close[..first_newline];
            // 开栏只允许 ``` 加可选语言标记
            if fence_line.trim_start_matches('`').trim().len() <= 16
                && !fence_line.trim_start_matches('`').contains(' ')
            {
                text = without_close[first_newline + 1..].trim().to_string();
            }
        }
    }

    // 3 个以上连续换行压成 2 个
    let mut collapsed = String::with_capacity(text.len());
    let mut newline_run = 0usize;
    for ch in text.chars() {
        if ch == '\n' {
            newline_run += 1;
            if newline_run <= 2 {
                collapsed.push(ch);
            }
        } else {
            newline_run = 0;
            collapsed.push(ch);
        }
    }

    collapsed.trim().to_string()
}

/// First `# ` heading, or a synthesized `Development Update` title.
pub fn derive_title(body: &str, repository: &str) -> String {
    for line in body.lines() {
        let line = line.trim();
        if let Some(heading) = line.strip_prefix("# ") {
            let heading = heading.trim();
            if !heading.is_empty() {
                return heading.to_string();
            }
        }
    }
    let repo_name = repository.rsplit('/').next().unwrap_or(repository);
    format!(
        "Development Update - {} ({})",
        repo_name,
        Utc::now().format("%Y-%m-%d")
    )
}

/// Appends the `## Commit Details` reference section listing each source
/// commit with its short hash, author, date and subject line.
pub fn append_commit_details(body: &str, commits: &[Commit]) -> String {
    let mut out = String::with_capacity(body.len() + commits.len() * 80);
    out.push_str(body.trim_end());
    out.push_str("\n\n## Commit Details\n\n");
    for commit in commits {
        out.push_str(&format!(
            "- **{}** by {} on {}: {}\n",
            commit.short_sha(),
            commit.author.display_name(),
            format_timestamp(commit.timestamp),
            commit.summary()
        ));
    }
    out
}
