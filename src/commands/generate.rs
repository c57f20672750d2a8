use std::io::Read;
use std::path::Path;

use crate::blog::GenerationRequest;
use crate::commit::{Commit, CommitFilter, filter_commits};
use crate::config::AppConfig;
use crate::error::{BloggerError, Result};
use crate::llm::GenerateOptions;
use crate::ui;

/// `generate` 命令参数
pub struct GenerateArgs<'a> {
    pub commits_path: &'a Path,
    pub repository: String,
    pub since: Option<String>,
    pub until: Option<String>,
    pub query: Option<String>,
    pub max_commits: Option<usize>,
    pub prompt: Option<String>,
    pub tags: Vec<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    /// 全局 `--provider` 覆盖
    pub provider: Option<String>,
}

/// `regenerate` 命令参数
pub struct RegenerateArgs<'a> {
    pub id: String,
    pub commits_path: &'a Path,
    pub prompt: Option<String>,
    pub tags: Vec<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub provider: Option<String>,
}

/// 读取提交记录文件（`-` 表示 stdin）
fn load_commits(path: &Path) -> Result<Vec<Commit>> {
    let content = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path).map_err(|e| {
            BloggerError::InvalidInput(format!(
                "Cannot read commits file '{}': {}",
                path.display(),
                e
            ))
        })?
    };

    let commits: Vec<Commit> = serde_json::from_str(&content).map_err(|e| {
        BloggerError::InvalidInput(format!("Commits file is not a valid commit list: {}", e))
    })?;
    Ok(commits)
}

fn build_filter(args: &GenerateArgs<'_>) -> Result<CommitFilter> {
    Ok(CommitFilter {
        date_from: args
            .since
            .as_deref()
            .map(|s| super::parse_date_bound(s, false))
            .transpose()?,
        date_to: args
            .until
            .as_deref()
            .map(|s| super::parse_date_bound(s, true))
            .transpose()?,
        query: args.query.clone(),
        max_count: args.max_commits,
    })
}

/// 生成新文章
pub async fn run(args: GenerateArgs<'_>, config: &AppConfig) -> Result<()> {
    let colored = config.ui.colored;
    let commits = load_commits(args.commits_path)?;
    let filter = build_filter(&args)?;
    let selected = filter_commits(&commits, &filter);

    println!(
        "{}",
        ui::info(
            &rust_i18n::t!(
                "generate.selected",
                count = selected.len(),
                total = commits.len()
            ),
            colored,
        )
    );

    let request = GenerationRequest {
        repository: args.repository,
        commits: selected,
        prompt_template: args.prompt,
        provider: args.provider,
        tags: args.tags,
        options: GenerateOptions {
            max_tokens: args.max_tokens,
            temperature: args.temperature,
        },
    };

    let (_storage, generator) = super::build_generator(config)?;

    let spinner = ui::Spinner::new(&rust_i18n::t!("generate.spinner"));
    let result = generator.generate(&request, Some(&spinner), None).await;
    spinner.finish_and_clear();
    let doc = result?;

    ui::success(
        &rust_i18n::t!("generate.done", title = doc.meta.title.as_str()),
        colored,
    );
    println!(
        "{}",
        rust_i18n::t!(
            "generate.details",
            id = doc.id.as_str(),
            provider = doc.meta.provider.as_str(),
            words = doc.meta.word_count
        )
    );
    Ok(())
}

/// 重新生成已有文章（保留 id 与创建时间）
pub async fn run_regenerate(args: RegenerateArgs<'_>, config: &AppConfig) -> Result<()> {
    let colored = config.ui.colored;
    let commits = load_commits(args.commits_path)?;

    let request = GenerationRequest {
        // 实际仓库名由已存条目决定
        repository: String::new(),
        commits,
        prompt_template: args.prompt,
        provider: args.provider,
        tags: args.tags,
        options: GenerateOptions {
            max_tokens: args.max_tokens,
            temperature: args.temperature,
        },
    };

    let (_storage, generator) = super::build_generator(config)?;

    let spinner = ui::Spinner::new(&rust_i18n::t!("generate.spinner"));
    let result = generator
        .regenerate(&args.id, &request, Some(&spinner), None)
        .await;
    spinner.finish_and_clear();
    let doc = result?;

    ui::success(
        &rust_i18n::t!("generate.regenerated", id = doc.id.as_str()),
        colored,
    );
    Ok(())
}
