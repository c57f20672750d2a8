//! # devblogger-rs
//!
//! 从提交记录生成开发博客文章的 AI 工具。
//!
//! ## 功能
//! - **文章生成**：把一段时间的提交记录交给 AI，生成一篇可读的开发博客
//! - **多 Provider 支持**：OpenAI、Gemini、Ollama（本地模型）
//! - **高可用**：重试 + Fallback 机制，主 provider 失败时自动切换
//! - **本地存储**：文章以带 frontmatter 的 markdown 落盘，JSON 索引支持
//!   搜索、导出、校验与修复
//! - **国际化**：支持中英文
//!
//! ## 快速开始
//!
//! ### 作为 CLI 使用
//! ```bash
//! # 安装
//! cargo install devblogger-rs
//!
//! # 初始化配置
//! devblogger init
//!
//! # 从提交记录生成文章
//! devblogger generate --commits commits.json --repository owner/repo
//!
//! # 浏览与搜索
//! devblogger list
//! devblogger search "refactor"
//! ```
//!
//! ### 作为库使用
//! ```ignore
//! use devblogger_rs::blog::{BlogGenerator, BlogStorage, GenerationRequest};
//! use devblogger_rs::config::load_config;
//! use devblogger_rs::llm::{GenerateOptions, ProviderManager};
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = load_config()?;
//! let manager = Arc::new(ProviderManager::from_config(&config)?);
//! let storage = Arc::new(BlogStorage::open("entries")?);
//! let generator = BlogGenerator::new(manager, storage, None);
//!
//! let request = GenerationRequest {
//!     repository: "owner/repo".to_string(),
//!     commits: vec![],
//!     prompt_template: None,
//!     provider: None,
//!     tags: vec![],
//!     options: GenerateOptions::default(),
//! };
//! let doc = generator.generate(&request, None, None).await?;
//! println!("Generated: {}", doc.meta.title);
//! # Ok(())
//! # }
//! ```
//!
//! ## 核心模块
//! - [`commit`] - 提交记录模型与筛选
//! - [`llm`] - AI provider 接口、适配器与重试/fallback 管理
//! - [`blog`] - 生成引擎与存储/索引引擎
//! - [`commands`] - CLI 命令实现
//! - [`config`] - 配置管理
//! - [`error`] - 统一错误类型
//! - [`ui`] - 用户界面工具
//!
//! ## 配置
//! 配置文件位置：
//! - Linux: `~/.config/devblogger/config.toml`
//! - macOS: `~/Library/Application Support/devblogger/config.toml`
//! - Windows: `%APPDATA%\devblogger\config\config.toml`
//!
//! 示例配置：
//! ```toml
//! [llm]
//! active_provider = "openai"
//! fallback_providers = ["ollama"]
//!
//! [llm.providers.openai]
//! api_key = "sk-..."
//! model = "gpt-4o-mini"
//!
//! [network]
//! max_retries = 3
//! max_total_retry_ms = 20000
//! ```

#[macro_use]
extern crate rust_i18n;

pub mod blog;
pub mod cli;
pub mod commands;
pub mod commit;
pub mod config;
pub mod constants;
pub mod error;
pub mod llm;
pub mod ui;

// Initialize i18n for library modules
i18n!("locales", fallback = "en");
