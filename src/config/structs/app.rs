//! Top-level application configuration.

use serde::{Deserialize, Serialize};

use super::{LLMConfig, NetworkConfig, StorageConfig};
use crate::error::Result;

/// Blog generation configuration.
///
/// # Example
/// ```toml
/// [blog]
/// default_prompt = "Write a weekly changelog post..."
/// prune_after_days = 180
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BlogConfig {
    /// Prompt template used when a request does not carry its own.
    ///
    /// When unset, the built-in template
    /// ([`crate::llm::prompt::DEFAULT_BLOG_PROMPT`]) is used.
    #[serde(default)]
    pub default_prompt: Option<String>,

    /// Age threshold in days for `devblogger prune` (default: `90`).
    #[serde(default = "default_prune_after_days")]
    pub prune_after_days: u32,
}

impl Default for BlogConfig {
    fn default() -> Self {
        Self {
            default_prompt: None,
            prune_after_days: default_prune_after_days(),
        }
    }
}

fn default_prune_after_days() -> u32 {
    90
}

/// UI configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UiConfig {
    /// Whether to use colored terminal output.
    #[serde(default = "default_colored")]
    pub colored: bool,

    /// UI language override (BCP 47, e.g. `"en"`, `"zh-CN"`).
    #[serde(default)]
    pub language: Option<String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            colored: default_colored(),
            language: None,
        }
    }
}

fn default_colored() -> bool {
    true
}

/// 应用配置根结构
///
/// 对应 `~/.config/devblogger/config.toml`，各 section 见子结构文档。
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub llm: LLMConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub blog: BlogConfig,

    #[serde(default)]
    pub ui: UiConfig,
}

impl AppConfig {
    /// Validates the whole configuration tree.
    pub fn validate(&self) -> Result<()> {
        self.network.validate()?;
        for (name, provider) in &self.llm.providers {
            provider.validate(name)?;
        }
        Ok(())
    }
}
