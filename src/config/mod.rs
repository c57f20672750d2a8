//! 配置加载与写回
//!
//! 配置加载优先级（从高到低）：
//! 1. 环境变量（`DEVBLOGGER__*` 前缀，双下划线表示嵌套）
//!    - 例如：`DEVBLOGGER__LLM__ACTIVE_PROVIDER=ollama`
//!    - 例如：`DEVBLOGGER__UI__COLORED=false`
//! 2. 配置文件（`~/.config/devblogger/config.toml`）
//! 3. 默认值
//!
//! 写回只通过显式的 [`set_active_provider`] / [`update_provider_config`]
//! 进行，直接编辑 TOML 文档树，从不整体序列化（避免丢掉 api_key 等
//! 跳过序列化的字段和用户自己加的注释外字段）。

mod structs;

use std::path::PathBuf;

use config::{Config, Environment, File};
use directories::ProjectDirs;

use crate::error::{BloggerError, Result};
pub use structs::*;

/// 加载应用配置
pub fn load_config() -> Result<AppConfig> {
    let mut builder = Config::builder();

    // 1. 设置默认值
    builder = builder
        .set_default("llm.active_provider", "openai")?
        .set_default("network.request_timeout", 120)?
        .set_default("network.connect_timeout", 10)?
        .set_default("network.max_retries", 3)?
        .set_default("network.retry_delay_ms", 1000)?
        .set_default("network.max_retry_delay_ms", 10_000)?
        .set_default("network.max_total_retry_ms", 20_000)?
        .set_default("blog.prune_after_days", 90)?
        .set_default("ui.colored", true)?;

    // 2. 加载配置文件（如果存在）
    if let Some(config_path) = get_config_path()
        && config_path.exists()
    {
        builder = builder.add_source(File::from(config_path));
    }

    // 3. 加载环境变量（DEVBLOGGER__*，优先级最高）
    // 双下划线作为嵌套层级分隔符，避免与字段名中的单下划线冲突
    builder = builder.add_source(
        Environment::with_prefix("DEVBLOGGER")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate()?;
    Ok(app_config)
}

/// 配置文件路径（`~/.config/devblogger/config.toml`）
pub fn get_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "devblogger").map(|dirs| dirs.config_dir().join("config.toml"))
}

/// 读取配置文件为 TOML 文档树（文件不存在时返回空表）
fn read_config_document() -> Result<(PathBuf, toml::Value)> {
    let path = get_config_path()
        .ok_or_else(|| BloggerError::Config("Could not determine config directory".to_string()))?;

    let doc = if path.exists() {
        let content = std::fs::read_to_string(&path)?;
        parse_config_document(&content)?
    } else {
        toml::Value::Table(toml::map::Map::new())
    };

    Ok((path, doc))
}

/// 把配置文件内容解析为 TOML 文档树
fn parse_config_document(content: &str) -> Result<toml::Value> {
    toml::from_str::<toml::Value>(content)
        .map_err(|e| BloggerError::Config(format!("Failed to parse config file: {}", e)))
}

/// 写回 TOML 文档树
fn write_config_document(path: &PathBuf, doc: &toml::Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(doc)
        .map_err(|e| BloggerError::Config(format!("Failed to serialize config: {}", e)))?;
    std::fs::write(path, content)?;
    Ok(())
}

/// 显式写回：切换激活 provider
///
/// 只改动 `llm.active_provider` 一个字段，其余文档内容原样保留。
pub fn set_active_provider(name: &str) -> Result<()> {
    let (path, mut doc) = read_config_document()?;

    let table = doc
        .as_table_mut()
        .ok_or_else(|| BloggerError::Config("Config root is not a table".to_string()))?;
    let llm = table
        .entry("llm".to_string())
        .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    let llm_table = llm
        .as_table_mut()
        .ok_or_else(|| BloggerError::Config("[llm] is not a table".to_string()))?;
    llm_table.insert(
        "active_provider".to_string(),
        toml::Value::String(name.to_string()),
    );

    write_config_document(&path, &doc)?;
    tracing::info!("Active provider switched to '{}' in config file", name);
    Ok(())
}

/// 显式写回：更新单个 provider 的配置字段
///
/// `updates` 中为 `None` 的字段保持不变。
pub fn update_provider_config(name: &str, updates: &ProviderUpdate) -> Result<()> {
    let (path, mut doc) = read_config_document()?;

    let table = doc
        .as_table_mut()
        .ok_or_else(|| BloggerError::Config("Config root is not a table".to_string()))?;
    let llm = table
        .entry("llm".to_string())
        .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    let llm_table = llm
        .as_table_mut()
        .ok_or_else(|| BloggerError::Config("[llm] is not a table".to_string()))?;
    let providers = llm_table
        .entry("providers".to_string())
        .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    let providers_table = providers
        .as_table_mut()
        .ok_or_else(|| BloggerError::Config("[llm.providers] is not a table".to_string()))?;
    let provider = providers_table
        .entry(name.to_string())
        .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    let provider_table = provider.as_table_mut().ok_or_else(|| {
        BloggerError::Config(format!("[llm.providers.{}] is not a table", name))
    })?;

    if let Some(ref endpoint) = updates.endpoint {
        provider_table.insert(
            "endpoint".to_string(),
            toml::Value::String(endpoint.clone()),
        );
    }
    if let Some(ref api_key) = updates.api_key {
        provider_table.insert("api_key".to_string(), toml::Value::String(api_key.clone()));
    }
    if let Some(ref model) = updates.model {
        provider_table.insert("model".to_string(), toml::Value::String(model.clone()));
    }
    if let Some(max_tokens) = updates.max_tokens {
        provider_table.insert(
            "max_tokens".to_string(),
            toml::Value::Integer(max_tokens as i64),
        );
    }
    if let Some(temperature) = updates.temperature {
        provider_table.insert(
            "temperature".to_string(),
            toml::Value::Float(temperature as f64),
        );
    }

    write_config_document(&path, &doc)?;
    tracing::info!("Updated provider '{}' configuration", name);
    Ok(())
}

/// Provider 配置的增量更新
#[derive(Debug, Clone, Default)]
pub struct ProviderUpdate {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// 生成默认配置文件内容（`devblogger init`）
pub fn default_config_template() -> String {
    r#"# devblogger configuration

[llm]
active_provider = "openai"
# Providers tried in order when the active one is exhausted.
fallback_providers = []

[llm.providers.openai]
model = "gpt-4o-mini"
# api_key = "sk-..."

[llm.providers.gemini]
model = "gemini-2.5-flash"
# api_key = "AIza..."

[llm.providers.ollama]
model = "llama3.2"
endpoint = "http://localhost:11434"

[network]
request_timeout = 120
connect_timeout = 10
max_retries = 3
retry_delay_ms = 1000
max_total_retry_ms = 20000

[storage]
# entries_dir = "/path/to/entries"

[blog]
prune_after_days = 90
# default_prompt = "Write a concise development blog entry..."

[ui]
colored = true
# language = "en"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_load_config_defaults() {
        let config = load_config().expect("default config should load");
        assert!(!config.llm.active_provider.is_empty());
        assert_eq!(config.network.connect_timeout, 10);
        assert_eq!(config.network.max_total_retry_ms, 20_000);
    }

    #[test]
    #[serial]
    fn test_env_override_active_provider() {
        unsafe {
            std::env::set_var("DEVBLOGGER__LLM__ACTIVE_PROVIDER", "ollama");
        }
        let config = load_config().unwrap();
        assert_eq!(config.llm.active_provider, "ollama");
        unsafe {
            std::env::remove_var("DEVBLOGGER__LLM__ACTIVE_PROVIDER");
        }
    }

    #[test]
    fn test_default_template_parses() {
        let parsed: toml::Value = toml::from_str(&default_config_template()).unwrap();
        assert!(parsed.get("llm").is_some());
        assert!(parsed.get("network").is_some());
    }

    #[test]
    fn test_parse_config_document_accepts_sectioned_file() {
        let doc = parse_config_document("[llm]\nactive_provider = \"openai\"\n").unwrap();
        assert_eq!(
            doc.get("llm")
                .and_then(|llm| llm.get("active_provider"))
                .and_then(|v| v.as_str()),
            Some("openai")
        );
    }
}
