pub mod base;
pub mod gemini;
pub mod ollama;
pub mod openai;
pub mod utils;

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use reqwest::Client;

use crate::config::{AppConfig, NetworkConfig, ProviderConfig};
use crate::error::{BloggerError, Result};
use crate::llm::AIProvider;

/// 全局 HTTP 客户端（共享连接池）
static HTTP_CLIENT: OnceLock<Client> = OnceLock::new();

/// 全局 HTTP 客户端初始化错误信息
///
/// 如果第一次创建失败，保存错误字符串以避免后续重复创建与潜在 panic。
static HTTP_CLIENT_ERROR: OnceLock<String> = OnceLock::new();

/// 获取或创建全局 HTTP 客户端
///
/// 使用 OnceLock 确保只创建一次，所有 provider 共享同一个连接池。
/// 第一次调用时的 NetworkConfig 决定 timeout 配置。
pub(crate) fn create_http_client(network_config: &NetworkConfig) -> Result<Client> {
    if let Some(client) = HTTP_CLIENT.get() {
        return Ok(client.clone());
    }

    if let Some(err_msg) = HTTP_CLIENT_ERROR.get() {
        return Err(BloggerError::Other(format!(
            "HTTP client initialization previously failed: {}",
            err_msg
        )));
    }

    let user_agent = format!(
        "{}/{} ({})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS
    );

    match Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(network_config.request_timeout))
        .connect_timeout(Duration::from_secs(network_config.connect_timeout))
        .build()
    {
        Ok(client) => {
            let _ = HTTP_CLIENT.set(client.clone());
            Ok(client)
        }
        Err(e) => {
            let err_msg = e.to_string();
            let _ = HTTP_CLIENT_ERROR.set(err_msg.clone());
            Err(BloggerError::Other(format!(
                "Failed to create HTTP client: {}",
                err_msg
            )))
        }
    }
}

/// 根据名称创建单个 Provider
pub fn create_provider(config: &AppConfig, name: &str) -> Result<Arc<dyn AIProvider>> {
    let provider_config = config.llm.providers.get(name).ok_or_else(|| {
        BloggerError::Config(format!("Provider '{}' not found in config", name))
    })?;

    create_provider_from_config(provider_config, name, &config.network)
}

/// 根据配置创建具体的 Provider 实现
///
/// 优先使用 api_style 字段，否则从 provider 名称推断。
fn create_provider_from_config(
    provider_config: &ProviderConfig,
    name: &str,
    network_config: &NetworkConfig,
) -> Result<Arc<dyn AIProvider>> {
    use crate::config::ApiStyle;

    let api_style = match provider_config.api_style {
        Some(style) => style,
        None => name.parse::<ApiStyle>().map_err(|_| {
            BloggerError::Config(format!(
                "Cannot infer API style for provider '{}': set api_style to one of openai/gemini/ollama",
                name
            ))
        })?,
    };

    match api_style {
        ApiStyle::OpenAI => {
            let provider = openai::OpenAIProvider::new(provider_config, name, network_config)?;
            Ok(Arc::new(provider))
        }
        ApiStyle::Gemini => {
            let provider = gemini::GeminiProvider::new(provider_config, name, network_config)?;
            Ok(Arc::new(provider))
        }
        ApiStyle::Ollama => {
            let provider = ollama::OllamaProvider::new(provider_config, name, network_config)?;
            Ok(Arc::new(provider))
        }
    }
}
