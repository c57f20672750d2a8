use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::base::{build_endpoint, resolve_max_tokens, resolve_temperature, send_llm_request};
use super::utils::{DEFAULT_OPENAI_BASE, OPENAI_API_SUFFIX};
use crate::config::{NetworkConfig, ProviderConfig};
use crate::error::{ConnectivityError, ProviderError, Result};
use crate::llm::{AIProvider, AIResponse, GenerateOptions};

/// OpenAI API provider
///
/// Works with the official API and any OpenAI-compatible endpoint
/// (DeepSeek, vLLM, etc.).
///
/// # Configuration example
/// ```toml
/// [llm.providers.openai]
/// api_key = "sk-..."
/// model = "gpt-4o-mini"
/// endpoint = "https://api.openai.com" # optional
/// ```
pub struct OpenAIProvider {
    name: String,
    client: Client,
    api_key: Option<String>,
    endpoint: String,
    model: String,
    config: ProviderConfig,
}

#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<MessagePayload>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize, Deserialize)]
struct MessagePayload {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    content: String,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: u32,
}

impl OpenAIProvider {
    pub fn new(
        config: &ProviderConfig,
        provider_name: &str,
        network_config: &NetworkConfig,
    ) -> Result<Self> {
        let endpoint = build_endpoint(config, DEFAULT_OPENAI_BASE, OPENAI_API_SUFFIX);
        // key 缺失不在构造时报错，is_configured() 会反映出来
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty());

        Ok(Self {
            name: provider_name.to_string(),
            client: super::create_http_client(network_config)?,
            api_key,
            endpoint,
            model: config.model.clone(),
            config: config.clone(),
        })
    }

    fn api_key(&self) -> std::result::Result<&str, ProviderError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| ProviderError::NotConfigured {
                provider: self.name.clone(),
            })
    }
}

#[async_trait]
impl AIProvider for OpenAIProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some() && !self.model.is_empty()
    }

    async fn test_connection(&self) -> std::result::Result<(), ConnectivityError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ConnectivityError::AuthFailed("API key not configured".to_string()))?;

        // 最小化请求：max_tokens=1，只验证连通性与凭证
        let request = OpenAIRequest {
            model: self.model.clone(),
            messages: vec![MessagePayload {
                role: "user".to_string(),
                content: "ping".to_string(),
            }],
            temperature: 0.0,
            max_tokens: 1,
        };

        let auth = format!("Bearer {}", api_key);
        let result: std::result::Result<OpenAIResponse, ProviderError> = send_llm_request(
            &self.client,
            &self.endpoint,
            &[("Authorization", auth.as_str())],
            &request,
            &self.name,
            &self.model,
        )
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(ProviderError::Timeout { message, .. }) => Err(ConnectivityError::Timeout(message)),
            Err(ProviderError::InvalidCredential { message, .. }) => {
                Err(ConnectivityError::AuthFailed(message))
            }
            Err(ProviderError::QuotaExceeded { message, .. }) => {
                Err(ConnectivityError::QuotaExceeded(message))
            }
            // 限流说明服务可达且凭证有效
            Err(ProviderError::RateLimited { .. }) => Ok(()),
            Err(e) => Err(ConnectivityError::Unreachable(e.to_string())),
        }
    }

    async fn generate_text(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> std::result::Result<AIResponse, ProviderError> {
        let api_key = self.api_key()?;

        let request = OpenAIRequest {
            model: self.model.clone(),
            messages: vec![MessagePayload {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: resolve_temperature(&self.config, options),
            max_tokens: resolve_max_tokens(&self.config, options),
        };

        tracing::debug!(
            "OpenAI API request: model={}, temperature={}, max_tokens={}",
            request.model,
            request.temperature,
            request.max_tokens
        );

        let auth = format!("Bearer {}", api_key);
        let response: OpenAIResponse = send_llm_request(
            &self.client,
            &self.endpoint,
            &[("Authorization", auth.as_str())],
            &request,
            &self.name,
            &self.model,
        )
        .await?;

        let text = response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ProviderError::InvalidResponse {
                provider: self.name.clone(),
                message: "response contained no choices".to_string(),
            })?;

        Ok(AIResponse {
            text,
            model: response.model.unwrap_or_else(|| self.model.clone()),
            provider: self.name.clone(),
            tokens_used: response.usage.map(|u| u.total_tokens),
        })
    }

    /// 远端不枚举，返回常用模型清单
    async fn list_models(&self) -> std::result::Result<Vec<String>, ProviderError> {
        Ok(vec![
            "gpt-4o".to_string(),
            "gpt-4o-mini".to_string(),
            "gpt-4.1".to_string(),
            "gpt-4.1-mini".to_string(),
            "gpt-3.5-turbo".to_string(),
        ])
    }
}
