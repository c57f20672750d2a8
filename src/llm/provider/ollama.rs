use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::base::{resolve_max_tokens, resolve_temperature, send_llm_request};
use super::utils::{DEFAULT_OLLAMA_BASE, OLLAMA_API_SUFFIX, OLLAMA_TAGS_SUFFIX, complete_endpoint};
use crate::config::{NetworkConfig, ProviderConfig};
use crate::error::{ConnectivityError, ProviderError, Result};
use crate::llm::{AIProvider, AIResponse, GenerateOptions};

/// Ollama API provider
///
/// Talks to a local (or remote) Ollama daemon. No API key required.
///
/// # Configuration example
/// ```toml
/// [llm.providers.ollama]
/// model = "llama3.2"
/// endpoint = "http://localhost:11434" # optional
/// ```
pub struct OllamaProvider {
    name: String,
    client: Client,
    endpoint: String,
    tags_endpoint: String,
    model: String,
    config: ProviderConfig,
}

#[derive(Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    eval_count: Option<u32>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
}

#[derive(Deserialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Deserialize)]
struct ModelInfo {
    name: String,
}

impl OllamaProvider {
    pub fn new(
        config: &ProviderConfig,
        provider_name: &str,
        network_config: &NetworkConfig,
    ) -> Result<Self> {
        // Ollama 本地部署，无需 API key
        let base = config.endpoint.as_deref().unwrap_or(DEFAULT_OLLAMA_BASE);
        let endpoint = complete_endpoint(base, OLLAMA_API_SUFFIX);
        let tags_endpoint = endpoint.replace(OLLAMA_API_SUFFIX, OLLAMA_TAGS_SUFFIX);

        Ok(Self {
            name: provider_name.to_string(),
            client: super::create_http_client(network_config)?,
            endpoint,
            tags_endpoint,
            model: config.model.clone(),
            config: config.clone(),
        })
    }

    async fn fetch_tags(&self) -> std::result::Result<TagsResponse, ProviderError> {
        let response = self
            .client
            .get(&self.tags_endpoint)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout {
                        provider: self.name.clone(),
                        message: e.to_string(),
                    }
                } else {
                    ProviderError::ConnectionFailed {
                        provider: self.name.clone(),
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::InvalidResponse {
                provider: self.name.clone(),
                message: format!("tags endpoint returned status {}", status),
            });
        }

        response
            .json::<TagsResponse>()
            .await
            .map_err(|e| ProviderError::InvalidResponse {
                provider: self.name.clone(),
                message: format!("failed to parse tags response: {}", e),
            })
    }
}

#[async_trait]
impl AIProvider for OllamaProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn is_configured(&self) -> bool {
        !self.model.is_empty()
    }

    async fn test_connection(&self) -> std::result::Result<(), ConnectivityError> {
        tracing::debug!("Checking Ollama daemon at {}", self.tags_endpoint);
        match self.fetch_tags().await {
            Ok(_) => Ok(()),
            Err(ProviderError::Timeout { message, .. }) => Err(ConnectivityError::Timeout(message)),
            Err(e) => Err(ConnectivityError::Unreachable(e.to_string())),
        }
    }

    async fn generate_text(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> std::result::Result<AIResponse, ProviderError> {
        let request = OllamaRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            options: OllamaOptions {
                temperature: resolve_temperature(&self.config, options),
                num_predict: resolve_max_tokens(&self.config, options),
            },
        };

        tracing::debug!(
            "Ollama API request: model={}, temperature={}, num_predict={}",
            self.model,
            request.options.temperature,
            request.options.num_predict
        );

        let response: OllamaResponse = send_llm_request(
            &self.client,
            &self.endpoint,
            &[], // Ollama 无需 auth headers
            &request,
            &self.name,
            &self.model,
        )
        .await?;

        // generate 与 prompt 两段 token 计数相加
        let tokens_used = match (response.eval_count, response.prompt_eval_count) {
            (None, None) => None,
            (a, b) => Some(a.unwrap_or(0) + b.unwrap_or(0)),
        };

        Ok(AIResponse {
            text: response.response,
            model: response.model.unwrap_or_else(|| self.model.clone()),
            provider: self.name.clone(),
            tokens_used,
        })
    }

    /// 列出本地已拉取的模型（`/api/tags`）
    ///
    /// 配置的模型不在列表中时返回 `ModelNotAvailable`，提示用户先
    /// `ollama pull`。
    async fn list_models(&self) -> std::result::Result<Vec<String>, ProviderError> {
        let tags = self.fetch_tags().await?;
        let names: Vec<String> = tags.models.into_iter().map(|m| m.name).collect();

        if !self.model.is_empty() && !names.iter().any(|n| n.starts_with(&self.model)) {
            return Err(ProviderError::ModelNotAvailable {
                provider: self.name.clone(),
                model: self.model.clone(),
            });
        }

        Ok(names)
    }
}
