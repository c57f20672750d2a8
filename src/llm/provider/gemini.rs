use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::base::{extract_api_key, resolve_max_tokens, resolve_temperature, send_llm_request};
use super::utils::DEFAULT_GEMINI_BASE;
use crate::config::{NetworkConfig, ProviderConfig};
use crate::error::{ConnectivityError, ProviderError, Result};
use crate::llm::{AIProvider, AIResponse, GenerateOptions};

/// Google Gemini API provider
///
/// # Configuration example
/// ```toml
/// [llm.providers.gemini]
/// api_key = "AIza..."
/// model = "gemini-2.5-flash"
/// endpoint = "https://generativelanguage.googleapis.com" # optional
/// ```
pub struct GeminiProvider {
    name: String,
    client: Client,
    base_url: String,
    model: String,
    config: ProviderConfig,
}

// ============================================================================
// Request/response structure
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Option<Vec<GeminiResponsePart>>,
}

#[derive(Deserialize)]
struct GeminiResponsePart {
    text: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    total_token_count: Option<u32>,
}

// ============================================================================
// Implementation
// ============================================================================

impl GeminiProvider {
    pub fn new(
        config: &ProviderConfig,
        provider_name: &str,
        network_config: &NetworkConfig,
    ) -> Result<Self> {
        let base_url = config
            .endpoint
            .as_deref()
            .unwrap_or(DEFAULT_GEMINI_BASE)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            name: provider_name.to_string(),
            client: super::create_http_client(network_config)?,
            base_url,
            model: config.model.clone(),
            config: config.clone(),
        })
    }

    fn generate_endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl AIProvider for GeminiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn is_configured(&self) -> bool {
        extract_api_key(&self.config, &self.name).is_ok() && !self.model.is_empty()
    }

    async fn test_connection(&self) -> std::result::Result<(), ConnectivityError> {
        let api_key = extract_api_key(&self.config, &self.name)
            .map_err(|_| ConnectivityError::AuthFailed("API key not configured".to_string()))?;

        // 模型列表接口作为轻量连通性检查
        let endpoint = format!("{}/v1beta/models", self.base_url);
        let response = self
            .client
            .get(&endpoint)
            .header("x-goog-api-key", &api_key)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ConnectivityError::Timeout(e.to_string())
                } else {
                    ConnectivityError::Unreachable(e.to_string())
                }
            })?;

        let status = response.status();
        match status.as_u16() {
            200..=299 => Ok(()),
            401 | 403 => Err(ConnectivityError::AuthFailed(format!(
                "Gemini rejected the API key (status {})",
                status
            ))),
            429 => Err(ConnectivityError::QuotaExceeded(
                "Gemini rate/quota limit hit during connectivity check".to_string(),
            )),
            _ => Err(ConnectivityError::Unreachable(format!(
                "Gemini returned status {}",
                status
            ))),
        }
    }

    async fn generate_text(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> std::result::Result<AIResponse, ProviderError> {
        let api_key = extract_api_key(&self.config, &self.name)?;

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: resolve_temperature(&self.config, options),
                max_output_tokens: resolve_max_tokens(&self.config, options),
            },
        };

        tracing::debug!(
            "Gemini API request: model={}, temperature={}",
            self.model,
            request.generation_config.temperature
        );

        let response: GeminiResponse = send_llm_request(
            &self.client,
            &self.generate_endpoint(),
            &[("x-goog-api-key", api_key.as_str())],
            &request,
            &self.name,
            &self.model,
        )
        .await?;

        // 安全策略拦截按终止性错误处理
        if let Some(feedback) = &response.prompt_feedback
            && let Some(reason) = &feedback.block_reason
        {
            return Err(ProviderError::ContentRejected {
                provider: self.name.clone(),
                message: format!("prompt blocked: {}", reason),
            });
        }

        let tokens_used = response
            .usage_metadata
            .and_then(|u| u.total_token_count);

        let candidate = response
            .candidates
            .and_then(|c| c.into_iter().next())
            .ok_or_else(|| ProviderError::InvalidResponse {
                provider: self.name.clone(),
                message: "response contained no candidates".to_string(),
            })?;

        if candidate.finish_reason.as_deref() == Some("SAFETY") {
            return Err(ProviderError::ContentRejected {
                provider: self.name.clone(),
                message: "candidate blocked by safety filter".to_string(),
            });
        }

        let text = candidate
            .content
            .and_then(|c| c.parts)
            .map(|parts| {
                parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .ok_or_else(|| ProviderError::InvalidResponse {
                provider: self.name.clone(),
                message: "candidate contained no text parts".to_string(),
            })?;

        Ok(AIResponse {
            text,
            model: self.model.clone(),
            provider: self.name.clone(),
            tokens_used,
        })
    }

    /// 远端不枚举，返回常用模型清单
    async fn list_models(&self) -> std::result::Result<Vec<String>, ProviderError> {
        Ok(vec![
            "gemini-2.5-flash".to_string(),
            "gemini-2.5-pro".to_string(),
            "gemini-2.0-flash".to_string(),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn test_provider(base_url: String) -> GeminiProvider {
        let config = ProviderConfig {
            api_style: None,
            endpoint: Some(base_url),
            api_key: Some("AIza-test".to_string()),
            model: "gemini-2.5-flash".to_string(),
            max_tokens: None,
            temperature: None,
            extra: HashMap::new(),
        };
        GeminiProvider::new(&config, "gemini", &NetworkConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_gemini_success_response_parsing() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock(
                "POST",
                "/v1beta/models/gemini-2.5-flash:generateContent",
            )
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"candidates":[{"content":{"parts":[{"text":"Part one. "},{"text":"Part two."}]},"finishReason":"STOP"}],"usageMetadata":{"totalTokenCount":99}}"#,
            )
            .create_async()
            .await;

        let provider = test_provider(server.url());
        let response = provider
            .generate_text("hi", &GenerateOptions::default())
            .await
            .unwrap();

        assert_eq!(response.text, "Part one. Part two.");
        assert_eq!(response.tokens_used, Some(99));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_gemini_safety_block_is_content_rejected() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock(
                "POST",
                "/v1beta/models/gemini-2.5-flash:generateContent",
            )
            .with_status(200)
            .with_body(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#)
            .create_async()
            .await;

        let provider = test_provider(server.url());
        let err = provider
            .generate_text("hi", &GenerateOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::ContentRejected { .. }));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_gemini_503_is_transient() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock(
                "POST",
                "/v1beta/models/gemini-2.5-flash:generateContent",
            )
            .with_status(503)
            .with_body("overloaded")
            .create_async()
            .await;

        let provider = test_provider(server.url());
        let err = provider
            .generate_text("hi", &GenerateOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_gemini_connection_check_auth_failed() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/v1beta/models")
            .with_status(403)
            .with_body("forbidden")
            .create_async()
            .await;

        let provider = test_provider(server.url());
        let err = provider.test_connection().await.unwrap_err();
        assert!(matches!(err, ConnectivityError::AuthFailed(_)));
    }
}
