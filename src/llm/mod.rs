//! LLM abstractions, shared types, and provider traits.
//!
//! This module defines the provider interface used by blog generation,
//! plus the manager that adds retry and fallback on top of it.

/// Provider dispatch with retry and fallback.
pub mod manager;
/// Prompt-building utilities for blog generation.
pub mod prompt;
/// Built-in provider implementations and factory helpers.
pub mod provider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ConnectivityError, ProviderError};

pub use manager::ProviderManager;

/// Progress reporting interface for LLM operations.
///
/// The LLM layer reports status changes (retry, fallback switch, etc.) through
/// this trait instead of depending on a concrete UI implementation.
pub trait ProgressReporter: Send + Sync {
    /// Appends an informative suffix to a progress message (for retries/fallbacks).
    fn append_suffix(&self, suffix: &str);
}

/// Generation parameters passed to a provider.
///
/// These override the per-provider configured values when set.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Maximum tokens to generate. `None` uses the provider configuration.
    pub max_tokens: Option<u32>,
    /// Sampling temperature. `None` uses the provider configuration.
    pub temperature: Option<f32>,
}

/// Normalized response returned by every provider.
///
/// # Fields
/// - `text`: the raw generated text
/// - `model`: the model that produced it
/// - `provider`: the provider name (for attribution in stored documents)
/// - `tokens_used`: total token usage when the backend reports it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AIResponse {
    /// Raw generated text.
    pub text: String,
    /// Model that produced the response.
    pub model: String,
    /// Provider name.
    pub provider: String,
    /// Total token usage, when reported by the backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,
}

/// Unified interface implemented by all AI providers.
///
/// # Architecture
///
/// Adapters are one-shot: [`generate_text`](Self::generate_text) performs a
/// single request and maps transport/API failures to a typed
/// [`ProviderError`]. Retry and fallback are the responsibility of
/// [`ProviderManager`], never of individual adapters.
///
/// # Implementer Notes
/// 1. Implement `Send + Sync` (required in async contexts).
/// 2. Classify failures precisely: [`ProviderError::is_retryable`] drives
///    the manager's retry decision.
/// 3. Override [`list_models`](Self::list_models) only when the backend can
///    enumerate models (Ollama does).
///
/// # Built-In Implementations
/// - [`OpenAIProvider`](provider::openai::OpenAIProvider) - OpenAI/compatible API
/// - [`GeminiProvider`](provider::gemini::GeminiProvider) - Google Gemini
/// - [`OllamaProvider`](provider::ollama::OllamaProvider) - Ollama local model
#[async_trait]
pub trait AIProvider: Send + Sync {
    /// Provider name (used for logs, error messages, and document attribution).
    fn name(&self) -> &str;

    /// Model this provider instance is configured to use.
    fn model(&self) -> &str;

    /// Whether the provider has everything it needs to make a request.
    ///
    /// For remote APIs this means a non-empty API key; Ollama only needs an
    /// endpoint.
    fn is_configured(&self) -> bool;

    /// Performs a lightweight connectivity check without generating content.
    async fn test_connection(&self) -> Result<(), ConnectivityError>;

    /// Sends one generation request and returns the normalized response.
    ///
    /// One attempt only. On failure the error is classified so that the
    /// manager can decide whether to retry, fall back, or abort.
    async fn generate_text(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<AIResponse, ProviderError>;

    /// Lists models available on the backend.
    ///
    /// Default: unsupported. Ollama overrides this with `/api/tags`.
    async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        Err(ProviderError::InvalidResponse {
            provider: self.name().to_string(),
            message: "model listing is not supported by this provider".to_string(),
        })
    }
}
