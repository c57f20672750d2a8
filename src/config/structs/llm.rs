//! LLM provider configuration structures.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// LLM API backend type.
///
/// Determines which provider adapter to instantiate.
/// If [`ProviderConfig::api_style`] is `None`, the style is inferred from the
/// provider name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiStyle {
    /// OpenAI API (and OpenAI-compatible APIs).
    #[serde(rename = "openai")]
    OpenAI,
    /// Google Gemini API.
    Gemini,
    /// Ollama local model API.
    Ollama,
}

impl std::fmt::Display for ApiStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiStyle::OpenAI => write!(f, "openai"),
            ApiStyle::Gemini => write!(f, "gemini"),
            ApiStyle::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for ApiStyle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" | "chatgpt" => Ok(ApiStyle::OpenAI),
            "gemini" => Ok(ApiStyle::Gemini),
            "ollama" => Ok(ApiStyle::Ollama),
            _ => Err(format!("Unknown API style: '{}'", s)),
        }
    }
}

impl ApiStyle {
    /// Returns the default model name for this API style.
    pub fn default_model(&self) -> &'static str {
        match self {
            ApiStyle::OpenAI => "gpt-4o-mini",
            ApiStyle::Gemini => "gemini-2.5-flash",
            ApiStyle::Ollama => "llama3.2",
        }
    }

    /// Whether this backend requires an API key to be configured.
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, ApiStyle::Ollama)
    }
}

/// Provider configuration.
///
/// Settings for one entry under `[llm.providers.<name>]`.
///
/// # Example
/// ```toml
/// [llm.providers.openai]
/// model = "gpt-4o-mini"
/// api_key = "sk-..."
/// max_tokens = 2000
/// temperature = 0.7
/// endpoint = "https://api.openai.com" # optional
/// ```
#[derive(Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// API style used to select the adapter implementation.
    ///
    /// If omitted, it is inferred from the provider name.
    #[serde(default)]
    pub api_style: Option<ApiStyle>,

    /// API endpoint / base URL.
    pub endpoint: Option<String>,

    /// API key. Required for openai/gemini; not used by ollama.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Model name.
    pub model: String,

    /// Maximum generated token count (output ceiling).
    pub max_tokens: Option<u32>,

    /// Sampling temperature in `0.0..=2.0`.
    pub temperature: Option<f32>,

    /// Additional provider-specific parameters.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_style: None,
            endpoint: None,
            api_key: None,
            model: String::new(),
            max_tokens: None,
            temperature: None,
            extra: HashMap::new(),
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use crate::llm::provider::utils::mask_api_key;
        let masked_key = self.api_key.as_deref().map(mask_api_key);
        f.debug_struct("ProviderConfig")
            .field("api_style", &self.api_style)
            .field("endpoint", &self.endpoint)
            .field("api_key", &masked_key)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl ProviderConfig {
    /// Validates provider configuration.
    pub fn validate(&self, name: &str) -> Result<()> {
        use crate::error::BloggerError;
        if let Some(temp) = self.temperature
            && !(0.0..=2.0).contains(&temp)
        {
            return Err(BloggerError::Config(format!(
                "Provider '{}': temperature {} out of range [0.0, 2.0]",
                name, temp
            )));
        }
        if let Some(ref key) = self.api_key
            && key.trim().is_empty()
        {
            return Err(BloggerError::Config(format!(
                "Provider '{}': api_key is empty",
                name
            )));
        }
        Ok(())
    }
}

/// LLM configuration.
///
/// Selects the active provider and the fallback chain.
///
/// # Example
/// ```toml
/// [llm]
/// active_provider = "openai"
/// fallback_providers = ["gemini", "ollama"]
///
/// [llm.providers.openai]
/// api_key = "sk-..."
/// model = "gpt-4o-mini"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LLMConfig {
    /// Provider used by default; must match a key under
    /// `[llm.providers.<name>]`.
    pub active_provider: String,

    /// Providers tried in order when the active provider is exhausted.
    #[serde(default)]
    pub fallback_providers: Vec<String>,

    /// Provider settings keyed by provider name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            active_provider: "openai".to_string(),
            fallback_providers: Vec::new(),
            providers: HashMap::new(),
        }
    }
}
