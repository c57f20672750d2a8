//! Provider configuration extraction tool
//!
//! Provides helper functions to extract various parameters from ProviderConfig

use crate::config::ProviderConfig;
use crate::constants::llm::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use crate::error::ProviderError;
use crate::llm::GenerateOptions;

use super::super::utils::complete_endpoint;

/// Extract API key
///
/// Read from the configuration file. The key may also arrive via the
/// `DEVBLOGGER__LLM__PROVIDERS__<NAME>__API_KEY` environment override.
pub fn extract_api_key(config: &ProviderConfig, provider_name: &str) -> Result<String, ProviderError> {
    config
        .api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| ProviderError::NotConfigured {
            provider: provider_name.to_string(),
        })
}

/// Build a complete endpoint
///
/// Read the endpoint from the configuration file, and use the default value
/// if not configured.
pub fn build_endpoint(config: &ProviderConfig, default_base: &str, suffix: &str) -> String {
    let base = config.endpoint.as_deref().unwrap_or(default_base);
    complete_endpoint(base, suffix)
}

/// Extract u32 value from extra configuration
pub fn extract_extra_u32(config: &ProviderConfig, key: &str) -> Option<u32> {
    config
        .extra
        .get(key)
        .and_then(|v| v.as_u64())
        .map(|v| v as u32)
}

/// Extract f32 value from extra configuration
pub fn extract_extra_f32(config: &ProviderConfig, key: &str) -> Option<f32> {
    config
        .extra
        .get(key)
        .and_then(|v| v.as_f64())
        .map(|v| v as f32)
}

/// max_tokens 取值顺序：请求参数 > 显式配置 > extra > 默认值
pub fn resolve_max_tokens(config: &ProviderConfig, options: &GenerateOptions) -> u32 {
    options
        .max_tokens
        .or(config.max_tokens)
        .or_else(|| extract_extra_u32(config, "max_tokens"))
        .unwrap_or(DEFAULT_MAX_TOKENS)
}

/// temperature 取值顺序：请求参数 > 显式配置 > extra > 默认值
pub fn resolve_temperature(config: &ProviderConfig, options: &GenerateOptions) -> f32 {
    options
        .temperature
        .or(config.temperature)
        .or_else(|| extract_extra_f32(config, "temperature"))
        .unwrap_or(DEFAULT_TEMPERATURE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiStyle;

    fn provider_config(api_key: Option<&str>) -> ProviderConfig {
        ProviderConfig {
            api_key: api_key.map(String::from),
            api_style: Some(ApiStyle::OpenAI),
            ..Default::default()
        }
    }

    #[test]
    fn test_extract_api_key_missing() {
        let config = provider_config(None);
        let err = extract_api_key(&config, "openai").unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured { .. }));
    }

    #[test]
    fn test_extract_api_key_blank_treated_as_missing() {
        let config = provider_config(Some("   "));
        assert!(extract_api_key(&config, "openai").is_err());
    }

    #[test]
    fn test_options_override_config() {
        let config = ProviderConfig {
            max_tokens: Some(1000),
            temperature: Some(0.5),
            ..Default::default()
        };
        let options = GenerateOptions {
            max_tokens: Some(42),
            temperature: Some(1.1),
        };
        assert_eq!(resolve_max_tokens(&config, &options), 42);
        assert_eq!(resolve_temperature(&config, &options), 1.1);
    }

    #[test]
    fn test_defaults_used_when_unset() {
        let config = ProviderConfig::default();
        let options = GenerateOptions::default();
        assert_eq!(resolve_max_tokens(&config, &options), DEFAULT_MAX_TOKENS);
        assert_eq!(resolve_temperature(&config, &options), DEFAULT_TEMPERATURE);
    }
}
