//! Provider 调度：重试、退避与 fallback 链
//!
//! adapter 只发一次请求；这里决定失败之后做什么：
//! - 可重试错误（限流、瞬时 5xx、超时、连接失败）：指数退避重试，
//!   429 的 Retry-After 优先于计算出的退避值
//! - 单个 provider 的重试预算用尽后按顺序切换 fallback provider
//! - 终止性错误（凭证、模型、内容策略）：立即中止整条链
//! - 所有 provider 用尽：返回 [`ProviderError::Exhausted`]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use futures_util::future::join_all;
use tokio::time::Instant;

use crate::config::{AppConfig, NetworkConfig};
use crate::error::{BloggerError, ConnectivityError, ProviderError, Result};
use crate::llm::{AIProvider, AIResponse, GenerateOptions, ProgressReporter};

/// Dispatch layer over the configured providers.
///
/// Holds every constructed provider, the atomically-swappable active
/// selection, and the fallback order. Cheap to share via `Arc`.
pub struct ProviderManager {
    providers: HashMap<String, Arc<dyn AIProvider>>,
    active: ArcSwap<String>,
    fallback_order: Vec<String>,
    network: NetworkConfig,
}

impl ProviderManager {
    /// Builds the manager from the application config.
    ///
    /// Every entry under `[llm.providers]` is constructed, even unconfigured
    /// ones, so that `test_all` and `list` can report on them.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let mut providers = HashMap::new();
        for name in config.llm.providers.keys() {
            let provider = super::provider::create_provider(config, name)?;
            providers.insert(name.clone(), provider);
        }

        let active = config.llm.active_provider.clone();
        if !providers.contains_key(&active) {
            return Err(BloggerError::Config(format!(
                "Active provider '{}' not found in config",
                active
            )));
        }

        // fallback 链中引用了未定义 provider 属于配置错误，尽早暴露
        for name in &config.llm.fallback_providers {
            if !providers.contains_key(name) {
                return Err(BloggerError::Config(format!(
                    "Fallback provider '{}' not found in config",
                    name
                )));
            }
        }

        Ok(Self {
            providers,
            active: ArcSwap::from_pointee(active),
            fallback_order: config.llm.fallback_providers.clone(),
            network: config.network.clone(),
        })
    }

    #[cfg(test)]
    fn new_for_test(
        providers: HashMap<String, Arc<dyn AIProvider>>,
        active: &str,
        fallback_order: Vec<String>,
        network: NetworkConfig,
    ) -> Self {
        Self {
            providers,
            active: ArcSwap::from_pointee(active.to_string()),
            fallback_order,
            network,
        }
    }

    /// Name of the currently active provider.
    pub fn active_name(&self) -> String {
        self.active.load().as_ref().clone()
    }

    /// Looks up a provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn AIProvider>> {
        self.providers.get(name).cloned()
    }

    /// All configured provider names, sorted for stable output.
    pub fn provider_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Switches the active provider in memory.
    ///
    /// In-flight generations keep the provider they started with; only
    /// subsequent calls observe the new selection. Persisting the choice is
    /// the caller's concern.
    pub fn switch_active(&self, name: &str) -> Result<()> {
        let provider = self.providers.get(name).ok_or_else(|| {
            BloggerError::Config(format!("Provider '{}' not found in config", name))
        })?;
        if !provider.is_configured() {
            return Err(ProviderError::NotConfigured {
                provider: name.to_string(),
            }
            .into());
        }
        let previous = self.active.swap(Arc::new(name.to_string()));
        tracing::info!("Active provider switched: {} -> {}", previous, name);
        Ok(())
    }

    /// Lists models for the named provider, defaulting to the active one.
    pub async fn list_models(&self, name: Option<&str>) -> Result<Vec<String>> {
        let name = name.map(String::from).unwrap_or_else(|| self.active_name());
        let provider = self.get(&name).ok_or_else(|| {
            BloggerError::Config(format!("Provider '{}' not found in config", name))
        })?;
        Ok(provider.list_models().await?)
    }

    /// Runs connectivity checks for all providers concurrently.
    ///
    /// One slow provider does not block the report for the others beyond the
    /// shared HTTP timeout.
    pub async fn test_all(&self) -> Vec<(String, std::result::Result<(), ConnectivityError>)> {
        let names = self.provider_names();
        let checks = names.iter().map(|name| {
            let provider = self.providers[name].clone();
            async move { provider.test_connection().await }
        });
        let results = join_all(checks).await;
        names.into_iter().zip(results).collect()
    }

    /// Generates text through the active provider, with retry and fallback.
    ///
    /// With `provider` set, only that provider is used (no fallback) —
    /// regeneration with an explicitly chosen backend must not silently
    /// land on a different one. Otherwise the chain is: active provider
    /// first, then each fallback provider in configured order, skipping the
    /// active one if it reappears there. Each provider gets up to
    /// `max_retries` retries for retryable errors within the
    /// `max_total_retry_ms` budget. A terminal error from any provider
    /// aborts the whole chain immediately.
    pub async fn generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
        provider: Option<&str>,
        progress: Option<&dyn ProgressReporter>,
    ) -> std::result::Result<AIResponse, ProviderError> {
        let chain: Vec<String> = match provider {
            Some(name) => vec![name.to_string()],
            None => {
                let active = self.active_name();
                let mut chain = vec![active.clone()];
                for name in &self.fallback_order {
                    if *name != active && !chain.contains(name) {
                        chain.push(name.clone());
                    }
                }
                chain
            }
        };

        let mut total_attempts = 0usize;
        let mut last_error: Option<ProviderError> = None;

        for (i, name) in chain.iter().enumerate() {
            let provider = match self.providers.get(name) {
                Some(p) => p.clone(),
                None => {
                    last_error = Some(ProviderError::NotConfigured {
                        provider: name.clone(),
                    });
                    continue;
                }
            };

            if i > 0 {
                tracing::warn!("Falling back to provider '{}'", name);
                if let Some(p) = progress {
                    p.append_suffix(
                        &rust_i18n::t!("provider.fallback_suffix", provider = name.as_str()),
                    );
                }
            }

            match self
                .generate_with_retry(provider.as_ref(), prompt, options, progress)
                .await
            {
                Ok((response, attempts)) => {
                    total_attempts += attempts;
                    if total_attempts > 1 {
                        tracing::debug!(
                            "Generation succeeded after {} total attempts",
                            total_attempts
                        );
                    }
                    return Ok(response);
                }
                Err((e, attempts)) => {
                    total_attempts += attempts;
                    if !e.is_retryable() {
                        // 终止性错误：fallback 也救不了，直接中止
                        tracing::warn!("Provider '{}' failed terminally: {}", name, e);
                        return Err(e);
                    }
                    tracing::warn!("Provider '{}' exhausted its retries: {}", name, e);
                    last_error = Some(e);
                }
            }
        }

        Err(ProviderError::Exhausted {
            attempts: total_attempts,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no provider attempted".to_string()),
        })
    }

    /// 单个 provider 的重试循环
    ///
    /// 返回 `(结果, 尝试次数)`。第一次调用不算重试，之后每次重试前按
    /// Retry-After 或指数退避等待；累计等待超出 `max_total_retry_ms`
    /// 预算时放弃。
    async fn generate_with_retry(
        &self,
        provider: &dyn AIProvider,
        prompt: &str,
        options: &GenerateOptions,
        progress: Option<&dyn ProgressReporter>,
    ) -> std::result::Result<(AIResponse, usize), (ProviderError, usize)> {
        let max_retries = self.network.max_retries;
        let budget = Duration::from_millis(self.network.max_total_retry_ms);
        let started = Instant::now();
        let mut attempt = 0usize;

        loop {
            attempt += 1;

            let error = match provider.generate_text(prompt, options).await {
                Ok(response) => return Ok((response, attempt)),
                Err(e) => e,
            };

            let retries_done = attempt - 1;
            if !error.is_retryable() || retries_done >= max_retries {
                return Err((error, attempt));
            }

            let delay = self.retry_delay(&error, attempt);
            if started.elapsed() + delay > budget {
                tracing::debug!(
                    "{}: retry budget of {:?} exceeded, giving up",
                    provider.name(),
                    budget
                );
                return Err((error, attempt));
            }

            if let Some(p) = progress {
                p.append_suffix(&rust_i18n::t!(
                    "provider.retrying_suffix",
                    attempt = attempt,
                    max = max_retries
                ));
            }

            tracing::debug!(
                "{} attempt {}/{} failed ({}). Retrying in {:.1}s...",
                provider.name(),
                attempt,
                max_retries + 1,
                error,
                delay.as_secs_f64()
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// 重试等待时长：429 的 Retry-After 优先，否则指数退避
    fn retry_delay(&self, error: &ProviderError, attempt: usize) -> Duration {
        if let ProviderError::RateLimited {
            retry_after: Some(secs),
            ..
        } = error
        {
            return Duration::from_secs(*secs);
        }
        calculate_exponential_backoff(
            attempt,
            self.network.retry_delay_ms,
            self.network.max_retry_delay_ms,
        )
    }
}

/// 计算指数退避延迟
fn calculate_exponential_backoff(
    attempt: usize,
    retry_delay_ms: u64,
    max_retry_delay_ms: u64,
) -> Duration {
    const MIN_RETRY_DELAY_MS: u64 = 100;
    let multiplier = 1u64.checked_shl((attempt - 1) as u32).unwrap_or(u64::MAX);
    let delay_ms = retry_delay_ms
        .saturating_mul(multiplier)
        .min(max_retry_delay_ms)
        .max(MIN_RETRY_DELAY_MS);
    Duration::from_millis(delay_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 按脚本返回结果的测试 provider
    struct ScriptedProvider {
        name: String,
        calls: AtomicUsize,
        script: Mutex<Vec<std::result::Result<String, ProviderError>>>,
    }

    impl ScriptedProvider {
        fn new(name: &str, script: Vec<std::result::Result<String, ProviderError>>) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                calls: AtomicUsize::new(0),
                script: Mutex::new(script),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AIProvider for ScriptedProvider {
        fn name(&self) -> &str {
            &self.name
        }

        fn model(&self) -> &str {
            "test-model"
        }

        fn is_configured(&self) -> bool {
            true
        }

        async fn test_connection(&self) -> std::result::Result<(), ConnectivityError> {
            Ok(())
        }

        async fn generate_text(
            &self,
            _prompt: &str,
            _options: &GenerateOptions,
        ) -> std::result::Result<AIResponse, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut script = self.script.lock().unwrap();
            if script.is_empty() {
                panic!("scripted provider '{}' ran out of responses", self.name);
            }
            script.remove(0).map(|text| AIResponse {
                text,
                model: "test-model".to_string(),
                provider: self.name.clone(),
                tokens_used: None,
            })
        }
    }

    fn rate_limited(provider: &str) -> ProviderError {
        ProviderError::RateLimited {
            provider: provider.to_string(),
            retry_after: None,
        }
    }

    fn fast_network() -> NetworkConfig {
        NetworkConfig {
            max_retries: 3,
            retry_delay_ms: 1,
            max_retry_delay_ms: 5,
            max_total_retry_ms: 20_000,
            ..Default::default()
        }
    }

    fn manager_with(
        providers: Vec<(&str, Arc<ScriptedProvider>)>,
        active: &str,
        fallback: Vec<&str>,
        network: NetworkConfig,
    ) -> ProviderManager {
        let map: HashMap<String, Arc<dyn AIProvider>> = providers
            .into_iter()
            .map(|(n, p)| (n.to_string(), p as Arc<dyn AIProvider>))
            .collect();
        ProviderManager::new_for_test(
            map,
            active,
            fallback.into_iter().map(String::from).collect(),
            network,
        )
    }

    #[tokio::test]
    async fn test_success_after_three_rate_limits() {
        let provider = ScriptedProvider::new(
            "openai",
            vec![
                Err(rate_limited("openai")),
                Err(rate_limited("openai")),
                Err(rate_limited("openai")),
                Ok("article body".to_string()),
            ],
        );
        let manager = manager_with(
            vec![("openai", provider.clone())],
            "openai",
            vec![],
            fast_network(),
        );

        let response = manager
            .generate("prompt", &GenerateOptions::default(), None, None)
            .await
            .unwrap();

        assert_eq!(response.text, "article body");
        // 1 次原始调用 + 恰好 3 次重试
        assert_eq!(provider.call_count(), 4);
    }

    #[tokio::test]
    async fn test_terminal_error_short_circuits_fallback() {
        let primary = ScriptedProvider::new(
            "openai",
            vec![Err(ProviderError::InvalidCredential {
                provider: "openai".to_string(),
                message: "bad key".to_string(),
            })],
        );
        let backup = ScriptedProvider::new("gemini", vec![Ok("unused".to_string())]);

        let manager = manager_with(
            vec![("openai", primary.clone()), ("gemini", backup.clone())],
            "openai",
            vec!["gemini"],
            fast_network(),
        );

        let err = manager
            .generate("prompt", &GenerateOptions::default(), None, None)
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::InvalidCredential { .. }));
        assert_eq!(primary.call_count(), 1);
        assert_eq!(backup.call_count(), 0, "fallback must not be consulted");
    }

    #[tokio::test]
    async fn test_retryable_exhaustion_falls_back() {
        let primary = ScriptedProvider::new(
            "openai",
            vec![
                Err(rate_limited("openai")),
                Err(rate_limited("openai")),
                Err(rate_limited("openai")),
                Err(rate_limited("openai")),
            ],
        );
        let backup = ScriptedProvider::new("ollama", vec![Ok("from backup".to_string())]);

        let manager = manager_with(
            vec![("openai", primary.clone()), ("ollama", backup.clone())],
            "openai",
            vec!["ollama"],
            fast_network(),
        );

        let response = manager
            .generate("prompt", &GenerateOptions::default(), None, None)
            .await
            .unwrap();

        assert_eq!(response.text, "from backup");
        assert_eq!(response.provider, "ollama");
        assert_eq!(primary.call_count(), 4);
        assert_eq!(backup.call_count(), 1);
    }

    #[tokio::test]
    async fn test_all_exhausted_returns_exhausted() {
        let primary = ScriptedProvider::new(
            "openai",
            vec![
                Err(rate_limited("openai")),
                Err(rate_limited("openai")),
                Err(rate_limited("openai")),
                Err(rate_limited("openai")),
            ],
        );
        let backup = ScriptedProvider::new(
            "gemini",
            vec![
                Err(rate_limited("gemini")),
                Err(rate_limited("gemini")),
                Err(rate_limited("gemini")),
                Err(rate_limited("gemini")),
            ],
        );

        let manager = manager_with(
            vec![("openai", primary.clone()), ("gemini", backup.clone())],
            "openai",
            vec!["gemini"],
            fast_network(),
        );

        let err = manager
            .generate("prompt", &GenerateOptions::default(), None, None)
            .await
            .unwrap_err();

        match err {
            ProviderError::Exhausted {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 8);
                assert!(last_error.contains("gemini"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_retry_budget_exceeded_gives_up() {
        // Retry-After 远超预算，第一次失败后应直接放弃
        let provider = ScriptedProvider::new(
            "openai",
            vec![Err(ProviderError::RateLimited {
                provider: "openai".to_string(),
                retry_after: Some(3600),
            })],
        );
        let network = NetworkConfig {
            max_retries: 3,
            retry_delay_ms: 1,
            max_retry_delay_ms: 5,
            max_total_retry_ms: 50,
            ..Default::default()
        };
        let manager = manager_with(vec![("openai", provider.clone())], "openai", vec![], network);

        let err = manager
            .generate("prompt", &GenerateOptions::default(), None, None)
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Exhausted { .. }));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_switch_active_rejects_unknown() {
        let provider = ScriptedProvider::new("openai", vec![]);
        let manager = manager_with(vec![("openai", provider)], "openai", vec![], fast_network());

        assert!(manager.switch_active("nonexistent").is_err());
        assert_eq!(manager.active_name(), "openai");
    }

    #[tokio::test]
    async fn test_switch_active_changes_selection() {
        let a = ScriptedProvider::new("openai", vec![]);
        let b = ScriptedProvider::new("ollama", vec![Ok("local".to_string())]);
        let manager = manager_with(
            vec![("openai", a), ("ollama", b)],
            "openai",
            vec![],
            fast_network(),
        );

        manager.switch_active("ollama").unwrap();
        assert_eq!(manager.active_name(), "ollama");

        let response = manager
            .generate("prompt", &GenerateOptions::default(), None, None)
            .await
            .unwrap();
        assert_eq!(response.provider, "ollama");
    }
}
