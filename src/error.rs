use thiserror::Error;

pub type Result<T> = std::result::Result<T, BloggerError>;

/// 连通性测试错误
///
/// `test_connection()` 的错误分类：传输、认证、配额各自独立，
/// 上层据此决定提示内容。
#[derive(Error, Debug)]
pub enum ConnectivityError {
    #[error("Connection timed out: {0}")]
    Timeout(String),

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Provider unreachable: {0}")]
    Unreachable(String),
}

/// AI provider 错误
///
/// 可重试错误（限流、瞬时 5xx、超时、连接失败）由 ProviderManager 内部重试；
/// 终止性错误（凭证、模型、内容策略）直接短路返回。
#[derive(Error, Debug)]
pub enum ProviderError {
    /// 429 限流。`retry_after` 来自 Retry-After header（秒），可能缺失。
    #[error("{provider}: rate limited{}", .retry_after.map(|s| format!(" (retry after {}s)", s)).unwrap_or_default())]
    RateLimited {
        provider: String,
        retry_after: Option<u64>,
    },

    /// 瞬时服务端错误（5xx）。
    #[error("{provider}: transient server error ({status}): {message}")]
    TransientServer {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("{provider}: request timed out: {message}")]
    Timeout { provider: String, message: String },

    #[error("{provider}: connection failed: {message}")]
    ConnectionFailed { provider: String, message: String },

    #[error("{provider}: invalid credential: {message}")]
    InvalidCredential { provider: String, message: String },

    #[error("{provider}: model '{model}' is not available")]
    ModelNotAvailable { provider: String, model: String },

    #[error("{provider}: content rejected by provider policy: {message}")]
    ContentRejected { provider: String, message: String },

    #[error("{provider}: quota exceeded: {message}")]
    QuotaExceeded { provider: String, message: String },

    #[error("Provider '{provider}' is not configured")]
    NotConfigured { provider: String },

    #[error("{provider}: failed to parse response: {message}")]
    InvalidResponse { provider: String, message: String },

    /// 重试与 fallback 链全部用尽。
    #[error("All providers exhausted after {attempts} attempts (last: {last_error})")]
    Exhausted { attempts: usize, last_error: String },
}

impl ProviderError {
    /// 判断该错误重试后是否可能成功
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited { .. }
                | ProviderError::TransientServer { .. }
                | ProviderError::Timeout { .. }
                | ProviderError::ConnectionFailed { .. }
        )
    }

    /// 错误所属的 provider 名称（用于日志）
    pub fn provider(&self) -> &str {
        match self {
            ProviderError::RateLimited { provider, .. }
            | ProviderError::TransientServer { provider, .. }
            | ProviderError::Timeout { provider, .. }
            | ProviderError::ConnectionFailed { provider, .. }
            | ProviderError::InvalidCredential { provider, .. }
            | ProviderError::ModelNotAvailable { provider, .. }
            | ProviderError::ContentRejected { provider, .. }
            | ProviderError::QuotaExceeded { provider, .. }
            | ProviderError::NotConfigured { provider }
            | ProviderError::InvalidResponse { provider, .. } => provider,
            ProviderError::Exhausted { .. } => "manager",
        }
    }
}

/// 存储/索引错误
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Write failed for '{path}': {message}")]
    WriteFailed { path: String, message: String },

    /// 文件与索引出现不一致（或索引自身无法落盘/解析）。
    /// 出现该错误后应运行 `devblogger validate` 检查漂移。
    #[error("Index inconsistency: {0}")]
    IndexCorrupt(String),

    #[error("Blog entry '{0}' not found")]
    NotFound(String),

    /// 文件内容与索引记录的 content hash 不一致，疑似损坏。
    #[error("Content hash mismatch for '{id}': index has {expected}, file has {actual}")]
    HashMismatch {
        id: String,
        expected: String,
        actual: String,
    },
}

#[derive(Error, Debug)]
pub enum BloggerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Configuration parsing error: {0}")]
    ConfigParse(#[from] config::ConfigError),

    #[error("UI error: {0}")]
    Dialoguer(#[from] dialoguer::Error),

    #[error("No commits selected for generation")]
    EmptySelection,

    #[error("Provider returned an empty article body")]
    EmptyOutput,

    #[error("Operation cancelled by user")]
    Cancelled,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// 通用错误类型，用于不适合其他分类的错误
    #[error("{0}")]
    Other(String),
}

impl BloggerError {
    /// 获取错误的解决建议
    pub fn suggestion(&self) -> Option<String> {
        match self {
            BloggerError::EmptySelection => {
                Some(rust_i18n::t!("suggestion.empty_selection").to_string())
            }
            BloggerError::Provider(ProviderError::NotConfigured { provider }) => Some(
                rust_i18n::t!("suggestion.not_configured", provider = provider.as_str())
                    .to_string(),
            ),
            BloggerError::Provider(ProviderError::InvalidCredential { provider, .. }) => Some(
                rust_i18n::t!("suggestion.invalid_credential", provider = provider.as_str())
                    .to_string(),
            ),
            BloggerError::Provider(ProviderError::ModelNotAvailable { provider, model }) => {
                if provider == "ollama" {
                    Some(rust_i18n::t!("suggestion.ollama_pull", model = model.as_str()).to_string())
                } else {
                    Some(rust_i18n::t!("suggestion.check_model").to_string())
                }
            }
            BloggerError::Provider(ProviderError::Exhausted { .. }) => {
                Some(rust_i18n::t!("suggestion.exhausted").to_string())
            }
            BloggerError::Storage(StorageError::IndexCorrupt(_)) => {
                Some(rust_i18n::t!("suggestion.index_corrupt").to_string())
            }
            BloggerError::Storage(StorageError::HashMismatch { .. }) => {
                Some(rust_i18n::t!("suggestion.hash_mismatch").to_string())
            }
            BloggerError::Network(_) => Some(rust_i18n::t!("suggestion.network").to_string()),
            BloggerError::Config(msg) if msg.contains("not found in config") => {
                Some(rust_i18n::t!("suggestion.provider_not_in_config").to_string())
            }
            _ => None,
        }
    }
}
