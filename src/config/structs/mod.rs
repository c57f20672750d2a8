//! Configuration structures, grouped by concern.

mod app;
mod llm;
mod network;
mod storage;

pub use app::{AppConfig, BlogConfig, UiConfig};
pub use llm::{ApiStyle, LLMConfig, ProviderConfig};
pub use network::NetworkConfig;
pub use storage::StorageConfig;
