//! Provider 公共抽象和辅助函数
//!
//! 提取各 Provider 的通用逻辑，减少重复代码。
//!
//! 模块结构：
//! - `config` - 配置提取工具函数
//! - `request` - 单次 HTTP 请求发送与错误分类
//!
//! 注意：重试不在这一层做。adapter 只负责发一次请求并把失败分类为
//! [`ProviderError`](crate::error::ProviderError)，重试与 fallback 由
//! [`ProviderManager`](crate::llm::ProviderManager) 统一处理。

pub mod config;
pub mod request;

pub use config::*;
pub use request::send_llm_request;
