//! 单次 HTTP 请求发送与错误分类
//!
//! 每次调用只发一次请求，把传输层错误和非 2xx 状态码映射为带语义的
//! [`ProviderError`]。是否重试由上层 manager 根据
//! [`ProviderError::is_retryable`] 决定。

use std::time::SystemTime;

use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ProviderError;

/// 解析 Retry-After header 值
///
/// 支持两种格式：
/// - 秒数：`120`
/// - HTTP 日期：`Wed, 21 Oct 2015 07:28:00 GMT`
///
/// 返回值：
/// - `Some(secs)`: 解析成功，返回等待秒数（日期早于当前时间时返回 0）
/// - `None`: 格式无效，无法解析
pub(crate) fn parse_retry_after(value: &str) -> Option<u64> {
    if let Ok(secs) = value.parse::<u64>() {
        return Some(secs);
    }

    if let Ok(date) = httpdate::parse_http_date(value) {
        let now = SystemTime::now();
        return Some(date.duration_since(now).map(|d| d.as_secs()).unwrap_or(0));
    }

    None
}

/// 把 reqwest 传输层错误映射为 ProviderError
fn classify_transport_error(e: reqwest::Error, provider_name: &str) -> ProviderError {
    let message = e.to_string();

    if e.is_timeout() {
        tracing::debug!("{} API request timed out: {}", provider_name, message);
        ProviderError::Timeout {
            provider: provider_name.to_string(),
            message,
        }
    } else {
        tracing::debug!("{} API request failed: {}", provider_name, message);
        ProviderError::ConnectionFailed {
            provider: provider_name.to_string(),
            message,
        }
    }
}

/// 把非 2xx 状态码映射为 ProviderError
///
/// - 429 → `RateLimited`（配额耗尽的 429 除外，按 body 识别）
/// - 401/403 → `InvalidCredential`
/// - 402 或 body 提示配额 → `QuotaExceeded`
/// - 404 → `ModelNotAvailable`
/// - 5xx → `TransientServer`
/// - 其余 → `InvalidResponse`
fn classify_status(
    provider_name: &str,
    model: &str,
    status: u16,
    retry_after: Option<u64>,
    body: &str,
) -> ProviderError {
    let provider = provider_name.to_string();
    let lower = body.to_lowercase();

    match status {
        429 if lower.contains("insufficient_quota") || lower.contains("quota exceeded") => {
            ProviderError::QuotaExceeded {
                provider,
                message: truncate_body(body),
            }
        }
        429 => ProviderError::RateLimited {
            provider,
            retry_after,
        },
        401 | 403 => ProviderError::InvalidCredential {
            provider,
            message: truncate_body(body),
        },
        402 => ProviderError::QuotaExceeded {
            provider,
            message: truncate_body(body),
        },
        404 => ProviderError::ModelNotAvailable {
            provider,
            model: model.to_string(),
        },
        500..=599 => ProviderError::TransientServer {
            provider,
            status,
            message: truncate_body(body),
        },
        _ if lower.contains("content_policy") || lower.contains("safety") => {
            ProviderError::ContentRejected {
                provider,
                message: truncate_body(body),
            }
        }
        _ => ProviderError::InvalidResponse {
            provider,
            message: format!("unexpected status {}: {}", status, truncate_body(body)),
        },
    }
}

/// 错误 body 可能很长，日志和错误信息只保留前 500 字符
fn truncate_body(body: &str) -> String {
    if body.len() > crate::constants::ui::ERROR_PREVIEW_LENGTH {
        let mut end = crate::constants::ui::ERROR_PREVIEW_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}

/// 发送一次 LLM API 请求并解析 JSON 响应
///
/// # Arguments
/// * `client` - HTTP 客户端
/// * `endpoint` - API 端点
/// * `headers` - 额外的请求头
/// * `request_body` - 请求体
/// * `provider_name` - Provider 名称（用于日志和错误分类）
/// * `model` - 模型名称（404 时用于 `ModelNotAvailable`）
pub async fn send_llm_request<Req, Resp>(
    client: &Client,
    endpoint: &str,
    headers: &[(&str, &str)],
    request_body: &Req,
    provider_name: &str,
    model: &str,
) -> Result<Resp, ProviderError>
where
    Req: Serialize,
    Resp: DeserializeOwned,
{
    let mut req = client
        .post(endpoint)
        .header("Content-Type", "application/json");

    for (key, value) in headers {
        req = req.header(*key, *value);
    }

    tracing::debug!("Sending request to: {}", endpoint);

    let response = req
        .json(request_body)
        .send()
        .await
        .map_err(|e| classify_transport_error(e, provider_name))?;

    let status = response.status();
    let retry_after = response
        .headers()
        .get("Retry-After")
        .and_then(|v| v.to_str().ok())
        .and_then(parse_retry_after);

    let response_text = response
        .text()
        .await
        .map_err(|e| classify_transport_error(e, provider_name))?;

    tracing::debug!("{} API response status: {}", provider_name, status);

    if !status.is_success() {
        return Err(classify_status(
            provider_name,
            model,
            status.as_u16(),
            retry_after,
            &response_text,
        ));
    }

    serde_json::from_str(&response_text).map_err(|e| ProviderError::InvalidResponse {
        provider: provider_name.to_string(),
        message: format!("{} (body: {})", e, truncate_body(&response_text)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_retry_after_seconds() {
        assert_eq!(parse_retry_after("120"), Some(120));
        assert_eq!(parse_retry_after("0"), Some(0));
    }

    #[test]
    fn test_parse_retry_after_http_date_in_past() {
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), Some(0));
    }

    #[test]
    fn test_parse_retry_after_invalid() {
        assert_eq!(parse_retry_after("soon"), None);
        assert_eq!(parse_retry_after(""), None);
    }

    #[test]
    fn test_classify_429_rate_limited() {
        let err = classify_status("openai", "gpt-4o-mini", 429, Some(30), "slow down");
        match err {
            ProviderError::RateLimited {
                provider,
                retry_after,
            } => {
                assert_eq!(provider, "openai");
                assert_eq!(retry_after, Some(30));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_classify_429_quota_body_is_terminal() {
        let err = classify_status(
            "openai",
            "gpt-4o-mini",
            429,
            None,
            r#"{"error":{"code":"insufficient_quota"}}"#,
        );
        assert!(matches!(err, ProviderError::QuotaExceeded { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_classify_auth_and_model_errors() {
        assert!(matches!(
            classify_status("gemini", "m", 401, None, "bad key"),
            ProviderError::InvalidCredential { .. }
        ));
        assert!(matches!(
            classify_status("ollama", "llama3.2", 404, None, "model not found"),
            ProviderError::ModelNotAvailable { .. }
        ));
    }

    #[test]
    fn test_classify_5xx_is_retryable() {
        let err = classify_status("openai", "m", 503, None, "overloaded");
        assert!(err.is_retryable());
        assert!(matches!(
            err,
            ProviderError::TransientServer { status: 503, .. }
        ));
    }

    #[test]
    fn test_truncate_body_long() {
        let long = "x".repeat(2000);
        let truncated = truncate_body(&long);
        assert!(truncated.ends_with("..."));
        assert!(truncated.len() < 600);
    }
}
