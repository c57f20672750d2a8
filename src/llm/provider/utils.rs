//! Provider utility functions
//!
//! URL handling, endpoint completion and API key masking shared by all
//! backend adapters.

/// OpenAI-compatible chat completion suffix
pub const OPENAI_API_SUFFIX: &str = "/v1/chat/completions";

/// Ollama generation suffix
pub const OLLAMA_API_SUFFIX: &str = "/api/generate";

/// Ollama model listing suffix
pub const OLLAMA_TAGS_SUFFIX: &str = "/api/tags";

/// OpenAI default base URL
pub const DEFAULT_OPENAI_BASE: &str = "https://api.openai.com";

/// Gemini default base URL
pub const DEFAULT_GEMINI_BASE: &str = "https://generativelanguage.googleapis.com";

/// Ollama default base URL
pub const DEFAULT_OLLAMA_BASE: &str = "http://localhost:11434";

/// Smart completion of an API endpoint
///
/// # Behavior
/// 1. Remove trailing slashes
/// 2. If the URL already ends with the expected suffix (or a prefix of it),
///    only complete the missing tail
/// 3. A custom path of depth >= 2 is kept as-is
///
/// # Example
/// ```
/// use devblogger_rs::llm::provider::utils::complete_endpoint;
///
/// assert_eq!(
///     complete_endpoint("https://api.deepseek.com", "/v1/chat/completions"),
///     "https://api.deepseek.com/v1/chat/completions"
/// );
///
/// assert_eq!(
///     complete_endpoint("https://api.deepseek.com/v1/chat/completions", "/v1/chat/completions"),
///     "https://api.deepseek.com/v1/chat/completions"
/// );
/// ```
pub fn complete_endpoint(base_url: &str, expected_suffix: &str) -> String {
    let url = base_url.trim_end_matches('/');
    let suffix = expected_suffix.trim_start_matches('/');

    if url.ends_with(suffix) {
        return url.to_string();
    }

    // URL 可能已包含 suffix 的前缀部分
    // 例如 url 为 ".../v1"，suffix 为 "v1/chat/completions"，只需补 "/chat/completions"
    let suffix_parts: Vec<&str> = suffix.split('/').collect();
    for i in 0..suffix_parts.len() {
        let partial_suffix = suffix_parts[..=i].join("/");
        if url.ends_with(&partial_suffix) {
            let remaining_suffix = &suffix_parts[i + 1..].join("/");
            if remaining_suffix.is_empty() {
                return url.to_string();
            }
            return format!("{}/{}", url, remaining_suffix);
        }
    }

    if is_complete_api_path(url) {
        return url.to_string();
    }

    format!("{}/{}", url, suffix)
}

/// Check if the URL is already a full API path
///
/// Path depth >= 2 is treated as a user-provided complete endpoint.
fn is_complete_api_path(url: &str) -> bool {
    let path = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))
        .and_then(|rest| rest.split_once('/'))
        .map(|(_, path)| path)
        .unwrap_or("");

    if path.is_empty() {
        return false;
    }

    let segment_count = path.split('/').filter(|s| !s.is_empty()).count();
    segment_count >= 2
}

/// Mask API key to prevent log leaks
///
/// # Example
/// ```
/// use devblogger_rs::llm::provider::utils::mask_api_key;
///
/// assert_eq!(mask_api_key("sk-proj-abcdefghijkl"), "sk-p...ijkl");
/// assert_eq!(mask_api_key("short"), "****");
/// ```
pub fn mask_api_key(key: &str) -> String {
    if key.len() > 8 {
        format!("{}...{}", &key[..4], &key[key.len() - 4..])
    } else {
        "****".to_string()
    }
}
