/// Default base URL for Gemini model endpoints.
pub const DEFAULT_GEMINI_BASE_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models";

/// Default model addressed when callers do not pick one.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Normalize a base URL to the Gemini models collection.
///
/// Normalization rules:
/// 1) empty input falls back to the default base URL
/// 2) surrounding whitespace and trailing `/` are trimmed
/// 3) a `/v1` or `/v1beta` suffix gets `/models` appended
pub fn normalize_gemini_url(input: &str) -> String {
    let base = if input.trim().is_empty() {
        DEFAULT_GEMINI_BASE_URL
    } else {
        input.trim()
    };

    let trimmed = base.trim_end_matches('/');
    if trimmed.ends_with("/v1") || trimmed.ends_with("/v1beta") {
        return format!("{trimmed}/models");
    }
    trimmed.to_string()
}

/// Full URL for a streamed `generateContent` call against `model`.
///
/// The `alt=sse` query selects server-sent-event framing over the default
/// JSON-array chunking.
pub fn stream_generate_content_url(base_url: &str, model: &str) -> String {
    format!(
        "{}/{}:streamGenerateContent?alt=sse",
        normalize_gemini_url(base_url),
        model.trim()
    )
}
