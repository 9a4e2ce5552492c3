use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Response};

use crate::config::GeminiApiConfig;
use crate::error::{parse_error_message, GeminiApiError};
use crate::payload::GenerateContentRequest;
use crate::response::{FinishReason, GenerateContentResponse};
use crate::sse::SseStreamParser;
use crate::url::stream_generate_content_url;

/// Request header carrying the API key credential.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug)]
pub struct GeminiClient {
    http: Client,
    config: GeminiApiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiApiConfig) -> Result<Self, GeminiApiError> {
        if config.api_key.trim().is_empty() {
            return Err(GeminiApiError::MissingApiKey);
        }
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(GeminiApiError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &GeminiApiConfig {
        &self.config
    }

    pub fn stream_endpoint(&self) -> String {
        stream_generate_content_url(&self.config.base_url, &self.config.model)
    }

    pub fn build_headers(&self) -> Result<HeaderMap, GeminiApiError> {
        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(self.config.api_key.trim())
            .map_err(|_| GeminiApiError::MalformedApiKey)?;
        headers.insert(API_KEY_HEADER, value);
        Ok(headers)
    }

    pub fn build_stream_request(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<reqwest::RequestBuilder, GeminiApiError> {
        validate_request_payload_shape(request)?;

        let headers = self.build_headers()?;
        Ok(self
            .http
            .post(self.stream_endpoint())
            .headers(headers)
            .json(request))
    }

    /// Sends the request and verifies the response status before any SSE
    /// bytes are consumed. Non-2xx bodies are drained for their error message.
    pub async fn send_stream_request(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<Response, GeminiApiError> {
        let response = self
            .build_stream_request(request)?
            .send()
            .await
            .map_err(GeminiApiError::from)?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
        Err(GeminiApiError::Status {
            status,
            message: parse_error_message(status, &body),
        })
    }

    /// Streams one reply, invoking `on_event` for every decoded stream event
    /// in arrival order. Returns the last reported finish reason once the
    /// stream ends; the Gemini stream has no explicit end marker.
    pub async fn stream_with_handler<F>(
        &self,
        request: &GenerateContentRequest,
        mut on_event: F,
    ) -> Result<Option<FinishReason>, GeminiApiError>
    where
        F: FnMut(GenerateContentResponse),
    {
        let response = self.send_stream_request(request).await?;
        let mut bytes = response.bytes_stream();
        let mut parser = SseStreamParser::default();
        let mut finish_reason = None;

        while let Some(chunk) = bytes.next().await {
            let chunk = chunk.map_err(GeminiApiError::from)?;
            for event in parser.feed(&chunk) {
                process_stream_event(event, &mut finish_reason, &mut on_event)?;
            }
        }

        Ok(finish_reason)
    }
}

fn validate_request_payload_shape(
    request: &GenerateContentRequest,
) -> Result<(), GeminiApiError> {
    if request.contents.is_empty() {
        return Err(GeminiApiError::InvalidRequestPayload(
            "'contents' must carry at least one conversation entry".to_string(),
        ));
    }
    if request
        .contents
        .iter()
        .any(|content| content.parts.is_empty())
    {
        return Err(GeminiApiError::InvalidRequestPayload(
            "every content entry must carry at least one part".to_string(),
        ));
    }
    Ok(())
}

fn process_stream_event<F>(
    event: GenerateContentResponse,
    finish_reason: &mut Option<FinishReason>,
    on_event: &mut F,
) -> Result<(), GeminiApiError>
where
    F: FnMut(GenerateContentResponse),
{
    if let Some(error) = stream_failure_from_event(&event) {
        return Err(error);
    }

    if let Some(reason) = event.finish_reason() {
        *finish_reason = Some(reason);
    }

    on_event(event);
    Ok(())
}

fn stream_failure_from_event(event: &GenerateContentResponse) -> Option<GeminiApiError> {
    // A feedback-only frame with a block reason means the prompt was refused
    // outright and no candidates will follow.
    if !event.has_candidates() {
        if let Some(reason) = event.block_reason() {
            return Some(GeminiApiError::PromptBlocked {
                reason: reason.to_string(),
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::process_stream_event;
    use crate::error::GeminiApiError;
    use crate::response::FinishReason;
    use crate::sse::SseStreamParser;

    #[test]
    fn process_stream_event_preserves_parser_order() {
        let frames = concat!(
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"A\"}]}}]}\n\n",
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"B\"}]}}]}\n\n",
        );
        let parsed = SseStreamParser::parse_frames(frames);

        let mut finish_reason = None;
        let mut observed = Vec::new();
        for event in parsed {
            process_stream_event(event, &mut finish_reason, &mut |event| {
                observed.push(event.text())
            })
            .expect("text events should process successfully");
        }

        assert!(finish_reason.is_none());
        assert_eq!(observed, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn process_stream_event_tracks_last_finish_reason() {
        let frames = concat!(
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"all\"}]}}]}\n\n",
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\" done\"}]},\"finishReason\":\"STOP\"}]}\n\n",
        );
        let parsed = SseStreamParser::parse_frames(frames);

        let mut finish_reason = None;
        let mut observed = Vec::new();
        for event in parsed {
            process_stream_event(event, &mut finish_reason, &mut |event| {
                observed.push(event.text())
            })
            .expect("text events should process successfully");
        }

        assert_eq!(finish_reason, Some(FinishReason::Stop));
        assert_eq!(observed.len(), 2);
    }

    #[test]
    fn blocked_prompt_frame_fails_the_stream() {
        let frames = "data: {\"promptFeedback\":{\"blockReason\":\"SAFETY\"}}\n\n";
        let parsed = SseStreamParser::parse_frames(frames);
        assert_eq!(parsed.len(), 1);

        let mut finish_reason = None;
        let mut observed: Vec<String> = Vec::new();
        let result = process_stream_event(
            parsed.into_iter().next().expect("one frame"),
            &mut finish_reason,
            &mut |event| observed.push(event.text()),
        );

        assert!(matches!(
            result,
            Err(GeminiApiError::PromptBlocked { reason }) if reason == "SAFETY"
        ));
        assert!(observed.is_empty());
    }
}
