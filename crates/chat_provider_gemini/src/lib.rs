//! Gemini-backed implementation of the shared `chat_provider` contract.
//!
//! This adapter translates `gemini_api` stream semantics into the
//! deterministic `TurnEvent` lifecycle the application expects: `Started`
//! once reply text begins, one `Chunk` per text increment, then exactly one
//! terminal event.

use std::sync::Arc;
use std::time::Duration;

use chat_provider::{
    ChatProvider, ProviderInitError, ProviderProfile, TurnEvent, TurnMessage, TurnRequest,
};
use gemini_api::{
    Content, FinishReason, GeminiApiConfig, GeminiApiError, GeminiClient, GenerateContentRequest,
    GenerateContentResponse, DEFAULT_GEMINI_MODEL,
};

/// Stable provider identifier used by startup selection.
pub const GEMINI_PROVIDER_ID: &str = "gemini";

/// Runtime configuration for the Gemini provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiProviderConfig {
    pub api_key: String,
    pub model_id: String,
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
}

impl GeminiProviderConfig {
    #[must_use]
    pub fn new(api_key: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model_id: model_id.into(),
            base_url: None,
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn into_gemini_api_config(self) -> GeminiApiConfig {
        let model = sanitize_model_id(&self.model_id);
        let mut config = GeminiApiConfig::new(self.api_key).with_model(model);

        if let Some(base_url) = self.base_url {
            config = config.with_base_url(base_url);
        }

        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }

        config
    }
}

trait StreamClient: Send + Sync {
    fn stream(
        &self,
        request: &GenerateContentRequest,
        on_event: &mut dyn FnMut(GenerateContentResponse),
    ) -> Result<Option<FinishReason>, GeminiApiError>;
}

#[derive(Debug)]
struct DefaultStreamClient {
    client: GeminiClient,
}

impl StreamClient for DefaultStreamClient {
    fn stream(
        &self,
        request: &GenerateContentRequest,
        on_event: &mut dyn FnMut(GenerateContentResponse),
    ) -> Result<Option<FinishReason>, GeminiApiError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| {
                GeminiApiError::Unknown(format!("failed to initialize tokio runtime: {error}"))
            })?;

        runtime.block_on(
            self.client
                .stream_with_handler(request, |event| on_event(event)),
        )
    }
}

/// `ChatProvider` adapter backed by `gemini_api` transport primitives.
pub struct GeminiProvider {
    model_id: String,
    stream_client: Arc<dyn StreamClient>,
}

impl GeminiProvider {
    /// Creates a provider using real Gemini transport.
    pub fn new(config: GeminiProviderConfig) -> Result<Self, ProviderInitError> {
        let model_id = sanitize_model_id(&config.model_id);
        let stream_client = Arc::new(DefaultStreamClient {
            client: GeminiClient::new(config.into_gemini_api_config()).map_err(map_init_error)?,
        });

        Ok(Self {
            model_id,
            stream_client,
        })
    }

    fn build_request(&self, req: &TurnRequest) -> GenerateContentRequest {
        let contents = req
            .messages
            .iter()
            .map(|message| match message {
                TurnMessage::UserText { text } => Content::user(text.clone()),
                TurnMessage::ModelText { text } => Content::model(text.clone()),
            })
            .collect();

        GenerateContentRequest::new(contents, Some(req.system_instruction.clone()))
    }

    #[cfg(test)]
    fn with_stream_client_for_tests(
        model_id: impl Into<String>,
        stream_client: Arc<dyn StreamClient>,
    ) -> Self {
        Self {
            model_id: sanitize_model_id(&model_id.into()),
            stream_client,
        }
    }
}

impl ChatProvider for GeminiProvider {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            provider_id: GEMINI_PROVIDER_ID.to_string(),
            model_id: self.model_id.clone(),
        }
    }

    fn run_turn(&self, req: TurnRequest, emit: &mut dyn FnMut(TurnEvent)) -> Result<(), String> {
        let turn_id = req.turn_id;
        let request = self.build_request(&req);

        let mut started = false;
        let outcome = {
            let mut on_event = |event: GenerateContentResponse| {
                let text = event.text();
                if text.is_empty() {
                    return;
                }
                if !started {
                    started = true;
                    emit(TurnEvent::Started { turn_id });
                }
                emit(TurnEvent::Chunk { turn_id, text });
            };
            self.stream_client.stream(&request, &mut on_event)
        };

        match outcome {
            Ok(finish_reason) => {
                if !started {
                    emit(TurnEvent::Started { turn_id });
                }
                match finish_reason {
                    None | Some(FinishReason::Stop) | Some(FinishReason::MaxTokens) => {
                        emit(TurnEvent::Finished { turn_id });
                    }
                    Some(reason) => emit(TurnEvent::Failed {
                        turn_id,
                        error: format!(
                            "Gemini reply ended with finish reason '{}'",
                            reason.as_str()
                        ),
                    }),
                }
            }
            Err(error) => emit(TurnEvent::Failed {
                turn_id,
                error: format!("Gemini API request failed: {error}"),
            }),
        }

        Ok(())
    }
}

fn sanitize_model_id(model_id: &str) -> String {
    let trimmed = model_id.trim();
    if trimmed.is_empty() {
        DEFAULT_GEMINI_MODEL.to_string()
    } else {
        trimmed.to_string()
    }
}

fn map_init_error(error: GeminiApiError) -> ProviderInitError {
    ProviderInitError::new(format!("Failed to initialize gemini provider: {error}"))
}
