use serde::Deserialize;

/// Reason the provider reports for ending a candidate reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    MaxTokens,
    Safety,
    Recitation,
    Other,
}

impl FinishReason {
    pub fn parse(value: &str) -> Option<Self> {
        Some(match value {
            "STOP" => Self::Stop,
            "MAX_TOKENS" => Self::MaxTokens,
            "SAFETY" => Self::Safety,
            "RECITATION" => Self::Recitation,
            "OTHER" => Self::Other,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stop => "STOP",
            Self::MaxTokens => "MAX_TOKENS",
            Self::Safety => "SAFETY",
            Self::Recitation => "RECITATION",
            Self::Other => "OTHER",
        }
    }

    /// Returns true when the reply ended because it was complete or hit the
    /// output token ceiling, as opposed to being suppressed.
    pub fn is_clean_end(&self) -> bool {
        matches!(self, Self::Stop | Self::MaxTokens)
    }
}

/// One `GenerateContentResponse` object, as carried by each SSE data frame.
///
/// Unknown fields (usage metadata, safety ratings, model version) are
/// ignored on decode.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GenerateContentResponse {
    pub candidates: Option<Vec<Candidate>>,
    #[serde(rename = "promptFeedback")]
    pub prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    /// Concatenated text across every candidate part in this event.
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::new();
        for candidate in self.candidates.iter().flatten() {
            let parts = candidate.content.iter().flat_map(|content| &content.parts);
            for part in parts {
                if let Some(text) = part.text.as_deref() {
                    out.push_str(text);
                }
            }
        }
        out
    }

    /// First candidate finish reason, when present and recognized.
    #[must_use]
    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.candidates
            .iter()
            .flatten()
            .find_map(|candidate| candidate.finish_reason.as_deref())
            .and_then(FinishReason::parse)
    }

    /// Prompt-feedback block reason, reported when the prompt was refused.
    #[must_use]
    pub fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.as_deref())
            .filter(|reason| !reason.trim().is_empty())
    }

    #[must_use]
    pub fn has_candidates(&self) -> bool {
        self.candidates
            .as_ref()
            .is_some_and(|candidates| !candidates.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    #[serde(rename = "finishReason")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PromptFeedback {
    #[serde(rename = "blockReason")]
    pub block_reason: Option<String>,
}
