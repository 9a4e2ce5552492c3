use serde::Serialize;

/// Conversation role for user-authored content.
pub const ROLE_USER: &str = "user";
/// Conversation role for model-authored content.
pub const ROLE_MODEL: &str = "model";

/// Request body for the `generateContent` endpoint family.
///
/// `contents` replays the full conversation, oldest first; the provider
/// derives its context window from it on every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(
        rename = "systemInstruction",
        skip_serializing_if = "Option::is_none"
    )]
    pub system_instruction: Option<SystemInstruction>,
}

impl GenerateContentRequest {
    #[must_use]
    pub fn new(contents: Vec<Content>, system_instruction: Option<String>) -> Self {
        Self {
            contents,
            system_instruction: system_instruction
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(SystemInstruction::from_text),
        }
    }
}

/// One conversation entry in provider wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    /// Constructs a user-role entry with a single text part.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ROLE_USER.to_string(),
            parts: vec![Part { text: text.into() }],
        }
    }

    /// Constructs a model-role entry with a single text part.
    #[must_use]
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ROLE_MODEL.to_string(),
            parts: vec![Part { text: text.into() }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Part {
    pub text: String,
}

/// System instruction envelope; roleless by contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemInstruction {
    pub parts: Vec<Part>,
}

impl SystemInstruction {
    fn from_text(text: &str) -> Self {
        Self {
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }
}
