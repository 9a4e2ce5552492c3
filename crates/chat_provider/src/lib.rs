//! Minimal provider-agnostic contract for executing a single chat turn.
//!
//! This crate intentionally defines only the shared turn lifecycle types.
//! It excludes provider transport details, protocol payloads, and multi-turn
//! orchestration concerns.

use std::fmt;

/// Identifier for one chat turn.
pub type TurnId = u64;

/// Error returned while constructing/configuring a provider before any turn starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderInitError {
    message: String,
}

impl ProviderInitError {
    /// Creates a new provider initialization error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the underlying error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ProviderInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ProviderInitError {}

impl From<String> for ProviderInitError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ProviderInitError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Provider-neutral conversation history item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnMessage {
    UserText { text: String },
    ModelText { text: String },
}

impl TurnMessage {
    /// Constructs a user-authored history item.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self::UserText { text: text.into() }
    }

    /// Constructs a model-authored history item.
    #[must_use]
    pub fn model(text: impl Into<String>) -> Self {
        Self::ModelText { text: text.into() }
    }

    /// Returns the message text regardless of author.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::UserText { text } | Self::ModelText { text } => text,
        }
    }
}

/// Input required to start a chat turn.
///
/// `messages` is the full conversation so far, oldest first, ending with the
/// user message this turn answers. Providers replay it verbatim so replies
/// carry context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnRequest {
    pub turn_id: TurnId,
    pub messages: Vec<TurnMessage>,
    pub system_instruction: String,
}

/// Provider-emitted lifecycle event for a turn.
///
/// Every turn emits `Started` once the reply stream is open, zero or more
/// `Chunk`s, and exactly one terminal event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnEvent {
    Started { turn_id: TurnId },
    Chunk { turn_id: TurnId, text: String },
    Finished { turn_id: TurnId },
    Failed { turn_id: TurnId, error: String },
}

impl TurnEvent {
    /// Returns the turn identifier associated with this event.
    #[must_use]
    pub fn turn_id(&self) -> TurnId {
        match self {
            Self::Started { turn_id }
            | Self::Chunk { turn_id, .. }
            | Self::Finished { turn_id }
            | Self::Failed { turn_id, .. } => *turn_id,
        }
    }

    /// Returns true when this event terminates the turn lifecycle.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished { .. } | Self::Failed { .. })
    }
}

/// Immutable metadata describing a chat provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    pub provider_id: String,
    pub model_id: String,
}

/// Provider interface for executing one turn request.
pub trait ChatProvider: Send + Sync + 'static {
    /// Returns provider/model identity metadata.
    fn profile(&self) -> ProviderProfile;

    /// Executes a turn request and emits lifecycle events in provider order.
    ///
    /// The emit callback is serial from the caller perspective. Returning
    /// `Err` without having emitted a terminal event tells the host the turn
    /// failed; hosts treat a clean return without a terminal event as a
    /// provider defect and synthesize the failure themselves.
    fn run_turn(
        &self,
        req: TurnRequest,
        emit: &mut dyn FnMut(TurnEvent),
    ) -> Result<(), String>;
}
