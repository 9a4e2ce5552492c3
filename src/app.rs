use chat_provider::{TurnId, TurnMessage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Idle,
    Loading { turn_id: TurnId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub text: String,
    pub streaming: bool,
    pub turn_id: Option<TurnId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingTurnMemory {
    turn_id: TurnId,
    entries: Vec<TurnMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct App {
    pub mode: Mode,
    pub transcript: Vec<Message>,
    conversation: Vec<TurnMessage>,
    pending_turn_memory: Option<PendingTurnMemory>,
    system_instruction: String,
}

pub trait HostOps {
    fn start_turn(
        &mut self,
        messages: Vec<TurnMessage>,
        system_instruction: String,
    ) -> Result<TurnId, String>;
}

/// Reply shown whenever a turn cannot be completed, regardless of cause.
pub const FALLBACK_REPLY: &str = "Oops! Something went wrong. Please try again.";
pub const SYSTEM_INSTRUCTION_ENV_VAR: &str = "YLDL4U_SYSTEM_INSTRUCTIONS";
pub const DEFAULT_SYSTEM_INSTRUCTION: &str =
    "You are YLDL4u, a helpful and friendly AI assistant. Your responses should be informative and engaging.";

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

pub fn system_instruction_from_env() -> String {
    let from_env = std::env::var(SYSTEM_INSTRUCTION_ENV_VAR).ok();
    sanitize_system_instruction(from_env)
}

fn sanitize_system_instruction(raw: Option<String>) -> String {
    let Some(value) = raw else {
        return DEFAULT_SYSTEM_INSTRUCTION.to_string();
    };

    let trimmed = value.trim();
    if trimmed.is_empty() {
        DEFAULT_SYSTEM_INSTRUCTION.to_string()
    } else {
        trimmed.to_string()
    }
}

impl App {
    pub fn new() -> Self {
        Self::with_system_instruction(None)
    }

    pub fn with_system_instruction(system_instruction: Option<String>) -> Self {
        Self {
            mode: Mode::Idle,
            transcript: Vec::new(),
            conversation: Vec::new(),
            pending_turn_memory: None,
            system_instruction: sanitize_system_instruction(system_instruction),
        }
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    /// Returns model-facing conversation messages retained across turns.
    pub fn conversation_messages(&self) -> &[TurnMessage] {
        &self.conversation
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.mode, Mode::Loading { .. })
    }

    /// True while a turn is loading and no reply text has arrived yet, which
    /// is exactly when the transcript still ends with the submitted prompt.
    pub fn typing_indicator_visible(&self) -> bool {
        self.is_loading()
            && self
                .transcript
                .last()
                .is_some_and(|message| message.role == Role::User)
    }

    pub fn on_submit(&mut self, input: &str, host: &mut dyn HostOps) {
        let prompt = input.trim().to_string();
        if prompt.is_empty() || self.is_loading() {
            return;
        }

        let turn_messages = self.turn_messages_with_pending_user_prompt(&prompt);

        self.transcript.push(Message {
            role: Role::User,
            text: prompt.clone(),
            streaming: false,
            turn_id: None,
        });

        match host.start_turn(turn_messages, self.system_instruction.clone()) {
            Ok(turn_id) => {
                self.pending_turn_memory = Some(PendingTurnMemory {
                    turn_id,
                    entries: vec![TurnMessage::user(&prompt)],
                });
                self.mode = Mode::Loading { turn_id };
            }
            Err(_) => {
                self.push_fallback_reply();
            }
        }
    }

    pub fn on_turn_started(&mut self, turn_id: TurnId) {
        if !self.is_active_turn(turn_id) || self.has_model_reply_for_turn(turn_id) {
            return;
        }

        self.transcript.push(Message {
            role: Role::Model,
            text: String::new(),
            streaming: true,
            turn_id: Some(turn_id),
        });
    }

    pub fn on_turn_chunk(&mut self, turn_id: TurnId, chunk: &str) {
        if !self.is_active_turn(turn_id) {
            return;
        }

        if let Some(message) = self
            .transcript
            .iter_mut()
            .rev()
            .find(|message| message.role == Role::Model && message.turn_id == Some(turn_id))
        {
            message.text.push_str(chunk);
        } else {
            self.transcript.push(Message {
                role: Role::Model,
                text: chunk.to_string(),
                streaming: true,
                turn_id: Some(turn_id),
            });
        }

        self.append_pending_model_chunk(turn_id, chunk);
    }

    pub fn on_turn_finished(&mut self, turn_id: TurnId) {
        if !self.is_active_turn(turn_id) {
            return;
        }

        self.finalize_stream(turn_id);
        self.commit_pending_turn_memory(turn_id);
        self.mode = Mode::Idle;
    }

    /// Failure detail never reaches the transcript; callers log it and the
    /// user sees the same fixed reply for every cause.
    pub fn on_turn_failed(&mut self, turn_id: TurnId) {
        if !self.is_active_turn(turn_id) {
            return;
        }

        self.finalize_stream(turn_id);
        self.discard_pending_turn_memory(turn_id);
        self.push_fallback_reply();
        self.mode = Mode::Idle;
    }

    fn turn_messages_with_pending_user_prompt(&self, prompt: &str) -> Vec<TurnMessage> {
        let mut messages = self.conversation.clone();
        messages.push(TurnMessage::user(prompt));
        messages
    }

    fn push_fallback_reply(&mut self) {
        self.transcript.push(Message {
            role: Role::Model,
            text: FALLBACK_REPLY.to_string(),
            streaming: false,
            turn_id: None,
        });
    }

    fn append_pending_model_chunk(&mut self, turn_id: TurnId, chunk: &str) {
        if chunk.is_empty() {
            return;
        }

        let Some(pending) = self.pending_turn_memory.as_mut() else {
            return;
        };
        if pending.turn_id != turn_id {
            return;
        }

        if let Some(TurnMessage::ModelText { text }) = pending.entries.last_mut() {
            text.push_str(chunk);
            return;
        }

        pending.entries.push(TurnMessage::model(chunk));
    }

    fn commit_pending_turn_memory(&mut self, turn_id: TurnId) {
        let Some(pending) = self.pending_turn_memory.take() else {
            return;
        };

        assert_eq!(
            pending.turn_id, turn_id,
            "pending turn memory belongs to turn {}, cannot commit turn {turn_id}",
            pending.turn_id
        );

        self.conversation.extend(pending.entries);
    }

    fn discard_pending_turn_memory(&mut self, turn_id: TurnId) {
        let Some(pending) = self.pending_turn_memory.take() else {
            return;
        };

        assert_eq!(
            pending.turn_id, turn_id,
            "pending turn memory belongs to turn {}, cannot discard turn {turn_id}",
            pending.turn_id
        );
    }

    fn is_active_turn(&self, turn_id: TurnId) -> bool {
        matches!(self.mode, Mode::Loading { turn_id: active } if active == turn_id)
    }

    fn finalize_stream(&mut self, turn_id: TurnId) {
        for message in &mut self.transcript {
            if message.role == Role::Model && message.turn_id == Some(turn_id) {
                message.streaming = false;
            }
        }
    }

    fn has_model_reply_for_turn(&self, turn_id: TurnId) -> bool {
        self.transcript
            .iter()
            .any(|message| message.role == Role::Model && message.turn_id == Some(turn_id))
    }
}
