//! Deterministic mock implementation of the shared `chat_provider` contract.
//!
//! This crate contains no transport/protocol logic and is intended for local
//! development without credentials and for contract-level integration testing.

use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use chat_provider::{ChatProvider, ProviderProfile, TurnEvent, TurnRequest};

/// Stable provider identifier used for explicit startup selection.
pub const MOCK_PROVIDER_ID: &str = "mock";

/// Deterministic mock provider used by tests and offline runs.
///
/// Replies are consumed in order, one per turn; once the script runs out the
/// last reply repeats. Each reply is emitted token by token so callers
/// exercise the same incremental append path a real stream produces.
#[derive(Debug)]
pub struct MockProvider {
    replies: Vec<String>,
    cursor: Mutex<usize>,
}

impl MockProvider {
    const TURN_DELAY_MS: u64 = 400;
    const TOKEN_DELAY_MS: u64 = 40;

    /// Creates a mock provider with caller-provided scripted replies.
    #[must_use]
    pub fn new(replies: Vec<String>) -> Self {
        Self {
            replies,
            cursor: Mutex::new(0),
        }
    }

    fn next_reply(&self) -> Option<String> {
        if self.replies.is_empty() {
            return None;
        }

        let mut cursor = lock_unpoisoned(&self.cursor);
        let reply = self.replies[(*cursor).min(self.replies.len() - 1)].clone();
        *cursor += 1;
        Some(reply)
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(vec![
            "Hi there! I'm a scripted stand-in for the hosted model, so nothing you type \
             leaves this machine.\n"
                .to_string(),
            "Replies stream one token at a time, which makes the typing indicator and \
             incremental transcript updates easy to watch.\n"
                .to_string(),
            "That's the whole script. From here on this reply repeats for every message.\n"
                .to_string(),
        ])
    }
}

impl ChatProvider for MockProvider {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            provider_id: MOCK_PROVIDER_ID.to_string(),
            model_id: "mock".to_string(),
        }
    }

    fn run_turn(&self, req: TurnRequest, emit: &mut dyn FnMut(TurnEvent)) -> Result<(), String> {
        let turn_id = req.turn_id;

        // Simulated connection setup; the typing indicator covers this window.
        thread::sleep(Duration::from_millis(Self::TURN_DELAY_MS));
        emit(TurnEvent::Started { turn_id });

        if let Some(reply) = self.next_reply() {
            let mut pending_token = String::new();
            for ch in reply.chars() {
                pending_token.push(ch);

                if matches!(ch, ' ' | '\n') {
                    emit(TurnEvent::Chunk {
                        turn_id,
                        text: std::mem::take(&mut pending_token),
                    });
                    thread::sleep(Duration::from_millis(Self::TOKEN_DELAY_MS));
                }
            }

            if !pending_token.is_empty() {
                emit(TurnEvent::Chunk {
                    turn_id,
                    text: pending_token,
                });
            }
        }

        emit(TurnEvent::Finished { turn_id });
        Ok(())
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use chat_provider::TurnMessage;

    use super::*;

    fn collect_events(provider: &MockProvider) -> Vec<TurnEvent> {
        let mut events = Vec::new();
        provider
            .run_turn(
                TurnRequest {
                    turn_id: 7,
                    messages: vec![TurnMessage::user("test")],
                    system_instruction: "system instruction".to_string(),
                },
                &mut |event| events.push(event),
            )
            .expect("mock turn should succeed");
        events
    }

    #[test]
    fn profile_exposes_explicit_mock_provider_identity() {
        let profile = MockProvider::new(Vec::new()).profile();

        assert_eq!(profile.provider_id, MOCK_PROVIDER_ID);
        assert_eq!(profile.model_id, "mock");
    }

    #[test]
    fn run_turn_emits_started_chunks_and_finished() {
        let provider = MockProvider::new(vec!["one two".to_string()]);

        let events = collect_events(&provider);

        assert!(matches!(
            events.first(),
            Some(TurnEvent::Started { turn_id: 7 })
        ));
        assert!(matches!(
            events.last(),
            Some(TurnEvent::Finished { turn_id: 7 })
        ));
        let chunks: Vec<&str> = events
            .iter()
            .filter_map(|event| match event {
                TurnEvent::Chunk { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(chunks, vec!["one ", "two"]);
    }

    #[test]
    fn replies_are_consumed_in_order_and_last_repeats() {
        let provider = MockProvider::new(vec!["first".to_string(), "second".to_string()]);

        let reply_text = |events: &[TurnEvent]| {
            events
                .iter()
                .filter_map(|event| match event {
                    TurnEvent::Chunk { text, .. } => Some(text.clone()),
                    _ => None,
                })
                .collect::<String>()
        };

        assert_eq!(reply_text(&collect_events(&provider)), "first");
        assert_eq!(reply_text(&collect_events(&provider)), "second");
        assert_eq!(reply_text(&collect_events(&provider)), "second");
    }

    #[test]
    fn empty_script_still_emits_clean_lifecycle() {
        let provider = MockProvider::new(Vec::new());

        let events = collect_events(&provider);

        assert_eq!(
            events,
            vec![
                TurnEvent::Started { turn_id: 7 },
                TurnEvent::Finished { turn_id: 7 },
            ]
        );
    }
}
