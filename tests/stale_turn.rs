use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::time::Duration;

use chat_provider::{ChatProvider, ProviderProfile, TurnEvent, TurnRequest};
use yldl4u::app::{App, Mode, Role};
use yldl4u::runtime::TurnRunner;

/// Emits a clean reply and then keeps talking after its own terminal event.
struct NoisyProvider;

impl ChatProvider for NoisyProvider {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            provider_id: "noisy".to_string(),
            model_id: "noisy-model".to_string(),
        }
    }

    fn run_turn(
        &self,
        req: TurnRequest,
        emit: &mut dyn FnMut(TurnEvent),
    ) -> Result<(), String> {
        let turn_id = req.turn_id;
        emit(TurnEvent::Started { turn_id });
        emit(TurnEvent::Chunk {
            turn_id,
            text: "Hello".to_string(),
        });
        emit(TurnEvent::Finished { turn_id });
        emit(TurnEvent::Chunk {
            turn_id,
            text: " late noise".to_string(),
        });
        emit(TurnEvent::Finished { turn_id });
        Ok(())
    }
}

fn drive_active_turn(app: &mut App, runner: &Arc<TurnRunner>, events: &Receiver<TurnEvent>) {
    let Mode::Loading { turn_id } = app.mode.clone() else {
        panic!("expected an active turn");
    };

    while app.is_loading() {
        let event = events
            .recv_timeout(Duration::from_secs(5))
            .expect("turn event before timeout");
        if event.turn_id() != turn_id {
            continue;
        }

        match event {
            TurnEvent::Started { turn_id } => app.on_turn_started(turn_id),
            TurnEvent::Chunk { turn_id, text } => app.on_turn_chunk(turn_id, &text),
            TurnEvent::Finished { turn_id } => app.on_turn_finished(turn_id),
            TurnEvent::Failed { turn_id, .. } => app.on_turn_failed(turn_id),
        }
    }

    runner.clear_active_turn_if_matching(turn_id);
}

#[test]
fn trailing_events_from_a_finished_turn_never_reach_the_next_turn() {
    let (events_tx, events_rx) = mpsc::channel();
    let runner = TurnRunner::new(Arc::new(NoisyProvider), events_tx);
    let mut app = App::new();
    let mut host = Arc::clone(&runner);

    app.on_submit("first", &mut host);
    drive_active_turn(&mut app, &runner, &events_rx);

    assert_eq!(app.transcript.len(), 2);
    assert_eq!(app.transcript[1].text, "Hello");

    app.on_submit("second", &mut host);
    drive_active_turn(&mut app, &runner, &events_rx);

    assert_eq!(app.mode, Mode::Idle);
    assert_eq!(app.transcript.len(), 4);
    assert_eq!(app.transcript[2].role, Role::User);
    assert_eq!(app.transcript[3].text, "Hello");
    assert!(app
        .transcript
        .iter()
        .all(|message| !message.text.contains("late noise")));
}
