use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use chat_provider::{ChatProvider, TurnEvent, TurnId, TurnMessage, TurnRequest};

use crate::app::HostOps;

const ERROR_TURN_ALREADY_ACTIVE: &str = "Turn already active";
const ERROR_PROVIDER_DISCONNECTED: &str = "Chat provider is disconnected";

struct ActiveTurn {
    turn_id: TurnId,
    join_handle: Option<JoinHandle<()>>,
}

/// Runs one provider turn at a time on a worker thread and forwards its
/// lifecycle events to the channel given at construction.
///
/// A runner built with [`TurnRunner::disconnected`] refuses every turn, which
/// keeps the chat usable after provider initialization fails: submissions
/// still produce the fallback reply without touching the network.
pub struct TurnRunner {
    provider: Option<Arc<dyn ChatProvider>>,
    events: Sender<TurnEvent>,
    next_turn_id: AtomicU64,
    active_turn: Mutex<Option<ActiveTurn>>,
}

impl TurnRunner {
    pub fn new(provider: Arc<dyn ChatProvider>, events: Sender<TurnEvent>) -> Arc<Self> {
        Self::with_provider(Some(provider), events)
    }

    pub fn disconnected(events: Sender<TurnEvent>) -> Arc<Self> {
        Self::with_provider(None, events)
    }

    fn with_provider(
        provider: Option<Arc<dyn ChatProvider>>,
        events: Sender<TurnEvent>,
    ) -> Arc<Self> {
        Arc::new(Self {
            provider,
            events,
            next_turn_id: AtomicU64::new(1),
            active_turn: Mutex::new(None),
        })
    }

    pub fn is_disconnected(&self) -> bool {
        self.provider.is_none()
    }

    fn start_turn_internal(
        self: &Arc<Self>,
        messages: Vec<TurnMessage>,
        system_instruction: String,
    ) -> Result<TurnId, String> {
        let Some(provider) = self.provider.as_ref() else {
            tracing::warn!("refusing turn: chat provider is disconnected");
            return Err(ERROR_PROVIDER_DISCONNECTED.to_string());
        };

        let mut active_turn = self.lock_active_turn();
        if active_turn.is_some() {
            return Err(ERROR_TURN_ALREADY_ACTIVE.to_string());
        }

        let turn_id = self.next_turn_id.fetch_add(1, Ordering::SeqCst);
        tracing::debug!("starting turn {turn_id} with {} messages", messages.len());

        let request = TurnRequest {
            turn_id,
            messages,
            system_instruction,
        };
        let join_handle = self.spawn_worker(Arc::clone(provider), request)?;

        *active_turn = Some(ActiveTurn {
            turn_id,
            join_handle: Some(join_handle),
        });

        Ok(turn_id)
    }

    fn spawn_worker(
        self: &Arc<Self>,
        provider: Arc<dyn ChatProvider>,
        request: TurnRequest,
    ) -> Result<JoinHandle<()>, String> {
        let turn_id = request.turn_id;
        let runner = Arc::clone(self);
        thread::Builder::new()
            .name(format!("yldl4u-turn-{turn_id}"))
            .spawn(move || runner.turn_worker(provider, request))
            .map_err(|error| format!("Failed to spawn turn worker: {error}"))
    }

    fn turn_worker(self: Arc<Self>, provider: Arc<dyn ChatProvider>, request: TurnRequest) {
        let turn_id = request.turn_id;
        let terminal_emitted = Arc::new(AtomicBool::new(false));
        let terminal_emitted_for_emit = Arc::clone(&terminal_emitted);
        let events = self.events.clone();

        let mut emit = move |event: TurnEvent| {
            if event.is_terminal() {
                terminal_emitted_for_emit.store(true, Ordering::SeqCst);
            }

            let _ = events.send(event);
        };

        let turn_outcome = catch_unwind(AssertUnwindSafe(|| provider.run_turn(request, &mut emit)));

        match turn_outcome {
            Ok(Ok(())) => {}
            Ok(Err(error)) => emit(TurnEvent::Failed { turn_id, error }),
            Err(_) => emit(TurnEvent::Failed {
                turn_id,
                error: "Chat provider panicked".to_string(),
            }),
        }

        if !terminal_emitted.load(Ordering::SeqCst) && self.is_active_turn_id(turn_id) {
            emit(TurnEvent::Failed {
                turn_id,
                error: "Chat provider exited without terminal event".to_string(),
            });
        }
    }

    /// Releases the worker slot once the consumer has applied the turn's
    /// terminal event. Joins the worker only when it has already exited so a
    /// misbehaving provider cannot stall the caller.
    pub fn clear_active_turn_if_matching(&self, turn_id: TurnId) {
        let mut active_turn = self.lock_active_turn();
        let matches = active_turn.as_ref().map(|active| active.turn_id) == Some(turn_id);
        if !matches {
            return;
        }

        let mut completed = match active_turn.take() {
            Some(completed) => completed,
            None => return,
        };

        if let Some(join_handle) = completed.join_handle.take() {
            if join_handle.is_finished() {
                let _ = join_handle.join();
            }
        }
    }

    fn is_active_turn_id(&self, turn_id: TurnId) -> bool {
        self.lock_active_turn()
            .as_ref()
            .map(|active| active.turn_id)
            == Some(turn_id)
    }

    fn lock_active_turn(&self) -> MutexGuard<'_, Option<ActiveTurn>> {
        lock_unpoisoned(&self.active_turn)
    }
}

impl HostOps for Arc<TurnRunner> {
    fn start_turn(
        &mut self,
        messages: Vec<TurnMessage>,
        system_instruction: String,
    ) -> Result<TurnId, String> {
        self.start_turn_internal(messages, system_instruction)
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
