use std::io::{self, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use chat_provider::{TurnEvent, TurnId};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use yldl4u::app::{system_instruction_from_env, App, Mode, Role, FALLBACK_REPLY};
use yldl4u::providers;
use yldl4u::runtime::TurnRunner;
use yldl4u::view;

const INDICATOR_TICK: Duration = Duration::from_millis(120);

fn main() -> io::Result<()> {
    init_tracing()?;

    let mut app = App::with_system_instruction(Some(system_instruction_from_env()));

    let provider = match providers::provider_from_env() {
        Ok(provider) => Some(provider),
        Err(error) => {
            tracing::error!("chat provider initialization failed: {error}");
            eprintln!("{}", view::offline_notice(error.message()));
            None
        }
    };
    let profile = provider.as_ref().map(|provider| provider.profile());

    let (events_tx, events_rx) = mpsc::channel();
    let mut host = match provider {
        Some(provider) => TurnRunner::new(provider, events_tx),
        None => TurnRunner::disconnected(events_tx),
    };

    println!("{}", view::banner(profile.as_ref()));
    println!();

    let mut editor = DefaultEditor::new().map_err(io::Error::other)?;

    loop {
        match editor.readline(&view::user_prompt()) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }

                let _ = editor.add_history_entry(line.as_str());

                let transcript_watermark = app.transcript.len();
                app.on_submit(&line, &mut host);

                match app.mode.clone() {
                    Mode::Loading { turn_id } => {
                        pump_turn(&mut app, &host, &events_rx, turn_id)?;
                    }
                    Mode::Idle => print_unstreamed_replies(&app, transcript_watermark)?,
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", view::dim("^C"));
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("{}", view::dim("bye"));
                break;
            }
            Err(error) => {
                tracing::error!("prompt input failed: {error}");
                break;
            }
        }
    }

    Ok(())
}

fn init_tracing() -> io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).map_err(io::Error::other)
}

/// Applies turn events in arrival order until the active turn reaches a
/// terminal event, mirroring each transcript change on stdout as it happens.
/// Ticks between events animate the typing indicator.
fn pump_turn(
    app: &mut App,
    runner: &Arc<TurnRunner>,
    events: &Receiver<TurnEvent>,
    turn_id: TurnId,
) -> io::Result<()> {
    let mut stdout = io::stdout();
    let mut indicator_visible = false;
    let mut reply_started = false;

    while app.is_loading() {
        let event = match events.recv_timeout(INDICATOR_TICK) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) => {
                if app.typing_indicator_visible() {
                    write!(
                        stdout,
                        "{}{}",
                        view::erase_line(),
                        view::typing_indicator_frame()
                    )?;
                    stdout.flush()?;
                    indicator_visible = true;
                }
                continue;
            }
            Err(RecvTimeoutError::Disconnected) => TurnEvent::Failed {
                turn_id,
                error: "turn event channel disconnected".to_string(),
            },
        };

        if event.turn_id() != turn_id {
            tracing::debug!("dropping stale event from turn {}", event.turn_id());
            continue;
        }

        if indicator_visible {
            write!(stdout, "{}", view::erase_line())?;
            indicator_visible = false;
        }

        match event {
            TurnEvent::Started { turn_id } => {
                app.on_turn_started(turn_id);
                write!(stdout, "{}", view::reply_prefix())?;
                stdout.flush()?;
                reply_started = true;
            }
            TurnEvent::Chunk { turn_id, text } => {
                app.on_turn_chunk(turn_id, &text);
                if !reply_started {
                    write!(stdout, "{}", view::reply_prefix())?;
                    reply_started = true;
                }
                write!(stdout, "{text}")?;
                stdout.flush()?;
            }
            TurnEvent::Finished { turn_id } => {
                tracing::debug!("turn {turn_id} finished");
                app.on_turn_finished(turn_id);
                if reply_started {
                    writeln!(stdout)?;
                }
                writeln!(stdout)?;
            }
            TurnEvent::Failed { turn_id, error } => {
                tracing::warn!("turn {turn_id} failed: {error}");
                app.on_turn_failed(turn_id);
                if reply_started {
                    writeln!(stdout)?;
                }
                writeln!(stdout, "{}{FALLBACK_REPLY}", view::reply_prefix())?;
                writeln!(stdout)?;
            }
        }
    }

    runner.clear_active_turn_if_matching(turn_id);
    Ok(())
}

/// Prints model replies appended during a submit that never became a turn,
/// which is how fallback replies surface when the provider is disconnected.
fn print_unstreamed_replies(app: &App, transcript_watermark: usize) -> io::Result<()> {
    let mut stdout = io::stdout();

    for message in app.transcript.iter().skip(transcript_watermark) {
        if message.role == Role::Model {
            writeln!(stdout, "{}{}", view::reply_prefix(), message.text)?;
            writeln!(stdout)?;
        }
    }

    Ok(())
}
