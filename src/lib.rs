//! Terminal chat client for Google Gemini with streamed replies.
//!
//! ## Provider bootstrap
//!
//! `yldl4u` talks to Gemini by default and falls back to a scripted local
//! provider for offline runs:
//!
//! - `YLDL4U_PROVIDER=gemini` (default) streams replies from the Gemini API
//! - `YLDL4U_PROVIDER=mock` for deterministic local sessions and tests
//!
//! The Gemini provider reads its key from `GEMINI_API_KEY` (or `API_KEY`)
//! and its model from `YLDL4U_MODEL`, defaulting to `gemini-2.5-flash`.
//! When provider initialization fails the client still starts: it reports
//! the cause once on stderr and answers every message with the fixed
//! fallback reply instead of calling the network.
//!
//! ## System instruction
//!
//! Every turn carries a system instruction. Set `YLDL4U_SYSTEM_INSTRUCTIONS`
//! to override the built-in YLDL4u persona.
//!
//! Conversation memory contract: the app owns model-facing history and
//! replays it on every turn through provider-neutral `TurnMessage` items.
//! An exchange joins history only after its turn finishes cleanly; failed
//! turns leave history untouched.

pub mod app;
pub mod providers;
pub mod runtime;
pub mod view;
