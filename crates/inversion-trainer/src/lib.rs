//! Exercise engine for triad inversion training.
//!
//! A single-threaded, sans-IO session controller: host collaborators push
//! [`InputEvent`]s in (key clicks, detected pitches, elapsed timers) and
//! receive [`Command`]s out (highlights, tones, feedback, timer schedules).
//! The engine owns all session state exclusively; collaborators never mutate
//! it. Delays are never awaited here: the engine emits schedule commands
//! carrying durations and the host calls back with the matching timer event.

pub mod commands;
pub mod events;
mod hints;
pub mod session;

pub use commands::{Command, FeedbackKind, TimerToken};
pub use events::InputEvent;
pub use session::{Phase, Trainer, TrainerError, DEFAULT_OCTAVE, HINT_DELAY};
