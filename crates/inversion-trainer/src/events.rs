use serde::{Deserialize, Serialize};
use triad_theory::PitchClass;

use crate::commands::TimerToken;

/// Inbound events from host collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum InputEvent {
    /// A note from the on-screen or MIDI keyboard, octave known.
    NotePlayed { pitch_class: PitchClass, octave: u8 },
    /// A note from the microphone pitch detector. The octave is not
    /// recoverable from pitch class alone; the engine assumes a default.
    ExternalNoteDetected { pitch_class: PitchClass },
    /// The hint timer armed with this token elapsed.
    HintTimerElapsed { token: TimerToken },
    /// The post-success delay elapsed; move to the next exercise.
    AdvanceTimerElapsed,
    /// The post-wrong-voicing delay elapsed; retry the same exercise.
    RetryTimerElapsed,
}
