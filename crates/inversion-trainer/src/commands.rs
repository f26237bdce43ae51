use std::time::Duration;

use serde::{Deserialize, Serialize};
use triad_theory::{InversionKind, PitchClass};

/// Identity of a scheduled hint timer.
///
/// Tokens are generation counters: re-arming hands out a new token and the
/// engine ignores any fired timer whose token no longer matches, so at most
/// one hint timer is live per exercise even if the host never cancels the
/// old one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerToken(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    /// Completed with zero mistakes and no hint.
    Perfect,
    /// Completed, but with mistakes or a hint along the way.
    Good,
    /// Right notes, wrong bass degree.
    WrongInversion,
}

/// Outbound requests to host collaborators (UI, audio, timer loop).
///
/// The engine emits these synchronously from each event; it never performs
/// the side effects itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "command")]
pub enum Command {
    DisplayInversion {
        name: String,
        kind: InversionKind,
    },
    HighlightReference {
        pitch_class: PitchClass,
        octave: u8,
    },
    HighlightCorrect {
        pitch_class: PitchClass,
        octave: u8,
    },
    HighlightIncorrect {
        pitch_class: PitchClass,
        octave: u8,
    },
    ShowHint {
        pitch_class: PitchClass,
        octave: u8,
    },
    ClearHighlights,
    /// Sound a note; `delay` of zero means immediately, non-zero delays are
    /// used for the staggered success replay.
    PlayTone {
        pitch_class: PitchClass,
        octave: u8,
        delay: Duration,
    },
    PlayErrorSound,
    ShowFeedback {
        kind: FeedbackKind,
        message: String,
    },
    SetInputEnabled {
        enabled: bool,
    },
    /// Arm the hint timer; deliver `InputEvent::HintTimerElapsed { token }`
    /// after `delay` unless cancelled or re-armed first.
    ArmHintTimer {
        token: TimerToken,
        delay: Duration,
    },
    CancelHintTimer,
    /// Deliver `InputEvent::AdvanceTimerElapsed` after `delay`.
    ScheduleAdvance {
        delay: Duration,
    },
    /// Deliver `InputEvent::RetryTimerElapsed` after `delay`.
    ScheduleRetry {
        delay: Duration,
    },
}
