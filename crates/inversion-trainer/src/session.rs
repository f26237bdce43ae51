use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use thiserror::Error;
use tracing::{debug, info};

use triad_theory::{check_voicing, Inversion, PitchClass};

use crate::commands::{Command, FeedbackKind, TimerToken};
use crate::events::InputEvent;
use crate::hints::hint_octave;

/// Octave assumed when none is known (external pitch detection, reference
/// display base, hints before any note is played).
pub const DEFAULT_OCTAVE: u8 = 4;

/// Idle time after the most recent correct note before a hint fires.
pub const HINT_DELAY: Duration = Duration::from_secs(5);

/// Mistakes within one exercise that trigger an immediate hint.
const MISTAKE_HINT_THRESHOLD: u32 = 3;

/// Pause before the success replay starts.
const REPLAY_LEAD_IN: Duration = Duration::from_millis(500);
/// Gap between replayed notes so the voicing is audible.
const REPLAY_STAGGER: Duration = Duration::from_millis(100);
/// Delay from success feedback to the next exercise.
const ADVANCE_DELAY: Duration = Duration::from_millis(2500);
/// Delay from wrong-voicing feedback to the retry reset.
const RETRY_DELAY: Duration = Duration::from_millis(2000);

#[derive(Debug, Error)]
pub enum TrainerError {
    #[error("cannot start a session with no inversions selected")]
    EmptySelection,
}

/// Where the session stands within one exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No session running.
    Idle,
    /// Exercise displayed, waiting for the first note.
    AwaitingFirstNote,
    /// Notes accumulating.
    InProgress,
    /// Verdict delivered, waiting for the advance or retry timer.
    Resolving,
}

/// Shuffled exercise queue. Exhausting it reshuffles and wraps, so
/// exercises recur in de-correlated random order without running out.
struct ExerciseQueue {
    items: Vec<Arc<Inversion>>,
    cursor: usize,
}

/// The exercise session controller.
///
/// Owns all mutable session state exclusively. Every mutation happens
/// synchronously inside [`Trainer::handle`] (or the explicit operations),
/// which return the commands the host must carry out.
pub struct Trainer {
    phase: Phase,
    queue: Option<ExerciseQueue>,
    current: Option<Arc<Inversion>>,
    /// Distinct correct pitch classes collected this exercise, capped at 3.
    correct_notes: BTreeSet<PitchClass>,
    /// Raw played notes as octave-aware semitone values, arrival order.
    played_notes: Vec<u8>,
    mistakes: u32,
    hints_used: bool,
    exercise_started: bool,
    started_at: Option<Instant>,
    /// Token of the currently armed hint timer, if any.
    hint_timer: Option<TimerToken>,
    next_token: u64,
    rng: StdRng,
}

impl Trainer {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic shuffling for tests and reproducible practice runs.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            phase: Phase::Idle,
            queue: None,
            current: None,
            correct_notes: BTreeSet::new(),
            played_notes: Vec::new(),
            mistakes: 0,
            hints_used: false,
            exercise_started: false,
            started_at: None,
            hint_timer: None,
            next_token: 0,
            rng,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current(&self) -> Option<&Arc<Inversion>> {
        self.current.as_ref()
    }

    pub fn mistakes(&self) -> u32 {
        self.mistakes
    }

    pub fn hints_used(&self) -> bool {
        self.hints_used
    }

    pub fn correct_count(&self) -> usize {
        self.correct_notes.len()
    }

    /// Time since the first note of the current exercise, if started.
    pub fn exercise_elapsed(&self) -> Option<Duration> {
        self.started_at.map(|started| started.elapsed())
    }

    /// Begin a session over a filtered, non-empty inversion list.
    ///
    /// The list is shuffled uniformly (Fisher-Yates via `SliceRandom`) and
    /// the first exercise is displayed immediately.
    pub fn start_session(
        &mut self,
        inversions: Vec<Arc<Inversion>>,
    ) -> Result<Vec<Command>, TrainerError> {
        if inversions.is_empty() {
            return Err(TrainerError::EmptySelection);
        }
        let mut items = inversions;
        items.shuffle(&mut self.rng);
        info!(count = items.len(), "session started");
        self.queue = Some(ExerciseQueue { items, cursor: 0 });
        Ok(self.advance())
    }

    /// Dispatch one inbound event. No-ops return an empty command list.
    pub fn handle(&mut self, event: InputEvent) -> Vec<Command> {
        match event {
            InputEvent::NotePlayed { pitch_class, octave } => {
                self.on_note(pitch_class, octave, true)
            }
            InputEvent::ExternalNoteDetected { pitch_class } => {
                self.on_note(pitch_class, DEFAULT_OCTAVE, false)
            }
            InputEvent::HintTimerElapsed { token } => self.on_hint_timer(token),
            InputEvent::AdvanceTimerElapsed => {
                if self.phase == Phase::Resolving {
                    self.advance()
                } else {
                    Vec::new()
                }
            }
            InputEvent::RetryTimerElapsed => self.on_retry(),
        }
    }

    /// Move to the next queued exercise, reshuffling the queue when the
    /// cursor has run off the end. Also usable by hosts as a skip control.
    pub fn advance(&mut self) -> Vec<Command> {
        let Some(queue) = self.queue.as_mut() else {
            return Vec::new();
        };
        if queue.cursor >= queue.items.len() {
            queue.items.shuffle(&mut self.rng);
            queue.cursor = 0;
            debug!("exercise queue exhausted, reshuffled");
        }
        let inversion = Arc::clone(&queue.items[queue.cursor]);
        queue.cursor += 1;

        self.reset_exercise_state();
        debug!(inversion = %inversion.id, "next exercise");
        self.current = Some(Arc::clone(&inversion));
        self.phase = Phase::AwaitingFirstNote;
        self.display_commands(&inversion)
    }

    /// End the session and drop all state.
    pub fn stop(&mut self) -> Vec<Command> {
        self.reset_exercise_state();
        self.current = None;
        self.queue = None;
        self.phase = Phase::Idle;
        vec![
            Command::CancelHintTimer,
            Command::ClearHighlights,
            Command::SetInputEnabled { enabled: false },
        ]
    }

    fn on_note(&mut self, pitch_class: PitchClass, octave: u8, audible: bool) -> Vec<Command> {
        let Some(inversion) = self.current.clone() else {
            return Vec::new();
        };
        if matches!(self.phase, Phase::Idle | Phase::Resolving) {
            return Vec::new();
        }

        let mut commands = Vec::new();
        if !self.exercise_started {
            self.exercise_started = true;
            self.started_at = Some(Instant::now());
            self.phase = Phase::InProgress;
            // The reference glow is stale once the learner starts playing.
            commands.push(Command::ClearHighlights);
            commands.push(self.arm_hint_timer());
        }

        let absolute = octave * 12 + pitch_class.value();

        if inversion.contains(pitch_class) {
            if self.correct_notes.contains(&pitch_class) {
                // Repeated presses of an already-correct tone are ignored,
                // not penalized, even at a different octave.
                debug!(%pitch_class, "duplicate correct note ignored");
                return commands;
            }
            self.correct_notes.insert(pitch_class);
            self.played_notes.push(absolute);
            commands.push(Command::HighlightCorrect { pitch_class, octave });
            if audible {
                commands.push(Command::PlayTone {
                    pitch_class,
                    octave,
                    delay: Duration::ZERO,
                });
            }
            commands.push(Command::CancelHintTimer);
            self.hint_timer = None;

            if self.correct_notes.len() == 3 {
                commands.extend(self.resolve(&inversion));
            } else {
                commands.push(self.arm_hint_timer());
            }
        } else {
            commands.push(Command::HighlightIncorrect { pitch_class, octave });
            commands.push(Command::PlayErrorSound);
            self.mistakes += 1;
            debug!(%pitch_class, mistakes = self.mistakes, "incorrect note");
            if self.mistakes >= MISTAKE_HINT_THRESHOLD && !self.hints_used {
                commands.extend(self.show_hint(&inversion));
            }
        }
        commands
    }

    /// All three chord tones collected: deliver the verdict.
    fn resolve(&mut self, inversion: &Inversion) -> Vec<Command> {
        self.phase = Phase::Resolving;
        let mut commands = vec![Command::SetInputEnabled { enabled: false }];

        if check_voicing(&self.played_notes, inversion) {
            let kind = if self.mistakes == 0 && !self.hints_used {
                FeedbackKind::Perfect
            } else {
                FeedbackKind::Good
            };
            info!(inversion = %inversion.id, ?kind, "voicing accepted");
            let message = match kind {
                FeedbackKind::Perfect => "Perfect!",
                _ => "Good job!",
            };
            commands.push(Command::ShowFeedback {
                kind,
                message: message.to_string(),
            });

            // Replay the voicing bottom-to-top so the inversion is audible.
            let mut replay = self.played_notes.clone();
            replay.sort_unstable();
            for (i, &note) in replay.iter().enumerate() {
                commands.push(Command::PlayTone {
                    pitch_class: PitchClass::from_semitone(note),
                    octave: note / 12,
                    delay: REPLAY_LEAD_IN + REPLAY_STAGGER * i as u32,
                });
            }
            commands.push(Command::ScheduleAdvance {
                delay: ADVANCE_DELAY,
            });
        } else {
            info!(inversion = %inversion.id, "right notes, wrong inversion");
            commands.push(Command::ShowFeedback {
                kind: FeedbackKind::WrongInversion,
                message: "Wrong inversion! Try again.".to_string(),
            });
            commands.push(Command::PlayErrorSound);
            commands.push(Command::ScheduleRetry { delay: RETRY_DELAY });
        }
        commands
    }

    /// Retry the same inversion after a wrong voicing: counters reset, the
    /// queue cursor does not move.
    fn on_retry(&mut self) -> Vec<Command> {
        if self.phase != Phase::Resolving {
            return Vec::new();
        }
        let Some(inversion) = self.current.clone() else {
            return Vec::new();
        };
        self.reset_exercise_state();
        self.phase = Phase::AwaitingFirstNote;
        debug!(inversion = %inversion.id, "retrying same inversion");
        self.display_commands(&inversion)
    }

    fn on_hint_timer(&mut self, token: TimerToken) -> Vec<Command> {
        if self.hint_timer != Some(token) {
            debug!(?token, "stale hint timer ignored");
            return Vec::new();
        }
        self.hint_timer = None;
        if self.hints_used || self.phase != Phase::InProgress {
            return Vec::new();
        }
        let Some(inversion) = self.current.clone() else {
            return Vec::new();
        };
        self.show_hint(&inversion)
    }

    /// Show at most one hint per exercise: the first chord degree (root,
    /// third, fifth order) not yet collected, in a voicing-consistent octave.
    fn show_hint(&mut self, inversion: &Inversion) -> Vec<Command> {
        let Some(needed) = inversion
            .chord_notes
            .iter()
            .copied()
            .find(|pc| !self.correct_notes.contains(pc))
        else {
            return Vec::new();
        };
        self.hints_used = true;
        let octave = hint_octave(inversion, needed, &self.played_notes);
        info!(inversion = %inversion.id, %needed, octave, "hint shown");
        vec![Command::ShowHint {
            pitch_class: needed,
            octave,
        }]
    }

    fn arm_hint_timer(&mut self) -> Command {
        self.next_token += 1;
        let token = TimerToken(self.next_token);
        self.hint_timer = Some(token);
        Command::ArmHintTimer {
            token,
            delay: HINT_DELAY,
        }
    }

    fn reset_exercise_state(&mut self) {
        self.mistakes = 0;
        self.hints_used = false;
        self.exercise_started = false;
        self.correct_notes.clear();
        self.played_notes.clear();
        self.started_at = None;
        self.hint_timer = None;
    }

    fn display_commands(&self, inversion: &Inversion) -> Vec<Command> {
        let reference = inversion.reference_note;
        let pitch_class = PitchClass::from_semitone(reference);
        let octave = DEFAULT_OCTAVE + reference / 12;
        vec![
            Command::CancelHintTimer,
            Command::ClearHighlights,
            Command::SetInputEnabled { enabled: true },
            Command::DisplayInversion {
                name: inversion.display_name.clone(),
                kind: inversion.kind,
            },
            Command::HighlightReference { pitch_class, octave },
            Command::PlayTone {
                pitch_class,
                octave,
                delay: Duration::ZERO,
            },
        ]
    }
}

impl Default for Trainer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use triad_theory::{Catalog, ChordQuality, InversionKind};

    fn pc(name: &str) -> PitchClass {
        PitchClass::from_name(name).unwrap()
    }

    fn single(root: &str, quality: ChordQuality, kind: InversionKind) -> Vec<Arc<Inversion>> {
        let catalog = Catalog::new();
        vec![Arc::clone(
            catalog.lookup(pc(root), quality, kind).unwrap(),
        )]
    }

    fn play(trainer: &mut Trainer, name: &str, octave: u8) -> Vec<Command> {
        trainer.handle(InputEvent::NotePlayed {
            pitch_class: pc(name),
            octave,
        })
    }

    fn feedback_kind(commands: &[Command]) -> Option<FeedbackKind> {
        commands.iter().find_map(|c| match c {
            Command::ShowFeedback { kind, .. } => Some(*kind),
            _ => None,
        })
    }

    fn armed_token(commands: &[Command]) -> Option<TimerToken> {
        commands.iter().rev().find_map(|c| match c {
            Command::ArmHintTimer { token, .. } => Some(*token),
            _ => None,
        })
    }

    #[test]
    fn clean_completion_is_perfect() {
        let mut trainer = Trainer::with_seed(7);
        trainer
            .start_session(single("C", ChordQuality::Major, InversionKind::Root))
            .unwrap();
        assert_eq!(trainer.phase(), Phase::AwaitingFirstNote);

        play(&mut trainer, "C", 4);
        assert_eq!(trainer.phase(), Phase::InProgress);
        play(&mut trainer, "E", 4);
        let commands = play(&mut trainer, "G", 4);

        assert_eq!(feedback_kind(&commands), Some(FeedbackKind::Perfect));
        assert_eq!(trainer.phase(), Phase::Resolving);
        assert!(commands
            .iter()
            .any(|c| matches!(c, Command::ScheduleAdvance { .. })));
        // Staggered replay of all three notes
        let tones = commands
            .iter()
            .filter(|c| matches!(c, Command::PlayTone { delay, .. } if !delay.is_zero()))
            .count();
        assert_eq!(tones, 3);
    }

    #[test]
    fn duplicate_pitch_class_at_other_octave_does_not_complete() {
        let mut trainer = Trainer::with_seed(7);
        trainer
            .start_session(single("C", ChordQuality::Major, InversionKind::Root))
            .unwrap();

        play(&mut trainer, "C", 4);
        play(&mut trainer, "E", 4);
        let commands = play(&mut trainer, "C", 5);

        assert_eq!(trainer.correct_count(), 2);
        assert_eq!(trainer.phase(), Phase::InProgress);
        assert_eq!(feedback_kind(&commands), None);
    }

    #[test]
    fn three_mistakes_fire_hint_and_downgrade_to_good() {
        let mut trainer = Trainer::with_seed(7);
        trainer
            .start_session(single("C", ChordQuality::Major, InversionKind::Root))
            .unwrap();

        play(&mut trainer, "C#", 4);
        play(&mut trainer, "D", 4);
        let commands = play(&mut trainer, "F#", 4);
        assert!(commands
            .iter()
            .any(|c| matches!(c, Command::ShowHint { .. })));
        assert!(trainer.hints_used());
        assert_eq!(trainer.mistakes(), 3);

        play(&mut trainer, "C", 4);
        play(&mut trainer, "E", 4);
        let commands = play(&mut trainer, "G", 4);
        assert_eq!(feedback_kind(&commands), Some(FeedbackKind::Good));
    }

    #[test]
    fn first_hint_names_the_root_degree() {
        let mut trainer = Trainer::with_seed(7);
        trainer
            .start_session(single("C", ChordQuality::Major, InversionKind::Root))
            .unwrap();

        play(&mut trainer, "D", 4);
        play(&mut trainer, "D", 4);
        let commands = play(&mut trainer, "D", 4);
        let hint = commands.iter().find_map(|c| match c {
            Command::ShowHint { pitch_class, .. } => Some(*pitch_class),
            _ => None,
        });
        assert_eq!(hint, Some(pc("C")));
    }

    #[test]
    fn wrong_voicing_retries_same_inversion() {
        let mut trainer = Trainer::with_seed(7);
        trainer
            .start_session(single("C", ChordQuality::Major, InversionKind::First))
            .unwrap();

        // Right notes, but C in the bass: root position, not first inversion
        play(&mut trainer, "C", 4);
        play(&mut trainer, "E", 4);
        let commands = play(&mut trainer, "G", 4);
        assert_eq!(feedback_kind(&commands), Some(FeedbackKind::WrongInversion));
        assert!(commands
            .iter()
            .any(|c| matches!(c, Command::ScheduleRetry { .. })));
        assert_eq!(trainer.phase(), Phase::Resolving);

        // Input is gated while resolving
        assert!(play(&mut trainer, "C", 4).is_empty());

        let id_before = trainer.current().unwrap().id.clone();
        let commands = trainer.handle(InputEvent::RetryTimerElapsed);
        assert_eq!(trainer.phase(), Phase::AwaitingFirstNote);
        assert_eq!(trainer.current().unwrap().id, id_before);
        assert_eq!(trainer.mistakes(), 0);
        assert_eq!(trainer.correct_count(), 0);
        assert!(commands
            .iter()
            .any(|c| matches!(c, Command::DisplayInversion { .. })));

        // Correct first inversion voicing now passes
        play(&mut trainer, "E", 4);
        play(&mut trainer, "G", 4);
        let commands = play(&mut trainer, "C", 5);
        assert_eq!(feedback_kind(&commands), Some(FeedbackKind::Perfect));
    }

    #[test]
    fn queue_reshuffles_on_exhaustion() {
        let catalog = Catalog::new();
        let items: Vec<_> = [InversionKind::Root, InversionKind::First]
            .into_iter()
            .map(|kind| {
                Arc::clone(catalog.lookup(pc("C"), ChordQuality::Major, kind).unwrap())
            })
            .collect();

        let mut trainer = Trainer::with_seed(42);
        trainer.start_session(items).unwrap();

        // The session consumed one item; two more advances exhaust the
        // queue and the third wraps around instead of failing.
        for _ in 0..3 {
            let commands = trainer.advance();
            assert!(commands
                .iter()
                .any(|c| matches!(c, Command::DisplayInversion { .. })));
        }
        assert_eq!(trainer.phase(), Phase::AwaitingFirstNote);
    }

    #[test]
    fn stale_hint_timer_is_ignored() {
        let mut trainer = Trainer::with_seed(7);
        trainer
            .start_session(single("C", ChordQuality::Major, InversionKind::Root))
            .unwrap();

        let commands = play(&mut trainer, "C", 4);
        let first_token = armed_token(&commands).unwrap();
        let commands = play(&mut trainer, "E", 4);
        let second_token = armed_token(&commands).unwrap();
        assert_ne!(first_token, second_token);

        // The superseded timer firing late must not hint
        assert!(trainer
            .handle(InputEvent::HintTimerElapsed { token: first_token })
            .is_empty());
        assert!(!trainer.hints_used());

        // The live one does
        let commands = trainer.handle(InputEvent::HintTimerElapsed {
            token: second_token,
        });
        assert!(commands
            .iter()
            .any(|c| matches!(c, Command::ShowHint { .. })));
        assert!(trainer.hints_used());
    }

    #[test]
    fn timer_hint_picks_first_missing_degree() {
        let mut trainer = Trainer::with_seed(7);
        trainer
            .start_session(single("C", ChordQuality::Major, InversionKind::Second))
            .unwrap();

        // G3 played (the bass of the second inversion)
        let commands = play(&mut trainer, "G", 3);
        let token = armed_token(&commands).unwrap();
        let commands = trainer.handle(InputEvent::HintTimerElapsed { token });

        // Root is the first uncollected degree; second inversion lifts it
        // above the anchor octave.
        assert_eq!(
            commands,
            vec![Command::ShowHint {
                pitch_class: pc("C"),
                octave: 4,
            }]
        );
    }

    #[test]
    fn external_notes_assume_default_octave() {
        let mut trainer = Trainer::with_seed(7);
        trainer
            .start_session(single("C", ChordQuality::Major, InversionKind::Root))
            .unwrap();

        for name in ["C", "E"] {
            let commands = trainer.handle(InputEvent::ExternalNoteDetected {
                pitch_class: pc(name),
            });
            // The external instrument already sounded; no tone playback
            assert!(!commands
                .iter()
                .any(|c| matches!(c, Command::PlayTone { .. })));
        }
        let commands = trainer.handle(InputEvent::ExternalNoteDetected {
            pitch_class: pc("G"),
        });
        assert_eq!(feedback_kind(&commands), Some(FeedbackKind::Perfect));
    }

    #[test]
    fn empty_selection_is_rejected() {
        let mut trainer = Trainer::with_seed(7);
        let err = trainer.start_session(Vec::new()).unwrap_err();
        assert!(matches!(err, TrainerError::EmptySelection));
        assert_eq!(trainer.phase(), Phase::Idle);
    }

    #[test]
    fn notes_before_session_are_ignored() {
        let mut trainer = Trainer::with_seed(7);
        assert!(play(&mut trainer, "C", 4).is_empty());
        assert_eq!(trainer.phase(), Phase::Idle);
    }

    #[test]
    fn advance_timer_ignored_outside_resolving() {
        let mut trainer = Trainer::with_seed(7);
        trainer
            .start_session(single("C", ChordQuality::Major, InversionKind::Root))
            .unwrap();
        play(&mut trainer, "C", 4);
        // Mid-exercise, a stray advance event must not skip ahead
        assert!(trainer.handle(InputEvent::AdvanceTimerElapsed).is_empty());
        assert_eq!(trainer.phase(), Phase::InProgress);
    }

    #[test]
    fn success_advances_to_next_exercise() {
        let mut trainer = Trainer::with_seed(7);
        trainer
            .start_session(single("C", ChordQuality::Major, InversionKind::Root))
            .unwrap();
        play(&mut trainer, "C", 4);
        play(&mut trainer, "E", 4);
        play(&mut trainer, "G", 4);
        assert_eq!(trainer.phase(), Phase::Resolving);

        let commands = trainer.handle(InputEvent::AdvanceTimerElapsed);
        assert_eq!(trainer.phase(), Phase::AwaitingFirstNote);
        assert!(commands
            .iter()
            .any(|c| matches!(c, Command::SetInputEnabled { enabled: true })));
    }

    #[test]
    fn stop_returns_to_idle() {
        let mut trainer = Trainer::with_seed(7);
        trainer
            .start_session(single("C", ChordQuality::Major, InversionKind::Root))
            .unwrap();
        trainer.stop();
        assert_eq!(trainer.phase(), Phase::Idle);
        assert!(trainer.current().is_none());
        assert!(play(&mut trainer, "C", 4).is_empty());
    }
}
