//! Terminal host for triad inversion drills.
//!
//! Narrows the catalog from CLI flags, feeds typed notes to the exercise
//! engine, and renders engine commands as colored lines. The engine's
//! scheduled commands (hint timer, advance/retry delays, staggered replay
//! tones) run on a reader-thread + `recv_timeout` loop so timers fire while
//! the main thread waits on stdin.

use std::io::BufRead;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use owo_colors::OwoColorize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use inversion_trainer::{Command, FeedbackKind, InputEvent, TimerToken, Trainer};
use triad_theory::{Catalog, ChordQuality, InversionKind, PitchClass, Selection};

/// Triad inversion ear training at the keyboard you already have.
#[derive(Parser, Debug)]
#[command(name = "invcli", version, about)]
struct Args {
    /// Root notes to drill, comma-separated (e.g. "C,F#,Bb"). Omit for all.
    #[arg(long, value_delimiter = ',')]
    roots: Vec<String>,

    /// Chord qualities: major, minor, diminished, augmented. Omit for all.
    #[arg(long, value_delimiter = ',')]
    qualities: Vec<String>,

    /// Inversion kinds: root, first, second. Omit for all.
    #[arg(long, value_delimiter = ',')]
    inversions: Vec<String>,

    /// Seed the exercise shuffle for a reproducible run.
    #[arg(long)]
    seed: Option<u64>,
}

/// A scheduled engine callback, host-side realization of the engine's
/// timer commands.
#[derive(Debug, Clone, Copy)]
enum Pending {
    Hint(TimerToken),
    Advance,
    Retry,
    Tone(PitchClass, u8),
}

struct Scheduled {
    due: Instant,
    what: Pending,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let selection = build_selection(&args)?;

    let catalog = Catalog::new();
    let selected = catalog.filter(&selection);
    if selected.is_empty() {
        bail!("selection matches no inversions; loosen --roots/--qualities/--inversions");
    }
    println!(
        "{} exercises selected. Play the shown inversion by typing notes like {}, {}, {}. '{}' exits.",
        selected.len().to_string().bold(),
        "C4".bold(),
        "f#3".bold(),
        "Bb4".bold(),
        "quit".bold(),
    );

    let mut trainer = match args.seed {
        Some(seed) => Trainer::with_seed(seed),
        None => Trainer::new(),
    };
    let mut timers: Vec<Scheduled> = Vec::new();

    let commands = trainer.start_session(selected)?;
    apply(&mut timers, commands);

    let (tx, rx) = mpsc::channel::<String>();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    loop {
        let timeout = timers
            .iter()
            .map(|t| t.due.saturating_duration_since(Instant::now()))
            .min()
            .unwrap_or(Duration::from_secs(3600));

        match rx.recv_timeout(timeout) {
            Ok(line) => {
                let line = line.trim();
                if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("q") {
                    break;
                }
                if !line.is_empty() {
                    match parse_note(line) {
                        Ok((pitch_class, octave)) => {
                            let commands =
                                trainer.handle(InputEvent::NotePlayed { pitch_class, octave });
                            apply(&mut timers, commands);
                        }
                        Err(e) => eprintln!("{}", format!("ignored: {e}").yellow()),
                    }
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }

        fire_due_timers(&mut trainer, &mut timers);
    }

    Ok(())
}

fn fire_due_timers(trainer: &mut Trainer, timers: &mut Vec<Scheduled>) {
    let now = Instant::now();
    let mut due = Vec::new();
    timers.retain(|t| {
        if t.due <= now {
            due.push(t.what);
            false
        } else {
            true
        }
    });

    for what in due {
        debug!(?what, "timer fired");
        match what {
            Pending::Hint(token) => {
                let commands = trainer.handle(InputEvent::HintTimerElapsed { token });
                apply(timers, commands);
            }
            Pending::Advance => {
                let commands = trainer.handle(InputEvent::AdvanceTimerElapsed);
                apply(timers, commands);
            }
            Pending::Retry => {
                let commands = trainer.handle(InputEvent::RetryTimerElapsed);
                apply(timers, commands);
            }
            Pending::Tone(pitch_class, octave) => print_tone(pitch_class, octave),
        }
    }
}

/// Render immediate commands and queue the scheduled ones.
fn apply(timers: &mut Vec<Scheduled>, commands: Vec<Command>) {
    let now = Instant::now();
    for command in commands {
        match command {
            Command::DisplayInversion { name, kind } => {
                println!();
                println!("{}  —  {}", name.bold(), kind.to_string().bright_blue());
            }
            Command::HighlightReference { pitch_class, octave } => {
                println!(
                    "  starts on {}",
                    format!("{pitch_class}{octave}").bright_magenta().bold()
                );
            }
            Command::HighlightCorrect { pitch_class, octave } => {
                println!("  {} {pitch_class}{octave}", "✓".green().bold());
            }
            Command::HighlightIncorrect { pitch_class, octave } => {
                println!("  {} {pitch_class}{octave}", "✗".red().bold());
            }
            Command::ShowHint { pitch_class, octave } => {
                println!(
                    "  {} try {}",
                    "hint:".cyan().bold(),
                    format!("{pitch_class}{octave}").cyan()
                );
            }
            Command::ClearHighlights => {}
            Command::PlayTone {
                pitch_class,
                octave,
                delay,
            } => {
                if delay.is_zero() {
                    print_tone(pitch_class, octave);
                } else {
                    timers.push(Scheduled {
                        due: now + delay,
                        what: Pending::Tone(pitch_class, octave),
                    });
                }
            }
            Command::PlayErrorSound => println!("  {}", "bzzt".red().dimmed()),
            Command::ShowFeedback { kind, message } => match kind {
                FeedbackKind::Perfect => println!("  {}", message.bright_green().bold()),
                FeedbackKind::Good => println!("  {}", message.green()),
                FeedbackKind::WrongInversion => println!("  {}", message.red()),
            },
            Command::SetInputEnabled { .. } => {}
            Command::ArmHintTimer { token, delay } => timers.push(Scheduled {
                due: now + delay,
                what: Pending::Hint(token),
            }),
            Command::CancelHintTimer => {
                timers.retain(|t| !matches!(t.what, Pending::Hint(_)));
            }
            Command::ScheduleAdvance { delay } => timers.push(Scheduled {
                due: now + delay,
                what: Pending::Advance,
            }),
            Command::ScheduleRetry { delay } => timers.push(Scheduled {
                due: now + delay,
                what: Pending::Retry,
            }),
        }
    }
}

fn print_tone(pitch_class: PitchClass, octave: u8) {
    println!("  {} {pitch_class}{octave}", "♪".bright_blue());
}

fn build_selection(args: &Args) -> Result<Selection> {
    let mut selection = Selection::default();
    for name in &args.roots {
        let normalized = normalize_note_name(name);
        let root = PitchClass::from_name(&normalized)
            .with_context(|| format!("bad --roots entry: {name:?}"))?;
        selection.roots.push(root);
    }
    for quality in &args.qualities {
        selection.qualities.push(
            quality
                .parse::<ChordQuality>()
                .map_err(|_| anyhow::anyhow!("bad --qualities entry: {quality:?}"))?,
        );
    }
    for kind in &args.inversions {
        selection.kinds.push(
            kind.parse::<InversionKind>()
                .map_err(|_| anyhow::anyhow!("bad --inversions entry: {kind:?}"))?,
        );
    }
    Ok(selection)
}

/// "f#" → "F#", "bb" → "Bb", "C" → "C".
fn normalize_note_name(input: &str) -> String {
    let mut chars: Vec<char> = input.chars().collect();
    if let Some(first) = chars.first_mut() {
        *first = first.to_ascii_uppercase();
    }
    if chars.len() == 2 && chars[1] == 'B' {
        chars[1] = 'b';
    }
    chars.into_iter().collect()
}

/// Parse entries like "C4", "f#3", "Bb4" into pitch class and octave.
fn parse_note(input: &str) -> Result<(PitchClass, u8)> {
    let digit_at = input
        .find(|c: char| c.is_ascii_digit())
        .with_context(|| format!("{input:?} has no octave digit (try C4)"))?;
    let (name, octave_str) = input.split_at(digit_at);
    let octave: u8 = octave_str
        .parse()
        .with_context(|| format!("bad octave in {input:?}"))?;
    if octave > 8 {
        bail!("octave {octave} out of range (0-8)");
    }
    let pitch_class = PitchClass::from_name(&normalize_note_name(name))?;
    Ok((pitch_class, octave))
}
