use serde::{Deserialize, Serialize};
use thiserror::Error;

const NOTE_NAMES_SHARP: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];
const NOTE_NAMES_FLAT: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

#[derive(Debug, Error)]
pub enum TheoryError {
    #[error("unknown note name: {0:?}")]
    UnknownNote(String),
    #[error("pitch class out of range: {0} (expected 0-11)")]
    PitchOutOfRange(u8),
}

/// A semitone offset from C within one octave, always 0–11.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PitchClass(u8);

impl PitchClass {
    /// Validated constructor. Rejects values ≥ 12.
    pub fn new(value: u8) -> Result<Self, TheoryError> {
        if value < 12 {
            Ok(Self(value))
        } else {
            Err(TheoryError::PitchOutOfRange(value))
        }
    }

    /// Reduce an octave-carrying semitone value to its pitch class.
    pub fn from_semitone(value: u8) -> Self {
        Self(value % 12)
    }

    /// Parse a note name, accepting both sharp and flat spellings.
    pub fn from_name(name: &str) -> Result<Self, TheoryError> {
        let value = match name {
            "C" => 0,
            "C#" | "Db" => 1,
            "D" => 2,
            "D#" | "Eb" => 3,
            "E" => 4,
            "F" => 5,
            "F#" | "Gb" => 6,
            "G" => 7,
            "G#" | "Ab" => 8,
            "A" => 9,
            "A#" | "Bb" => 10,
            "B" => 11,
            _ => return Err(TheoryError::UnknownNote(name.to_string())),
        };
        Ok(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Transpose upward by an interval, reduced mod 12.
    pub fn transpose(self, interval: u8) -> Self {
        Self((self.0 + interval) % 12)
    }

    /// Sharp-spelled name: "C", "C#", "D", ...
    pub fn name(self) -> &'static str {
        NOTE_NAMES_SHARP[self.0 as usize]
    }

    /// Flat-spelled name: "C", "Db", "D", ...
    pub fn flat_name(self) -> &'static str {
        NOTE_NAMES_FLAT[self.0 as usize]
    }

    /// All 12 pitch classes in ascending order from C.
    pub fn all() -> impl Iterator<Item = PitchClass> {
        (0..12).map(PitchClass)
    }
}

impl std::fmt::Display for PitchClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
