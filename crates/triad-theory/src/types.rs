use serde::{Deserialize, Serialize};

use crate::notes::{PitchClass, TheoryError};

/// Triad quality, mapped to a fixed interval triple from the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
    Augmented,
}

impl ChordQuality {
    pub const ALL: [ChordQuality; 4] = [
        ChordQuality::Major,
        ChordQuality::Minor,
        ChordQuality::Diminished,
        ChordQuality::Augmented,
    ];

    /// Semitone intervals [root, third, fifth] from the root.
    pub fn intervals(self) -> [u8; 3] {
        match self {
            ChordQuality::Major => [0, 4, 7],
            ChordQuality::Minor => [0, 3, 7],
            ChordQuality::Diminished => [0, 3, 6],
            ChordQuality::Augmented => [0, 4, 8],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ChordQuality::Major => "Major",
            ChordQuality::Minor => "Minor",
            ChordQuality::Diminished => "Diminished",
            ChordQuality::Augmented => "Augmented",
        }
    }
}

impl std::fmt::Display for ChordQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for ChordQuality {
    type Err = TheoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "major" | "maj" => Ok(ChordQuality::Major),
            "minor" | "min" => Ok(ChordQuality::Minor),
            "diminished" | "dim" => Ok(ChordQuality::Diminished),
            "augmented" | "aug" => Ok(ChordQuality::Augmented),
            _ => Err(TheoryError::UnknownNote(s.to_string())),
        }
    }
}

/// Which chord degree sits in the bass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InversionKind {
    Root,
    First,
    Second,
}

impl InversionKind {
    pub const ALL: [InversionKind; 3] = [
        InversionKind::Root,
        InversionKind::First,
        InversionKind::Second,
    ];

    /// Bottom-to-top ordering of scale degrees (root=0, third=1, fifth=2).
    pub fn degree_order(self) -> [usize; 3] {
        match self {
            InversionKind::Root => [0, 1, 2],
            InversionKind::First => [1, 2, 0],
            InversionKind::Second => [2, 0, 1],
        }
    }

    /// Degrees shifted up one octave in this inversion's voicing.
    pub fn lifted_degrees(self) -> &'static [usize] {
        match self {
            InversionKind::Root => &[],
            InversionKind::First => &[0],
            InversionKind::Second => &[0, 1],
        }
    }

    /// Scale degree that must be the lowest sounding note.
    pub fn bass_degree(self) -> usize {
        match self {
            InversionKind::Root => 0,
            InversionKind::First => 1,
            InversionKind::Second => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            InversionKind::Root => "Root Position",
            InversionKind::First => "First Inversion",
            InversionKind::Second => "Second Inversion",
        }
    }
}

impl std::fmt::Display for InversionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for InversionKind {
    type Err = TheoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "root" => Ok(InversionKind::Root),
            "first" | "1st" => Ok(InversionKind::First),
            "second" | "2nd" => Ok(InversionKind::Second),
            _ => Err(TheoryError::UnknownNote(s.to_string())),
        }
    }
}

/// One exercise unit: a specific triad in a specific inversion.
///
/// Two views of the chord tones are kept deliberately separate:
/// `chord_notes` stays in scale-degree order [root, third, fifth] so the
/// bass degree can be indexed positionally, while the ascending set used for
/// content comparison is computed by [`Inversion::pitch_class_set`]. For
/// roots whose third or fifth wraps past B the two orders differ (B major is
/// [11, 3, 6]), so re-sorting `chord_notes` in place would corrupt the
/// degree index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inversion {
    /// Stable identity: "C#-Minor-First Inversion"
    pub id: String,
    pub root: PitchClass,
    pub quality: ChordQuality,
    pub kind: InversionKind,
    /// "C Major", "F# Diminished", ...
    pub display_name: String,
    /// Chord tones in scale-degree order [root, third, fifth], mod 12.
    pub chord_notes: [PitchClass; 3],
    /// The voicing bottom-to-top as semitone offsets from the base octave's
    /// C. Octave lifts keep the sequence strictly ascending, so values run
    /// 0–27 rather than 0–11.
    pub ordered_notes: [u8; 3],
    /// First voice of the voicing, played as the starting cue.
    pub reference_note: u8,
}

impl Inversion {
    pub fn new(root: PitchClass, quality: ChordQuality, kind: InversionKind) -> Self {
        let intervals = quality.intervals();
        let chord_notes = intervals.map(|i| root.transpose(i));

        // Build the voicing from un-reduced interval offsets so that each
        // voice is genuinely above the previous one, then apply the
        // inversion's octave lifts.
        let lifted = kind.lifted_degrees();
        let ordered_notes = kind.degree_order().map(|degree| {
            let mut value = root.value() + intervals[degree];
            if lifted.contains(&degree) {
                value += 12;
            }
            value
        });

        Self {
            id: format!("{}-{}-{}", root, quality, kind),
            root,
            quality,
            kind,
            display_name: format!("{} {}", root, quality),
            chord_notes,
            ordered_notes,
            reference_note: ordered_notes[0],
        }
    }

    /// Ascending pitch-class set for content comparison.
    pub fn pitch_class_set(&self) -> [PitchClass; 3] {
        let mut set = self.chord_notes;
        set.sort();
        set
    }

    /// Is this pitch class one of the chord tones (any octave)?
    pub fn contains(&self, pitch_class: PitchClass) -> bool {
        self.chord_notes.contains(&pitch_class)
    }

    /// The pitch class required in the bass for this inversion.
    pub fn bass_pitch_class(&self) -> PitchClass {
        self.chord_notes[self.kind.bass_degree()]
    }
}
