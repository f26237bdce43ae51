use triad_theory::{Inversion, InversionKind, PitchClass};

use crate::session::DEFAULT_OCTAVE;

/// Pick the octave a hinted chord tone should be shown in.
///
/// With nothing played yet, hint in the default middle octave. Otherwise
/// anchor on the lowest note played so far and mirror the inversion's own
/// octave-shift pattern: degrees the inversion lifts are hinted one octave
/// above the anchor, the rest in the anchor's octave.
pub(crate) fn hint_octave(inversion: &Inversion, needed: PitchClass, played: &[u8]) -> u8 {
    let Some(&lowest) = played.iter().min() else {
        return DEFAULT_OCTAVE;
    };
    let anchor = lowest / 12;

    match inversion.kind {
        InversionKind::Root => anchor,
        InversionKind::First => {
            if needed == inversion.chord_notes[0] {
                anchor + 1
            } else {
                anchor
            }
        }
        InversionKind::Second => {
            if needed == inversion.chord_notes[2] {
                anchor
            } else {
                anchor + 1
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use triad_theory::ChordQuality;

    fn pc(name: &str) -> PitchClass {
        PitchClass::from_name(name).unwrap()
    }

    fn c_major(kind: InversionKind) -> Inversion {
        Inversion::new(pc("C"), ChordQuality::Major, kind)
    }

    #[test]
    fn defaults_to_middle_octave_with_nothing_played() {
        let inv = c_major(InversionKind::First);
        assert_eq!(hint_octave(&inv, pc("E"), &[]), DEFAULT_OCTAVE);
    }

    #[test]
    fn root_position_stays_in_anchor_octave() {
        let inv = c_major(InversionKind::Root);
        // G4 already played
        assert_eq!(hint_octave(&inv, pc("C"), &[55]), 4);
        assert_eq!(hint_octave(&inv, pc("E"), &[55]), 4);
    }

    #[test]
    fn first_inversion_lifts_only_the_root_hint() {
        let inv = c_major(InversionKind::First);
        // E4 played; root hint goes above, fifth hint stays
        assert_eq!(hint_octave(&inv, pc("C"), &[52]), 5);
        assert_eq!(hint_octave(&inv, pc("G"), &[52]), 4);
    }

    #[test]
    fn second_inversion_lifts_root_and_third_hints() {
        let inv = c_major(InversionKind::Second);
        // G3 played
        assert_eq!(hint_octave(&inv, pc("G"), &[43]), 3);
        assert_eq!(hint_octave(&inv, pc("C"), &[43]), 4);
        assert_eq!(hint_octave(&inv, pc("E"), &[43]), 4);
    }

    #[test]
    fn anchor_is_the_lowest_played_note() {
        let inv = c_major(InversionKind::Root);
        // C5 then E3: anchor is octave 3
        assert_eq!(hint_octave(&inv, pc("G"), &[60, 40]), 3);
    }
}
