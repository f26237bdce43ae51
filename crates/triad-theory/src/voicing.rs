use crate::notes::PitchClass;
use crate::types::Inversion;

/// Does a played voicing realize the target inversion?
///
/// `played` holds raw octave-aware semitone values (octave × 12 + pitch
/// class) in arrival order. Two checks, both required:
///
/// 1. Content: the played pitch-class set must equal the chord's, so three
///    right-sounding notes in the wrong chord are rejected outright rather
///    than treated as a near-miss.
/// 2. Inversion identity: the pitch class of the lowest raw value must be
///    the scale degree the inversion puts in the bass.
pub fn check_voicing(played: &[u8], target: &Inversion) -> bool {
    if played.len() != 3 {
        return false;
    }

    let mut played_set: Vec<PitchClass> = played
        .iter()
        .map(|&note| PitchClass::from_semitone(note))
        .collect();
    played_set.sort();
    if played_set != target.pitch_class_set() {
        return false;
    }

    let Some(&lowest) = played.iter().min() else {
        return false;
    };
    PitchClass::from_semitone(lowest) == target.bass_pitch_class()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::generate_all;
    use crate::notes::PitchClass;
    use crate::types::{ChordQuality, InversionKind};
    use pretty_assertions::assert_eq;

    fn pc(name: &str) -> PitchClass {
        PitchClass::from_name(name).unwrap()
    }

    fn at_octave(notes: [u8; 3], octave: u8) -> Vec<u8> {
        notes.iter().map(|n| octave * 12 + n).collect()
    }

    #[test]
    fn every_inversion_accepts_its_own_voicing() {
        for inv in generate_all() {
            let played = at_octave(inv.ordered_notes, 4);
            assert!(
                check_voicing(&played, &inv),
                "own voicing rejected for {}",
                inv.id
            );
        }
    }

    #[test]
    fn wrong_bass_is_rejected() {
        let inv = Inversion::new(pc("C"), ChordQuality::Major, InversionKind::Root);
        // E in the bass: E4 G4 C5 is first inversion, not root position
        assert!(!check_voicing(&[52, 55, 60], &inv));
        // G in the bass: second inversion
        assert!(!check_voicing(&[43, 48, 52], &inv));
        // C in the bass passes
        assert!(check_voicing(&[48, 52, 55], &inv));
    }

    #[test]
    fn bass_uses_lowest_value_not_arrival_order() {
        let inv = Inversion::new(pc("C"), ChordQuality::Major, InversionKind::First);
        // Played top-down, E4 still lowest: correct first inversion
        assert!(check_voicing(&[60, 55, 52], &inv));
    }

    #[test]
    fn wrong_content_is_rejected_regardless_of_bass() {
        let inv = Inversion::new(pc("C"), ChordQuality::Major, InversionKind::Root);
        // C D G: right bass, wrong chord
        assert!(!check_voicing(&[48, 50, 55], &inv));
        // C minor content against a major target
        assert!(!check_voicing(&[48, 51, 55], &inv));
    }

    #[test]
    fn requires_exactly_three_notes() {
        let inv = Inversion::new(pc("C"), ChordQuality::Major, InversionKind::Root);
        assert!(!check_voicing(&[48, 52], &inv));
        assert!(!check_voicing(&[48, 52, 55, 60], &inv));
        assert!(!check_voicing(&[], &inv));
    }

    #[test]
    fn wrapped_root_bass_check_uses_degree_order() {
        // B major root position: ascending order would put D# first, but
        // the bass check must still demand B.
        let inv = Inversion::new(pc("B"), ChordQuality::Major, InversionKind::Root);
        // B3 D#4 F#4
        assert!(check_voicing(&[47, 51, 54], &inv));
        // D#4 F#4 B4 is first inversion of B major, not root position
        assert!(!check_voicing(&[51, 54, 59], &inv));
    }
}
