//! Chord naming over held pitches.
//!
//! Template matching is exact: the sounded interval set must equal a chord
//! template in both cardinality and members. Candidate roots are tried in
//! ascending order from the lowest sounded pitch, so the first match is
//! deterministic even when several roots could name the same pitch-class set.

use alloc::vec::Vec;
use core::fmt;

use crate::note::NOTE_NAMES;

/// Chord quality, one per matching template.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
    Augmented,
    Dominant7,
    Major7,
    Minor7,
    HalfDiminished7,
    Diminished7,
    Sus2,
    Sus4,
}

/// Template table in match-priority order.
const TEMPLATES: [(ChordQuality, &[u8]); 11] = [
    (ChordQuality::Major, &[0, 4, 7]),
    (ChordQuality::Minor, &[0, 3, 7]),
    (ChordQuality::Diminished, &[0, 3, 6]),
    (ChordQuality::Augmented, &[0, 4, 8]),
    (ChordQuality::Dominant7, &[0, 4, 7, 10]),
    (ChordQuality::Major7, &[0, 4, 7, 11]),
    (ChordQuality::Minor7, &[0, 3, 7, 10]),
    (ChordQuality::HalfDiminished7, &[0, 3, 6, 10]),
    (ChordQuality::Diminished7, &[0, 3, 6, 9]),
    (ChordQuality::Sus2, &[0, 2, 7]),
    (ChordQuality::Sus4, &[0, 5, 7]),
];

impl ChordQuality {
    /// Pitch-class offsets from the root.
    pub fn intervals(&self) -> &'static [u8] {
        TEMPLATES
            .iter()
            .find(|(q, _)| q == self)
            .map(|(_, ivs)| *ivs)
            .unwrap_or(&[])
    }

    /// Human-readable quality name.
    pub fn name(&self) -> &'static str {
        match self {
            ChordQuality::Major => "major",
            ChordQuality::Minor => "minor",
            ChordQuality::Diminished => "diminished",
            ChordQuality::Augmented => "augmented",
            ChordQuality::Dominant7 => "dominant 7th",
            ChordQuality::Major7 => "major 7th",
            ChordQuality::Minor7 => "minor 7th",
            ChordQuality::HalfDiminished7 => "half-diminished 7th",
            ChordQuality::Diminished7 => "diminished 7th",
            ChordQuality::Sus2 => "sus2",
            ChordQuality::Sus4 => "sus4",
        }
    }
}

/// A named chord: root pitch class plus quality.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChordLabel {
    /// Root pitch class (0-11)
    pub root: u8,
    pub quality: ChordQuality,
}

impl fmt::Display for ChordLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", NOTE_NAMES[self.root as usize], self.quality.name())
    }
}

/// Name the chord formed by the given held pitches, if any template matches.
///
/// Fewer than 3 distinct pitches never name a chord. Octave duplicates
/// collapse to one pitch class before matching.
pub fn detect_chord(pitches: &[u8]) -> Option<ChordLabel> {
    if pitches.len() < 3 {
        return None;
    }

    let mut sorted: Vec<u8> = pitches.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    if sorted.len() < 3 {
        return None;
    }

    // Distinct pitch classes, ordered by the ascending sounded pitches
    let mut classes: Vec<u8> = Vec::with_capacity(sorted.len());
    for &p in &sorted {
        let pc = p % 12;
        if !classes.contains(&pc) {
            classes.push(pc);
        }
    }

    for &root in &classes {
        let mut intervals: Vec<u8> = classes.iter().map(|&pc| (pc + 12 - root) % 12).collect();
        intervals.sort_unstable();

        for (quality, template) in TEMPLATES {
            if intervals.as_slice() == template {
                return Some(ChordLabel { root, quality });
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn fewer_than_three_pitches_is_no_chord() {
        assert_eq!(detect_chord(&[]), None);
        assert_eq!(detect_chord(&[60]), None);
        assert_eq!(detect_chord(&[60, 64]), None);
        // Three sounded keys but only two distinct pitches
        assert_eq!(detect_chord(&[60, 72, 64]), None);
    }

    #[test]
    fn c_major_triad() {
        let label = detect_chord(&[60, 64, 67]).unwrap();
        assert_eq!(label.root, 0);
        assert_eq!(label.quality, ChordQuality::Major);
        assert_eq!(label.to_string(), "C major");
    }

    #[test]
    fn c_diminished_triad() {
        let label = detect_chord(&[60, 63, 66]).unwrap();
        assert_eq!(label.to_string(), "C diminished");
    }

    #[test]
    fn c_sus2_triad() {
        let label = detect_chord(&[60, 62, 67]).unwrap();
        assert_eq!(label.to_string(), "C sus2");
    }

    #[test]
    fn ascending_root_tie_break_is_deterministic() {
        // C#, E, G#: C# minor from the lowest-root candidate
        let label = detect_chord(&[61, 64, 68]).unwrap();
        assert_eq!(label.root, 1);
        assert_eq!(label.quality, ChordQuality::Minor);
    }

    #[test]
    fn octave_duplicates_collapse() {
        // C major with a doubled root an octave up
        let label = detect_chord(&[60, 64, 67, 72]).unwrap();
        assert_eq!(label.to_string(), "C major");
    }

    #[test]
    fn inversion_still_names_the_chord() {
        // First-inversion C major: E3 in the bass
        let label = detect_chord(&[52, 60, 67]).unwrap();
        assert_eq!(label.to_string(), "C major");
    }

    #[test]
    fn seventh_chords() {
        assert_eq!(detect_chord(&[60, 64, 67, 70]).unwrap().to_string(), "C dominant 7th");
        assert_eq!(detect_chord(&[60, 64, 67, 71]).unwrap().to_string(), "C major 7th");
        assert_eq!(detect_chord(&[60, 63, 67, 70]).unwrap().to_string(), "C minor 7th");
        assert_eq!(detect_chord(&[60, 63, 66, 70]).unwrap().to_string(), "C half-diminished 7th");
        assert_eq!(detect_chord(&[60, 63, 66, 69]).unwrap().to_string(), "C diminished 7th");
    }

    #[test]
    fn non_template_cluster_matches_nothing() {
        assert_eq!(detect_chord(&[60, 61, 62]), None);
    }

    #[test]
    fn display_uses_sharp_names() {
        let label = detect_chord(&[66, 70, 73]).unwrap();
        assert_eq!(label.to_string(), "F# major");
    }
}
