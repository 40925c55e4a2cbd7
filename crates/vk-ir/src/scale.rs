//! Scale-degree enumeration for keyboard highlighting.

use alloc::vec::Vec;

use crate::note::KeyRange;

/// Scale mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Major,
    Minor,
}

impl Mode {
    /// Pitch-class offsets from the root.
    pub const fn intervals(&self) -> &'static [u8] {
        match self {
            Mode::Major => &[0, 2, 4, 5, 7, 9, 11],
            Mode::Minor => &[0, 2, 3, 5, 7, 8, 10],
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Mode::Major => "major",
            Mode::Minor => "minor",
        }
    }
}

/// All pitches of the scale within `range`, anchored at the lowest octave
/// instance of the root at or above the range start.
///
/// The result is a display set; ordering carries no meaning.
pub fn scale_pitches(root_class: u8, mode: Mode, range: KeyRange) -> Vec<u8> {
    let mut anchor = (root_class % 12) as u16;
    while anchor < range.low as u16 {
        anchor += 12;
    }

    let mut pitches = Vec::new();
    let mut octave_root = anchor;
    while octave_root <= range.high as u16 {
        for &interval in mode.intervals() {
            let pitch = octave_root + interval as u16;
            if pitch >= range.low as u16 && pitch <= range.high as u16 {
                pitches.push(pitch as u8);
            }
        }
        octave_root += 12;
    }

    pitches
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn c_major_over_37_keys_is_every_congruent_pitch() {
        let pitches = scale_pitches(0, Mode::Major, KeyRange::KEYS_37);
        let expected: Vec<u8> = (48..=84)
            .filter(|p| [0, 2, 4, 5, 7, 9, 11].contains(&(p % 12)))
            .collect();
        let mut sorted = pitches.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, expected);
    }

    #[test]
    fn a_minor_contains_only_naturals() {
        let pitches = scale_pitches(9, Mode::Minor, KeyRange::KEYS_37);
        assert!(!pitches.is_empty());
        for p in pitches {
            assert!(
                [9, 11, 0, 2, 4, 5, 7].contains(&(p % 12)),
                "unexpected pitch {} in A minor",
                p
            );
        }
    }

    #[test]
    fn anchor_is_lowest_root_at_or_above_range_start() {
        // D over the 61-key range (36..=96): anchor is D2 = 38
        let pitches = scale_pitches(2, Mode::Major, KeyRange::KEYS_61);
        assert_eq!(*pitches.iter().min().unwrap(), 38);
        // Nothing below the anchor even though 36/37 are in range
        assert!(!pitches.contains(&36));
    }

    #[test]
    fn all_pitches_within_range() {
        let range = KeyRange::KEYS_88;
        for root in 0..12 {
            for pitch in scale_pitches(root, Mode::Minor, range) {
                assert!(range.contains(pitch));
            }
        }
    }
}
