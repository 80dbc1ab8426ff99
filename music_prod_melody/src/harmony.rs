// Harmonic planning: the chord cycle underneath the melody.
//
// Chords are built from fixed tables of scale-position triples. The triples
// index into the resolved `Scale` by position, not by pitch value, so the
// same table yields different voicings in different windows. Only the major
// mode selects the major table; every other mode (lydian included) falls
// back to the minor table. That coarse split is intentional and preserved.
//
// Two selection policies exist:
// - `Cyclic` (default): the four table chords in order, no randomness.
// - `RandomPerSlot`: one uniform draw per two-bar slot.
// Either way the composer looks chords up by `(bar) % len`.

use crate::error::{ComposeError, Result};
use crate::mode::Mode;
use crate::scale::Scale;
use music_prod_prng::ComposerRng;
use serde::{Deserialize, Serialize};

/// Scale-position triples for the major table: I, ii, iii/IV, V.
pub const MAJOR_TRIADS: [[usize; 3]; 4] = [[0, 4, 7], [2, 5, 9], [4, 7, 11], [7, 11, 14]];

/// Scale-position triples for the minor table: i, ii°, III, V.
pub const MINOR_TRIADS: [[usize; 3]; 4] = [[0, 3, 7], [2, 5, 8], [3, 7, 10], [7, 10, 14]];

/// How chords are chosen for each slot of the progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChordPolicy {
    /// Table chords in order, repeating every four bars.
    #[default]
    Cyclic,
    /// One uniformly drawn table chord per two bars.
    RandomPerSlot,
}

/// A three-note chord drawn from the scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chord {
    pub pitches: [u8; 3],
}

/// The ordered chord cycle for a piece.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progression {
    pub chords: Vec<Chord>,
}

impl Progression {
    pub fn len(&self) -> usize {
        self.chords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chords.is_empty()
    }

    /// The chord active in a given bar (zero-based), cycling through the
    /// progression. Returns `None` only for an empty progression.
    pub fn chord_for_bar(&self, bar: usize) -> Option<&Chord> {
        if self.chords.is_empty() {
            return None;
        }
        self.chords.get(bar % self.chords.len())
    }
}

/// The triad table a mode uses.
pub fn triad_table(mode: Mode) -> &'static [[usize; 3]; 4] {
    match mode {
        Mode::Major => &MAJOR_TRIADS,
        _ => &MINOR_TRIADS,
    }
}

/// Map a scale-position triple onto the scale.
///
/// Fails with `InsufficientScaleRange` when any position is past the end of
/// the scale; positions are never wrapped or clamped.
pub fn build_triad(scale: &Scale, positions: [usize; 3]) -> Result<Chord> {
    let pitches = scale.pitches();
    let mut out = [0u8; 3];
    for (slot, &idx) in out.iter_mut().zip(positions.iter()) {
        *slot = *pitches
            .get(idx)
            .ok_or(ComposeError::InsufficientScaleRange {
                index: idx,
                available: pitches.len(),
            })?;
    }
    Ok(Chord { pitches: out })
}

/// Build the chord progression for a piece of `total_bars` bars.
///
/// The whole table is validated against the scale up front, so a window too
/// narrow for the table fails even if a random draw would have skipped the
/// offending chord.
pub fn plan(
    scale: &Scale,
    mode: Mode,
    total_bars: usize,
    policy: ChordPolicy,
    rng: &mut ComposerRng,
) -> Result<Progression> {
    let table: Vec<Chord> = triad_table(mode)
        .iter()
        .map(|&positions| build_triad(scale, positions))
        .collect::<Result<_>>()?;

    let chords = match policy {
        ChordPolicy::Cyclic => table,
        ChordPolicy::RandomPerSlot => {
            let slots = (total_bars / 2).max(1);
            (0..slots)
                .map(|_| table[rng.range_usize(0, table.len())])
                .collect()
        }
    };

    tracing::debug!(?policy, %mode, total_bars, chords = chords.len(), "planned progression");
    Ok(Progression { chords })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::Key;
    use crate::scale::{PitchWindow, resolve, resolve_in};

    #[test]
    fn test_major_cycle_maps_by_position() {
        let scale = resolve("C", Mode::Major).unwrap();
        let mut rng = ComposerRng::new(1);
        let prog = plan(&scale, Mode::Major, 8, ChordPolicy::Cyclic, &mut rng).unwrap();
        assert_eq!(prog.len(), 4);
        let p = scale.pitches();
        for (chord, triple) in prog.chords.iter().zip(MAJOR_TRIADS.iter()) {
            assert_eq!(chord.pitches, [p[triple[0]], p[triple[1]], p[triple[2]]]);
        }
        assert_eq!(prog.chords[0].pitches, [48, 55, 60]);
        assert_eq!(prog.chords[3].pitches, [60, 67, 72]);
    }

    #[test]
    fn test_cyclic_consumes_no_randomness() {
        let scale = resolve("C", Mode::Major).unwrap();
        let mut rng = ComposerRng::new(5);
        let before = rng.clone();
        plan(&scale, Mode::Major, 8, ChordPolicy::Cyclic, &mut rng).unwrap();
        assert_eq!(rng, before);
    }

    #[test]
    fn test_non_major_modes_use_minor_table() {
        let scale = resolve("F", Mode::Lydian).unwrap();
        let mut rng = ComposerRng::new(1);
        let prog = plan(&scale, Mode::Lydian, 4, ChordPolicy::Cyclic, &mut rng).unwrap();
        let p = scale.pitches();
        assert_eq!(prog.chords[0].pitches, [p[0], p[3], p[7]]);
    }

    #[test]
    fn test_chord_pitches_are_scale_members() {
        let mut rng = ComposerRng::new(9);
        for mode in Mode::ALL {
            let scale = resolve("D", mode).unwrap();
            let prog = plan(&scale, mode, 16, ChordPolicy::RandomPerSlot, &mut rng).unwrap();
            for chord in &prog.chords {
                assert!(chord.pitches.iter().all(|&p| scale.contains(p)));
            }
        }
    }

    #[test]
    fn test_random_policy_slot_count() {
        let scale = resolve("A", Mode::Minor).unwrap();
        let mut rng = ComposerRng::new(3);
        let prog = plan(&scale, Mode::Minor, 12, ChordPolicy::RandomPerSlot, &mut rng).unwrap();
        assert_eq!(prog.len(), 6);
        let one_bar = plan(&scale, Mode::Minor, 1, ChordPolicy::RandomPerSlot, &mut rng).unwrap();
        assert_eq!(one_bar.len(), 1);
    }

    #[test]
    fn test_narrow_window_is_insufficient() {
        let key = Key::new(0, Mode::Major);
        let scale = resolve_in(key, PitchWindow::new(60, 72).unwrap()).unwrap();
        let mut rng = ComposerRng::new(1);
        let err = plan(&scale, Mode::Major, 4, ChordPolicy::Cyclic, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            ComposeError::InsufficientScaleRange { available: 8, .. }
        ));
    }

    #[test]
    fn test_chord_for_bar_cycles() {
        let scale = resolve("C", Mode::Major).unwrap();
        let mut rng = ComposerRng::new(1);
        let prog = plan(&scale, Mode::Major, 8, ChordPolicy::Cyclic, &mut rng).unwrap();
        assert_eq!(prog.chord_for_bar(0), prog.chord_for_bar(4));
        assert_eq!(prog.chord_for_bar(3), Some(&prog.chords[3]));
        assert_eq!(Progression { chords: vec![] }.chord_for_bar(0), None);
    }
}
