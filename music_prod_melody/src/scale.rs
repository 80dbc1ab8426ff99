// Scale resolution: from a key to the concrete pitches a melody may use.
//
// The composer never works with abstract scale degrees directly. Instead a
// `Key` is resolved once into a `Scale`, the ascending list of in-key MIDI
// pitches inside a fixed absolute window (C3-C6 by default). The harmonic
// planner indexes into this list by position and the motif generator walks
// over it, so both depend on the window being stable for a whole piece.
//
// Resolution is pure: no randomness, same inputs always give the same scale.

use crate::error::{ComposeError, Result};
use crate::mode::{Key, Mode, parse_pitch_class};
use serde::{Deserialize, Serialize};

/// Inclusive absolute MIDI pitch range a scale is resolved within.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PitchWindow {
    pub low: u8,
    pub high: u8,
}

impl PitchWindow {
    /// C3 (48) through C6 (84).
    pub const C3_C6: PitchWindow = PitchWindow { low: 48, high: 84 };

    pub fn new(low: u8, high: u8) -> Result<Self> {
        let window = PitchWindow { low, high };
        window.validate()?;
        Ok(window)
    }

    pub fn validate(&self) -> Result<()> {
        if self.low > self.high || self.high > 127 {
            return Err(ComposeError::InvalidWindow {
                low: self.low,
                high: self.high,
            });
        }
        Ok(())
    }
}

impl Default for PitchWindow {
    fn default() -> Self {
        PitchWindow::C3_C6
    }
}

/// Ascending, duplicate-free set of in-key MIDI pitches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scale {
    pub key: Key,
    pub window: PitchWindow,
    pitches: Vec<u8>,
}

impl Scale {
    pub fn pitches(&self) -> &[u8] {
        &self.pitches
    }

    pub fn len(&self) -> usize {
        self.pitches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pitches.is_empty()
    }

    /// Membership test. The list is sorted, so this is a binary search.
    pub fn contains(&self, pitch: u8) -> bool {
        self.pitches.binary_search(&pitch).is_ok()
    }

    /// Position of a pitch in the scale, if it is a member.
    pub fn index_of(&self, pitch: u8) -> Option<usize> {
        self.pitches.binary_search(&pitch).ok()
    }

    /// Build a scale from an explicit pitch list. Sorts and deduplicates;
    /// used by callers that bring their own pitch material.
    pub fn from_pitches(key: Key, window: PitchWindow, mut pitches: Vec<u8>) -> Self {
        pitches.sort_unstable();
        pitches.dedup();
        Scale {
            key,
            window,
            pitches,
        }
    }
}

/// Resolve a tonic name and mode into a scale over the default C3-C6 window.
pub fn resolve(tonic: &str, mode: Mode) -> Result<Scale> {
    let key = Key::new(parse_pitch_class(tonic)?, mode);
    resolve_in(key, PitchWindow::default())
}

/// Resolve a key into a scale over an explicit window.
pub fn resolve_in(key: Key, window: PitchWindow) -> Result<Scale> {
    window.validate()?;
    let pitches = key.pitches_in_range(window.low, window.high);
    tracing::debug!(%key, low = window.low, high = window.high, count = pitches.len(), "resolved scale");
    Ok(Scale {
        key,
        window,
        pitches,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_c_major_c3_c6() {
        let scale = resolve("C", Mode::Major).unwrap();
        assert_eq!(
            scale.pitches(),
            &[
                48, 50, 52, 53, 55, 57, 59, 60, 62, 64, 65, 67, 69, 71, 72, 74, 76, 77, 79, 81,
                83, 84
            ]
        );
    }

    #[test]
    fn test_every_key_is_ascending_and_in_window() {
        for tonic in 0..12u8 {
            for mode in Mode::ALL {
                let key = Key::new(tonic, mode);
                let scale = resolve_in(key, PitchWindow::default()).unwrap();
                assert!(!scale.is_empty());
                assert!(
                    scale.pitches().windows(2).all(|w| w[0] < w[1]),
                    "{key} not strictly ascending"
                );
                assert!(
                    scale.pitches().iter().all(|&p| (48..=84).contains(&p)),
                    "{key} escapes the window"
                );
                assert!(scale.pitches().iter().all(|&p| key.contains(p)));
            }
        }
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let a = resolve("F#", Mode::Dorian).unwrap();
        let b = resolve("F#", Mode::Dorian).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_narrow_window_excludes_out_of_range() {
        let key = Key::new(0, Mode::Major);
        let scale = resolve_in(key, PitchWindow::new(60, 64).unwrap()).unwrap();
        assert_eq!(scale.pitches(), &[60, 62, 64]);
    }

    #[test]
    fn test_invalid_tonic() {
        assert!(matches!(
            resolve("X", Mode::Major),
            Err(ComposeError::InvalidScale(_))
        ));
    }

    #[test]
    fn test_invalid_window() {
        assert!(matches!(
            PitchWindow::new(70, 60),
            Err(ComposeError::InvalidWindow { low: 70, high: 60 })
        ));
        assert!(PitchWindow::new(0, 128).is_err());
    }

    #[test]
    fn test_from_pitches_sorts_and_dedups() {
        let key = Key::new(0, Mode::Major);
        let scale = Scale::from_pitches(key, PitchWindow::default(), vec![64, 60, 62, 60]);
        assert_eq!(scale.pitches(), &[60, 62, 64]);
        assert_eq!(scale.index_of(62), Some(1));
        assert!(!scale.contains(61));
    }
}
