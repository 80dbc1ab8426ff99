// Keys and modes: the tonal vocabulary the composer works in.
//
// A `Key` is a tonic pitch class plus a `Mode`. The modern major/minor pair
// sits alongside the seven diatonic church modes; each mode is defined by
// its seven semitone offsets from the tonic.
//
// This module provides:
// - Mode definitions and name parsing
// - Pitch-class name parsing ("C", "F#", "Bb", "B-")
// - Key membership tests for MIDI pitches
// - Key-signature data (sharps/flats) for the MIDI writer
//
// Used by scale.rs to resolve pitch sets, harmony.rs to pick a chord table,
// and midi.rs for the key-signature meta event.

use crate::error::{ComposeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported modes, each defined by its interval pattern from the tonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Major scale. The only mode that selects the major chord table.
    Major,
    /// Natural minor.
    Minor,
    /// C D E F G A B: same pitches as major, named as a church mode.
    Ionian,
    /// Natural minor with raised 6th.
    Dorian,
    /// Natural minor with lowered 2nd.
    Phrygian,
    /// Major with raised 4th.
    Lydian,
    /// Major with lowered 7th.
    Mixolydian,
    /// Natural minor, named as a church mode.
    Aeolian,
    /// Diminished tonic triad; lowered 2nd and 5th.
    Locrian,
}

impl Mode {
    pub const ALL: [Mode; 9] = [
        Mode::Major,
        Mode::Minor,
        Mode::Ionian,
        Mode::Dorian,
        Mode::Phrygian,
        Mode::Lydian,
        Mode::Mixolydian,
        Mode::Aeolian,
        Mode::Locrian,
    ];

    /// Semitone intervals from the tonic to each of the 7 scale degrees.
    pub fn intervals(self) -> [u8; 7] {
        match self {
            Mode::Major | Mode::Ionian => [0, 2, 4, 5, 7, 9, 11],
            Mode::Minor | Mode::Aeolian => [0, 2, 3, 5, 7, 8, 10],
            Mode::Dorian => [0, 2, 3, 5, 7, 9, 10],
            Mode::Phrygian => [0, 1, 3, 5, 7, 8, 10],
            Mode::Lydian => [0, 2, 4, 6, 7, 9, 11],
            Mode::Mixolydian => [0, 2, 4, 5, 7, 9, 10],
            Mode::Locrian => [0, 1, 3, 5, 6, 8, 10],
        }
    }

    /// The 12 pitch classes that belong to the mode, indexed relative to the
    /// tonic (index 0 is the tonic itself).
    pub fn pitch_classes(self) -> [bool; 12] {
        let mut pcs = [false; 12];
        for &interval in &self.intervals() {
            pcs[interval as usize] = true;
        }
        pcs
    }

    /// Distance in semitones from the relative major's tonic up to this
    /// mode's tonic. D Dorian shares C major's pitches, so Dorian is 2.
    pub fn offset_from_relative_major(self) -> u8 {
        match self {
            Mode::Major | Mode::Ionian => 0,
            Mode::Dorian => 2,
            Mode::Phrygian => 4,
            Mode::Lydian => 5,
            Mode::Mixolydian => 7,
            Mode::Minor | Mode::Aeolian => 9,
            Mode::Locrian => 11,
        }
    }

    /// Whether a standard key signature should mark this key as minor.
    pub fn is_minor_key_signature(self) -> bool {
        matches!(self, Mode::Minor | Mode::Aeolian)
    }

    pub fn name(self) -> &'static str {
        match self {
            Mode::Major => "major",
            Mode::Minor => "minor",
            Mode::Ionian => "ionian",
            Mode::Dorian => "dorian",
            Mode::Phrygian => "phrygian",
            Mode::Lydian => "lydian",
            Mode::Mixolydian => "mixolydian",
            Mode::Aeolian => "aeolian",
            Mode::Locrian => "locrian",
        }
    }
}

impl FromStr for Mode {
    type Err = ComposeError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        Mode::ALL
            .into_iter()
            .find(|m| m.name() == lower)
            .ok_or_else(|| ComposeError::InvalidScale(format!("unknown mode '{s}'")))
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parse a pitch class name ("C", "F#", "Bb", "E-") into a semitone 0-11.
///
/// The letter is case-insensitive. `#` and `s` raise by a semitone, `b` and
/// `-` lower by one. Anything else is an `InvalidScale` error.
pub fn parse_pitch_class(name: &str) -> Result<u8> {
    let trimmed = name.trim();
    let invalid = || ComposeError::InvalidScale(format!("unknown tonic '{name}'"));

    let mut chars = trimmed.chars();
    let letter = chars.next().ok_or_else(invalid)?;
    let base: i32 = match letter.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return Err(invalid()),
    };
    let accidental: i32 = match chars.as_str() {
        "" => 0,
        "#" | "s" => 1,
        "b" | "-" => -1,
        _ => return Err(invalid()),
    };
    Ok((base + accidental).rem_euclid(12) as u8)
}

/// Display name for a pitch class, preferring sharps except for the flats
/// that are conventional in key names.
pub fn pitch_class_name(pc: u8) -> &'static str {
    match pc % 12 {
        0 => "C",
        1 => "C#",
        2 => "D",
        3 => "Eb",
        4 => "E",
        5 => "F",
        6 => "F#",
        7 => "G",
        8 => "Ab",
        9 => "A",
        10 => "Bb",
        _ => "B",
    }
}

/// A tonic plus a mode. Immutable once constructed.
///
/// The tonic is always a pitch class below 12. Deserialization goes through
/// `Key::new`, so an out-of-range tonic in JSON wraps like any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "KeyFields")]
pub struct Key {
    /// Pitch class of the tonic (0 = C, 2 = D, ...).
    tonic: u8,
    pub mode: Mode,
}

#[derive(Deserialize)]
struct KeyFields {
    tonic: u8,
    mode: Mode,
}

impl From<KeyFields> for Key {
    fn from(fields: KeyFields) -> Self {
        Key::new(fields.tonic, fields.mode)
    }
}

impl Key {
    pub fn new(tonic: u8, mode: Mode) -> Self {
        Key {
            tonic: tonic % 12,
            mode,
        }
    }


    /// Parse a key name such as "C major", "A minor" or "F lydian". A lone
    /// tonic ("G") means major.
    pub fn parse(name: &str) -> Result<Self> {
        let mut parts = name.split_whitespace();
        let tonic = parts
            .next()
            .ok_or_else(|| ComposeError::InvalidScale("empty key name".to_string()))?;
        let rest: Vec<&str> = parts.collect();
        let mode = if rest.is_empty() {
            Mode::Major
        } else {
            rest.join(" ").parse()?
        };
        Ok(Key::new(parse_pitch_class(tonic)?, mode))
    }

    /// Check if a MIDI pitch belongs to this key.
    pub fn contains(&self, pitch: u8) -> bool {
        let pc = (pitch % 12 + 12 - self.tonic) % 12;
        self.mode.pitch_classes()[pc as usize]
    }

    /// All in-key pitches in an inclusive range, ascending.
    pub fn pitches_in_range(&self, low: u8, high: u8) -> Vec<u8> {
        (low..=high).filter(|&p| self.contains(p)).collect()
    }

    /// Number of sharps (positive) or flats (negative) in the key signature,
    /// computed from the relative major's position on the circle of fifths.
    pub fn signature_accidentals(&self) -> i8 {
        let relative_major = (self.tonic + 12 - self.mode.offset_from_relative_major()) % 12;
        // Multiplying by 7 (a fifth) maps a pitch class to its circle position.
        let fifths = (relative_major as i8 * 7).rem_euclid(12);
        if fifths > 6 { fifths - 12 } else { fifths }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", pitch_class_name(self.tonic), self.mode)
    }
}
