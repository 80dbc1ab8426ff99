// Timed musical events: the composer's output stream.
//
// Time is kept on an integer sixteenth-note grid (4 per quarter, 16 per 4/4
// bar) so that the timeline arithmetic is exact: every canned rhythm value
// is a whole number of sixteenths. Quarter-note views are derived for
// display and serialization.
//
// A `Composition` is append-only while the sequencing loop runs and is never
// mutated afterward. midi.rs is its only downstream consumer besides JSON
// export.

use crate::harmony::Chord;
use crate::mode::Key;
use crate::phrasing::{Articulation, Dynamic};
use serde::{Deserialize, Serialize};

/// Grid resolution: sixteenth notes per quarter note.
pub const SIXTEENTHS_PER_QUARTER: u32 = 4;

/// Sixteenth notes per 4/4 bar.
pub const SIXTEENTHS_PER_BAR: u32 = 4 * SIXTEENTHS_PER_QUARTER;

/// Convert a sixteenth count to quarter-note units.
pub fn to_quarters(sixteenths: u32) -> f64 {
    f64::from(sixteenths) / f64::from(SIXTEENTHS_PER_QUARTER)
}

/// A single sounding melody note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// Onset, in sixteenths from the start of the piece.
    pub offset: u32,
    pub pitch: u8,
    /// Written length in sixteenths.
    pub duration: u32,
    /// MIDI velocity, always within 0..=127.
    pub velocity: u8,
    pub articulation: Articulation,
    pub dynamic: Option<Dynamic>,
}

/// A chord entering at a timeline position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordEvent {
    pub offset: u32,
    pub chord: Chord,
}

/// Piece-level context, all at offset 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetaEvent {
    TimeSignature { numerator: u8, denominator: u8 },
    Key(Key),
    Tempo { bpm: u16 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    Meta(MetaEvent),
    Chord(ChordEvent),
    Note(NoteEvent),
}

/// A finished piece: its parameters plus the ordered event stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    pub key: Key,
    pub bars: u32,
    pub energy: f64,
    pub tempo_bpm: u16,
    pub events: Vec<Event>,
}

impl Composition {
    /// Piece length in sixteenths (the bound the timeline never exceeds).
    pub fn length(&self) -> u32 {
        self.bars.saturating_mul(SIXTEENTHS_PER_BAR)
    }

    pub fn notes(&self) -> impl Iterator<Item = &NoteEvent> {
        self.events.iter().filter_map(|e| match e {
            Event::Note(n) => Some(n),
            _ => None,
        })
    }

    pub fn chords(&self) -> impl Iterator<Item = &ChordEvent> {
        self.events.iter().filter_map(|e| match e {
            Event::Chord(c) => Some(c),
            _ => None,
        })
    }

    /// Sum of written note durations, in sixteenths.
    pub fn note_duration_total(&self) -> u32 {
        self.notes().map(|n| n.duration).sum()
    }

    /// End of the last note, in sixteenths (0 if there are none).
    pub fn end_of_last_note(&self) -> u32 {
        self.notes().map(|n| n.offset + n.duration).max().unwrap_or(0)
    }
}
