// MIDI output from compositions.
//
// Converts a Composition into a Standard MIDI File (SMF Format 1) for
// playback or import into a DAW. Three tracks:
// - Track 0: tempo, time signature and key signature.
// - Track 1 "Melody": one note per NoteEvent. Staccato notes sound for half
//   their written length; dynamic markings ride along as Text meta events.
// - Track 2 "Chords": each ChordEvent sustains until the next chord event or
//   the end of the piece.
//
// Events are collected with absolute ticks, sorted (note-offs before
// note-ons at the same tick so repeated pitches retrigger cleanly), then
// delta-encoded.
//
// Uses the `midly` crate for the binary encoding.

use crate::error::{ComposeError, Result};
use crate::event::{Composition, Event, MetaEvent, SIXTEENTHS_PER_QUARTER};
use crate::phrasing::Articulation;
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Rendering choices that do not affect the composition itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiOptions {
    /// Ticks per quarter note. Must be a multiple of 4 to land sixteenths
    /// on whole ticks.
    pub ticks_per_quarter: u16,
    /// General MIDI program for the melody (0 = acoustic grand piano).
    pub melody_program: u8,
    /// General MIDI program for the chord pad (48 = string ensemble).
    pub chord_program: u8,
    /// Fixed velocity for chord tones.
    pub chord_velocity: u8,
}

impl MidiOptions {
    /// The grid is sixteenths, so a quarter must split into four whole
    /// ticks, and the header field is 15 bits.
    pub fn validate(&self) -> Result<()> {
        let tpq = self.ticks_per_quarter;
        if tpq == 0 || tpq % SIXTEENTHS_PER_QUARTER as u16 != 0 || tpq > 0x7ffc {
            return Err(ComposeError::InvalidTicksPerQuarter(tpq));
        }
        Ok(())
    }
}

impl Default for MidiOptions {
    fn default() -> Self {
        Self {
            ticks_per_quarter: 480,
            melody_program: 0,
            chord_program: 48,
            chord_velocity: 56,
        }
    }
}

const MELODY_CHANNEL: u8 = 0;
const CHORD_CHANNEL: u8 = 1;

/// Convert a Composition to MIDI and write it to a file.
pub fn write_midi(composition: &Composition, path: &Path, options: &MidiOptions) -> Result<()> {
    let bytes = midi_bytes(composition, options)?;
    std::fs::write(path, &bytes)?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "wrote MIDI file");
    Ok(())
}

/// Encode a Composition as SMF bytes.
pub fn midi_bytes(composition: &Composition, options: &MidiOptions) -> Result<Vec<u8>> {
    let smf = composition_to_smf(composition, options)?;
    let mut buf = Vec::new();
    smf.write_std(&mut buf)?;
    Ok(buf)
}

/// Convert a Composition to an in-memory SMF.
pub fn composition_to_smf(
    composition: &Composition,
    options: &MidiOptions,
) -> Result<Smf<'static>> {
    options.validate()?;
    let tpq = options.ticks_per_quarter;
    let ticks_per_sixteenth = u32::from(tpq) / SIXTEENTHS_PER_QUARTER;
    let to_ticks = |sixteenths: u32| sixteenths * ticks_per_sixteenth;

    let mut smf = Smf::new(Header::new(Format::Parallel, Timing::Metrical(u15::new(tpq))));
    smf.tracks.push(conductor_track(composition));

    // Melody
    let mut melody: Vec<(u32, TrackEventKind<'static>)> = vec![
        (0, TrackEventKind::Meta(MetaMessage::TrackName(b"Melody"))),
        (0, program_change(MELODY_CHANNEL, options.melody_program)),
    ];
    for note in composition.notes() {
        let start = to_ticks(note.offset);
        let written = to_ticks(note.duration);
        let sounding = match note.articulation {
            Articulation::Staccato => (written / 2).max(1),
            Articulation::None => written,
        };
        if let Some(dynamic) = note.dynamic {
            melody.push((
                start,
                TrackEventKind::Meta(MetaMessage::Text(dynamic.symbol().as_bytes())),
            ));
        }
        melody.push((start, note_on(MELODY_CHANNEL, note.pitch, note.velocity)));
        melody.push((start + sounding, note_off(MELODY_CHANNEL, note.pitch)));
    }
    smf.tracks.push(encode_track(melody));

    // Chords
    let piece_end = to_ticks(composition.length());
    let chord_events: Vec<_> = composition.chords().collect();
    let mut chords: Vec<(u32, TrackEventKind<'static>)> = vec![
        (0, TrackEventKind::Meta(MetaMessage::TrackName(b"Chords"))),
        (0, program_change(CHORD_CHANNEL, options.chord_program)),
    ];
    for (i, chord) in chord_events.iter().enumerate() {
        let start = to_ticks(chord.offset);
        let stop = chord_events
            .get(i + 1)
            .map_or(piece_end, |next| to_ticks(next.offset));
        if stop <= start {
            continue;
        }
        for &pitch in &chord.chord.pitches {
            chords.push((start, note_on(CHORD_CHANNEL, pitch, options.chord_velocity)));
            chords.push((stop, note_off(CHORD_CHANNEL, pitch)));
        }
    }
    smf.tracks.push(encode_track(chords));

    Ok(smf)
}

/// Track 0: tempo, meter and key signature at tick 0.
fn conductor_track(composition: &Composition) -> Track<'static> {
    let mut events: Vec<(u32, TrackEventKind<'static>)> = Vec::new();
    for event in &composition.events {
        let Event::Meta(meta) = event else {
            continue;
        };
        let message = match *meta {
            MetaEvent::Tempo { bpm } => {
                let micros_per_quarter = 60_000_000 / u32::from(bpm.max(4));
                MetaMessage::Tempo(u24::new(micros_per_quarter))
            }
            MetaEvent::TimeSignature {
                numerator,
                denominator,
            } => MetaMessage::TimeSignature(
                numerator,
                denominator.max(1).trailing_zeros() as u8,
                24,
                8,
            ),
            MetaEvent::Key(key) => MetaMessage::KeySignature(
                key.signature_accidentals(),
                key.mode.is_minor_key_signature(),
            ),
        };
        events.push((0, TrackEventKind::Meta(message)));
    }
    encode_track(events)
}

fn program_change(channel: u8, program: u8) -> TrackEventKind<'static> {
    TrackEventKind::Midi {
        channel: u4::new(channel),
        message: MidiMessage::ProgramChange {
            program: u7::new(program.min(127)),
        },
    }
}

fn note_on(channel: u8, pitch: u8, velocity: u8) -> TrackEventKind<'static> {
    TrackEventKind::Midi {
        channel: u4::new(channel),
        message: MidiMessage::NoteOn {
            key: u7::new(pitch.min(127)),
            vel: u7::new(velocity.min(127)),
        },
    }
}

fn note_off(channel: u8, pitch: u8) -> TrackEventKind<'static> {
    TrackEventKind::Midi {
        channel: u4::new(channel),
        message: MidiMessage::NoteOff {
            key: u7::new(pitch.min(127)),
            vel: u7::new(0),
        },
    }
}

/// Sort order within one tick: metadata, then note-offs, then everything
/// else.
fn tick_rank(kind: &TrackEventKind<'_>) -> u8 {
    match kind {
        TrackEventKind::Meta(_) => 0,
        TrackEventKind::Midi {
            message: MidiMessage::NoteOff { .. },
            ..
        } => 1,
        _ => 2,
    }
}

/// Sort absolute-tick events, convert to deltas and terminate the track.
fn encode_track(mut events: Vec<(u32, TrackEventKind<'static>)>) -> Track<'static> {
    events.sort_by_key(|(tick, kind)| (*tick, tick_rank(kind)));
    let mut track: Track<'static> = Vec::with_capacity(events.len() + 1);
    let mut last_tick = 0;
    for (tick, kind) in events {
        track.push(TrackEvent {
            delta: u28::new(tick - last_tick),
            kind,
        });
        last_tick = tick;
    }
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    track
}
