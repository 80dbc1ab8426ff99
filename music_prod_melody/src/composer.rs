// The sequencing loop: scale, harmony and motifs assembled into a piece.
//
// Pipeline: validate request -> resolve scale -> plan progression -> emit
// meta events -> sequence. The sequencer's only state is the timeline
// position (in sixteenths), which starts at 0 and only grows.
//
// Each iteration of the sequencer:
// 1. Emits the chord for the current bar (`bar % progression.len()`),
//    unless chords are turned off.
// 2. Draws a motif and a rhythm (or, with development on and a previous
//    motif in the same bar, a developed variant of that motif). With
//    contour shaping on, a fresh motif starts near the contour's target
//    for the current position.
// 3. Walks the zipped (pitch, duration) pairs. A pair that would cross the
//    end of the piece ends sequencing outright: nothing is trimmed and the
//    rest of that motif is dropped. Every other pair becomes a NoteEvent
//    and advances the position.
//
// So the position never exceeds `bars * 16`, the total written note length
// never exceeds `bars * 4` quarters, and the loop runs at most one note per
// sixteenth of the piece. `bars == 0` emits only the meta events.
//
// All randomness comes from the caller's `ComposerRng`; the same seed and
// request always produce the same event list.

use crate::config::ComposerConfig;
use crate::contour::{ContourShape, choose_contour};
use crate::development::develop;
use crate::error::{ComposeError, Result};
use crate::event::{ChordEvent, Composition, Event, MetaEvent, NoteEvent, SIXTEENTHS_PER_BAR};
use crate::harmony::plan;
use crate::mode::Key;
use crate::motif::{RhythmPattern, generate_motif, generate_motif_from, generate_rhythm};
use crate::phrasing::{choose_phrasing, note_velocity};
use crate::scale::resolve_in;
use music_prod_prng::ComposerRng;
use serde::{Deserialize, Serialize};

/// What to compose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComposeParams {
    pub key: Key,
    /// Piece length in 4/4 bars.
    pub bars: u32,
    /// Intensity in [0, 1]; drives tempo and velocity.
    pub energy: f64,
}

/// Reject energies outside [0, 1], NaN included.
pub fn validate_energy(energy: f64) -> Result<()> {
    if (0.0..=1.0).contains(&energy) {
        Ok(())
    } else {
        Err(ComposeError::InvalidEnergy(energy))
    }
}

/// Compose a piece.
pub fn compose(
    params: &ComposeParams,
    config: &ComposerConfig,
    rng: &mut ComposerRng,
) -> Result<Composition> {
    validate_energy(params.energy)?;
    config.validate()?;

    let scale = resolve_in(params.key, config.window)?;
    let progression = if config.emit_chords {
        Some(plan(
            &scale,
            params.key.mode,
            params.bars as usize,
            config.chord_policy,
            rng,
        )?)
    } else {
        None
    };
    let shape = if config.shape_contour {
        let contour = choose_contour(config.contour, rng);
        let shape = ContourShape::new(contour, &scale);
        tracing::debug!(?shape, "contour");
        shape
    } else {
        None
    };
    let tempo_bpm = config.tempo_for_energy(params.energy);

    let mut events = vec![
        Event::Meta(MetaEvent::TimeSignature {
            numerator: 4,
            denominator: 4,
        }),
        Event::Meta(MetaEvent::Key(params.key)),
        Event::Meta(MetaEvent::Tempo { bpm: tempo_bpm }),
    ];

    let end = params.bars.saturating_mul(SIXTEENTHS_PER_BAR);
    let mut position: u32 = 0;
    // Last phrase drawn, with the bar it started in, for development.
    let mut previous: Option<(Vec<u8>, RhythmPattern, u32)> = None;

    'sequencing: while position < end {
        let bar = position / SIXTEENTHS_PER_BAR;
        if let Some(&chord) = progression
            .as_ref()
            .and_then(|p| p.chord_for_bar(bar as usize))
        {
            events.push(Event::Chord(ChordEvent {
                offset: position,
                chord,
            }));
        }

        let (motif, rhythm) = match previous.take() {
            Some((motif, rhythm, start_bar)) if config.develop_motifs && start_bar == bar => {
                develop(&motif, &rhythm, &scale, rng)?
            }
            _ => {
                let progress = f64::from(position) / f64::from(end);
                let start = shape.and_then(|s| s.start_pitch(&scale, progress, rng));
                let motif = match start {
                    Some(start) => generate_motif_from(&scale, start, config.motif_length, rng)?,
                    None => generate_motif(&scale, config.motif_length, rng)?,
                };
                (motif, generate_rhythm(rng))
            }
        };

        for (&pitch, &duration) in motif.iter().zip(rhythm.durations.iter()) {
            let Some(next) = position.checked_add(duration).filter(|&p| p <= end) else {
                tracing::trace!(position, duration, end, "phrase crosses the end, stopping");
                break 'sequencing;
            };

            let phrasing = choose_phrasing(duration, rng);
            let velocity = note_velocity(params.energy, rng);
            events.push(Event::Note(NoteEvent {
                offset: position,
                pitch,
                duration,
                velocity,
                articulation: phrasing.articulation(),
                dynamic: phrasing.dynamic(),
            }));
            position = next;
        }

        previous = Some((motif, rhythm, bar));
    }

    let composition = Composition {
        key: params.key,
        bars: params.bars,
        energy: params.energy,
        tempo_bpm,
        events,
    };
    tracing::info!(
        key = %params.key,
        bars = params.bars,
        tempo_bpm,
        notes = composition.notes().count(),
        chords = composition.chords().count(),
        filled = position,
        length = end,
        "composed piece"
    );
    Ok(composition)
}
