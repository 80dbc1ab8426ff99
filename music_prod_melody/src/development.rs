// Motivic development: deriving a new phrase from the previous one.
//
// When enabled in `ComposerConfig`, the composer reuses the previous motif
// within a chord span and transforms it with one of four techniques instead
// of drawing fresh material:
//
// - Repetition (0.3): exact restatement.
// - Sequence (0.3): shift every pitch by the same number of scale positions
//   (+-1 or +-2). Only shifts that keep the whole motif inside the scale are
//   eligible; with none eligible it degrades to repetition.
// - Augmentation (0.2): durations doubled.
// - Diminution (0.2): durations halved, floored at one sixteenth.
//
// Off by default, so plain composition is unaffected.

use crate::error::{ComposeError, Result};
use crate::motif::RhythmPattern;
use crate::scale::Scale;
use music_prod_prng::ComposerRng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Technique {
    Repetition,
    Sequence,
    Augmentation,
    Diminution,
}

impl Technique {
    pub const ALL: [Technique; 4] = [
        Technique::Repetition,
        Technique::Sequence,
        Technique::Augmentation,
        Technique::Diminution,
    ];

    pub fn weight(self) -> f64 {
        match self {
            Technique::Repetition | Technique::Sequence => 0.3,
            Technique::Augmentation | Technique::Diminution => 0.2,
        }
    }
}

/// Scale-position shifts a sequence may use.
const SEQUENCE_SHIFTS: [isize; 4] = [-2, -1, 1, 2];

/// Draw a development technique by weight.
pub fn choose_technique(rng: &mut ComposerRng) -> Technique {
    let weights = Technique::ALL.map(Technique::weight);
    let idx = rng.weighted_index(&weights).unwrap_or(0);
    Technique::ALL[idx]
}

/// Apply a technique to a motif and its rhythm.
///
/// Motif pitches must be scale members; a sequence of a pitch outside the
/// scale is a `DegenerateScale` error.
pub fn apply(
    technique: Technique,
    motif: &[u8],
    rhythm: &RhythmPattern,
    scale: &Scale,
    rng: &mut ComposerRng,
) -> Result<(Vec<u8>, RhythmPattern)> {
    let developed = match technique {
        Technique::Repetition => (motif.to_vec(), rhythm.clone()),
        Technique::Sequence => (transpose_in_scale(motif, scale, rng)?, rhythm.clone()),
        Technique::Augmentation => (
            motif.to_vec(),
            RhythmPattern {
                durations: rhythm.durations.iter().map(|&d| d * 2).collect(),
            },
        ),
        Technique::Diminution => (
            motif.to_vec(),
            RhythmPattern {
                durations: rhythm.durations.iter().map(|&d| (d / 2).max(1)).collect(),
            },
        ),
    };
    Ok(developed)
}

/// Choose a technique and apply it.
pub fn develop(
    motif: &[u8],
    rhythm: &RhythmPattern,
    scale: &Scale,
    rng: &mut ComposerRng,
) -> Result<(Vec<u8>, RhythmPattern)> {
    let technique = choose_technique(rng);
    tracing::trace!(?technique, "developing motif");
    apply(technique, motif, rhythm, scale, rng)
}

fn transpose_in_scale(motif: &[u8], scale: &Scale, rng: &mut ComposerRng) -> Result<Vec<u8>> {
    let positions: Vec<usize> = motif
        .iter()
        .map(|&p| {
            scale.index_of(p).ok_or_else(|| {
                ComposeError::DegenerateScale(format!("motif pitch {p} is not in the scale"))
            })
        })
        .collect::<Result<_>>()?;

    let fits = |shift: isize| {
        positions.iter().all(|&i| {
            i.checked_add_signed(shift)
                .is_some_and(|j| j < scale.len())
        })
    };
    let eligible: Vec<isize> = SEQUENCE_SHIFTS.into_iter().filter(|&s| fits(s)).collect();
    let Some(&shift) = rng.choose(&eligible) else {
        return Ok(motif.to_vec());
    };

    let pitches = scale.pitches();
    Ok(positions
        .iter()
        .filter_map(|&i| i.checked_add_signed(shift).map(|j| pitches[j]))
        .collect())
}
