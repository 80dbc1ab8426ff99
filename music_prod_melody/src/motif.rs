// Motif and rhythm generation.
//
// A motif is a short constrained random walk over the scale: the first
// pitch is uniform over the scale, and each following pitch moves by a
// step drawn uniformly from {-2, -1, +1, +2} semitones, redrawn until it
// lands on a scale member. The redraw loop is bounded by
// `MAX_STEP_ATTEMPTS`; once exhausted, the step is drawn uniformly from the
// steps that land in the scale, which is the same distribution the
// unbounded loop converges to. A pitch with no in-scale neighbour within
// two semitones is a `DegenerateScale` error, as is a scale with fewer than
// two pitches.
//
// Rhythms come from four canned templates, chosen uniformly and not shaped
// by energy or bar length. The composer zips a motif with a rhythm and
// truncates to the shorter of the two.

use crate::error::{ComposeError, Result};
use crate::scale::Scale;
use music_prod_prng::ComposerRng;
use serde::{Deserialize, Serialize};

/// Candidate semitone steps for the motif walk.
pub const STEP_CHOICES: [i16; 4] = [-2, -1, 1, 2];

/// Redraws allowed per step before falling back to a direct choice among
/// the landing steps.
pub const MAX_STEP_ATTEMPTS: usize = 32;

/// Rhythm templates in sixteenths:
/// [1, 1, 2], [0.5, 0.5, 1, 2], [0.25, 0.25, 0.5, 1], [1, 0.5, 1.5, 1] beats.
pub const RHYTHM_TEMPLATES: [&[u32]; 4] = [&[4, 4, 8], &[2, 2, 4, 8], &[1, 1, 2, 4], &[4, 2, 6, 4]];

/// An ordered list of note durations in sixteenths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RhythmPattern {
    pub durations: Vec<u32>,
}

/// Generate a motif of `length` pitches, every one a member of `scale`.
/// The first pitch is uniform over the scale.
pub fn generate_motif(scale: &Scale, length: usize, rng: &mut ComposerRng) -> Result<Vec<u8>> {
    check_walkable(scale, length)?;
    let pitches = scale.pitches();
    let start = pitches[rng.range_usize(0, pitches.len())];
    walk(scale, start, length, MAX_STEP_ATTEMPTS, rng)
}

/// Generate a motif that starts on `start`, which must be a scale member.
/// Used when the contour picks the opening pitch.
pub fn generate_motif_from(
    scale: &Scale,
    start: u8,
    length: usize,
    rng: &mut ComposerRng,
) -> Result<Vec<u8>> {
    check_walkable(scale, length)?;
    if !scale.contains(start) {
        return Err(ComposeError::InvalidScale(format!(
            "motif start {start} is not in {}",
            scale.key
        )));
    }
    walk(scale, start, length, MAX_STEP_ATTEMPTS, rng)
}

fn check_walkable(scale: &Scale, length: usize) -> Result<()> {
    if length == 0 {
        return Err(ComposeError::InvalidMotifLength(length));
    }
    if scale.len() < 2 {
        return Err(ComposeError::DegenerateScale(format!(
            "random walk needs at least 2 pitches, scale has {}",
            scale.len()
        )));
    }
    Ok(())
}

fn walk(
    scale: &Scale,
    start: u8,
    length: usize,
    max_attempts: usize,
    rng: &mut ComposerRng,
) -> Result<Vec<u8>> {
    let mut current = start;
    let mut motif = Vec::with_capacity(length);
    motif.push(current);
    for _ in 1..length {
        current = next_walk_pitch(scale, current, max_attempts, rng)?;
        motif.push(current);
    }
    tracing::trace!(?motif, "generated motif");
    Ok(motif)
}

/// Take one step of the walk from `current`, redrawing at most
/// `max_attempts` times before choosing directly among the landing steps.
fn next_walk_pitch(
    scale: &Scale,
    current: u8,
    max_attempts: usize,
    rng: &mut ComposerRng,
) -> Result<u8> {
    let landing = |step: i16| -> Option<u8> {
        u8::try_from(i16::from(current) + step)
            .ok()
            .filter(|&p| scale.contains(p))
    };

    let reachable: Vec<u8> = STEP_CHOICES.iter().filter_map(|&s| landing(s)).collect();
    if reachable.is_empty() {
        return Err(ComposeError::DegenerateScale(format!(
            "no scale pitch within two semitones of {current}"
        )));
    }

    for _ in 0..max_attempts {
        let step = STEP_CHOICES[rng.range_usize(0, STEP_CHOICES.len())];
        if let Some(pitch) = landing(step) {
            return Ok(pitch);
        }
    }
    let idx = rng.range_usize(0, reachable.len());
    Ok(reachable[idx])
}

/// Pick one of the canned rhythm templates uniformly.
pub fn generate_rhythm(rng: &mut ComposerRng) -> RhythmPattern {
    let idx = rng.range_usize(0, RHYTHM_TEMPLATES.len());
    RhythmPattern {
        durations: RHYTHM_TEMPLATES[idx].to_vec(),
    }
}
