// Per-note phrasing and velocity.
//
// Each note gets at most one of two markings: a mezzo-forte dynamic or a
// staccato articulation, never both. The probabilities depend only on the
// note's written length:
//
//   length >= 1 beat:  mf 0.50, staccato 0.15, plain 0.35
//   length <  1 beat:  mf 0.00, staccato 0.30, plain 0.70
//
// (The 0.15 is the 0.3 staccato chance applied to the half of long notes
// that did not get the dynamic.) This is drawn as one weighted choice so
// the exclusivity is structural.
//
// Velocity centres on 64 + round(energy * 30) with integer jitter in
// [-10, 10], clamped to the MIDI range.

use crate::event::SIXTEENTHS_PER_QUARTER;
use music_prod_prng::ComposerRng;
use serde::{Deserialize, Serialize};

/// Chance that a note of at least one beat is marked mezzo-forte.
pub const DYNAMIC_CHANCE: f64 = 0.5;

/// Chance of staccato for a note that did not receive a dynamic.
pub const STACCATO_CHANCE: f64 = 0.3;

pub const BASE_VELOCITY: i32 = 64;
pub const ENERGY_VELOCITY_SPAN: f64 = 30.0;
pub const VELOCITY_JITTER: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Articulation {
    #[default]
    None,
    Staccato,
}

/// Dynamic markings. Only mezzo-forte is produced by the phrasing choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dynamic {
    Mf,
}

impl Dynamic {
    pub fn symbol(self) -> &'static str {
        match self {
            Dynamic::Mf => "mf",
        }
    }
}

/// Outcome of the phrasing choice for one note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phrasing {
    Dynamic(Dynamic),
    Staccato,
    Plain,
}

impl Phrasing {
    pub fn articulation(self) -> Articulation {
        match self {
            Phrasing::Staccato => Articulation::Staccato,
            _ => Articulation::None,
        }
    }

    pub fn dynamic(self) -> Option<Dynamic> {
        match self {
            Phrasing::Dynamic(d) => Some(d),
            _ => None,
        }
    }
}

/// Outcome weights (dynamic, staccato, plain) for a note of the given
/// length in sixteenths.
pub fn phrasing_weights(duration: u32) -> [f64; 3] {
    let dynamic = if duration >= SIXTEENTHS_PER_QUARTER {
        DYNAMIC_CHANCE
    } else {
        0.0
    };
    let staccato = (1.0 - dynamic) * STACCATO_CHANCE;
    [dynamic, staccato, 1.0 - dynamic - staccato]
}

/// Draw the phrasing for one note. Consumes exactly one `next_f64`.
pub fn choose_phrasing(duration: u32, rng: &mut ComposerRng) -> Phrasing {
    match rng.weighted_index(&phrasing_weights(duration)) {
        Some(0) => Phrasing::Dynamic(Dynamic::Mf),
        Some(1) => Phrasing::Staccato,
        _ => Phrasing::Plain,
    }
}

/// Centre velocity for an energy level, before jitter.
pub fn base_velocity(energy: f64) -> i32 {
    BASE_VELOCITY + (energy * ENERGY_VELOCITY_SPAN).round() as i32
}

/// Draw a note velocity for an energy level in [0, 1].
pub fn note_velocity(energy: f64, rng: &mut ComposerRng) -> u8 {
    let jitter = rng.range_i32_inclusive(-VELOCITY_JITTER, VELOCITY_JITTER);
    (base_velocity(energy) + jitter).clamp(0, 127) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_sum_to_one() {
        for duration in [1, 2, 3, 4, 6, 8] {
            let w = phrasing_weights(duration);
            assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        }
        assert_eq!(phrasing_weights(4)[0], 0.5);
        assert!((phrasing_weights(4)[1] - 0.15).abs() < 1e-12);
        let short = phrasing_weights(2);
        assert_eq!(short[0], 0.0);
        assert!((short[1] - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_short_notes_never_get_dynamics() {
        let mut rng = ComposerRng::new(11);
        for _ in 0..2000 {
            let p = choose_phrasing(2, &mut rng);
            assert_ne!(p, Phrasing::Dynamic(Dynamic::Mf));
        }
    }

    #[test]
    fn test_long_note_distribution() {
        let mut rng = ComposerRng::new(12);
        let n = 20_000;
        let mut counts = [0usize; 3];
        for _ in 0..n {
            let idx = match choose_phrasing(8, &mut rng) {
                Phrasing::Dynamic(_) => 0,
                Phrasing::Staccato => 1,
                Phrasing::Plain => 2,
            };
            counts[idx] += 1;
        }
        let frac = |c: usize| c as f64 / n as f64;
        assert!((0.47..0.53).contains(&frac(counts[0])));
        assert!((0.13..0.17).contains(&frac(counts[1])));
        assert!((0.32..0.38).contains(&frac(counts[2])));
    }

    #[test]
    fn test_phrasing_projection_is_exclusive() {
        let dyn_note = Phrasing::Dynamic(Dynamic::Mf);
        assert_eq!(dyn_note.dynamic(), Some(Dynamic::Mf));
        assert_eq!(dyn_note.articulation(), Articulation::None);
        assert_eq!(Phrasing::Staccato.dynamic(), None);
        assert_eq!(Phrasing::Staccato.articulation(), Articulation::Staccato);
    }

    #[test]
    fn test_velocity_bounds_by_energy() {
        let mut rng = ComposerRng::new(13);
        for _ in 0..5000 {
            let low = note_velocity(0.0, &mut rng);
            assert!((54..=74).contains(&low), "energy 0 gave {low}");
            let high = note_velocity(1.0, &mut rng);
            assert!((84..=104).contains(&high), "energy 1 gave {high}");
        }
    }

    #[test]
    fn test_base_velocity_rounds() {
        assert_eq!(base_velocity(0.0), 64);
        assert_eq!(base_velocity(0.5), 79);
        assert_eq!(base_velocity(1.0), 94);
    }
}
