// Melodic contour shaping.
//
// A contour gives the piece an overall pitch trajectory. Each shape has a
// base pitch and a climax pitch derived from the resolved scale, plus an
// envelope over the piece (0 = base, 1 = climax) given as piecewise-linear
// breakpoints:
//
//   arc      rises to the climax at 60% of the piece, then falls
//   plateau  reaches the climax by 30%, holds it until 70%, then falls
//   pyramid  symmetric rise and fall around the midpoint
//   wave     two smaller swells peaking at 25% and 75%
//
// The composer only uses the contour to pick where each fresh motif starts:
// the opening pitch is drawn uniformly among scale pitches within
// `CONTOUR_SPREAD` semitones of the target at the current position. The
// motif's random walk then proceeds as usual, so every note stays in scale.
//
// Shaping is opt-in (`ComposerConfig::shape_contour`). With it off, the
// composer draws no contour and consumes no extra randomness.

use crate::scale::Scale;
use music_prod_prng::ComposerRng;
use serde::{Deserialize, Serialize};

/// Semitones either side of the contour target a motif may start on.
pub const CONTOUR_SPREAD: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Contour {
    Arc,
    Plateau,
    Pyramid,
    Wave,
}

impl Contour {
    pub const ALL: [Contour; 4] = [
        Contour::Arc,
        Contour::Plateau,
        Contour::Pyramid,
        Contour::Wave,
    ];

    /// Envelope breakpoints as (position in the piece, height), both in
    /// [0, 1], sorted by position.
    fn breakpoints(self) -> &'static [(f64, f64)] {
        match self {
            Contour::Arc => &[(0.0, 0.0), (0.6, 1.0), (1.0, 0.0)],
            Contour::Plateau => &[(0.0, 0.0), (0.3, 1.0), (0.7, 1.0), (1.0, 0.0)],
            Contour::Pyramid => &[(0.0, 0.0), (0.5, 1.0), (1.0, 0.0)],
            Contour::Wave => &[(0.0, 0.0), (0.25, 1.0), (0.5, 0.0), (0.75, 1.0), (1.0, 0.0)],
        }
    }

    /// Envelope height at `progress` (clamped to [0, 1]).
    pub fn envelope(self, progress: f64) -> f64 {
        let x = if progress.is_finite() {
            progress.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let points = self.breakpoints();
        for pair in points.windows(2) {
            let (x0, y0) = pair[0];
            let (x1, y1) = pair[1];
            if x <= x1 {
                return y0 + (y1 - y0) * (x - x0) / (x1 - x0);
            }
        }
        points.last().map_or(0.0, |&(_, y)| y)
    }
}

/// A contour resolved against a concrete scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContourShape {
    pub contour: Contour,
    /// Pitch at envelope height 0.
    pub base: f64,
    /// Pitch at envelope height 1.
    pub climax: f64,
}

impl ContourShape {
    /// Derive base and climax from the scale's range. Returns None for an
    /// empty scale.
    ///
    /// - arc: climax an octave below the top, base an octave above the bottom
    /// - plateau: climax at the mean pitch, base a fifth below it
    /// - pyramid: climax at the median pitch, base an octave above the bottom
    /// - wave: climax at the mean pitch, base a fourth below it
    pub fn new(contour: Contour, scale: &Scale) -> Option<Self> {
        let pitches = scale.pitches();
        let lowest = f64::from(*pitches.first()?);
        let highest = f64::from(*pitches.last()?);
        let mean = pitches.iter().map(|&p| f64::from(p)).sum::<f64>() / pitches.len() as f64;
        let median = {
            let mid = pitches.len() / 2;
            if pitches.len() % 2 == 0 {
                (f64::from(pitches[mid - 1]) + f64::from(pitches[mid])) / 2.0
            } else {
                f64::from(pitches[mid])
            }
        };
        let (climax, base) = match contour {
            Contour::Arc => (highest - 12.0, lowest + 12.0),
            Contour::Plateau => (mean, mean - 7.0),
            Contour::Pyramid => (median, lowest + 12.0),
            Contour::Wave => (mean, mean - 5.0),
        };
        Some(ContourShape {
            contour,
            base,
            climax,
        })
    }

    /// Target pitch (not snapped to the scale) at `progress` through the
    /// piece.
    pub fn target(&self, progress: f64) -> f64 {
        self.base + (self.climax - self.base) * self.contour.envelope(progress)
    }

    /// Draw a motif start near the target at `progress`: uniform among scale
    /// pitches within `CONTOUR_SPREAD` of it, or the nearest scale pitch if
    /// none is that close. None only for an empty scale.
    pub fn start_pitch(&self, scale: &Scale, progress: f64, rng: &mut ComposerRng) -> Option<u8> {
        let target = self.target(progress);
        let near: Vec<u8> = scale
            .pitches()
            .iter()
            .copied()
            .filter(|&p| (f64::from(p) - target).abs() <= CONTOUR_SPREAD)
            .collect();
        if let Some(&pitch) = rng.choose(&near) {
            return Some(pitch);
        }
        scale.pitches().iter().copied().min_by(|&a, &b| {
            let da = (f64::from(a) - target).abs();
            let db = (f64::from(b) - target).abs();
            da.total_cmp(&db)
        })
    }
}

/// Pick a contour: the configured one, or a uniform draw over all four.
pub fn choose_contour(fixed: Option<Contour>, rng: &mut ComposerRng) -> Contour {
    match fixed {
        Some(contour) => contour,
        None => Contour::ALL[rng.range_usize(0, Contour::ALL.len())],
    }
}
