// Data-driven composer configuration.
//
// Every tunable constant of the composer that is not part of the musical
// request itself (key, bars, energy) lives in `ComposerConfig`, loaded from
// JSON or taken from `Default`. Fields missing from a JSON file fall back to
// their defaults, so a config file only needs the values it changes.
//
// See also: `composer.rs` which reads the config, `midi.rs` for the
// `MidiOptions` sub-struct, and `preset.rs` for named musical requests.

use crate::contour::Contour;
use crate::error::{ComposeError, Result};
use crate::harmony::ChordPolicy;
use crate::midi::MidiOptions;
use crate::scale::PitchWindow;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    /// Absolute pitch range the scale is resolved within.
    pub window: PitchWindow,

    /// Pitches per generated motif.
    pub motif_length: usize,

    /// How the harmonic planner fills progression slots.
    pub chord_policy: ChordPolicy,

    /// Derive follow-up motifs from the previous one (repetition, sequence,
    /// augmentation, diminution) instead of always drawing fresh ones.
    pub develop_motifs: bool,

    /// Start each fresh motif near a melodic contour's target pitch.
    pub shape_contour: bool,

    /// Contour to follow when shaping. None draws one per piece.
    pub contour: Option<Contour>,

    /// Emit chord events. With this off the piece is melody only and no
    /// progression is planned.
    pub emit_chords: bool,

    /// Tempo at energy 0, in BPM.
    pub tempo_base_bpm: f64,

    /// Tempo added at energy 1, in BPM. Tempo scales linearly between.
    pub tempo_energy_span_bpm: f64,

    pub midi: MidiOptions,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            window: PitchWindow::default(),
            motif_length: 3,
            chord_policy: ChordPolicy::Cyclic,
            develop_motifs: false,
            shape_contour: false,
            contour: None,
            emit_chords: true,
            tempo_base_bpm: 60.0,
            tempo_energy_span_bpm: 80.0,
            midi: MidiOptions::default(),
        }
    }
}

impl ComposerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ComposerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.window.validate()?;
        if self.motif_length == 0 {
            return Err(ComposeError::InvalidMotifLength(self.motif_length));
        }
        self.midi.validate()?;
        Ok(())
    }

    /// Tempo for an energy level, rounded to whole BPM and kept within the
    /// range a MIDI tempo event can express.
    pub fn tempo_for_energy(&self, energy: f64) -> u16 {
        let bpm = self.tempo_base_bpm + energy * self.tempo_energy_span_bpm;
        bpm.round().clamp(4.0, 1000.0) as u16
    }
}
