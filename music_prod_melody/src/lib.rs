// music_prod melody composer
//
// A seeded, parameterized melody generator for sketching ideas in a DAW.
// Given a key, a bar count and an energy level it produces a melody line
// over a repeating triad progression and writes it out as a Standard MIDI
// File. The pipeline is small and deterministic: one injected `ComposerRng`
// drives every random decision, so a seed reproduces a piece exactly.
//
// Architecture:
// - mode.rs: Keys, modes, pitch-class parsing, key signatures
// - scale.rs: Scale resolution over a fixed absolute pitch window
// - harmony.rs: Triad tables and progression planning (cyclic or random)
// - motif.rs: Constrained random-walk motifs and canned rhythm templates
// - phrasing.rs: Per-note dynamic/staccato choice and energy-driven velocity
// - contour.rs: Optional melodic contour (arc, plateau, pyramid, wave)
//   steering where motifs start
// - development.rs: Optional motif development (repetition, sequence,
//   augmentation, diminution)
// - composer.rs: The sequencing loop that assembles the event stream
// - event.rs: Timed events on a sixteenth-note grid, plus `Composition`
// - midi.rs: SMF output via `midly`
// - config.rs: JSON-loadable tunables
// - preset.rs: Named musical requests
// - error.rs: `ComposeError` taxonomy

pub mod composer;
pub mod config;
pub mod contour;
pub mod development;
pub mod error;
pub mod event;
pub mod harmony;
pub mod midi;
pub mod mode;
pub mod motif;
pub mod phrasing;
pub mod preset;
pub mod scale;

pub use composer::{ComposeParams, compose};
pub use config::ComposerConfig;
pub use error::{ComposeError, Result};
pub use event::{Composition, Event};
pub use mode::{Key, Mode};
