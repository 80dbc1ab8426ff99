// Named musical requests.
//
// Each preset is a ready-made `ComposeParams`: a mood expressed as key, length
// and energy. The CLI exposes them through `--preset`; explicit flags still
// override individual fields.

use crate::composer::ComposeParams;
use crate::error::{ComposeError, Result};
use crate::mode::{Key, Mode};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// C major, unhurried and soft.
    Calm,
    /// A minor, fast and loud.
    Energetic,
    /// F lydian, floating mid-energy.
    LydianDream,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Calm, Preset::Energetic, Preset::LydianDream];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Calm => "calm",
            Preset::Energetic => "energetic",
            Preset::LydianDream => "lydian_dream",
        }
    }

    pub fn params(self) -> ComposeParams {
        match self {
            Preset::Calm => ComposeParams {
                key: Key::new(0, Mode::Major),
                bars: 8,
                energy: 0.2,
            },
            Preset::Energetic => ComposeParams {
                key: Key::new(9, Mode::Minor),
                bars: 8,
                energy: 0.85,
            },
            Preset::LydianDream => ComposeParams {
                key: Key::new(5, Mode::Lydian),
                bars: 8,
                energy: 0.4,
            },
        }
    }
}

impl FromStr for Preset {
    type Err = ComposeError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase().replace('-', "_");
        Preset::ALL
            .into_iter()
            .find(|p| p.name() == lower)
            .ok_or_else(|| ComposeError::UnknownPreset(s.to_string()))
    }
}
