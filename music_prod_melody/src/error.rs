// Error taxonomy for melody composition.
//
// Every failure is raised synchronously at the point of violation and never
// retried: composition is a pure function of its inputs and the injected
// generator, so there are no transient faults. The CLI surfaces these
// unmodified (wrapped in `anyhow` context).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("invalid scale: {0}")]
    InvalidScale(String),

    #[error("scale has {available} pitches but the chord table needs index {index}")]
    InsufficientScaleRange { index: usize, available: usize },

    #[error("degenerate scale: {0}")]
    DegenerateScale(String),

    #[error("energy must be within [0, 1], got {0}")]
    InvalidEnergy(f64),

    #[error("motif length must be at least 1, got {0}")]
    InvalidMotifLength(usize),

    #[error("invalid pitch window {low}..={high}")]
    InvalidWindow { low: u8, high: u8 },

    #[error("ticks per quarter must be a positive multiple of 4 up to 32764, got {0}")]
    InvalidTicksPerQuarter(u16),

    #[error("unknown preset '{0}'")]
    UnknownPreset(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ComposeError>;
