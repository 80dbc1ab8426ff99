// music_prod melody composer: CLI entry point.
//
// Composes a melody over a triad progression and writes it to MIDI.
// The pipeline: request assembly -> scale + harmony -> sequencing -> MIDI.
//
// Usage:
//   cargo run -p music_prod_melody -- [output.mid] [--preset NAME] [--key "A minor"]
//     [--bars N] [--energy F] [--seed N] [--config composer.json]
//     [--chord-policy cyclic|random] [--develop] [--motif-length N]
//     [--contour random|arc|plateau|pyramid|wave] [--no-chords] [--json events.json]
//
// Presets: calm, energetic, lydian_dream
// Modes: major, minor, ionian, dorian, phrygian, lydian, mixolydian, aeolian, locrian
//
// Logging goes through `tracing`; set RUST_LOG (e.g. `music_prod_melody=debug`)
// for stage-level detail.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use music_prod_melody::composer::{ComposeParams, compose};
use music_prod_melody::config::ComposerConfig;
use music_prod_melody::contour::Contour;
use music_prod_melody::harmony::ChordPolicy;
use music_prod_melody::midi::write_midi;
use music_prod_melody::mode::Key;
use music_prod_melody::preset::Preset;
use music_prod_prng::ComposerRng;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    Cyclic,
    Random,
}

impl From<PolicyArg> for ChordPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Cyclic => ChordPolicy::Cyclic,
            PolicyArg::Random => ChordPolicy::RandomPerSlot,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ContourArg {
    Random,
    Arc,
    Plateau,
    Pyramid,
    Wave,
}

impl ContourArg {
    fn fixed(self) -> Option<Contour> {
        match self {
            ContourArg::Random => None,
            ContourArg::Arc => Some(Contour::Arc),
            ContourArg::Plateau => Some(Contour::Plateau),
            ContourArg::Pyramid => Some(Contour::Pyramid),
            ContourArg::Wave => Some(Contour::Wave),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "compose", about = "Compose a seeded melody and write it as MIDI")]
struct Args {
    /// Output MIDI file.
    #[arg(default_value = "melody.mid")]
    output: PathBuf,

    /// Start from a named preset (calm, energetic, lydian_dream).
    #[arg(long)]
    preset: Option<String>,

    /// Key name, e.g. "C major", "A minor", "F lydian".
    #[arg(long)]
    key: Option<String>,

    /// Length in 4/4 bars.
    #[arg(long)]
    bars: Option<u32>,

    /// Intensity in [0, 1]; drives tempo and velocity.
    #[arg(long)]
    energy: Option<f64>,

    /// Seed for reproducible output. Defaults to the system clock.
    #[arg(long)]
    seed: Option<u64>,

    /// JSON composer config; omitted fields use defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum)]
    chord_policy: Option<PolicyArg>,

    /// Develop motifs from their predecessors within a bar.
    #[arg(long)]
    develop: bool,

    #[arg(long)]
    motif_length: Option<usize>,

    /// Steer motif starts along a melodic contour ("random" draws one).
    #[arg(long, value_enum)]
    contour: Option<ContourArg>,

    /// Melody only: skip the chord track.
    #[arg(long)]
    no_chords: bool,

    /// Also write the event list as JSON.
    #[arg(long)]
    json: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("music_prod_melody=info")),
        )
        .init();

    let args = Args::parse();
    let config = build_config(&args)?;
    let params = build_params(&args)?;

    let seed = args.seed.unwrap_or_else(clock_seed);

    println!("=== music_prod melody composer ===");
    println!("Output: {}", args.output.display());
    println!("Key: {}", params.key);
    println!("Bars: {}", params.bars);
    println!("Energy: {:.2}", params.energy);
    println!("Chord policy: {:?}", config.chord_policy);
    println!("Seed: {seed}");
    println!();

    let mut rng = ComposerRng::new(seed);

    println!("[1/2] Composing...");
    let composition = compose(&params, &config, &mut rng).context("composing melody")?;
    println!(
        "  {} notes over {} chord changes at {} BPM",
        composition.notes().count(),
        composition.chords().count(),
        composition.tempo_bpm
    );
    println!(
        "  Filled {:.2} of {} beats",
        music_prod_melody::event::to_quarters(composition.end_of_last_note()),
        params.bars * 4
    );

    println!("[2/2] Writing MIDI to {}...", args.output.display());
    write_midi(&composition, &args.output, &config.midi)
        .with_context(|| format!("writing {}", args.output.display()))?;

    if let Some(json_path) = &args.json {
        let json = serde_json::to_string_pretty(&composition)?;
        std::fs::write(json_path, json)
            .with_context(|| format!("writing {}", json_path.display()))?;
        println!("  Event list written to {}", json_path.display());
    }

    println!();
    println!("Reproduce with: --seed {seed}");
    Ok(())
}

/// Config file (or defaults) with command-line overrides applied.
fn build_config(args: &Args) -> anyhow::Result<ComposerConfig> {
    let mut config = match &args.config {
        Some(path) => ComposerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ComposerConfig::default(),
    };
    if let Some(policy) = args.chord_policy {
        config.chord_policy = policy.into();
    }
    if let Some(length) = args.motif_length {
        config.motif_length = length;
    }
    if let Some(contour) = args.contour {
        config.shape_contour = true;
        config.contour = contour.fixed();
    }
    config.develop_motifs |= args.develop;
    config.emit_chords &= !args.no_chords;
    config.validate()?;
    Ok(config)
}

/// Preset (calm by default) with explicit key, bars and energy overrides.
fn build_params(args: &Args) -> anyhow::Result<ComposeParams> {
    let mut params = match &args.preset {
        Some(name) => name.parse::<Preset>()?.params(),
        None => Preset::Calm.params(),
    };
    if let Some(key) = &args.key {
        params.key = Key::parse(key).with_context(|| format!("parsing key '{key}'"))?;
    }
    if let Some(bars) = args.bars {
        params.bars = bars;
    }
    if let Some(energy) = args.energy {
        params.energy = energy;
    }
    Ok(params)
}

fn clock_seed() -> u64 {
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    tracing::debug!(seed, "seeded from system clock");
    seed
}

#[cfg(test)]
mod tests {
    use super::*;
    use music_prod_melody::harmony::ChordPolicy;
    use music_prod_melody::mode::Mode;

    fn args(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("compose").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_compose_calm() {
        let a = args(&[]);
        assert_eq!(a.output, PathBuf::from("melody.mid"));
        assert_eq!(build_params(&a).unwrap(), Preset::Calm.params());
        assert_eq!(build_config(&a).unwrap(), ComposerConfig::default());
    }

    #[test]
    fn flags_override_preset() {
        let a = args(&[
            "out.mid",
            "--preset",
            "energetic",
            "--key",
            "F# dorian",
            "--bars",
            "3",
        ]);
        let params = build_params(&a).unwrap();
        assert_eq!(params.key, Key::new(6, Mode::Dorian));
        assert_eq!(params.bars, 3);
        assert_eq!(params.energy, Preset::Energetic.params().energy);
    }

    #[test]
    fn flags_override_config() {
        let a = args(&[
            "--chord-policy",
            "random",
            "--develop",
            "--contour",
            "pyramid",
            "--no-chords",
            "--motif-length",
            "5",
        ]);
        let config = build_config(&a).unwrap();
        assert_eq!(config.chord_policy, ChordPolicy::RandomPerSlot);
        assert!(config.develop_motifs);
        assert!(config.shape_contour);
        assert_eq!(config.contour, Some(Contour::Pyramid));
        assert!(!config.emit_chords);
        assert_eq!(config.motif_length, 5);

        let random = build_config(&args(&["--contour", "random"])).unwrap();
        assert!(random.shape_contour);
        assert_eq!(random.contour, None);
    }

    #[test]
    fn bad_requests_are_rejected() {
        assert!(build_params(&args(&["--preset", "chaos"])).is_err());
        assert!(build_params(&args(&["--key", "H major"])).is_err());
        assert!(build_config(&args(&["--motif-length", "0"])).is_err());
        assert!(Args::try_parse_from(["compose", "--contour", "zigzag"]).is_err());
    }
}
